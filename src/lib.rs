pub mod config; // Construction-time settings and their validation
pub mod dsp; // Sample-level building blocks
pub mod engine; // Voice allocation and release timing
pub mod graph; // Block-rendering nodes over the dsp blocks
pub mod synth; // Voice slots, voice bank and the note facade

pub use config::{ConfigError, SynthConfig};
pub use engine::{ManualScheduler, ReleaseScheduler, ThreadScheduler, VoiceAllocator};
pub use synth::{facade::SynthFacade, message::SynthEvent, Instrument, Synth, SynthParts};

pub const MAX_BLOCK_SIZE: usize = 2048;
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;
