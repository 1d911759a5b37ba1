//! Low-level DSP primitives behind the voice slots and the mix bus.
//!
//! These components are allocation-free once constructed, making them safe to
//! run inside the audio callback. The allocator never touches them directly;
//! it only sends gate and pitch commands to the voice bank that owns them.

/// Gated attack/decay/sustain/release envelope.
pub mod envelope;
/// Low-pass state-variable filter for the mix bus.
pub mod filter;
/// Helpers for the shared control-rate oscillator.
pub mod lfo;
/// Phase-accumulator oscillator waveforms.
pub mod oscillator;
/// Comb/allpass room reverb.
pub mod reverb;

pub use envelope::EnvelopeState;
pub use oscillator::OscillatorWaveform;
