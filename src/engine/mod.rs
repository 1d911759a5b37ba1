// Purpose: note → voice bookkeeping and deferred release

pub mod allocator;
pub mod scheduler;

pub use allocator::{AllocatorSnapshot, ModulationSync, VoiceAllocator};
pub use scheduler::{ManualScheduler, ReleaseScheduler, ThreadScheduler, TimerHandle};
