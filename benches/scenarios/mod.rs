//! Real-world scenario benchmarks.
//!
//! These model how the instrument is actually played: chords and runs hitting
//! the allocator, and a full pool rendering in the audio callback.

mod allocator;
mod bank;

pub use allocator::bench_allocator;
pub use bank::bench_bank;
