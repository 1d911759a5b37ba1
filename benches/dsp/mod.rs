//! Benchmarks for low-level DSP primitives.

mod envelope;
mod mix_bus;
mod oscillator;

pub use envelope::bench_envelope;
pub use mix_bus::bench_mix_bus;
pub use oscillator::bench_oscillator;
