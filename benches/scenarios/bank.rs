//! Benchmarks for rendering the full voice bank.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use hisynth::{ManualScheduler, Synth, SynthConfig, SynthParts};

use crate::BLOCK_SIZES;

pub fn bench_bank(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/bank");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Default 8-voice pool, nothing playing: the idle cost of the bus
        let SynthParts { mut bank, .. } =
            Synth::build(&SynthConfig::default(), 48_000.0, ManualScheduler::new()).unwrap();
        group.bench_with_input(BenchmarkId::new("idle", size), &size, |b, _| {
            b.iter(|| bank.render(black_box(&mut buffer)))
        });

        // Every slot sounding
        let SynthParts {
            facade, mut bank, ..
        } = Synth::build(&SynthConfig::default(), 48_000.0, ManualScheduler::new()).unwrap();
        for note in [48, 52, 55, 59, 60, 64, 67, 71] {
            facade.note_on(note);
        }
        group.bench_with_input(BenchmarkId::new("full_pool", size), &size, |b, _| {
            b.iter(|| bank.render(black_box(&mut buffer)))
        });
    }

    group.finish();
}
