//! Benchmarks for the gated envelope.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use hisynth::dsp::envelope::Envelope;
use hisynth::graph::node::RenderCtx;

use crate::BLOCK_SIZES;

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");
    let ctx = RenderCtx::from_freq(48_000.0, 440.0, 1.0);

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Held in sustain - constant output, cheapest path
        let mut env = Envelope::adsr(0.001, 0.001, 0.7, 0.5);
        env.note_on(&ctx);
        env.render(&mut vec![0.0; 1024], &ctx);
        group.bench_with_input(BenchmarkId::new("sustain", size), &size, |b, _| {
            b.iter(|| {
                env.render(black_box(&mut buffer), black_box(&ctx));
            })
        });

        // Gate reopened every block - ramp stepping plus stage changes
        let mut env = Envelope::adsr(0.5, 0.1, 1.0, 0.5);
        group.bench_with_input(BenchmarkId::new("retrigger", size), &size, |b, _| {
            b.iter(|| {
                env.note_on(&ctx);
                env.render(black_box(&mut buffer), black_box(&ctx));
            })
        });
    }

    group.finish();
}
