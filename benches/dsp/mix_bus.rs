//! Benchmarks for the effects on the shared mix bus.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use hisynth::graph::{
    filter::SweptLowPass,
    node::{GraphNode, RenderCtx},
    reverb::ReverbNode,
};

use crate::BLOCK_SIZES;

pub fn bench_mix_bus(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/mix_bus");
    let ctx = RenderCtx::from_freq(48_000.0, 0.0, 1.0);

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| ((i % 64) as f32 / 32.0) - 1.0).collect();
        let mut buffer = input.clone();

        // Cutoff recomputed every sample from the LFO
        let mut filter = SweptLowPass::new(3.0, 5000.0);
        group.bench_with_input(BenchmarkId::new("swept_lowpass", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                filter.render_block(black_box(&mut buffer), black_box(&ctx));
            })
        });

        // 4 combs + 2 allpasses per sample
        let mut reverb = ReverbNode::hall(0.3);
        group.bench_with_input(BenchmarkId::new("reverb", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                reverb.render_block(black_box(&mut buffer), black_box(&ctx));
            })
        });
    }

    group.finish();
}
