//! Benchmarks for note handling in the allocator.

use std::{hint::black_box, time::Duration};

use criterion::{BenchmarkId, Criterion};
use hisynth::{
    engine::{ManualScheduler, VoiceAllocator},
    synth::{pool::VoicePool, voice::VoiceOutput},
};

/// Output with no audio behind it, so only bookkeeping is measured.
struct NullOutput;

impl VoiceOutput for NullOutput {
    fn set_frequency(&mut self, _hz: f32) {}
    fn set_amplitude(&mut self, _level: f32) {}
    fn open_gate(&mut self) {}
    fn close_gate(&mut self) {}
    fn release_duration(&self) -> Duration {
        Duration::from_millis(500)
    }
}

fn allocator(voices: usize) -> VoiceAllocator<NullOutput, ManualScheduler> {
    let pool = VoicePool::new((0..voices).map(|_| NullOutput));
    VoiceAllocator::new(pool, ManualScheduler::new())
}

pub fn bench_allocator(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/allocator");

    for voices in [4usize, 8, 16] {
        // Press and release a chord that fits, then let the tails finish
        let chord = allocator(voices);
        group.bench_with_input(BenchmarkId::new("chord", voices), &voices, |b, &n| {
            b.iter(|| {
                for note in 0..n as u8 {
                    chord.note_on(black_box(48 + note));
                }
                for note in 0..n as u8 {
                    chord.note_off(black_box(48 + note));
                }
                chord.scheduler().advance(Duration::from_secs(1));
            })
        });

        // Twice as many notes as voices: every second note steals
        let storm = allocator(voices);
        group.bench_with_input(BenchmarkId::new("steal_storm", voices), &voices, |b, &n| {
            b.iter(|| {
                for note in 0..(2 * n) as u8 {
                    storm.note_on(black_box(36 + note));
                }
                storm.all_notes_off();
                storm.scheduler().advance(Duration::from_secs(1));
            })
        });
    }

    group.finish();
}
