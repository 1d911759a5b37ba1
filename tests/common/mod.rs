#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;

use hisynth::{
    engine::{ModulationSync, ReleaseScheduler, VoiceAllocator},
    synth::{pool::VoicePool, voice::VoiceOutput},
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A call the allocator made on one slot's audio output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Call {
    Frequency(f32),
    Amplitude(f32),
    OpenGate,
    CloseGate,
}

/// Slot output that records every call, shared with the test through a log.
pub struct RecordingOutput {
    log: Arc<Mutex<Vec<Call>>>,
    release: Duration,
}

impl VoiceOutput for RecordingOutput {
    fn set_frequency(&mut self, hz: f32) {
        self.log.lock().push(Call::Frequency(hz));
    }

    fn set_amplitude(&mut self, level: f32) {
        self.log.lock().push(Call::Amplitude(level));
    }

    fn open_gate(&mut self) {
        self.log.lock().push(Call::OpenGate);
    }

    fn close_gate(&mut self) {
        self.log.lock().push(Call::CloseGate);
    }

    fn release_duration(&self) -> Duration {
        self.release
    }
}

/// Per-slot call logs, index = slot.
pub type SlotLogs = Vec<Arc<Mutex<Vec<Call>>>>;

/// `voices` recording outputs with the given release time.
pub fn recording_pool(voices: usize, release: Duration) -> (VoicePool<RecordingOutput>, SlotLogs) {
    let logs: SlotLogs = (0..voices).map(|_| Arc::default()).collect();
    let outputs = logs.iter().map(|log| RecordingOutput {
        log: Arc::clone(log),
        release,
    });
    (VoicePool::new(outputs), logs)
}

pub fn recording_allocator<S: ReleaseScheduler>(
    voices: usize,
    release: Duration,
    scheduler: S,
) -> (VoiceAllocator<RecordingOutput, S>, SlotLogs) {
    let (pool, logs) = recording_pool(voices, release);
    (VoiceAllocator::new(pool, scheduler), logs)
}

/// Counts modulation restarts.
#[derive(Clone, Default)]
pub struct SyncCounter(pub Arc<Mutex<usize>>);

impl SyncCounter {
    pub fn count(&self) -> usize {
        *self.0.lock()
    }
}

impl ModulationSync for SyncCounter {
    fn restart(&mut self) {
        *self.0.lock() += 1;
    }
}
