use std::sync::Arc;

use crate::{
    engine::{allocator::VoiceAllocator, scheduler::ReleaseScheduler, AllocatorSnapshot},
    synth::voice::VoiceOutput,
};

/// The note interface the rest of the app talks to.
///
/// Cheap to clone; every clone drives the same allocator, so the keyboard UI
/// and any other note source can each hold one.
pub struct SynthFacade<O, S> {
    allocator: Arc<VoiceAllocator<O, S>>,
}

impl<O, S> Clone for SynthFacade<O, S> {
    fn clone(&self) -> Self {
        Self {
            allocator: Arc::clone(&self.allocator),
        }
    }
}

impl<O, S> SynthFacade<O, S>
where
    O: VoiceOutput + 'static,
    S: ReleaseScheduler,
{
    pub fn new(allocator: VoiceAllocator<O, S>) -> Self {
        Self {
            allocator: Arc::new(allocator),
        }
    }

    pub fn note_on(&self, note: u8) {
        self.allocator.note_on(note);
    }

    pub fn note_off(&self, note: u8) {
        self.allocator.note_off(note);
    }

    /// Panic button: release every held key.
    pub fn all_notes_off(&self) {
        self.allocator.all_notes_off();
    }

    pub fn snapshot(&self) -> AllocatorSnapshot {
        self.allocator.snapshot()
    }

    pub fn allocator(&self) -> &VoiceAllocator<O, S> {
        &self.allocator
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{engine::ManualScheduler, synth::pool::VoicePool};

    struct Silent;

    impl VoiceOutput for Silent {
        fn set_frequency(&mut self, _hz: f32) {}
        fn set_amplitude(&mut self, _level: f32) {}
        fn open_gate(&mut self) {}
        fn close_gate(&mut self) {}
        fn release_duration(&self) -> Duration {
            Duration::from_millis(200)
        }
    }

    #[test]
    fn clones_share_one_allocator() {
        let pool = VoicePool::new(vec![Silent, Silent]);
        let facade = SynthFacade::new(VoiceAllocator::new(pool, ManualScheduler::new()));
        let other = facade.clone();

        facade.note_on(60);
        other.note_on(64);
        assert_eq!(facade.allocator().allocated_count(), 2);

        other.note_off(60);
        assert_eq!(facade.snapshot().active, vec![64]);

        facade.allocator().scheduler().advance(Duration::from_millis(300));
        assert_eq!(other.allocator().slot_of(60), None);
    }
}
