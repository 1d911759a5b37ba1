use rtrb::Consumer;

/// Parameter change for one voice slot, sent from the allocator to the audio
/// thread.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum VoiceCommand {
    SetFrequency(f32),
    SetAmplitude(f32),
    OpenGate,
    CloseGate,
}

/// Commands for the shared mix bus.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BusCommand {
    /// Restart the filter-sweep LFO from phase zero.
    RestartLfo,
}

/// What happened inside the allocator, for the UI to poll.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SynthEvent {
    /// A free slot started sounding `note`.
    NoteAllocated { note: u8, slot: usize },
    /// `note` was pressed again while still holding its slot.
    NoteRetriggered { note: u8, slot: usize },
    /// The pool was full; `stolen` lost its slot to `note`.
    NoteStolen { stolen: u8, note: u8, slot: usize },
    /// Key released; the slot is in its release tail.
    NoteReleased { note: u8, slot: usize },
    /// Release tail over; the slot is free again.
    VoiceFreed { note: u8, slot: usize },
    /// The shared modulation source was restarted for a new phrase.
    ModulationSynced,
}

pub trait MessageReceiver<T> {
    fn pop(&mut self) -> Option<T>;
}

impl<T> MessageReceiver<T> for Consumer<T> {
    fn pop(&mut self) -> Option<T> {
        Consumer::pop(self).ok()
    }
}

/// Receiving end of the allocator's event stream.
pub type EventReceiver = Consumer<SynthEvent>;
