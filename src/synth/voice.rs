use std::time::Duration;

use crate::synth::note::midi_note_to_freq;

/// What a voice slot needs from the audio engine.
///
/// Calls are fire-and-forget: implementations must not block on audio
/// rendering, since they are made while the allocator holds its lock.
pub trait VoiceOutput: Send {
    fn set_frequency(&mut self, hz: f32);

    fn set_amplitude(&mut self, level: f32);

    /// Start (or restart) the envelope attack.
    fn open_gate(&mut self);

    /// Start the release tail. Sound keeps decaying after this returns.
    fn close_gate(&mut self);

    /// How long the voice keeps ringing after `close_gate`.
    fn release_duration(&self) -> Duration;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Open,
    Closed,
}

/// Control-side view of one slot, as last written by the allocator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotState {
    pub index: usize,
    pub frequency: f32,
    pub amplitude: f32,
    pub gate: GateState,
}

/// One oscillator + envelope pair, addressed by its index in the pool.
///
/// Slots are never destroyed; they are only retuned and regated.
pub struct VoiceSlot<O> {
    index: usize,
    output: O,
    frequency: f32,
    amplitude: f32,
    gate: GateState,
}

impl<O: VoiceOutput> VoiceSlot<O> {
    pub fn new(index: usize, output: O) -> Self {
        Self {
            index,
            output,
            frequency: 0.0,
            amplitude: 0.0,
            gate: GateState::Closed,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Tune to `note`, open the gate and set the playing level.
    pub fn trigger(&mut self, note: u8, level: f32) {
        self.retune(note);
        self.amplitude = level.clamp(0.0, 1.0);
        self.output.set_amplitude(self.amplitude);
    }

    /// Tune to `note` and reopen the gate, keeping the current level.
    pub fn retune(&mut self, note: u8) {
        self.frequency = midi_note_to_freq(note);
        self.output.set_frequency(self.frequency);
        self.gate = GateState::Open;
        self.output.open_gate();
    }

    /// Close the gate; the slot rings for `release_duration` afterwards.
    pub fn release(&mut self) {
        self.gate = GateState::Closed;
        self.output.close_gate();
    }

    pub fn release_duration(&self) -> Duration {
        self.output.release_duration()
    }

    pub fn gate(&self) -> GateState {
        self.gate
    }

    pub fn state(&self) -> SlotState {
        SlotState {
            index: self.index,
            frequency: self.frequency,
            amplitude: self.amplitude,
            gate: self.gate,
        }
    }

    pub fn output(&self) -> &O {
        &self.output
    }
}
