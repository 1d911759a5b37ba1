use std::collections::{BTreeSet, VecDeque};

use crate::synth::voice::{VoiceOutput, VoiceSlot};

/// Fixed arena of voice slots.
pub struct VoicePool<O> {
    slots: Vec<VoiceSlot<O>>,
}

impl<O: VoiceOutput> VoicePool<O> {
    /// Build a pool with one slot per output, indexed in iteration order.
    pub fn new(outputs: impl IntoIterator<Item = O>) -> Self {
        let slots = outputs
            .into_iter()
            .enumerate()
            .map(|(index, output)| VoiceSlot::new(index, output))
            .collect();
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Lowest slot index not in `allocated`.
    pub fn find_free(&self, allocated: &BTreeSet<usize>) -> Option<usize> {
        (0..self.slots.len()).find(|index| !allocated.contains(index))
    }

    /// The note to steal from when the pool is exhausted: always the oldest
    /// sounding note, regardless of level or envelope stage.
    pub fn find_steal_candidate(&self, active: &VecDeque<u8>) -> Option<u8> {
        active.front().copied()
    }

    pub fn slot(&self, index: usize) -> Option<&VoiceSlot<O>> {
        self.slots.get(index)
    }

    pub fn slot_mut(&mut self, index: usize) -> Option<&mut VoiceSlot<O>> {
        self.slots.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &VoiceSlot<O>> {
        self.slots.iter()
    }
}
