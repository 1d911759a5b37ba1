use std::{
    collections::{BTreeMap, BTreeSet, HashMap, VecDeque},
    sync::{Arc, Weak},
    time::Duration,
};

use log::{debug, error, info, warn};
use parking_lot::Mutex;
use rtrb::Producer;

use crate::{
    engine::scheduler::{ReleaseScheduler, TimerHandle},
    synth::{
        message::SynthEvent,
        note::{is_valid_note, note_name},
        pool::VoicePool,
        voice::{SlotState, VoiceOutput},
    },
};

/*
Voice allocation
================

Every note goes through the same life cycle:

    Unallocated ──note_on──► Sounding ──note_off──► Releasing ──timer──► Unallocated
                               ▲                        │
                               └────────note_on─────────┘  (timer cancelled,
                                                            same slot reused)

Three structures track it, all behind one mutex:

  allocation   note → slot. A note keeps its slot through the release tail;
               the entry goes away only when its release timer fires, or when
               the slot is stolen.
  active       notes whose key is down, oldest first. This is the steal queue.
               A released note leaves it immediately even though it still
               rings.
  pending      note → release timer. At most one per note.

When no slot is free, the oldest held note is stolen: its slot is retuned to
the new note and its envelope restarts. Strict FIFO, no level or stage
heuristics.

The shared modulation source (filter LFO) restarts when the number of held
notes goes from 0 to 1 through a fresh allocation or a retrigger. Stealing
never restarts it: the pool cannot be full while nothing is held, so a steal
is never the start of a phrase.

Release timers carry a ticket. A timer only frees its note if the pending map
still holds that same ticket, so a timer that outlived a retrigger or a steal
does nothing when it fires.
*/

/// Default amplitude given to a newly triggered voice.
pub const DEFAULT_LEVEL: f32 = 0.8;

/// Extra time after the release duration before a slot is freed, so the
/// envelope is fully silent when the slot is reused.
pub const DEFAULT_GUARD_INTERVAL: Duration = Duration::from_millis(100);

/// Something restarted in sync with the first note of a phrase.
pub trait ModulationSync: Send {
    fn restart(&mut self);
}

/// Copy of the allocator bookkeeping at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocatorSnapshot {
    pub allocation: BTreeMap<u8, usize>,
    pub active: Vec<u8>,
    pub pending: Vec<u8>,
    pub slots: Vec<SlotState>,
}

impl AllocatorSnapshot {
    /// Note currently holding `slot`, sounding or releasing.
    pub fn note_in_slot(&self, slot: usize) -> Option<u8> {
        self.allocation
            .iter()
            .find(|(_, &s)| s == slot)
            .map(|(&note, _)| note)
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingRelease {
    ticket: u64,
    handle: TimerHandle,
}

struct AllocatorState<O> {
    pool: VoicePool<O>,
    allocation: BTreeMap<u8, usize>,
    active: VecDeque<u8>,
    pending: HashMap<u8, PendingRelease>,
    next_ticket: u64,
    level: f32,
    guard_interval: Duration,
    modulation: Option<Box<dyn ModulationSync>>,
    events: Option<Producer<SynthEvent>>,
}

impl<O: VoiceOutput> AllocatorState<O> {
    fn allocated_slots(&self) -> BTreeSet<usize> {
        self.allocation.values().copied().collect()
    }

    fn emit(&mut self, event: SynthEvent) {
        if let Some(events) = self.events.as_mut() {
            if events.push(event).is_err() {
                debug!("event queue full, dropping {event:?}");
            }
        }
    }

    fn hold(&mut self, note: u8) {
        if !self.active.contains(&note) {
            self.active.push_back(note);
            if self.active.len() == 1 {
                self.sync_modulation();
            }
        }
    }

    fn sync_modulation(&mut self) {
        if let Some(modulation) = self.modulation.as_mut() {
            modulation.restart();
            debug!("first note of phrase, modulation restarted");
            self.emit(SynthEvent::ModulationSynced);
        }
    }

    fn retrigger(&mut self, note: u8, slot: usize) {
        let level = self.level;
        let Some(voice) = self.pool.slot_mut(slot) else {
            error!("note {note} mapped to missing slot {slot}");
            return;
        };
        voice.trigger(note, level);
        debug!("retrigger {} on slot {slot}", note_name(note));
        self.hold(note);
        self.emit(SynthEvent::NoteRetriggered { note, slot });
    }

    fn allocate(&mut self, note: u8, slot: usize) {
        let level = self.level;
        let Some(voice) = self.pool.slot_mut(slot) else {
            error!("free slot {slot} is outside the pool");
            return;
        };
        voice.trigger(note, level);
        self.allocation.insert(note, slot);
        debug!("allocate {} to slot {slot}", note_name(note));
        self.hold(note);
        self.emit(SynthEvent::NoteAllocated { note, slot });
    }

    fn steal(&mut self, note: u8) {
        let Some(stolen) = self.pool.find_steal_candidate(&self.active) else {
            warn!("no voices to steal, dropping {}", note_name(note));
            return;
        };
        let Some(&slot) = self.allocation.get(&stolen) else {
            error!(
                "voice stealing error: oldest note {stolen} has no slot, dropping {}",
                note_name(note)
            );
            return;
        };
        let Some(voice) = self.pool.slot_mut(slot) else {
            error!("voice stealing error: slot {slot} is outside the pool");
            return;
        };

        info!(
            "maximum polyphony reached, stealing {} (slot {slot}) for {}",
            note_name(stolen),
            note_name(note)
        );
        voice.retune(note);
        self.active.pop_front();
        self.allocation.remove(&stolen);
        // an outstanding timer for the stolen note is now inert
        self.pending.remove(&stolen);
        self.allocation.insert(note, slot);
        self.active.push_back(note);
        self.emit(SynthEvent::NoteStolen { stolen, note, slot });
    }

    fn finish_release(&mut self, note: u8, ticket: u64) {
        match self.pending.get(&note) {
            Some(pending) if pending.ticket == ticket => {}
            _ => {
                debug!("stale release timer for {} ignored", note_name(note));
                return;
            }
        }
        self.pending.remove(&note);
        if let Some(slot) = self.allocation.remove(&note) {
            debug!("{} released, slot {slot} free", note_name(note));
            self.emit(SynthEvent::VoiceFreed { note, slot });
        }
    }

    fn snapshot(&self) -> AllocatorSnapshot {
        let mut pending: Vec<u8> = self.pending.keys().copied().collect();
        pending.sort_unstable();
        AllocatorSnapshot {
            allocation: self.allocation.clone(),
            active: self.active.iter().copied().collect(),
            pending,
            slots: self.pool.iter().map(|slot| slot.state()).collect(),
        }
    }
}

/// Maps note events onto a fixed pool of voices.
///
/// All methods take `&self` and may be called from any thread; release timers
/// fire on the scheduler's thread and serialize through the same lock.
pub struct VoiceAllocator<O, S> {
    state: Arc<Mutex<AllocatorState<O>>>,
    scheduler: S,
}

impl<O, S> VoiceAllocator<O, S>
where
    O: VoiceOutput + 'static,
    S: ReleaseScheduler,
{
    pub fn new(pool: VoicePool<O>, scheduler: S) -> Self {
        let state = AllocatorState {
            pool,
            allocation: BTreeMap::new(),
            active: VecDeque::new(),
            pending: HashMap::new(),
            next_ticket: 0,
            level: DEFAULT_LEVEL,
            guard_interval: DEFAULT_GUARD_INTERVAL,
            modulation: None,
            events: None,
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            scheduler,
        }
    }

    /// Amplitude set on every newly triggered voice.
    pub fn with_level(self, level: f32) -> Self {
        self.state.lock().level = level.clamp(0.0, 1.0);
        self
    }

    pub fn with_guard_interval(self, guard_interval: Duration) -> Self {
        self.state.lock().guard_interval = guard_interval;
        self
    }

    /// Source restarted on the first note after silence.
    pub fn with_modulation(self, modulation: Box<dyn ModulationSync>) -> Self {
        self.state.lock().modulation = Some(modulation);
        self
    }

    /// Publish allocation events into `events`.
    pub fn with_events(self, events: Producer<SynthEvent>) -> Self {
        self.state.lock().events = Some(events);
        self
    }

    pub fn note_on(&self, note: u8) {
        if !is_valid_note(note) {
            warn!("note_on ignored: {note} is outside the MIDI range");
            return;
        }
        let mut guard = self.state.lock();
        let state = &mut *guard;

        if let Some(pending) = state.pending.remove(&note) {
            self.scheduler.cancel(pending.handle);
            debug!("{} retriggered in release, timer cancelled", note_name(note));
        }

        if let Some(&slot) = state.allocation.get(&note) {
            state.retrigger(note, slot);
            return;
        }

        let free = state.pool.find_free(&state.allocated_slots());
        match free {
            Some(slot) => state.allocate(note, slot),
            None => state.steal(note),
        }
    }

    pub fn note_off(&self, note: u8) {
        let mut guard = self.state.lock();
        self.release(&mut guard, note);
    }

    /// Release every held note.
    pub fn all_notes_off(&self) {
        let mut guard = self.state.lock();
        let held: Vec<u8> = guard.active.iter().copied().collect();
        for note in held {
            self.release(&mut guard, note);
        }
    }

    fn release(&self, state: &mut AllocatorState<O>, note: u8) {
        let Some(&slot) = state.allocation.get(&note) else {
            warn!("note_off called on {note}, which is not playing");
            return;
        };
        let Some(voice) = state.pool.slot_mut(slot) else {
            error!("note {note} mapped to missing slot {slot}");
            return;
        };
        voice.release();
        let delay = voice.release_duration() + state.guard_interval;

        let ticket = state.next_ticket;
        state.next_ticket += 1;
        let weak: Weak<Mutex<AllocatorState<O>>> = Arc::downgrade(&self.state);
        let handle = self.scheduler.schedule(
            delay,
            Box::new(move || {
                if let Some(state) = weak.upgrade() {
                    state.lock().finish_release(note, ticket);
                }
            }),
        );
        if let Some(previous) = state.pending.insert(note, PendingRelease { ticket, handle }) {
            self.scheduler.cancel(previous.handle);
        }
        debug!(
            "{} released on slot {slot}, freeing in {delay:?}",
            note_name(note)
        );

        if let Some(position) = state.active.iter().position(|&n| n == note) {
            state.active.remove(position);
        }
        state.emit(SynthEvent::NoteReleased { note, slot });
    }

    pub fn snapshot(&self) -> AllocatorSnapshot {
        self.state.lock().snapshot()
    }

    /// Pool size N.
    pub fn voice_count(&self) -> usize {
        self.state.lock().pool.len()
    }

    /// Notes currently holding a slot, sounding or releasing.
    pub fn allocated_count(&self) -> usize {
        self.state.lock().allocation.len()
    }

    /// Notes whose key is down.
    pub fn active_count(&self) -> usize {
        self.state.lock().active.len()
    }

    pub fn slot_of(&self, note: u8) -> Option<usize> {
        self.state.lock().allocation.get(&note).copied()
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }
}
