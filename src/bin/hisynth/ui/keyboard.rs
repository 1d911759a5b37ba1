//! Computer keyboard as a piano
//!
//!     w e   t y u   o p
//!    a s d f g h j k l ;      z / x: octave down / up

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

/// Key, semitone offset from the octave's C.
const KEY_ROW: [(char, u8); 17] = [
    ('a', 0),
    ('w', 1),
    ('s', 2),
    ('e', 3),
    ('d', 4),
    ('f', 5),
    ('t', 6),
    ('g', 7),
    ('y', 8),
    ('h', 9),
    ('u', 10),
    ('j', 11),
    ('k', 12),
    ('o', 13),
    ('l', 14),
    ('p', 15),
    (';', 16),
];

const MIN_OCTAVE: i8 = 0;
const MAX_OCTAVE: i8 = 8;

/// How long a key sounds when the terminal cannot report key releases.
pub const AUTO_RELEASE: Duration = Duration::from_millis(400);

pub struct Keyboard {
    octave: i8,
}

impl Keyboard {
    pub fn new() -> Self {
        Self { octave: 4 }
    }

    pub fn octave(&self) -> i8 {
        self.octave
    }

    pub fn octave_down(&mut self) {
        self.octave = (self.octave - 1).max(MIN_OCTAVE);
    }

    pub fn octave_up(&mut self) {
        self.octave = (self.octave + 1).min(MAX_OCTAVE);
    }

    /// MIDI note for `key` in the current octave (C4 = 60).
    pub fn note_for(&self, key: char) -> Option<u8> {
        let key = key.to_ascii_lowercase();
        let (_, offset) = KEY_ROW.iter().find(|(k, _)| *k == key)?;
        let base = (self.octave as u16 + 1) * 12;
        u8::try_from(base + *offset as u16)
            .ok()
            .filter(|&note| note <= 127)
    }
}

impl Default for Keyboard {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy)]
struct HeldKey {
    note: u8,
    deadline: Option<Instant>,
}

/// Keys currently down, remembering the note each one started so an octave
/// change mid-hold still releases the right note.
pub struct HeldKeys {
    keys: HashMap<char, HeldKey>,
    auto_release: Option<Duration>,
}

impl HeldKeys {
    /// `auto_release` is set when the terminal only reports presses.
    pub fn new(auto_release: Option<Duration>) -> Self {
        Self {
            keys: HashMap::new(),
            auto_release,
        }
    }

    /// Record a press. Returns true when the note should start; key repeat
    /// of a held key only pushes its auto-release deadline out.
    pub fn press(&mut self, key: char, note: u8, now: Instant) -> bool {
        let deadline = self.auto_release.map(|hold| now + hold);
        match self.keys.get_mut(&key) {
            Some(held) => {
                held.deadline = deadline;
                false
            }
            None => {
                self.keys.insert(key, HeldKey { note, deadline });
                true
            }
        }
    }

    /// Record a release, returning the note to stop.
    pub fn release(&mut self, key: char) -> Option<u8> {
        self.keys.remove(&key).map(|held| held.note)
    }

    /// Notes whose auto-release deadline has passed.
    pub fn expire(&mut self, now: Instant) -> Vec<u8> {
        let expired: Vec<char> = self
            .keys
            .iter()
            .filter(|(_, held)| held.deadline.is_some_and(|d| d <= now))
            .map(|(&key, _)| key)
            .collect();
        expired
            .into_iter()
            .filter_map(|key| self.release(key))
            .collect()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }
}
