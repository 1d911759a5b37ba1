//! MIDI note numbers and their equal-tempered pitch.

/// Highest valid MIDI note number.
pub const MAX_NOTE: u8 = 127;

const NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Convert MIDI note number to frequency in Hz.
/// A4 = 440 Hz = MIDI note 69
#[inline]
pub fn midi_note_to_freq(note: u8) -> f32 {
    440.0 * 2.0_f32.powf((note as f32 - 69.0) / 12.0)
}

#[inline]
pub fn is_valid_note(note: u8) -> bool {
    note <= MAX_NOTE
}

/// Scientific pitch name, middle C (60) = "C4".
pub fn note_name(note: u8) -> String {
    let octave = note as i32 / 12 - 1;
    format!("{}{}", NAMES[note as usize % 12], octave)
}
