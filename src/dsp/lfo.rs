//! Control-rate helpers for the shared LFO.

/*
The instrument has one LFO shared by every voice: a slow sine that sweeps the
mix low-pass cutoff between 0 and the configured depth.

    cutoff = unipolar(lfo) * depth

Because it is shared, its phase is only meaningful relative to a phrase. The
allocator restarts it when the first key goes down after silence, so every
phrase opens with the filter at the same point of its sweep.

Oscillators output bipolar signals (-1..+1); the sweep wants unipolar (0..1).
*/

/// Convert bipolar signal (-1.0 to +1.0) to unipolar (0.0 to 1.0).
#[inline]
pub fn bipolar_to_unipolar(bipolar: f32) -> f32 {
    (bipolar + 1.0) * 0.5
}

/// Map a bipolar LFO sample onto `0..=depth`.
#[inline]
pub fn scale_unipolar(bipolar: f32, depth: f32) -> f32 {
    bipolar_to_unipolar(bipolar.clamp(-1.0, 1.0)) * depth
}

/// Calculate samples per LFO period.
///
/// # Example
/// ```
/// use hisynth::dsp::lfo::samples_per_period;
/// assert_eq!(samples_per_period(3.0, 48_000.0), 16_000.0);
/// ```
#[inline]
pub fn samples_per_period(frequency_hz: f32, sample_rate: f32) -> f32 {
    sample_rate / frequency_hz
}
