#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use std::f32::consts::TAU;

use crate::graph::node::RenderCtx;

/*
Phase-Accumulator Oscillator
============================

Every waveform here is a function of a single normalized phase in [0, 1).
Each sample the phase advances by `frequency / sample_rate` and wraps.

    phase   0.0 ────────────── 0.5 ────────────── 1.0
    sine    0 → +1 → 0 → -1 → 0          sin(TAU * phase)
    saw     -1 ──────────────────────→ +1  2 * phase - 1
    square  +1 +1 +1 +1 │ -1 -1 -1 -1     phase < 0.5
    pulse   +1 +1 │ -1 -1 -1 -1 -1 -1     phase < duty
    tri     -1 ↗ +1 ↘ -1                  4 * |phase - 0.5| - 1 (inverted)

No band-limiting is applied. Harsh aliasing on saw/square at high notes is
accepted; the mix runs through a low-pass filter anyway.
*/

/// Default duty cycle of the pulse waveform.
pub const PULSE_DUTY: f32 = 0.25;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OscillatorWaveform {
    Sine,
    Square,
    Saw,
    Triangle,
    /// Rectangular wave high for `duty` of the period.
    Pulse { duty: f32 },
}

impl OscillatorWaveform {
    /// Pulse waveform with the default 25% duty cycle.
    pub fn pulse() -> Self {
        OscillatorWaveform::Pulse { duty: PULSE_DUTY }
    }

    /// Human-readable name, used by the terminal UI.
    pub fn name(&self) -> &'static str {
        match self {
            OscillatorWaveform::Sine => "Sine",
            OscillatorWaveform::Square => "Square",
            OscillatorWaveform::Saw => "Saw",
            OscillatorWaveform::Triangle => "Triangle",
            OscillatorWaveform::Pulse { .. } => "Pulse",
        }
    }

    #[inline]
    fn sample_at(&self, phase: f32) -> f32 {
        match *self {
            OscillatorWaveform::Sine => (TAU * phase).sin(),
            OscillatorWaveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            OscillatorWaveform::Saw => 2.0 * phase - 1.0,
            OscillatorWaveform::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
            OscillatorWaveform::Pulse { duty } => {
                if phase < duty.clamp(0.0, 1.0) {
                    1.0
                } else {
                    -1.0
                }
            }
        }
    }
}

pub struct OscillatorBlock {
    waveform: OscillatorWaveform,
    phase: f32,
}

impl OscillatorBlock {
    pub fn new(waveform: OscillatorWaveform) -> Self {
        Self {
            waveform,
            phase: 0.0,
        }
    }

    pub fn sine() -> Self {
        Self::new(OscillatorWaveform::Sine)
    }

    pub fn sawtooth() -> Self {
        Self::new(OscillatorWaveform::Saw)
    }

    pub fn square() -> Self {
        Self::new(OscillatorWaveform::Square)
    }

    pub fn triangle() -> Self {
        Self::new(OscillatorWaveform::Triangle)
    }

    pub fn pulse() -> Self {
        Self::new(OscillatorWaveform::pulse())
    }

    pub fn waveform(&self) -> OscillatorWaveform {
        self.waveform
    }

    /// Restart the waveform from phase zero.
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Fill `destination` with the waveform at `ctx.frequency`.
    pub fn render(&mut self, destination: &mut [f32], ctx: &RenderCtx) {
        let increment = ctx.frequency / ctx.sample_rate;
        for sample in destination.iter_mut() {
            *sample = self.waveform.sample_at(self.phase);
            self.phase += increment;
            if self.phase >= 1.0 {
                self.phase -= self.phase.floor();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(waveform: OscillatorWaveform, frequency: f32, len: usize) -> Vec<f32> {
        let ctx = RenderCtx::from_freq(48_000.0, frequency, 1.0);
        let mut osc = OscillatorBlock::new(waveform);
        let mut buffer = vec![0.0; len];
        osc.render(&mut buffer, &ctx);
        buffer
    }

    #[test]
    fn all_waveforms_stay_in_range() {
        for waveform in [
            OscillatorWaveform::Sine,
            OscillatorWaveform::Square,
            OscillatorWaveform::Saw,
            OscillatorWaveform::Triangle,
            OscillatorWaveform::pulse(),
        ] {
            for sample in render(waveform, 1_234.0, 4096) {
                assert!(
                    (-1.0..=1.0).contains(&sample),
                    "{} produced {sample}",
                    waveform.name()
                );
            }
        }
    }

    #[test]
    fn pulse_duty_controls_high_fraction() {
        // 100 Hz at 48 kHz = 480 samples per period
        let buffer = render(OscillatorWaveform::pulse(), 100.0, 480);
        let high = buffer.iter().filter(|&&s| s > 0.0).count();
        // accumulated phase error may shift the edge by one sample
        assert!((119..=121).contains(&high), "high samples: {high}");
    }

    #[test]
    fn reset_restarts_phase() {
        let ctx = RenderCtx::from_freq(48_000.0, 440.0, 1.0);
        let mut osc = OscillatorBlock::sawtooth();
        let mut first = vec![0.0; 64];
        osc.render(&mut first, &ctx);

        osc.reset();
        let mut second = vec![0.0; 64];
        osc.render(&mut second, &ctx);

        assert_eq!(first, second);
    }
}
