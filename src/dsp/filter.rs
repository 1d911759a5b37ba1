use std::f32::consts::PI;

use crate::graph::node::RenderCtx;

/*
Low-pass state-variable filter (TPT form)
=========================================

The mix bus runs through a single low-pass whose cutoff is swept by the
shared LFO. Only the low-pass tap of the SVF is used, so only that output is
computed.

    g = tan(PI * cutoff / sample_rate)     prewarped integrator gain
    k = 2 - 2 * resonance                  damping (2 = no peak)

The cutoff can change every sample without blowing up, which is why this
topology is used instead of a biquad.
*/

/// Lowest cutoff the filter accepts. A cutoff of 0 would silence everything
/// and make the gain computation degenerate.
pub const MIN_CUTOFF_HZ: f32 = 20.0;

pub struct LowPassFilter {
    ic1eq: f32,
    ic2eq: f32,
    cutoff_hz: f32,
    resonance: f32,
}

impl LowPassFilter {
    pub fn new(cutoff_hz: f32) -> Self {
        Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
            cutoff_hz: cutoff_hz.max(MIN_CUTOFF_HZ),
            resonance: 0.0,
        }
    }

    pub fn with_resonance(mut self, resonance: f32) -> Self {
        self.set_resonance(resonance);
        self
    }

    pub fn set_cutoff(&mut self, cutoff_hz: f32) {
        self.cutoff_hz = cutoff_hz.max(MIN_CUTOFF_HZ);
    }

    pub fn set_resonance(&mut self, resonance: f32) {
        self.resonance = resonance.clamp(0.0, 0.95);
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff_hz
    }

    /// Filter one sample with the current cutoff.
    #[inline]
    pub fn process(&mut self, input: f32, sample_rate: f32) -> f32 {
        let nyquist_guard = sample_rate * 0.49;
        let g = (PI * self.cutoff_hz.min(nyquist_guard) / sample_rate).tan();
        let k = 2.0 - 2.0 * self.resonance;

        let h = 1.0 / (1.0 + g * (g + k));
        let v3 = input - self.ic2eq;
        let v1 = h * (self.ic1eq + g * v3);
        let v2 = self.ic2eq + g * v1;

        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;

        v2
    }

    pub fn render(&mut self, buffer: &mut [f32], ctx: &RenderCtx) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample, ctx.sample_rate);
        }
    }

    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::oscillator::OscillatorBlock;

    fn peak(buffer: &[f32]) -> f32 {
        buffer[64..].iter().fold(0.0f32, |acc, &x| acc.max(x.abs()))
    }

    #[test]
    fn passes_dc() {
        let mut filter = LowPassFilter::new(500.0);
        let mut buffer = vec![1.0; 512];
        filter.render(&mut buffer, &RenderCtx::from_freq(48_000.0, 0.0, 1.0));
        assert!(buffer[511] > 0.99);
    }

    #[test]
    fn attenuates_above_cutoff() {
        let ctx = RenderCtx::from_freq(48_000.0, 8_000.0, 1.0);
        let mut buffer = vec![0.0; 512];
        OscillatorBlock::sine().render(&mut buffer, &ctx);

        let mut filter = LowPassFilter::new(500.0);
        filter.render(&mut buffer, &ctx);

        assert!(peak(&buffer) < 0.1, "peak was {}", peak(&buffer));
    }

    #[test]
    fn cutoff_is_clamped() {
        let mut filter = LowPassFilter::new(0.0);
        assert_eq!(filter.cutoff(), MIN_CUTOFF_HZ);
        filter.set_cutoff(-10.0);
        assert_eq!(filter.cutoff(), MIN_CUTOFF_HZ);
    }
}
