use crate::{
    dsp::oscillator::{OscillatorBlock, OscillatorWaveform},
    graph::node::{GraphNode, RenderCtx},
};

/*
LFO (Low Frequency Oscillator)
==============================

A sub-audio oscillator whose output modulates a parameter instead of being
heard. The instrument uses one sine LFO at 3 Hz to sweep the mix low-pass.

The LFO ignores `ctx.frequency` (the note pitch) and runs at its own rate.
`restart()` snaps it back to phase zero; the allocator triggers this on the
first note after silence so each phrase starts at the same sweep position.
*/

pub struct LfoNode {
    osc: OscillatorBlock,
    frequency: f32,
}

impl LfoNode {
    pub fn new(waveform: OscillatorWaveform, frequency: f32) -> Self {
        Self {
            osc: OscillatorBlock::new(waveform),
            frequency,
        }
    }

    pub fn sine(frequency: f32) -> Self {
        Self::new(OscillatorWaveform::Sine, frequency)
    }

    pub fn triangle(frequency: f32) -> Self {
        Self::new(OscillatorWaveform::Triangle, frequency)
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Restart the sweep from phase zero.
    pub fn restart(&mut self) {
        self.osc.reset();
    }
}

impl GraphNode for LfoNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        let lfo_ctx = RenderCtx::from_freq(ctx.sample_rate, self.frequency, 1.0);
        self.osc.render(out, &lfo_ctx);
    }
}
