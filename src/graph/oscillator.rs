use crate::dsp::oscillator::{OscillatorBlock, OscillatorWaveform};
use crate::graph::node::{GraphNode, RenderCtx};

/*
Voice Oscillator
================

The sound source of one voice slot. It follows `ctx.frequency`, which the
slot updates whenever the allocator retunes it, so a stolen voice changes
pitch on the next block without any reset.

The oscillator is free-running: gate events do not reset its phase. Only the
envelope restarts on a retrigger, as on the hardware-style instrument this
models.

Waveform character:

  Sine      pure, no overtones
  Triangle  soft, weak odd harmonics
  Square    hollow, odd harmonics
  Pulse     nasal, 25% duty
  Saw       bright, all harmonics (instrument default)
*/

pub struct OscNode {
    osc: OscillatorBlock,
}

impl OscNode {
    pub fn new(waveform: OscillatorWaveform) -> Self {
        Self {
            osc: OscillatorBlock::new(waveform),
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
        self.osc.waveform()
    }
}

impl GraphNode for OscNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.osc.render(out, ctx);
    }
}
