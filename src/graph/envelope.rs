use std::time::Duration;

use crate::{
    dsp::envelope::{Envelope, EnvelopeState},
    graph::node::{GraphNode, RenderCtx},
};

/// Envelope as a graph node: renders its gain curve into the buffer.
pub struct EnvNode {
    env: Envelope,
}

impl EnvNode {
    pub fn new() -> Self {
        Self {
            env: Envelope::new(),
        }
    }

    pub fn adsr(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            env: Envelope::adsr(attack, decay, sustain, release),
        }
    }

    pub fn level(&self) -> f32 {
        self.env.level()
    }

    pub fn state(&self) -> EnvelopeState {
        self.env.state()
    }

    pub fn release_duration(&self) -> Duration {
        self.env.release_duration()
    }
}

impl Default for EnvNode {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphNode for EnvNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.env.render(out, ctx);
    }

    fn note_on(&mut self, ctx: &RenderCtx) {
        self.env.note_on(ctx);
    }

    fn note_off(&mut self, ctx: &RenderCtx) {
        self.env.note_off(ctx);
    }

    fn is_active(&self) -> bool {
        self.env.is_active()
    }
}
