use crate::{
    dsp::{filter::LowPassFilter, lfo::scale_unipolar},
    graph::{
        lfo::LfoNode,
        node::{GraphNode, RenderCtx},
    },
    MAX_BLOCK_SIZE,
};

/*
LFO-swept low-pass
==================

The mix bus effect of the instrument: a low-pass whose cutoff follows a
shared LFO, giving a slow "wah" pulse over everything that sounds.

    cutoff(t) = unipolar(lfo(t)) * depth      (0 .. depth Hz)

The cutoff is updated per sample from a pre-rendered LFO block. The LFO can
be restarted from outside (modulation sync) through `restart_lfo`.
*/

pub struct SweptLowPass {
    filter: LowPassFilter,
    lfo: LfoNode,
    depth: f32,
    lfo_buffer: Vec<f32>,
}

impl SweptLowPass {
    pub fn new(lfo_rate: f32, depth: f32) -> Self {
        Self {
            filter: LowPassFilter::new(depth),
            lfo: LfoNode::sine(lfo_rate),
            depth,
            lfo_buffer: vec![0.0; MAX_BLOCK_SIZE],
        }
    }

    pub fn restart_lfo(&mut self) {
        self.lfo.restart();
    }

    pub fn cutoff(&self) -> f32 {
        self.filter.cutoff()
    }
}

impl GraphNode for SweptLowPass {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        for chunk in out.chunks_mut(MAX_BLOCK_SIZE) {
            let lfo = &mut self.lfo_buffer[..chunk.len()];
            self.lfo.render_block(lfo, ctx);

            for (sample, &modulation) in chunk.iter_mut().zip(lfo.iter()) {
                self.filter.set_cutoff(scale_unipolar(modulation, self.depth));
                *sample = self.filter.process(*sample, ctx.sample_rate);
            }
        }
    }
}
