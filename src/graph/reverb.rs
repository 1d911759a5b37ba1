use crate::dsp::reverb::SchroederReverb;
use crate::graph::node::{GraphNode, RenderCtx};

/// Dry/wet reverb on the mix bus.
///
/// The delay lines depend on the sample rate, so the reverb is built lazily on
/// the first rendered block.
pub struct ReverbNode {
    reverb: Option<SchroederReverb>,
    room_size: f32,
    damping: f32,
    mix: f32,
}

impl ReverbNode {
    /// - `room_size`: 0.0 (small room) to 1.0 (large hall)
    /// - `damping`: 0.0 (bright) to 1.0 (dark)
    /// - `mix`: 0.0 (dry) to 1.0 (wet)
    pub fn new(room_size: f32, damping: f32, mix: f32) -> Self {
        Self {
            reverb: None,
            room_size: room_size.clamp(0.0, 1.0),
            damping: damping.clamp(0.0, 1.0),
            mix: mix.clamp(0.0, 1.0),
        }
    }

    /// Medium hall, the instrument's default space.
    pub fn hall(mix: f32) -> Self {
        Self::new(0.6, 0.4, mix)
    }

    pub fn mix(&self) -> f32 {
        self.mix
    }
}

impl GraphNode for ReverbNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        let (room_size, damping, mix) = (self.room_size, self.damping, self.mix);
        let reverb = self.reverb.get_or_insert_with(|| {
            let mut reverb = SchroederReverb::new(ctx.sample_rate);
            reverb.set_room_size(room_size);
            reverb.set_damping(damping);
            reverb
        });

        for sample in out.iter_mut() {
            let dry = *sample;
            let wet = reverb.process(dry);
            *sample = dry * (1.0 - mix) + wet * mix;
        }
    }
}
