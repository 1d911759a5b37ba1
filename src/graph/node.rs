use crate::synth::note::midi_note_to_freq;

/// Context passed to graph nodes during rendering
///
/// - sample_rate: Audio sample rate (e.g., 48000.0)
/// - frequency: Pitch to render (Hz)
/// - level: Output amplitude (0.0-1.0)
pub struct RenderCtx {
    pub sample_rate: f32,
    pub frequency: f32,
    pub level: f32,
}

impl RenderCtx {
    /// Create context from a MIDI note number
    pub fn from_note(sample_rate: f32, note: u8, level: f32) -> Self {
        Self::from_freq(sample_rate, midi_note_to_freq(note), level)
    }

    /// Create context from a frequency in Hz
    pub fn from_freq(sample_rate: f32, frequency: f32, level: f32) -> Self {
        Self {
            sample_rate,
            frequency,
            level,
        }
    }
}

/// Core trait for audio processing graph nodes
///
/// Nodes render audio in blocks and respond to gate events.
pub trait GraphNode: Send {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx);

    /// Gate opened
    fn note_on(&mut self, _ctx: &RenderCtx) {}

    /// Gate closed
    fn note_off(&mut self, _ctx: &RenderCtx) {}

    /// Check if this node is still producing sound
    fn is_active(&self) -> bool {
        true
    }
}

impl GraphNode for Box<dyn GraphNode> {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        (**self).render_block(out, ctx)
    }

    fn note_on(&mut self, ctx: &RenderCtx) {
        (**self).note_on(ctx)
    }

    fn note_off(&mut self, ctx: &RenderCtx) {
        (**self).note_off(ctx)
    }

    fn is_active(&self) -> bool {
        (**self).is_active()
    }
}
