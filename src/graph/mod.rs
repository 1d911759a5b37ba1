//! Graph nodes wrapping the DSP primitives with note/gate events and
//! block-based rendering. Voice slots are built from `OscNode` and `EnvNode`;
//! the mix bus runs through `SweptLowPass` and `ReverbNode`.

/// Envelope node exposing gate events.
pub mod envelope;
/// LFO-swept low-pass for the mix bus.
pub mod filter;
/// Low frequency oscillator for the filter sweep.
pub mod lfo;
/// Core traits shared by all graph nodes.
pub mod node;
/// Audio-rate voice oscillator.
pub mod oscillator;
/// Dry/wet reverb node.
pub mod reverb;

pub use node::{GraphNode, RenderCtx};
