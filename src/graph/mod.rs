//! Block-rendering nodes built on the DSP primitives.
//!
//! Nodes add the note lifecycle (`note_on`/`note_off`/`is_active`) on top of
//! the raw oscillators and envelopes so voices can be composed with
//! `.amplify()` and rendered a block at a time from the audio callback.

/// Multiply a signal by an envelope.
pub mod amplify;
/// Envelope nodes: ADSR gate and percussive decay.
pub mod envelope;
/// Fluent combinators (`.amplify()`).
pub mod extensions;
/// Core traits shared by all graph nodes.
pub mod node;
/// Audio-band oscillator node.
pub mod oscillator;

pub use node::{GraphNode, RenderCtx};
