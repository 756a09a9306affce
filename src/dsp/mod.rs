//! Low-level DSP primitives used by the graph nodes and voices.
//!
//! These components are allocation-free and realtime-safe, so they can live
//! inside voices that are rendered from the audio callback.

/// Exponential one-shot envelope for percussive clicks.
pub mod decay;
/// Attack/decay/sustain/release gate for sustained tones.
pub mod envelope;
/// Phase-accumulator oscillator and waveform shapes.
pub mod oscillator;

pub use envelope::EnvelopeState;
pub use oscillator::Waveform;
