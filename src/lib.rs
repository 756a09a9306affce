//! Metronome, tap tempo and pitch-reference tone generator.
//!
//! The crate is layered the same way top to bottom:
//!
//! - [`dsp`]: allocation-free oscillator and envelope primitives
//! - [`graph`]: block-rendering nodes built from those primitives
//! - [`voices`]: the per-beat click sounds and the sustained reference tone
//! - [`output`]: the lazily created audio output context and its mixer
//! - [`metronome`]: beat scheduling, tap tempo and the threaded driver
//! - [`tone`]: the pitch-reference tone generator widget
//!
//! # Example
//!
//! ```ignore
//! use saavy_metronome::{metronome::Metronome, output::AudioContext, sequencing::TimeSignature};
//!
//! let mut metronome = Metronome::builder()
//!     .bpm(100)
//!     .time_signature(TimeSignature::SIX_EIGHT)
//!     .listener(|event| println!("{event:?}"))
//!     .build(AudioContext::new());
//! metronome.start()?;
//! ```

pub mod dsp;
pub mod error;
pub mod graph;
pub mod metronome;
pub mod output;
pub mod pitch;
pub mod sequencing;
pub mod tone;
pub mod voices;

pub use error::{AudioError, MetronomeError, Result};

pub const MAX_BLOCK_SIZE: usize = 2048;
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;
