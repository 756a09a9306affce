//! Ready-made voices rendered by the output mixer.
//!
//! - [`click`]: the per-beat metronome click, one of four sound types
//! - [`tone`]: the sustained pitch-reference tone

pub mod click;
pub mod tone;

pub use click::{ClickSound, ClickVoice, SoundType};
pub use tone::{ToneSettings, ToneVoice};
