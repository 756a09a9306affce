//! Scenario benchmarks: what the audio callback does while the metronome
//! and the reference tone are both sounding.

mod clicks;
mod mixer;

pub use clicks::bench_clicks;
pub use mixer::bench_mixer;
