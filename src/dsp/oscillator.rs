use std::{f32::consts::TAU, fmt, str::FromStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{error::MetronomeError, graph::node::RenderCtx};

/*
Phase-Accumulator Oscillator
============================

The oscillator keeps a normalised phase in [0, 1) and advances it by
`frequency / sample_rate` every sample. Each waveform is a pure function of
that phase, so changing the frequency mid-note never causes a jump in the
output: only the slope of the phase changes.

  phase  0.0        0.25       0.5        0.75       1.0
  sine   0 ──────── 1 ──────── 0 ──────── -1 ─────── 0
  square 1 ─────────────────── -1 ────────────────── 1
  saw    -1 ───────────────────────────────────────→ 1
  tri    -1 ─────── 0 ──────── 1 ──────── 0 ──────── -1

No band-limiting is applied. The clicks are a few tens of milliseconds long
and the reference tone defaults to a sine, so aliasing from the square and
saw shapes is acceptable here.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    pub const ALL: [Waveform; 4] = [
        Waveform::Sine,
        Waveform::Square,
        Waveform::Sawtooth,
        Waveform::Triangle,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
            Waveform::Sawtooth => "sawtooth",
            Waveform::Triangle => "triangle",
        }
    }

    /// The next waveform in selector order, wrapping around.
    pub fn next(self) -> Self {
        let index = Self::ALL.iter().position(|&w| w == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }

    /// Evaluate the waveform at a normalised phase in [0, 1).
    #[inline]
    pub fn sample(self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => (TAU * phase).sin(),
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => 2.0 * phase - 1.0,
            Waveform::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
        }
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Waveform {
    type Err = MetronomeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sine" => Ok(Waveform::Sine),
            "square" => Ok(Waveform::Square),
            "saw" | "sawtooth" => Ok(Waveform::Sawtooth),
            "triangle" | "tri" => Ok(Waveform::Triangle),
            _ => Err(MetronomeError::UnknownWaveform(s.to_string())),
        }
    }
}

pub struct OscillatorBlock {
    waveform: Waveform,
    phase: f32,
}

impl OscillatorBlock {
    pub fn new(waveform: Waveform) -> Self {
        Self { waveform, phase: 0.0 }
    }

    pub fn sine() -> Self {
        Self::new(Waveform::Sine)
    }

    pub fn square() -> Self {
        Self::new(Waveform::Square)
    }

    pub fn sawtooth() -> Self {
        Self::new(Waveform::Sawtooth)
    }

    pub fn triangle() -> Self {
        Self::new(Waveform::Triangle)
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    /// Switch shape without resetting phase, so a live change does not click.
    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    #[inline]
    pub fn next_sample(&mut self, ctx: &RenderCtx) -> f32 {
        let value = self.waveform.sample(self.phase);
        let increment = ctx.frequency / ctx.sample_rate;
        self.phase = (self.phase + increment).fract();
        value
    }

    pub fn render(&mut self, destination: &mut [f32], ctx: &RenderCtx) {
        for sample in destination.iter_mut() {
            *sample = self.next_sample(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sine_matches_reference() {
        let sample_rate = 48_000.0;
        let ctx = RenderCtx::from_freq(sample_rate, 440.0, 1.0);
        let mut osc = OscillatorBlock::sine();
        let mut buffer = vec![0.0f32; 64];
        osc.render(&mut buffer, &ctx);

        let n = 12;
        let expected = (TAU * 440.0 * n as f32 / sample_rate).sin();
        assert!((buffer[n] - expected).abs() < 1e-4);
    }

    #[test]
    fn shapes_stay_in_range() {
        let ctx = RenderCtx::from_freq(48_000.0, 997.0, 1.0);
        for waveform in Waveform::ALL {
            let mut osc = OscillatorBlock::new(waveform);
            let mut buffer = vec![0.0f32; 512];
            osc.render(&mut buffer, &ctx);
            assert!(
                buffer.iter().all(|s| (-1.0..=1.0).contains(s)),
                "{waveform} left [-1, 1]"
            );
        }
    }

    #[test]
    fn square_flips_at_half_period() {
        // 4 samples per period
        let ctx = RenderCtx::from_freq(4.0, 1.0, 1.0);
        let mut osc = OscillatorBlock::square();
        let mut buffer = [0.0f32; 4];
        osc.render(&mut buffer, &ctx);
        assert_eq!(buffer, [1.0, 1.0, -1.0, -1.0]);
    }

    #[test]
    fn waveform_parses_and_cycles() {
        assert_eq!("Saw".parse::<Waveform>().unwrap(), Waveform::Sawtooth);
        assert!("noise".parse::<Waveform>().is_err());
        assert_eq!(Waveform::Triangle.next(), Waveform::Sine);
    }
}
