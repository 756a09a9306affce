use crate::dsp::oscillator::{OscillatorBlock, Waveform};
use crate::graph::node::{GraphNode, RenderCtx};

/*
Oscillator Node
===============

Wraps an `OscillatorBlock` with the node lifecycle. Two tuning modes:

  - tracking: the pitch comes from `RenderCtx::frequency`. The reference tone
    uses this so a frequency change applies on the next block.
  - fixed: `with_frequency()` pins the pitch. Click voices use this because
    the frequency is part of the sound's identity, not a parameter.

Waveform character, for picking click and tone timbres:

  Sine      pure, round. No overtones.
  Triangle  soft and warm. Weak odd harmonics.
  Square    hollow and sharp. Strong odd harmonics.
  Sawtooth  bright and buzzy. Every harmonic.
*/

pub struct OscNode {
    osc: OscillatorBlock,
    /// Pinned frequency in Hz. `None` tracks the context pitch.
    fixed_frequency: Option<f32>,
}

impl OscNode {
    pub fn new(waveform: Waveform) -> Self {
        Self {
            osc: OscillatorBlock::new(waveform),
            fixed_frequency: None,
        }
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

    /// Pin the pitch, ignoring the frequency carried by `RenderCtx`.
    pub fn with_frequency(mut self, freq: f32) -> Self {
        self.fixed_frequency = Some(freq.clamp(20.0, 20_000.0));
        self
    }

    /// Re-pin the pitch. Used when a click slot is retriggered.
    pub fn set_frequency(&mut self, freq: f32) {
        self.fixed_frequency = Some(freq.clamp(20.0, 20_000.0));
    }

    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.osc.set_waveform(waveform);
    }

    pub fn waveform(&self) -> Waveform {
        self.osc.waveform()
    }
}

impl GraphNode for OscNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        match self.fixed_frequency {
            Some(frequency) => {
                let pinned = RenderCtx { frequency, ..*ctx };
                self.osc.render(out, &pinned);
            }
            None => self.osc.render(out, ctx),
        }
    }

    fn note_on(&mut self, _ctx: &RenderCtx) {
        // Clicks start at zero phase so every beat sounds identical. A
        // tracking oscillator keeps running to avoid a discontinuity.
        if self.fixed_frequency.is_some() {
            self.osc.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    #[test]
    fn tracks_context_frequency() {
        let sample_rate = 48_000.0;
        let ctx = RenderCtx::from_freq(sample_rate, 440.0, 1.0);
        let mut node = OscNode::sine();

        let mut buffer = vec![0.0f32; 128];
        node.render_block(&mut buffer, &ctx);

        let n = 12;
        let expected = (TAU * 440.0 * n as f32 / sample_rate).sin();
        assert!((buffer[n] - expected).abs() < 1e-4);
    }

    #[test]
    fn fixed_frequency_ignores_context() {
        let sample_rate = 48_000.0;
        let mut pinned = OscNode::sine().with_frequency(1_000.0);
        let mut reference = OscNode::sine();

        let mut a = vec![0.0f32; 64];
        let mut b = vec![0.0f32; 64];
        pinned.render_block(&mut a, &RenderCtx::from_freq(sample_rate, 220.0, 1.0));
        reference.render_block(&mut b, &RenderCtx::from_freq(sample_rate, 1_000.0, 1.0));

        assert_eq!(a, b);
    }
}
