//! Sustained reference tone.
//!
//! A tracking oscillator behind an ADSR gate. Frequency, waveform and volume
//! are applied live on the next rendered block; the gate only fades the tone
//! in on start and out on stop.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    dsp::oscillator::Waveform,
    graph::{
        envelope::EnvNode,
        node::{GraphNode, RenderCtx},
        oscillator::OscNode,
    },
    MAX_BLOCK_SIZE,
};

pub const MIN_TONE_HZ: f32 = 20.0;
pub const MAX_TONE_HZ: f32 = 20_000.0;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSettings {
    pub frequency: f32,
    pub waveform: Waveform,
    pub volume: f32,
}

impl ToneSettings {
    /// Clamp every field into its valid range.
    pub fn clamped(self) -> Self {
        Self {
            frequency: self.frequency.clamp(MIN_TONE_HZ, MAX_TONE_HZ),
            waveform: self.waveform,
            volume: self.volume.clamp(0.0, 1.0),
        }
    }
}

impl Default for ToneSettings {
    /// Concert A on a sine at half volume.
    fn default() -> Self {
        Self {
            frequency: 440.0,
            waveform: Waveform::Sine,
            volume: 0.5,
        }
    }
}

pub struct ToneVoice {
    osc: OscNode,
    gate: EnvNode,
    settings: ToneSettings,
    sample_rate: f32,
    gate_buffer: Vec<f32>,
}

impl ToneVoice {
    pub fn new(sample_rate: f32) -> Self {
        let settings = ToneSettings::default();
        Self {
            osc: OscNode::new(settings.waveform),
            gate: EnvNode::gate(),
            settings,
            sample_rate,
            gate_buffer: vec![0.0; MAX_BLOCK_SIZE],
        }
    }

    fn ctx(&self) -> RenderCtx {
        RenderCtx::from_freq(self.sample_rate, self.settings.frequency, self.settings.volume)
    }

    pub fn start(&mut self, settings: ToneSettings) {
        self.update(settings);
        let ctx = self.ctx();
        self.gate.note_on(&ctx);
    }

    pub fn update(&mut self, settings: ToneSettings) {
        self.settings = settings.clamped();
        self.osc.set_waveform(self.settings.waveform);
    }

    pub fn stop(&mut self) {
        let ctx = self.ctx();
        self.gate.note_off(&ctx);
    }

    pub fn settings(&self) -> ToneSettings {
        self.settings
    }

    /// Render and sum into `out`. Silent (and cheap) once the gate has closed.
    pub fn render_add(&mut self, out: &mut [f32], scratch: &mut [f32]) {
        if !self.gate.is_active() {
            return;
        }

        let ctx = self.ctx();
        let scratch = &mut scratch[..out.len()];
        let gate = &mut self.gate_buffer[..out.len()];
        self.osc.render_block(scratch, &ctx);
        self.gate.render_block(gate, &ctx);

        for ((o, s), g) in out.iter_mut().zip(scratch.iter()).zip(gate.iter()) {
            *o += *s * *g * ctx.gain;
        }
    }

    pub fn is_active(&self) -> bool {
        self.gate.is_active()
    }
}
