//! Metronome click voices.
//!
//! One short enveloped tone per beat. Each sound type has a fixed waveform,
//! decay time and a pair of pitches: the accented beat sits higher than the
//! regular one so the downbeat stands out even at low volume.
//!
//! | sound      | character            | waveform | regular | accent | decay  |
//! |------------|----------------------|----------|---------|--------|--------|
//! | classic    | pure, round          | sine     | 800 Hz  | 1000Hz | 50 ms  |
//! | wood       | warmer, longer       | triangle | 600 Hz  | 800 Hz | 80 ms  |
//! | electronic | sharp, short         | square   | 1000 Hz | 1200Hz | 30 ms  |
//! | bell       | longer, resonant     | sine     | 1200 Hz | 1500Hz | 150 ms |
//!
//! Clicks are fire-and-forget: the voice goes idle when its decay finishes
//! and the mixer drops it. Nobody holds a handle to cancel one.

use std::{fmt, str::FromStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    dsp::oscillator::Waveform,
    error::MetronomeError,
    graph::{
        amplify::Amplify,
        envelope::DecayNode,
        extensions::NodeExt,
        node::{GraphNode, RenderCtx},
        oscillator::OscNode,
    },
};

/// Level multiplier for accented beats. May push the peak above 1.0; the
/// mixer's output limiter catches it.
pub const ACCENT_BOOST: f32 = 1.3;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SoundType {
    #[default]
    Classic,
    Wood,
    Electronic,
    Bell,
}

struct SoundSpec {
    waveform: Waveform,
    regular_hz: f32,
    accent_hz: f32,
    decay_secs: f32,
}

impl SoundType {
    pub const ALL: [SoundType; 4] = [
        SoundType::Classic,
        SoundType::Wood,
        SoundType::Electronic,
        SoundType::Bell,
    ];

    fn spec(self) -> SoundSpec {
        match self {
            SoundType::Classic => SoundSpec {
                waveform: Waveform::Sine,
                regular_hz: 800.0,
                accent_hz: 1_000.0,
                decay_secs: 0.05,
            },
            SoundType::Wood => SoundSpec {
                waveform: Waveform::Triangle,
                regular_hz: 600.0,
                accent_hz: 800.0,
                decay_secs: 0.08,
            },
            SoundType::Electronic => SoundSpec {
                waveform: Waveform::Square,
                regular_hz: 1_000.0,
                accent_hz: 1_200.0,
                decay_secs: 0.03,
            },
            SoundType::Bell => SoundSpec {
                waveform: Waveform::Sine,
                regular_hz: 1_200.0,
                accent_hz: 1_500.0,
                decay_secs: 0.15,
            },
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SoundType::Classic => "classic",
            SoundType::Wood => "wood",
            SoundType::Electronic => "electronic",
            SoundType::Bell => "bell",
        }
    }

    pub fn next(self) -> Self {
        let index = Self::ALL.iter().position(|&s| s == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for SoundType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SoundType {
    type Err = MetronomeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|sound| sound.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| MetronomeError::UnknownSound(s.to_string()))
    }
}

/// Everything needed to render one beat's click.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickSound {
    pub waveform: Waveform,
    pub frequency: f32,
    /// Decay length in seconds
    pub duration: f32,
    /// Peak level, `volume` (boosted for accents)
    pub level: f32,
}

impl ClickSound {
    /// Resolve the click for a beat from the live sound settings.
    pub fn for_beat(sound: SoundType, accent: bool, volume: f32) -> Self {
        let spec = sound.spec();
        let volume = volume.clamp(0.0, 1.0);
        Self {
            waveform: spec.waveform,
            frequency: if accent { spec.accent_hz } else { spec.regular_hz },
            duration: spec.decay_secs,
            level: if accent { volume * ACCENT_BOOST } else { volume },
        }
    }

    /// Build a fresh voice already triggered with this click.
    pub fn voice(&self, sample_rate: f32) -> ClickVoice {
        let mut voice = ClickVoice::new(sample_rate);
        voice.trigger(self);
        voice
    }
}

/// A click voice slot. Retriggering reconfigures it in place, so the mixer
/// can keep a fixed pool and never allocate on the audio thread.
pub struct ClickVoice {
    node: Amplify<OscNode, DecayNode>,
    ctx: RenderCtx,
}

impl ClickVoice {
    /// An idle voice. Silent until triggered.
    pub fn new(sample_rate: f32) -> Self {
        let idle = ClickSound::for_beat(SoundType::Classic, false, 0.0);
        Self {
            node: OscNode::new(idle.waveform)
                .with_frequency(idle.frequency)
                .amplify(DecayNode::new(idle.duration, 1.0)),
            ctx: RenderCtx::from_freq(sample_rate, idle.frequency, 0.0),
        }
    }

    pub fn trigger(&mut self, sound: &ClickSound) {
        self.node.signal.set_waveform(sound.waveform);
        self.node.signal.set_frequency(sound.frequency);
        self.node.envelope.set_duration(sound.duration);
        self.ctx.frequency = sound.frequency;
        self.ctx.gain = sound.level;
        self.node.note_on(&self.ctx);
    }

    /// Render and sum into `out`, so several overlapping clicks can share a buffer.
    pub fn render_add(&mut self, out: &mut [f32], scratch: &mut [f32]) {
        if !self.is_active() {
            return;
        }

        let scratch = &mut scratch[..out.len()];
        self.node.render_block(scratch, &self.ctx);
        for (o, s) in out.iter_mut().zip(scratch.iter()) {
            *o += *s;
        }
    }

    pub fn is_active(&self) -> bool {
        self.node.is_active()
    }
}
