#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{sequencing::TimeSignature, voices::SoundType};

pub const MIN_BPM: u16 = 40;
pub const MAX_BPM: u16 = 200;
pub const DEFAULT_BPM: u16 = 120;

/// Clamp any tempo into the supported range.
pub fn clamp_bpm(bpm: i32) -> u16 {
    bpm.clamp(MIN_BPM as i32, MAX_BPM as i32) as u16
}

/// Live metronome settings.
///
/// The beat loop reads these on every tick rather than copying them at start,
/// so a change made while playing is heard on the next beat. Setters clamp,
/// which keeps out-of-range values from ever reaching the scheduler.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "StoredTempo"))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoState {
    bpm: u16,
    pub time_signature: TimeSignature,
    pub sound: SoundType,
    volume: f32,
    /// Highlight the final beat of each measure as a breathing cue. Purely
    /// presentational; scheduling ignores it.
    pub breathing_cue: bool,
}

impl TempoState {
    pub fn bpm(&self) -> u16 {
        self.bpm
    }

    pub fn set_bpm(&mut self, bpm: i32) {
        self.bpm = clamp_bpm(bpm);
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = if volume.is_nan() { 0.0 } else { volume.clamp(0.0, 1.0) };
    }

    /// The same settings with BPM and volume forced back into range.
    pub fn clamped(mut self) -> Self {
        self.set_bpm(self.bpm as i32);
        self.set_volume(self.volume);
        self
    }

    /// Milliseconds between beats at the current tempo.
    pub fn interval_ms(&self) -> f64 {
        60_000.0 / self.bpm as f64
    }
}

impl Default for TempoState {
    fn default() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            time_signature: TimeSignature::FOUR_FOUR,
            sound: SoundType::Classic,
            volume: 0.7,
            breathing_cue: false,
        }
    }
}

/// Wire form of [`TempoState`]. Stored values are untrusted and go through
/// the setters on the way in.
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct StoredTempo {
    bpm: i64,
    time_signature: TimeSignature,
    sound: SoundType,
    volume: f32,
    #[serde(default)]
    breathing_cue: bool,
}

#[cfg(feature = "serde")]
impl From<StoredTempo> for TempoState {
    fn from(stored: StoredTempo) -> Self {
        let mut tempo = TempoState {
            time_signature: stored.time_signature,
            sound: stored.sound,
            breathing_cue: stored.breathing_cue,
            ..TempoState::default()
        };
        tempo.set_bpm(stored.bpm.clamp(i32::MIN as i64, i32::MAX as i64) as i32);
        tempo.set_volume(stored.volume);
        tempo
    }
}
