//! What the UI remembers between frames.
//!
//! The metronome and tone generator own the real settings; this only holds
//! the presentational bits derived from their events.

use std::time::{Duration, Instant};

use log::Level;
use saavy_metronome::metronome::{Beat, MetronomeEvent};

use crate::logger::LogLine;

/// How long a beat stays lit after it sounds.
pub const BEAT_FLASH: Duration = Duration::from_millis(120);
/// How long the tap indicator stays lit.
pub const TAP_FLASH: Duration = Duration::from_millis(100);
/// Status messages fade after this long.
const STATUS_TIMEOUT: Duration = Duration::from_secs(4);

#[derive(Debug, Default)]
pub struct UiState {
    /// Latest beat, cleared when playback stops.
    pub beat: Option<Beat>,
    pub beat_at: Option<Instant>,
    pub tap_at: Option<Instant>,
    pub tap_bpm: Option<u16>,
    pub status: Option<(LogLine, Instant)>,
    /// Blocking notice (audio unavailable). Any key dismisses it.
    pub notice: Option<String>,
}

impl UiState {
    pub fn apply(&mut self, event: MetronomeEvent, now: Instant) {
        match event {
            MetronomeEvent::Beat(beat) => {
                self.beat = Some(beat);
                self.beat_at = Some(now);
            }
            MetronomeEvent::TapPulse { bpm } => {
                self.tap_at = Some(now);
                if bpm.is_some() {
                    self.tap_bpm = bpm;
                }
            }
            MetronomeEvent::Stopped => {
                self.beat = None;
                self.beat_at = None;
            }
        }
    }

    pub fn log(&mut self, line: LogLine, now: Instant) {
        self.status = Some((line, now));
    }

    pub fn beat_lit(&self, now: Instant) -> bool {
        self.beat_at.is_some_and(|at| now.duration_since(at) < BEAT_FLASH)
    }

    pub fn tap_lit(&self, now: Instant) -> bool {
        self.tap_at.is_some_and(|at| now.duration_since(at) < TAP_FLASH)
    }

    pub fn status(&self, now: Instant) -> Option<&LogLine> {
        let (line, at) = self.status.as_ref()?;
        let sticky = line.level <= Level::Warn;
        (sticky || now.duration_since(*at) < STATUS_TIMEOUT).then_some(line)
    }
}
