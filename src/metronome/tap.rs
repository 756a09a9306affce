use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

use crate::metronome::tempo::{clamp_bpm, MAX_BPM};

/// A pause longer than this starts a new tap session.
pub const TAP_RESET_GAP: Duration = Duration::from_millis(2_000);

/// Number of most recent intervals averaged into the estimate.
pub const TAP_WINDOW: usize = 4;

/// Intervals needed before an estimate is produced. Two taps give one
/// interval, which is not enough: the third tap is the first to count.
const MIN_INTERVALS: usize = 2;

/// Tap-based tempo estimator.
///
/// ```
/// use std::time::{Duration, Instant};
/// use saavy_metronome::metronome::TapTempo;
///
/// let mut tapper = TapTempo::new();
/// let t0 = Instant::now();
/// assert_eq!(tapper.tap(t0), None);
/// assert_eq!(tapper.tap(t0 + Duration::from_millis(500)), None);
/// assert_eq!(tapper.tap(t0 + Duration::from_millis(1_000)), Some(120));
/// ```
#[derive(Debug, Clone)]
pub struct TapTempo {
    reset_gap: Duration,
    window: usize,
    intervals: VecDeque<Duration>,
    last_tap: Option<Instant>,
}

impl TapTempo {
    pub fn new() -> Self {
        Self::with_limits(TAP_WINDOW, TAP_RESET_GAP)
    }

    /// * `window` – how many recent intervals are averaged (at least 2).
    /// * `reset_gap` – a pause longer than this clears the history.
    pub fn with_limits(window: usize, reset_gap: Duration) -> Self {
        let window = window.max(MIN_INTERVALS);
        Self {
            reset_gap,
            window,
            intervals: VecDeque::with_capacity(window + 1),
            last_tap: None,
        }
    }

    /// Register a tap. Returns the estimated BPM, clamped to the supported
    /// range, once at least two intervals are recorded.
    pub fn tap(&mut self, now: Instant) -> Option<u16> {
        match self.last_tap {
            Some(last) => {
                let gap = now.saturating_duration_since(last);
                if gap > self.reset_gap {
                    self.intervals.clear();
                } else {
                    self.intervals.push_back(gap);
                    while self.intervals.len() > self.window {
                        self.intervals.pop_front();
                    }
                }
            }
            None => self.intervals.clear(),
        }
        self.last_tap = Some(now);

        self.estimate()
    }

    fn estimate(&self) -> Option<u16> {
        if self.intervals.len() < MIN_INTERVALS {
            return None;
        }

        let total: Duration = self.intervals.iter().sum();
        let average_ms = total.as_secs_f64() * 1_000.0 / self.intervals.len() as f64;
        if average_ms <= 0.0 {
            // taps on the same instant: as fast as we go
            return Some(MAX_BPM);
        }

        let bpm = (60_000.0 / average_ms).round();
        Some(clamp_bpm(bpm as i32))
    }

    /// Intervals currently in the window.
    pub fn intervals(&self) -> usize {
        self.intervals.len()
    }

    pub fn reset(&mut self) {
        self.intervals.clear();
        self.last_tap = None;
    }
}

impl Default for TapTempo {
    fn default() -> Self {
        Self::new()
    }
}
