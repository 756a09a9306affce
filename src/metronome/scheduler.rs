//! Beat scheduling core.
//!
//! `BeatScheduler` is the timing logic of the metronome with the clock and
//! the threads taken out: callers pass `now` in and get beats back. The
//! driver in [`super::Metronome`] owns a timer thread that asks
//! [`next_due`](BeatScheduler::next_due) for a deadline, sleeps until it, and
//! calls [`tick`](BeatScheduler::tick). Both read the tempo state they are
//! handed at that moment, never a copy taken at start.
//!
//! Deadlines are anchored to when the previous beat was *due*, not when the
//! timer happened to wake, so oversleeping by a millisecond on one beat is
//! absorbed by the next interval instead of accumulating.

use std::time::{Duration, Instant};

use crate::metronome::tempo::TempoState;

/// One scheduled pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Beat {
    /// 0-based position in the measure
    pub index: usize,
    /// Measure length this beat was counted against
    pub beats: usize,
    pub accent: bool,
    /// Last beat of the measure while the breathing cue is enabled
    pub breath: bool,
}

impl Beat {
    /// 1-based beat number, as counted aloud.
    pub fn number(&self) -> usize {
        self.index + 1
    }
}

#[derive(Debug, Default)]
pub struct BeatScheduler {
    running: bool,
    index: usize,
    last_beat_at: Option<Instant>,
    beats_played: u64,
}

impl BeatScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Current position in the measure. Always below the live beat count.
    pub fn beat_index(&self) -> usize {
        self.index
    }

    /// Beats emitted since the last start, including the first.
    pub fn beats_played(&self) -> u64 {
        self.beats_played
    }

    /// Begin a run. The first beat is emitted immediately and is always
    /// accented. Returns `None` if already running.
    pub fn start(&mut self, tempo: &TempoState, now: Instant) -> Option<Beat> {
        if self.running {
            return None;
        }

        self.running = true;
        self.index = 0;
        self.last_beat_at = Some(now);
        self.beats_played = 1;

        let beats = tempo.time_signature.beats();
        Some(Beat {
            index: 0,
            beats,
            accent: true,
            breath: tempo.breathing_cue && beats == 1,
        })
    }

    /// When the next beat is due, from the tempo as it is right now.
    pub fn next_due(&self, tempo: &TempoState) -> Option<Instant> {
        if !self.running {
            return None;
        }
        let last = self.last_beat_at?;
        Some(last + interval(tempo))
    }

    /// Advance to the next beat. `None` once stopped, so a timer that fires
    /// after `stop()` does nothing.
    pub fn tick(&mut self, tempo: &TempoState, now: Instant) -> Option<Beat> {
        let due = self.next_due(tempo)?;

        // A single read of the meter for the whole tick: the index math and
        // the accent lookup must agree even if the meter is being switched.
        let signature = tempo.time_signature;
        let beats = signature.beats();
        self.index = (self.index + 1) % beats;

        let step = interval(tempo);
        let late = now.saturating_duration_since(due);
        self.last_beat_at = Some(if now < due || late > step { now } else { due });
        self.beats_played += 1;

        Some(Beat {
            index: self.index,
            beats,
            accent: signature.is_accent(self.index + 1),
            breath: tempo.breathing_cue && self.index + 1 == beats,
        })
    }

    /// Back to the top of the measure without interrupting the run.
    pub fn reset_position(&mut self) {
        self.index = 0;
    }

    /// End the run. Returns whether it was running; stopping twice is harmless.
    pub fn stop(&mut self) -> bool {
        let was_running = self.running;
        self.running = false;
        self.index = 0;
        self.last_beat_at = None;
        was_running
    }
}

fn interval(tempo: &TempoState) -> Duration {
    Duration::from_secs_f64(tempo.interval_ms() / 1_000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencing::TimeSignature;

    fn tempo(bpm: i32, signature: TimeSignature) -> TempoState {
        let mut tempo = TempoState::default();
        tempo.set_bpm(bpm);
        tempo.time_signature = signature;
        tempo
    }

    /// Drive the scheduler exactly on its deadlines for `count` beats.
    fn run(
        scheduler: &mut BeatScheduler,
        tempo: &TempoState,
        count: usize,
    ) -> Vec<(Instant, Beat)> {
        (0..count)
            .map(|_| {
                let due = scheduler.next_due(tempo).unwrap();
                (due, scheduler.tick(tempo, due).unwrap())
            })
            .collect()
    }

    #[test]
    fn index_stays_in_bounds() {
        let t0 = Instant::now();
        for signature in TimeSignature::ALL {
            let tempo = tempo(200, signature);
            let mut scheduler = BeatScheduler::new();
            scheduler.start(&tempo, t0);
            for (_, beat) in run(&mut scheduler, &tempo, 25) {
                assert!(beat.index < signature.beats());
                assert!(scheduler.beat_index() < signature.beats());
            }
        }
    }

    #[test]
    fn six_eight_accents() {
        let t0 = Instant::now();
        let tempo = tempo(120, TimeSignature::SIX_EIGHT);
        let mut scheduler = BeatScheduler::new();
        let first = scheduler.start(&tempo, t0).unwrap();

        let mut accents = vec![first.accent];
        accents.extend(run(&mut scheduler, &tempo, 11).iter().map(|(_, b)| b.accent));
        assert_eq!(
            accents,
            [true, false, false, true, false, false, true, false, false, true, false, false]
        );
    }

    #[test]
    fn tempo_change_applies_to_pending_beat() {
        let t0 = Instant::now();
        let mut tempo = tempo(60, TimeSignature::FOUR_FOUR);
        let mut scheduler = BeatScheduler::new();
        scheduler.start(&tempo, t0);
        assert_eq!(scheduler.next_due(&tempo), Some(t0 + Duration::from_millis(1_000)));

        tempo.set_bpm(120);
        assert_eq!(scheduler.next_due(&tempo), Some(t0 + Duration::from_millis(500)));
    }

    #[test]
    fn meter_switch_resets_position() {
        let t0 = Instant::now();
        let mut tempo = tempo(120, TimeSignature::FOUR_FOUR);
        let mut scheduler = BeatScheduler::new();
        scheduler.start(&tempo, t0);
        run(&mut scheduler, &tempo, 2);
        assert_eq!(scheduler.beat_index(), 2);

        tempo.time_signature = TimeSignature::TWO_FOUR;
        scheduler.reset_position();
        assert_eq!(scheduler.beat_index(), 0);

        let (_, next) = run(&mut scheduler, &tempo, 1)[0];
        assert!(next.index < 2);
    }

    #[test]
    fn start_twice_is_refused() {
        let t0 = Instant::now();
        let tempo = TempoState::default();
        let mut scheduler = BeatScheduler::new();
        assert!(scheduler.start(&tempo, t0).is_some());
        assert!(scheduler.start(&tempo, t0).is_none());
    }

    #[test]
    fn stop_is_idempotent_and_silences_ticks() {
        let t0 = Instant::now();
        let tempo = TempoState::default();
        let mut scheduler = BeatScheduler::new();
        assert!(!scheduler.stop());

        scheduler.start(&tempo, t0);
        run(&mut scheduler, &tempo, 1);
        assert!(scheduler.stop());
        assert!(!scheduler.stop());
        assert_eq!(scheduler.beat_index(), 0);
        assert!(scheduler.tick(&tempo, t0 + Duration::from_secs(5)).is_none());
        assert!(scheduler.next_due(&tempo).is_none());
    }

    #[test]
    fn four_four_at_100_bpm() {
        let t0 = Instant::now();
        let tempo = tempo(100, TimeSignature::FOUR_FOUR);
        let mut scheduler = BeatScheduler::new();
        let first = scheduler.start(&tempo, t0).unwrap();

        let beats = run(&mut scheduler, &tempo, 7);
        let accents: Vec<bool> = std::iter::once(first.accent)
            .chain(beats.iter().map(|(_, b)| b.accent))
            .collect();
        assert_eq!(accents, [true, false, false, false, true, false, false, false]);

        // beat 0 at t0, beat 4 (start of the next measure) 4 intervals later
        assert_eq!(beats[3].0 - t0, Duration::from_millis(2_400));
    }

    #[test]
    fn late_wakeups_do_not_accumulate() {
        let t0 = Instant::now();
        let tempo = tempo(120, TimeSignature::FOUR_FOUR);
        let mut scheduler = BeatScheduler::new();
        scheduler.start(&tempo, t0);

        // fire 20 ms late; the following deadline stays on the grid
        let due = scheduler.next_due(&tempo).unwrap();
        scheduler.tick(&tempo, due + Duration::from_millis(20));
        assert_eq!(scheduler.next_due(&tempo), Some(t0 + Duration::from_millis(1_000)));
    }

    #[test]
    fn long_stall_resyncs_to_now() {
        let t0 = Instant::now();
        let tempo = tempo(120, TimeSignature::FOUR_FOUR);
        let mut scheduler = BeatScheduler::new();
        scheduler.start(&tempo, t0);

        let woke = t0 + Duration::from_secs(3);
        scheduler.tick(&tempo, woke);
        assert_eq!(scheduler.next_due(&tempo), Some(woke + Duration::from_millis(500)));
    }

    #[test]
    fn breathing_cue_marks_last_beat() {
        let t0 = Instant::now();
        let mut tempo = tempo(120, TimeSignature::THREE_FOUR);
        tempo.breathing_cue = true;
        let mut scheduler = BeatScheduler::new();
        scheduler.start(&tempo, t0);

        let breaths: Vec<bool> = run(&mut scheduler, &tempo, 3)
            .iter()
            .map(|(_, b)| b.breath)
            .collect();
        assert_eq!(breaths, [false, true, false]);
    }
}
