//! The metronome widget.
//!
//! [`Metronome`] wraps the deterministic [`BeatScheduler`] in a timer thread.
//! The thread waits on a condvar until the next deadline, so a parameter
//! setter can wake it early and the deadline is re-derived from the new
//! tempo before anything plays. Every wake-up re-checks the running flag and
//! the run generation first: a beat never fires after [`Metronome::stop`].
//!
//! Events go to a [`BeatListener`], which is how a UI keeps its beat
//! indicator in step. Listeners run on the timer thread while the metronome
//! is locked, so they should hand the event off (a channel, an atomic) and
//! return rather than call back into the metronome.

pub mod scheduler;
pub mod tap;
pub mod tempo;

pub use scheduler::{Beat, BeatScheduler};
pub use tap::{TapTempo, TAP_RESET_GAP, TAP_WINDOW};
pub use tempo::{clamp_bpm, TempoState, DEFAULT_BPM, MAX_BPM, MIN_BPM};

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Condvar, Mutex, MutexGuard, PoisonError,
    },
    thread::JoinHandle,
    time::{Duration, Instant},
};

use log::{debug, error, info, warn};

use crate::{
    error::{MetronomeError, Result},
    output::{OutputContext, VoiceCommand},
    sequencing::TimeSignature,
    voices::{ClickSound, SoundType},
};

/// What the metronome tells its listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetronomeEvent {
    /// A beat was just played.
    Beat(Beat),
    /// The user tapped. `bpm` is the new tempo if the tap produced an estimate.
    TapPulse { bpm: Option<u16> },
    /// Playback stopped; clear any beat highlight.
    Stopped,
}

/// Receives [`MetronomeEvent`]s on the timer thread.
pub trait BeatListener: Send {
    fn on_event(&mut self, event: MetronomeEvent);
}

impl<F> BeatListener for F
where
    F: FnMut(MetronomeEvent) + Send,
{
    fn on_event(&mut self, event: MetronomeEvent) {
        self(event)
    }
}

struct Core {
    tempo: TempoState,
    scheduler: BeatScheduler,
    tap: TapTempo,
    output: Box<dyn OutputContext>,
    listener: Option<Box<dyn BeatListener>>,
    /// Bumped on every start and stop; a timer only acts for its own run.
    generation: u64,
}

impl Core {
    fn emit(&mut self, event: MetronomeEvent) {
        if let Some(listener) = self.listener.as_mut() {
            listener.on_event(event);
        }
    }

    fn play(&mut self, beat: Beat) {
        let sound = ClickSound::for_beat(self.tempo.sound, beat.accent, self.tempo.volume());
        self.output.send(VoiceCommand::Click(sound));
        debug!(
            "beat {}/{}{}",
            beat.number(),
            beat.beats,
            if beat.accent { " accent" } else { "" }
        );
        self.emit(MetronomeEvent::Beat(beat));
    }
}

struct Shared {
    core: Mutex<Core>,
    wake: Condvar,
    /// Read without the lock so a second `start` is refused at once.
    running: AtomicBool,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Core> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Fluent configuration for a [`Metronome`].
pub struct MetronomeBuilder {
    tempo: TempoState,
    tap: TapTempo,
    listener: Option<Box<dyn BeatListener>>,
}

impl MetronomeBuilder {
    pub fn new() -> Self {
        Self {
            tempo: TempoState::default(),
            tap: TapTempo::new(),
            listener: None,
        }
    }

    /// Tempo in beats per minute, clamped to 40–200.
    pub fn bpm(mut self, bpm: u16) -> Self {
        self.tempo.set_bpm(bpm as i32);
        self
    }

    pub fn time_signature(mut self, time_signature: TimeSignature) -> Self {
        self.tempo.time_signature = time_signature;
        self
    }

    pub fn sound(mut self, sound: SoundType) -> Self {
        self.tempo.sound = sound;
        self
    }

    /// Click level, clamped to 0.0–1.0.
    pub fn volume(mut self, volume: f32) -> Self {
        self.tempo.set_volume(volume);
        self
    }

    pub fn breathing_cue(mut self, enabled: bool) -> Self {
        self.tempo.breathing_cue = enabled;
        self
    }

    /// Start from an existing tempo state, e.g. one deserialized by the caller.
    /// BPM and volume are clamped again on the way in.
    pub fn tempo(mut self, tempo: TempoState) -> Self {
        self.tempo = tempo.clamped();
        self
    }

    /// Override the tap-tempo window and reset gap.
    pub fn tap_limits(mut self, window: usize, reset_gap: Duration) -> Self {
        self.tap = TapTempo::with_limits(window, reset_gap);
        self
    }

    pub fn listener(mut self, listener: impl BeatListener + 'static) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    /// Nothing is opened here; the output is resumed on the first `start`.
    pub fn build(self, output: impl OutputContext + 'static) -> Metronome {
        let core = Core {
            tempo: self.tempo,
            scheduler: BeatScheduler::new(),
            tap: self.tap,
            output: Box::new(output),
            listener: self.listener,
            generation: 0,
        };

        Metronome {
            shared: Arc::new(Shared {
                core: Mutex::new(core),
                wake: Condvar::new(),
                running: AtomicBool::new(false),
            }),
            timer: None,
        }
    }
}

impl Default for MetronomeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Self-correcting beat loop playing clicks through an [`OutputContext`].
pub struct Metronome {
    shared: Arc<Shared>,
    timer: Option<JoinHandle<()>>,
}

impl Metronome {
    pub fn builder() -> MetronomeBuilder {
        MetronomeBuilder::new()
    }

    /// A metronome with default settings.
    pub fn new(output: impl OutputContext + 'static) -> Self {
        MetronomeBuilder::new().build(output)
    }

    /// Start playing. Does nothing if already running.
    ///
    /// Blocks until the output is confirmed running, then plays the first
    /// (accented) beat right away. If the output cannot be resumed the
    /// metronome stays stopped and the error is returned; calling `start`
    /// again makes a fresh attempt.
    pub fn start(&mut self) -> Result<()> {
        if self.shared.running.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let generation = {
            let mut guard = self.shared.lock();
            let core = &mut *guard;

            if let Err(err) = core.output.resume() {
                self.shared.running.store(false, Ordering::SeqCst);
                warn!("metronome could not start: {err}");
                return Err(err.into());
            }

            core.generation += 1;
            if let Some(beat) = core.scheduler.start(&core.tempo, Instant::now()) {
                info!(
                    "metronome started at {} BPM in {}",
                    core.tempo.bpm(),
                    core.tempo.time_signature
                );
                core.play(beat);
            }
            core.generation
        };

        let shared = Arc::clone(&self.shared);
        let spawned = std::thread::Builder::new()
            .name("metronome-timer".into())
            .spawn(move || run_timer(shared, generation));

        match spawned {
            Ok(timer) => {
                self.timer = Some(timer);
                Ok(())
            }
            Err(err) => {
                self.shared.running.store(false, Ordering::SeqCst);
                let mut core = self.shared.lock();
                core.generation += 1;
                core.scheduler.stop();
                core.emit(MetronomeEvent::Stopped);
                error!("failed to spawn metronome timer: {err}");
                Err(MetronomeError::Timer(err))
            }
        }
    }

    /// Stop playing. Safe to call when already stopped.
    ///
    /// When this returns the timer thread has exited, so no further beat can
    /// sound. Clicks already handed to the output finish their decay.
    pub fn stop(&mut self) {
        if !self.shared.running.swap(false, Ordering::SeqCst) {
            return;
        }

        {
            let mut core = self.shared.lock();
            core.generation += 1;
            core.scheduler.stop();
            core.emit(MetronomeEvent::Stopped);
        }
        self.shared.wake.notify_all();

        if let Some(timer) = self.timer.take() {
            if timer.join().is_err() {
                error!("metronome timer thread panicked");
            }
        }
        info!("metronome stopped");
    }

    pub fn toggle(&mut self) -> Result<()> {
        if self.is_running() {
            self.stop();
            Ok(())
        } else {
            self.start()
        }
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Snapshot of the current settings.
    pub fn tempo(&self) -> TempoState {
        self.shared.lock().tempo
    }

    pub fn beat_index(&self) -> usize {
        self.shared.lock().scheduler.beat_index()
    }

    /// Apply a change under the lock, then wake the timer so the pending
    /// deadline is recomputed.
    fn update<R>(&self, apply: impl FnOnce(&mut Core) -> R) -> R {
        let result = {
            let mut core = self.shared.lock();
            apply(&mut core)
        };
        self.shared.wake.notify_all();
        result
    }

    /// Clamped to 40–200. While playing, the beat after the current one
    /// already follows the new tempo.
    pub fn set_bpm(&self, bpm: i32) {
        self.update(|core| core.tempo.set_bpm(bpm));
    }

    /// Nudge the tempo by `delta` BPM.
    pub fn adjust_bpm(&self, delta: i32) {
        self.update(|core| {
            let bpm = core.tempo.bpm() as i32 + delta;
            core.tempo.set_bpm(bpm)
        });
    }

    /// Switching meter moves back to the top of the measure immediately.
    pub fn set_time_signature(&self, time_signature: TimeSignature) {
        self.update(|core| {
            if core.tempo.time_signature != time_signature {
                core.tempo.time_signature = time_signature;
                core.scheduler.reset_position();
                debug!("time signature now {time_signature}");
            }
        });
    }

    pub fn set_sound(&self, sound: SoundType) {
        self.update(|core| core.tempo.sound = sound);
    }

    pub fn set_volume(&self, volume: f32) {
        self.update(|core| core.tempo.set_volume(volume));
    }

    pub fn set_breathing_cue(&self, enabled: bool) {
        self.update(|core| core.tempo.breathing_cue = enabled);
    }

    /// Register a tap now. See [`tap_at`](Self::tap_at).
    pub fn tap(&self) -> Option<u16> {
        self.tap_at(Instant::now())
    }

    /// Register a tap at `now`. Once the taps give an estimate it becomes the
    /// tempo, running or not. The listener gets a `TapPulse` either way.
    pub fn tap_at(&self, now: Instant) -> Option<u16> {
        self.update(|core| {
            let estimate = core.tap.tap(now);
            if let Some(bpm) = estimate {
                core.tempo.set_bpm(bpm as i32);
                debug!("tap tempo estimate {bpm} BPM");
            }
            core.emit(MetronomeEvent::TapPulse { bpm: estimate });
            estimate
        })
    }
}

impl Drop for Metronome {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Body of the timer thread for one run.
fn run_timer(shared: Arc<Shared>, generation: u64) {
    let mut core = shared.lock();

    loop {
        if !shared.running.load(Ordering::SeqCst) || core.generation != generation {
            break;
        }

        // Re-derived on every pass: a setter that changed the tempo woke us.
        let Some(due) = core.scheduler.next_due(&core.tempo) else {
            break;
        };

        let now = Instant::now();
        if now < due {
            core = shared
                .wake
                .wait_timeout(core, due - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
            continue;
        }

        let state = &mut *core;
        if let Some(beat) = state.scheduler.tick(&state.tempo, now) {
            state.play(beat);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::AudioError, output::ContextState};
    use std::sync::mpsc;

    /// Output that accepts everything and records nothing.
    struct NullOutput {
        state: ContextState,
        fail: bool,
    }

    impl NullOutput {
        fn new() -> Self {
            Self { state: ContextState::Suspended, fail: false }
        }

        fn failing() -> Self {
            Self { state: ContextState::Suspended, fail: true }
        }
    }

    impl OutputContext for NullOutput {
        fn resume(&mut self) -> std::result::Result<(), AudioError> {
            if self.fail {
                return Err(AudioError::NoDevice);
            }
            self.state = ContextState::Running;
            Ok(())
        }

        fn send(&mut self, _command: VoiceCommand) {}

        fn close(&mut self) {
            self.state = ContextState::Closed;
        }

        fn state(&self) -> ContextState {
            self.state
        }
    }

    #[cfg(feature = "serde")]
    #[test]
    fn stored_tempo_cannot_stall_the_timer() {
        let json = r#"{"bpm":0,"time_signature":"4/4","sound":"classic","volume":5.0}"#;
        let stored: TempoState = serde_json::from_str(json).unwrap();
        let mut metronome = Metronome::builder().tempo(stored).build(NullOutput::new());
        assert_eq!(metronome.tempo().bpm(), MIN_BPM);
        assert_eq!(metronome.tempo().volume(), 1.0);

        metronome.start().unwrap();
        metronome.stop();
    }

    #[test]
    fn failed_output_leaves_it_stopped() {
        let mut metronome = Metronome::new(NullOutput::failing());
        let err = metronome.start().unwrap_err();
        assert!(matches!(err, MetronomeError::Audio(AudioError::NoDevice)));
        assert!(!metronome.is_running());
    }

    #[test]
    fn first_beat_is_immediate_and_accented() {
        let (tx, rx) = mpsc::channel();
        let mut metronome = Metronome::builder()
            .bpm(40)
            .listener(move |event| {
                let _ = tx.send(event);
            })
            .build(NullOutput::new());

        metronome.start().unwrap();
        let first = rx.recv_timeout(Duration::from_millis(500)).unwrap();
        match first {
            MetronomeEvent::Beat(beat) => {
                assert_eq!(beat.index, 0);
                assert!(beat.accent);
            }
            other => panic!("expected a beat, got {other:?}"),
        }
        metronome.stop();
        assert_eq!(rx.recv_timeout(Duration::from_millis(500)).unwrap(), MetronomeEvent::Stopped);
    }

    #[test]
    fn double_start_and_double_stop() {
        let (tx, rx) = mpsc::channel();
        let mut metronome = Metronome::builder()
            .bpm(40)
            .listener(move |event| {
                let _ = tx.send(event);
            })
            .build(NullOutput::new());

        metronome.start().unwrap();
        metronome.start().unwrap();
        assert!(metronome.is_running());
        metronome.stop();
        metronome.stop();
        assert!(!metronome.is_running());

        let events: Vec<_> = rx.try_iter().collect();
        let beats = events.iter().filter(|e| matches!(e, MetronomeEvent::Beat(_))).count();
        let stops = events.iter().filter(|e| **e == MetronomeEvent::Stopped).count();
        assert_eq!(beats, 1);
        assert_eq!(stops, 1);
    }

    #[test]
    fn meter_switch_resets_index_at_once() {
        let metronome = Metronome::new(NullOutput::new());
        metronome.set_time_signature(TimeSignature::THREE_FOUR);
        assert_eq!(metronome.beat_index(), 0);
        assert_eq!(metronome.tempo().time_signature, TimeSignature::THREE_FOUR);
    }

    #[test]
    fn taps_write_the_tempo() {
        let (tx, rx) = mpsc::channel();
        let metronome = Metronome::builder()
            .bpm(90)
            .listener(move |event| {
                let _ = tx.send(event);
            })
            .build(NullOutput::new());

        let t0 = Instant::now();
        assert_eq!(metronome.tap_at(t0), None);
        assert_eq!(metronome.tempo().bpm(), 90);
        metronome.tap_at(t0 + Duration::from_millis(500));
        assert_eq!(metronome.tap_at(t0 + Duration::from_millis(1_000)), Some(120));
        assert_eq!(metronome.tempo().bpm(), 120);

        let pulses: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            pulses,
            [
                MetronomeEvent::TapPulse { bpm: None },
                MetronomeEvent::TapPulse { bpm: None },
                MetronomeEvent::TapPulse { bpm: Some(120) },
            ]
        );
    }

    #[test]
    fn setters_clamp() {
        let metronome = Metronome::new(NullOutput::new());
        metronome.set_bpm(500);
        assert_eq!(metronome.tempo().bpm(), MAX_BPM);
        metronome.adjust_bpm(-1_000);
        assert_eq!(metronome.tempo().bpm(), MIN_BPM);
        metronome.set_volume(3.0);
        assert_eq!(metronome.tempo().volume(), 1.0);
    }
}
