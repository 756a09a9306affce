//! The pitch-reference tone generator widget.
//!
//! A single sustained tone whose frequency, waveform and volume can change
//! while it sounds. It shares the output context with the metronome; starting
//! it resumes the context just as the metronome does.

use log::{debug, info};

use crate::{
    dsp::oscillator::Waveform,
    error::Result,
    output::{OutputContext, VoiceCommand},
    pitch,
    voices::ToneSettings,
};

pub struct ToneGenerator {
    output: Box<dyn OutputContext>,
    settings: ToneSettings,
    playing: bool,
}

impl ToneGenerator {
    pub fn new(output: impl OutputContext + 'static) -> Self {
        Self::with_settings(output, ToneSettings::default())
    }

    pub fn with_settings(output: impl OutputContext + 'static, settings: ToneSettings) -> Self {
        Self {
            output: Box::new(output),
            settings: settings.clamped(),
            playing: false,
        }
    }

    /// Fade the tone in. Resumes the output first; on failure the generator
    /// stays silent and the error is returned.
    pub fn start(&mut self) -> Result<()> {
        if self.playing {
            return Ok(());
        }
        self.output.resume()?;
        self.output.send(VoiceCommand::ToneOn(self.settings));
        self.playing = true;
        info!("tone started at {:.2} Hz ({})", self.settings.frequency, self.settings.waveform);
        Ok(())
    }

    /// Fade the tone out over the release. No-op when silent.
    pub fn stop(&mut self) {
        if !self.playing {
            return;
        }
        self.output.send(VoiceCommand::ToneOff);
        self.playing = false;
        info!("tone stopped");
    }

    pub fn toggle(&mut self) -> Result<()> {
        if self.playing {
            self.stop();
            Ok(())
        } else {
            self.start()
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn settings(&self) -> ToneSettings {
        self.settings
    }

    fn apply(&mut self, settings: ToneSettings) {
        self.settings = settings.clamped();
        if self.playing {
            self.output.send(VoiceCommand::ToneUpdate(self.settings));
        }
    }

    /// Clamped to 20 Hz – 20 kHz.
    pub fn set_frequency(&mut self, frequency: f32) {
        if !frequency.is_finite() {
            return;
        }
        self.apply(ToneSettings { frequency, ..self.settings });
    }

    /// Tune to a note name (`A4`, `C#3`, `Bb2`) or a plain frequency (`"440"`).
    /// An unparseable input leaves the tone unchanged.
    pub fn set_note(&mut self, note: &str) -> Result<f32> {
        let frequency = pitch::parse_tone(note)?;
        debug!("tone set to {note} ({frequency:.2} Hz)");
        self.set_frequency(frequency);
        Ok(self.settings.frequency)
    }

    /// Move the current frequency by whole semitones.
    pub fn transpose(&mut self, semitones: i32) {
        self.set_frequency(pitch::transpose(self.settings.frequency, semitones));
    }

    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.apply(ToneSettings { waveform, ..self.settings });
    }

    pub fn set_volume(&mut self, volume: f32) {
        let volume = if volume.is_nan() { 0.0 } else { volume };
        self.apply(ToneSettings { volume, ..self.settings });
    }
}

impl Drop for ToneGenerator {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::AudioError, output::ContextState, MetronomeError};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Recorder {
        commands: Arc<Mutex<Vec<VoiceCommand>>>,
        running: bool,
        unavailable: bool,
    }

    impl Recorder {
        fn taken(&self) -> Vec<VoiceCommand> {
            std::mem::take(&mut *self.commands.lock().unwrap())
        }
    }

    impl OutputContext for Recorder {
        fn resume(&mut self) -> std::result::Result<(), AudioError> {
            if self.unavailable {
                return Err(AudioError::NoDevice);
            }
            self.running = true;
            Ok(())
        }

        fn send(&mut self, command: VoiceCommand) {
            if self.running {
                self.commands.lock().unwrap().push(command);
            }
        }

        fn close(&mut self) {
            self.running = false;
        }

        fn state(&self) -> ContextState {
            if self.running {
                ContextState::Running
            } else {
                ContextState::Suspended
            }
        }
    }

    #[test]
    fn start_and_stop_gate_the_tone() {
        let recorder = Recorder::default();
        let mut tone = ToneGenerator::new(recorder.clone());

        tone.start().unwrap();
        tone.start().unwrap();
        tone.stop();
        tone.stop();

        assert_eq!(
            recorder.taken(),
            [VoiceCommand::ToneOn(ToneSettings::default()), VoiceCommand::ToneOff]
        );
    }

    #[test]
    fn changes_are_live_while_playing() {
        let recorder = Recorder::default();
        let mut tone = ToneGenerator::new(recorder.clone());
        tone.start().unwrap();
        recorder.taken();

        tone.set_note("A3").unwrap();
        tone.set_waveform(Waveform::Triangle);
        let sent = recorder.taken();
        assert_eq!(sent.len(), 2);
        match sent[1] {
            VoiceCommand::ToneUpdate(settings) => {
                assert!((settings.frequency - 220.0).abs() < 0.01);
                assert_eq!(settings.waveform, Waveform::Triangle);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn silent_changes_are_remembered() {
        let recorder = Recorder::default();
        let mut tone = ToneGenerator::new(recorder.clone());
        tone.set_frequency(100_000.0);
        tone.set_volume(-1.0);
        assert!(recorder.taken().is_empty());
        assert_eq!(tone.settings().frequency, 20_000.0);
        assert_eq!(tone.settings().volume, 0.0);
    }

    #[test]
    fn transpose_moves_by_semitones() {
        let mut tone = ToneGenerator::new(Recorder::default());
        tone.transpose(12);
        assert!((tone.settings().frequency - 880.0).abs() < 0.01);
    }

    #[test]
    fn bad_note_keeps_frequency() {
        let mut tone = ToneGenerator::new(Recorder::default());
        assert!(matches!(tone.set_note("Q9"), Err(MetronomeError::InvalidNote(_))));
        assert_eq!(tone.settings().frequency, 440.0);
    }

    #[test]
    fn unavailable_output_keeps_it_silent() {
        let recorder = Recorder { unavailable: true, ..Recorder::default() };
        let mut tone = ToneGenerator::new(recorder);
        assert!(tone.start().is_err());
        assert!(!tone.is_playing());
    }
}
