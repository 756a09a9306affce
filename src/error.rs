//! Error types shared by the metronome and tone generator.

use thiserror::Error;

/// Failures of the platform audio output.
#[derive(Error, Debug)]
pub enum AudioError {
    /// The host has no output device to open.
    #[error("no default output device available")]
    NoDevice,

    /// The device refused to report a usable output configuration.
    #[error("failed to fetch default output config: {0}")]
    Config(#[from] cpal::DefaultStreamConfigError),

    /// The output stream could not be created.
    #[error("failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    /// The stream exists but the platform would not start (resume) it.
    #[error("failed to resume output stream: {0}")]
    Resume(#[from] cpal::PlayStreamError),

    /// The sample format of the device is not one we can render into.
    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to spawn audio thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// The audio thread went away before reporting whether it started.
    #[error("audio thread exited before the output started")]
    ThreadExited,

    /// The context was closed and can no longer produce sound.
    #[error("audio context is closed")]
    Closed,
}

/// Errors surfaced by the metronome and tone generator APIs.
#[derive(Error, Debug)]
pub enum MetronomeError {
    /// Starting playback needs a running output, and it could not be created or resumed.
    #[error("audio output unavailable: {0}")]
    Audio(#[from] AudioError),

    /// The beat timer thread could not be spawned.
    #[error("failed to spawn metronome timer: {0}")]
    Timer(#[source] std::io::Error),

    #[error("unknown time signature: {0} (expected one of 2/4, 3/4, 4/4, 6/8)")]
    UnknownTimeSignature(String),

    #[error("unknown sound type: {0} (expected classic, wood, electronic or bell)")]
    UnknownSound(String),

    #[error("unknown waveform: {0} (expected sine, square, sawtooth or triangle)")]
    UnknownWaveform(String),

    /// A note name or frequency string that could not be turned into Hz.
    #[error("invalid note: {0}")]
    InvalidNote(String),
}

/// Result type alias using MetronomeError.
pub type Result<T> = std::result::Result<T, MetronomeError>;
