//! Audio output context.
//!
//! The metronome and the tone generator never touch the platform audio API
//! directly. They talk to an [`OutputContext`]: something that can be resumed
//! (created lazily on first use), accepts [`VoiceCommand`]s, and can be closed.
//! [`AudioContext`] is the cpal-backed implementation; tests substitute an
//! in-memory recorder.

mod context;
pub mod mixer;

pub use context::AudioContext;
pub use mixer::Mixer;

use crate::{
    error::AudioError,
    voices::{ClickSound, ToneSettings},
};

/// Lifecycle of an output context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// Not created yet, or suspended. Commands are dropped.
    Suspended,
    Running,
    /// Released. Cannot be resumed again.
    Closed,
}

/// Control messages from widgets to the mixer. All variants are `Copy` so
/// they cross the ring buffer without allocating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VoiceCommand {
    /// Fire-and-forget click.
    Click(ClickSound),
    /// Open the reference tone gate with these settings.
    ToneOn(ToneSettings),
    /// Retune the sounding (or next) reference tone.
    ToneUpdate(ToneSettings),
    /// Close the reference tone gate.
    ToneOff,
}

/// Platform audio output as seen by the widgets.
pub trait OutputContext: Send {
    /// Create the output on first call, then make sure it is running.
    ///
    /// Blocks until the platform confirms. Nothing may be scheduled before
    /// this returns `Ok`.
    fn resume(&mut self) -> Result<(), AudioError>;

    /// Queue a command for the audio thread. Dropped while not running.
    fn send(&mut self, command: VoiceCommand);

    /// Release the output. Later `resume` calls fail with [`AudioError::Closed`].
    fn close(&mut self);

    fn state(&self) -> ContextState;
}

impl OutputContext for Box<dyn OutputContext> {
    fn resume(&mut self) -> Result<(), AudioError> {
        (**self).resume()
    }

    fn send(&mut self, command: VoiceCommand) {
        (**self).send(command)
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn state(&self) -> ContextState {
        (**self).state()
    }
}
