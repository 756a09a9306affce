use std::{
    sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError},
    thread::JoinHandle,
};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use log::{debug, error, info, warn};
use rtrb::{Consumer, Producer, RingBuffer};

use crate::{
    error::AudioError,
    output::{mixer::Mixer, ContextState, OutputContext, VoiceCommand},
};

const COMMAND_QUEUE_SIZE: usize = 256;

/// Messages to the thread that owns the cpal stream.
enum Control {
    Resume(mpsc::Sender<Result<f32, AudioError>>),
    Suspend,
    Close,
}

struct Inner {
    state: ContextState,
    tx: Option<Producer<VoiceCommand>>,
    control: Option<mpsc::Sender<Control>>,
    /// Yields the monitor back when the stream could not be built.
    thread: Option<JoinHandle<Option<Producer<f32>>>>,
    /// Handed to the mixer when the stream is built.
    monitor: Option<Producer<f32>>,
    sample_rate: Option<f32>,
}

impl Inner {
    fn shutdown(&mut self) {
        if let Some(control) = self.control.take() {
            let _ = control.send(Control::Close);
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("audio thread panicked during shutdown");
            }
        }
        self.tx = None;
        self.state = ContextState::Closed;
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if self.state != ContextState::Closed {
            self.shutdown();
            info!("audio output released");
        }
    }
}

/// Process-wide audio output backed by the default cpal device.
///
/// Cloning yields another handle to the same output. Nothing touches the
/// audio device until the first [`resume`](OutputContext::resume); the device
/// is released by [`close`](OutputContext::close) or when the last handle drops.
///
/// cpal streams are not `Send` on every platform, so the stream lives on a
/// dedicated thread and is driven through a control channel. Voice commands
/// bypass that thread and go straight to the audio callback over a lock-free
/// ring buffer.
#[derive(Clone)]
pub struct AudioContext {
    inner: Arc<Mutex<Inner>>,
}

impl AudioContext {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: ContextState::Suspended,
                tx: None,
                control: None,
                thread: None,
                monitor: None,
                sample_rate: None,
            })),
        }
    }

    /// A context that also copies the mono mix into a ring buffer of
    /// `capacity` samples, for oscilloscope-style displays. Samples that do
    /// not fit are dropped.
    pub fn with_monitor(capacity: usize) -> (Self, Consumer<f32>) {
        let (tx, rx) = RingBuffer::new(capacity);
        let context = Self::new();
        context.lock().monitor = Some(tx);
        (context, rx)
    }

    /// Device sample rate, known once the output has started.
    pub fn sample_rate(&self) -> Option<f32> {
        self.lock().sample_rate
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stop rendering without releasing the device.
    pub fn suspend(&mut self) {
        let mut inner = self.lock();
        if inner.state != ContextState::Running {
            return;
        }
        if let Some(control) = &inner.control {
            let _ = control.send(Control::Suspend);
        }
        inner.state = ContextState::Suspended;
    }
}

impl Default for AudioContext {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputContext for AudioContext {
    fn resume(&mut self) -> Result<(), AudioError> {
        let mut inner = self.lock();
        match inner.state {
            ContextState::Closed => return Err(AudioError::Closed),
            ContextState::Running => return Ok(()),
            ContextState::Suspended => {}
        }

        let (reply_tx, reply_rx) = mpsc::channel();
        let fresh = match inner.control.clone() {
            Some(control) => {
                if control.send(Control::Resume(reply_tx)).is_err() {
                    return Err(AudioError::ThreadExited);
                }
                false
            }
            None => {
                let (tx, rx) = RingBuffer::<VoiceCommand>::new(COMMAND_QUEUE_SIZE);
                let (control_tx, control_rx) = mpsc::channel();
                let monitor = inner.monitor.take();
                let thread = std::thread::Builder::new()
                    .name("audio-output".into())
                    .spawn(move || run_output(rx, monitor, control_rx, reply_tx, build_stream))?;
                inner.tx = Some(tx);
                inner.control = Some(control_tx);
                inner.thread = Some(thread);
                info!("audio output created");
                true
            }
        };

        // Some platforms hand out streams suspended; wait for the thread to
        // confirm the stream is actually playing.
        let result = reply_rx.recv().unwrap_or(Err(AudioError::ThreadExited));
        match result {
            Ok(sample_rate) => {
                inner.state = ContextState::Running;
                inner.sample_rate = Some(sample_rate);
                Ok(())
            }
            Err(err) => {
                warn!("audio output failed to start: {err}");
                if fresh {
                    // The thread exits right after reporting a failed build.
                    // Forget it so the next attempt starts from scratch.
                    if let Some(control) = inner.control.take() {
                        let _ = control.send(Control::Close);
                    }
                    if let Some(thread) = inner.thread.take() {
                        if let Ok(monitor) = thread.join() {
                            inner.monitor = monitor;
                        }
                    }
                    inner.tx = None;
                }
                Err(err)
            }
        }
    }

    fn send(&mut self, command: VoiceCommand) {
        let mut inner = self.lock();
        if inner.state != ContextState::Running {
            debug!("output not running, dropping {command:?}");
            return;
        }
        if let Some(tx) = inner.tx.as_mut() {
            if tx.push(command).is_err() {
                warn!("output queue full, dropping {command:?}");
            }
        }
    }

    fn close(&mut self) {
        let mut inner = self.lock();
        if inner.state == ContextState::Closed {
            return;
        }
        inner.shutdown();
        info!("audio output closed");
    }

    fn state(&self) -> ContextState {
        self.lock().state
    }
}

/// Body of the audio-output thread: build the stream, report, then obey
/// control messages until closed. Returns the monitor if the build failed.
fn run_output<B>(
    rx: Consumer<VoiceCommand>,
    monitor: Option<Producer<f32>>,
    control: mpsc::Receiver<Control>,
    ready: mpsc::Sender<Result<f32, AudioError>>,
    build: B,
) -> Option<Producer<f32>>
where
    B: FnOnce(
        Consumer<VoiceCommand>,
        Consumer<Producer<f32>>,
    ) -> Result<(cpal::Stream, f32), AudioError>,
{
    let (mut handoff, handoff_rx) = RingBuffer::new(1);
    let (stream, sample_rate) = match build(rx, handoff_rx) {
        Ok(built) => built,
        Err(err) => {
            let _ = ready.send(Err(err));
            return monitor;
        }
    };
    if let Some(monitor) = monitor {
        let _ = handoff.push(monitor);
    }

    let play = |stream: &cpal::Stream| {
        stream.play().map(|()| sample_rate).map_err(AudioError::from)
    };
    let _ = ready.send(play(&stream));

    while let Ok(message) = control.recv() {
        match message {
            Control::Resume(reply) => {
                let _ = reply.send(play(&stream));
            }
            Control::Suspend => {
                if let Err(err) = stream.pause() {
                    warn!("failed to suspend output stream: {err}");
                }
            }
            Control::Close => break,
        }
    }
    None
}

fn build_stream(
    rx: Consumer<VoiceCommand>,
    monitor: Consumer<Producer<f32>>,
) -> Result<(cpal::Stream, f32), AudioError> {
    let host = cpal::default_host();
    let device = host.default_output_device().ok_or(AudioError::NoDevice)?;
    let default = device.default_output_config()?;

    let supported = if default.sample_format() == cpal::SampleFormat::F32 {
        default
    } else {
        device
            .supported_output_configs()
            .map_err(|err| AudioError::UnsupportedFormat(err.to_string()))?
            .filter(|range| range.sample_format() == cpal::SampleFormat::F32)
            .find_map(|range| range.try_with_sample_rate(default.sample_rate()))
            .ok_or_else(|| AudioError::UnsupportedFormat(default.sample_format().to_string()))?
    };

    let sample_rate = supported.sample_rate().0 as f32;
    let channels = supported.channels() as usize;
    info!(
        "audio output: {} @ {} Hz, {} channels",
        device.name().unwrap_or_else(|_| "unknown device".into()),
        sample_rate,
        channels
    );

    let mut mixer = Mixer::new(sample_rate, rx);
    mixer.accept_monitor(monitor);
    let stream = device.build_output_stream(
        &supported.into(),
        move |data: &mut [f32], _| mixer.render_interleaved(data, channels),
        |err| error!("audio stream error: {err}"),
        None,
    )?;

    Ok((stream, sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_build_returns_the_monitor() {
        let (_tx, rx) = RingBuffer::<VoiceCommand>::new(4);
        let (monitor, _monitor_rx) = RingBuffer::<f32>::new(8);
        let (_control_tx, control_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();

        let returned = run_output(rx, Some(monitor), control_rx, ready_tx, |_, _| {
            Err(AudioError::NoDevice)
        });

        assert!(matches!(ready_rx.recv().unwrap(), Err(AudioError::NoDevice)));
        assert!(returned.is_some());
    }

    #[test]
    fn monitor_is_kept_without_a_device() {
        let (context, _monitor_rx) = AudioContext::with_monitor(8);
        assert!(context.lock().monitor.is_some());
        assert_eq!(context.state(), ContextState::Suspended);
        assert_eq!(context.sample_rate(), None);
    }
}
