//! Audio-thread side of the output context.
//!
//! The mixer drains [`VoiceCommand`]s from the ring buffer at the start of
//! every block, then sums a fixed pool of click voices and the reference tone.
//! Nothing in here allocates or locks once constructed.

use rtrb::{Consumer, Producer};

use crate::{
    output::VoiceCommand,
    voices::{ClickVoice, ToneVoice},
    MAX_BLOCK_SIZE,
};

/// Click slots. At 200 BPM with the longest (150 ms) decay, at most one click
/// overlaps another; the rest is headroom for tap-happy users.
pub const CLICK_VOICES: usize = 8;

pub struct Mixer {
    rx: Consumer<VoiceCommand>,
    clicks: Vec<ClickVoice>,
    /// Trigger order of each click slot, for stealing the oldest.
    click_age: Vec<u64>,
    tone: ToneVoice,
    mix_buffer: Vec<f32>,
    scratch: Vec<f32>,
    triggers: u64,
    monitor: Option<Producer<f32>>,
    monitor_handoff: Option<Consumer<Producer<f32>>>,
}

impl Mixer {
    pub fn new(sample_rate: f32, rx: Consumer<VoiceCommand>) -> Self {
        Self {
            rx,
            clicks: (0..CLICK_VOICES).map(|_| ClickVoice::new(sample_rate)).collect(),
            click_age: vec![0; CLICK_VOICES],
            tone: ToneVoice::new(sample_rate),
            mix_buffer: vec![0.0; MAX_BLOCK_SIZE],
            scratch: vec![0.0; MAX_BLOCK_SIZE],
            triggers: 0,
            monitor: None,
            monitor_handoff: None,
        }
    }

    /// Copy every mixed block into `monitor` as well. Samples are dropped
    /// while the reader is behind.
    pub fn set_monitor(&mut self, monitor: Producer<f32>) {
        self.monitor = Some(monitor);
    }

    /// Pick up a monitor from `handoff` once one is pushed into it. Lets the
    /// owner keep the monitor until the stream around this mixer exists.
    pub fn accept_monitor(&mut self, handoff: Consumer<Producer<f32>>) {
        self.monitor_handoff = Some(handoff);
    }

    fn handle(&mut self, command: VoiceCommand) {
        match command {
            VoiceCommand::Click(sound) => {
                let slot = self.free_click_slot();
                self.triggers += 1;
                self.click_age[slot] = self.triggers;
                self.clicks[slot].trigger(&sound);
            }
            VoiceCommand::ToneOn(settings) => self.tone.start(settings),
            VoiceCommand::ToneUpdate(settings) => self.tone.update(settings),
            VoiceCommand::ToneOff => self.tone.stop(),
        }
    }

    /// First idle slot, or the oldest one when all are sounding.
    fn free_click_slot(&self) -> usize {
        if let Some(idle) = self.clicks.iter().position(|v| !v.is_active()) {
            return idle;
        }

        self.click_age
            .iter()
            .enumerate()
            .min_by_key(|(_, age)| **age)
            .map(|(slot, _)| slot)
            .unwrap_or(0)
    }

    fn drain_commands(&mut self) {
        while let Ok(command) = self.rx.pop() {
            self.handle(command);
        }
        if let Some(monitor) = self.monitor_handoff.as_mut().and_then(|h| h.pop().ok()) {
            self.monitor = Some(monitor);
            self.monitor_handoff = None;
        }
    }

    /// Sum every voice into the mix buffer and hard-limit to [-1, 1].
    /// `frames` must not exceed MAX_BLOCK_SIZE.
    fn mix(&mut self, frames: usize) -> &[f32] {
        let block = &mut self.mix_buffer[..frames];
        block.fill(0.0);

        for click in &mut self.clicks {
            click.render_add(block, &mut self.scratch);
        }
        self.tone.render_add(block, &mut self.scratch);

        for sample in block.iter_mut() {
            *sample = sample.clamp(-1.0, 1.0);
        }

        if let Some(monitor) = self.monitor.as_mut() {
            for &sample in block.iter() {
                if monitor.push(sample).is_err() {
                    break;
                }
            }
        }
        block
    }

    /// Render a mono buffer of any length.
    pub fn render_mono(&mut self, out: &mut [f32]) {
        self.drain_commands();

        for chunk in out.chunks_mut(MAX_BLOCK_SIZE) {
            let mixed = self.mix(chunk.len());
            chunk.copy_from_slice(mixed);
        }
    }

    /// Render interleaved frames, copying the mono mix to every channel.
    pub fn render_interleaved(&mut self, data: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        self.drain_commands();

        for chunk in data.chunks_mut(MAX_BLOCK_SIZE * channels) {
            let frames = chunk.len() / channels;
            let mixed = self.mix(frames);
            for (frame, &sample) in chunk.chunks_mut(channels).zip(mixed.iter()) {
                frame.fill(sample);
            }
        }
    }

    pub fn active_clicks(&self) -> usize {
        self.clicks.iter().filter(|c| c.is_active()).count()
    }

    pub fn tone_active(&self) -> bool {
        self.tone.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dsp::oscillator::Waveform,
        voices::{ClickSound, SoundType, ToneSettings},
    };
    use rtrb::RingBuffer;

    const SAMPLE_RATE: f32 = 8_000.0;

    #[test]
    fn silent_without_commands() {
        let (_tx, rx) = RingBuffer::new(16);
        let mut mixer = Mixer::new(SAMPLE_RATE, rx);
        let mut out = vec![1.0f32; 256];
        mixer.render_mono(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn accented_click_is_limited() {
        let (mut tx, rx) = RingBuffer::new(16);
        let mut mixer = Mixer::new(SAMPLE_RATE, rx);
        tx.push(VoiceCommand::Click(ClickSound::for_beat(SoundType::Electronic, true, 1.0)))
            .unwrap();

        let mut out = vec![0.0f32; 64];
        mixer.render_mono(&mut out);
        assert_eq!(out[0], 1.0);
        assert!(out.iter().all(|s| (-1.0..=1.0).contains(s)));
        assert_eq!(mixer.active_clicks(), 1);
    }

    #[test]
    fn clicks_beyond_the_pool_steal_the_oldest() {
        let (mut tx, rx) = RingBuffer::new(64);
        let mut mixer = Mixer::new(SAMPLE_RATE, rx);
        for _ in 0..CLICK_VOICES + 3 {
            tx.push(VoiceCommand::Click(ClickSound::for_beat(SoundType::Bell, false, 0.1)))
                .unwrap();
        }

        let mut out = vec![0.0f32; 16];
        mixer.render_mono(&mut out);
        assert_eq!(mixer.active_clicks(), CLICK_VOICES);
    }

    #[test]
    fn tone_gate_follows_commands() {
        let (mut tx, rx) = RingBuffer::new(16);
        let mut mixer = Mixer::new(SAMPLE_RATE, rx);
        let settings = ToneSettings {
            frequency: 440.0,
            waveform: Waveform::Sine,
            volume: 0.5,
        };

        tx.push(VoiceCommand::ToneOn(settings)).unwrap();
        let mut out = vec![0.0f32; 800];
        mixer.render_mono(&mut out);
        assert!(mixer.tone_active());
        assert!(out.iter().any(|s| s.abs() > 0.4));

        tx.push(VoiceCommand::ToneOff).unwrap();
        mixer.render_mono(&mut out);
        assert!(!mixer.tone_active());
    }

    #[test]
    fn monitor_sees_the_mix() {
        let (mut tx, rx) = RingBuffer::new(16);
        let (monitor_tx, mut monitor_rx) = RingBuffer::new(32);
        let mut mixer = Mixer::new(SAMPLE_RATE, rx);
        mixer.set_monitor(monitor_tx);
        tx.push(VoiceCommand::Click(ClickSound::for_beat(SoundType::Classic, false, 0.5)))
            .unwrap();

        let mut out = vec![0.0f32; 64];
        mixer.render_mono(&mut out);
        let mut seen = Vec::new();
        while let Ok(sample) = monitor_rx.pop() {
            seen.push(sample);
        }
        assert_eq!(seen.as_slice(), &out[..32]);
    }

    #[test]
    fn monitor_arrives_through_handoff() {
        let (_tx, rx) = RingBuffer::new(16);
        let (mut handoff_tx, handoff_rx) = RingBuffer::new(1);
        let (monitor_tx, mut monitor_rx) = RingBuffer::<f32>::new(64);
        let mut mixer = Mixer::new(SAMPLE_RATE, rx);
        mixer.accept_monitor(handoff_rx);

        let mut out = vec![0.0f32; 16];
        mixer.render_mono(&mut out);
        assert!(monitor_rx.pop().is_err());

        handoff_tx.push(monitor_tx).unwrap();
        mixer.render_mono(&mut out);
        assert_eq!(monitor_rx.slots(), 16);
    }

    #[test]
    fn interleaved_copies_mono_to_all_channels() {
        let (mut tx, rx) = RingBuffer::new(16);
        let mut mixer = Mixer::new(SAMPLE_RATE, rx);
        tx.push(VoiceCommand::Click(ClickSound::for_beat(SoundType::Wood, false, 0.8)))
            .unwrap();

        let mut data = vec![0.0f32; 2 * 100];
        mixer.render_interleaved(&mut data, 2);
        assert!(data.chunks(2).all(|frame| frame[0] == frame[1]));
        assert!(data.iter().any(|&s| s != 0.0));
    }
}
