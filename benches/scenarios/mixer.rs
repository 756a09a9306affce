//! Benchmarks for the output mixer at the densest realistic load:
//! overlapping bell clicks on top of a sustained sawtooth tone.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use rtrb::RingBuffer;
use saavy_metronome::{
    dsp::Waveform,
    output::{Mixer, VoiceCommand},
    voices::{ClickSound, SoundType, ToneSettings},
};

use crate::BLOCK_SIZES;

pub fn bench_mixer(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/mixer");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size * 2];

        let (mut tx, rx) = RingBuffer::new(64);
        let mut mixer = Mixer::new(48_000.0, rx);
        let tone = ToneSettings {
            frequency: 440.0,
            waveform: Waveform::Sawtooth,
            volume: 0.5,
        };
        let click = ClickSound::for_beat(SoundType::Bell, true, 1.0);

        let _ = tx.push(VoiceCommand::ToneOn(tone));
        group.bench_with_input(BenchmarkId::new("tone_and_clicks", size), &size, |b, _| {
            b.iter(|| {
                let _ = tx.push(VoiceCommand::Click(click));
                mixer.render_interleaved(black_box(&mut buffer), 2);
            })
        });
    }

    group.finish();
}
