//! Benchmarks for one click voice of each sound type.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_metronome::voices::{ClickSound, ClickVoice, SoundType};

use crate::BLOCK_SIZES;

pub fn bench_clicks(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/clicks");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];
        let mut scratch = vec![0.0f32; size];

        for sound in SoundType::ALL {
            let click = ClickSound::for_beat(sound, true, 0.8);
            let mut voice = ClickVoice::new(48_000.0);
            group.bench_with_input(BenchmarkId::new(sound.label(), size), &size, |b, _| {
                b.iter(|| {
                    voice.trigger(&click);
                    voice.render_add(black_box(&mut buffer), black_box(&mut scratch));
                })
            });
        }
    }

    group.finish();
}
