//! Benchmarks for the tone gate and the click decay.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_metronome::dsp::{decay::DecayEnvelope, envelope::Envelope};
use saavy_metronome::graph::node::RenderCtx;

use crate::BLOCK_SIZES;

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");
    let ctx = RenderCtx::from_freq(48_000.0, 440.0, 1.0);

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Gate held open: the sustain stage most tone blocks sit in
        let mut gate = Envelope::new();
        gate.note_on(&ctx);
        group.bench_with_input(BenchmarkId::new("gate_sustain", size), &size, |b, _| {
            b.iter(|| {
                gate.render(black_box(&mut buffer), black_box(&ctx));
            })
        });

        // Retriggered every block so it never goes idle
        let mut decay = DecayEnvelope::new(0.15);
        group.bench_with_input(BenchmarkId::new("click_decay", size), &size, |b, _| {
            b.iter(|| {
                decay.trigger(&ctx);
                decay.render(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
