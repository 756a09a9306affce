use crate::{graph::node::RenderCtx, MIN_TIME};

/*
Percussive Decay Envelope
=========================

A metronome click has no sustain: it jumps to its peak and dies away. The
shape is an instantaneous attack followed by an exponential fall from `peak`
to `peak * FLOOR` over the configured duration:

    level(n) = peak * FLOOR^(n / N)        N = duration * sample_rate

which is computed incrementally as `level *= k` with `k = FLOOR^(1/N)`. An
exponential ramp sounds like a struck object; a linear one sounds clipped.
When the duration has elapsed the envelope snaps to zero and goes idle, which
is what lets a click voice free itself without the caller tracking it.
*/

/// Ratio of the final level to the peak (-60 dB).
pub const DECAY_FLOOR: f32 = 0.001;

#[derive(Debug, Clone)]
pub struct DecayEnvelope {
    duration: f32,
    peak: f32,
    level: f32,
    coefficient: f32,
    remaining: u32,
}

impl DecayEnvelope {
    pub fn new(duration: f32) -> Self {
        Self {
            duration: duration.max(MIN_TIME),
            peak: 1.0,
            level: 0.0,
            coefficient: 0.0,
            remaining: 0,
        }
    }

    /// Peak level reached on trigger. Not clamped: output limiting happens in the mixer.
    pub fn with_peak(mut self, peak: f32) -> Self {
        self.peak = peak.max(0.0);
        self
    }

    pub fn set_duration(&mut self, duration: f32) {
        self.duration = duration.max(MIN_TIME);
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn trigger(&mut self, ctx: &RenderCtx) {
        let samples = (self.duration * ctx.sample_rate).round().max(1.0);
        self.coefficient = DECAY_FLOOR.powf(1.0 / samples);
        self.remaining = samples as u32;
        self.level = self.peak;
    }

    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        if self.remaining == 0 {
            self.level = 0.0;
            return 0.0;
        }

        let out = self.level;
        self.level *= self.coefficient;
        self.remaining -= 1;
        out
    }

    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample();
        }
    }

    pub fn is_active(&self) -> bool {
        self.remaining > 0
    }

    pub fn level(&self) -> f32 {
        self.level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_peak_and_decays_to_floor() {
        let ctx = RenderCtx::from_freq(1_000.0, 1_000.0, 1.0);
        let mut env = DecayEnvelope::new(0.05).with_peak(0.8);
        env.trigger(&ctx);

        let mut buffer = [0.0f32; 50];
        env.render(&mut buffer);

        assert_eq!(buffer[0], 0.8);
        assert!(buffer.windows(2).all(|w| w[1] < w[0]));
        // one step short of the floor on the final sample
        assert!(buffer[49] < 0.8 * 0.01);
        assert!(!env.is_active());
    }

    #[test]
    fn goes_silent_after_duration() {
        let ctx = RenderCtx::from_freq(1_000.0, 1_000.0, 1.0);
        let mut env = DecayEnvelope::new(0.01);
        env.trigger(&ctx);

        let mut buffer = [1.0f32; 20];
        env.render(&mut buffer);
        assert!(buffer[10..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn idle_until_triggered() {
        let mut env = DecayEnvelope::new(0.05);
        assert!(!env.is_active());
        assert_eq!(env.next_sample(), 0.0);
    }
}
