use crate::{
    dsp::{decay::DecayEnvelope, envelope::Envelope},
    graph::node::{GraphNode, RenderCtx},
};

/// ADSR gate as a node. Multiplied onto the reference tone.
pub struct EnvNode {
    env: Envelope,
}

impl EnvNode {
    pub fn adsr(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            env: Envelope::adsr(attack, decay, sustain, release),
        }
    }

    /// Short fade in and out, full level while held.
    pub fn gate() -> Self {
        Self {
            env: Envelope::new(),
        }
    }

    pub fn level(&self) -> f32 {
        self.env.level()
    }
}

impl GraphNode for EnvNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.env.render(out, ctx);
    }

    fn note_on(&mut self, ctx: &RenderCtx) {
        self.env.note_on(ctx);
    }

    fn note_off(&mut self, ctx: &RenderCtx) {
        self.env.note_off(ctx);
    }

    fn is_active(&self) -> bool {
        self.env.is_active()
    }
}

/// One-shot exponential decay as a node. `note_off` is meaningless for a
/// click and is ignored.
pub struct DecayNode {
    env: DecayEnvelope,
}

impl DecayNode {
    pub fn new(duration: f32, peak: f32) -> Self {
        Self {
            env: DecayEnvelope::new(duration).with_peak(peak),
        }
    }

    /// Takes effect on the next trigger.
    pub fn set_duration(&mut self, duration: f32) {
        self.env.set_duration(duration);
    }
}

impl GraphNode for DecayNode {
    fn render_block(&mut self, out: &mut [f32], _ctx: &RenderCtx) {
        self.env.render(out);
    }

    fn note_on(&mut self, ctx: &RenderCtx) {
        self.env.trigger(ctx);
    }

    fn is_active(&self) -> bool {
        self.env.is_active()
    }
}
