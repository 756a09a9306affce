use crate::{
    graph::node::{GraphNode, RenderCtx},
    MAX_BLOCK_SIZE,
};

/// Signal multiplied by an envelope.
///
/// Lifetime follows the envelope: an oscillator never stops by itself, so the
/// pair is finished once the envelope has gone idle.
pub struct Amplify<N, M> {
    pub signal: N,
    pub envelope: M,
    temp_buffer: Vec<f32>,
}

impl<N, M> Amplify<N, M> {
    pub fn new(signal: N, envelope: M) -> Self {
        Self {
            signal,
            envelope,
            temp_buffer: vec![0.0; MAX_BLOCK_SIZE],
        }
    }
}

impl<N: GraphNode, M: GraphNode> GraphNode for Amplify<N, M> {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.signal.render_block(out, ctx);

        // Blocks longer than the scratch buffer are the caller's bug; the
        // mixer never renders more than MAX_BLOCK_SIZE at once.
        let frames = &mut self.temp_buffer[..out.len()];
        self.envelope.render_block(frames, ctx);

        for (o, m) in out.iter_mut().zip(frames.iter()) {
            *o *= *m * ctx.gain;
        }
    }

    fn note_on(&mut self, ctx: &RenderCtx) {
        self.signal.note_on(ctx);
        self.envelope.note_on(ctx);
    }

    fn note_off(&mut self, ctx: &RenderCtx) {
        self.signal.note_off(ctx);
        self.envelope.note_off(ctx);
    }

    fn is_active(&self) -> bool {
        self.envelope.is_active()
    }
}
