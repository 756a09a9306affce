/// Context passed to graph nodes during rendering
///
/// - sample_rate: Audio sample rate (e.g., 48000.0)
/// - frequency: Pitch to render (Hz)
/// - gain: Linear output level the voice was triggered with
#[derive(Debug, Clone, Copy)]
pub struct RenderCtx {
    pub sample_rate: f32,
    pub frequency: f32,
    pub gain: f32,
}

impl RenderCtx {
    /// Create context from a direct frequency. Clicks and reference tones are
    /// tuned in Hz, never by note number.
    pub fn from_freq(sample_rate: f32, frequency: f32, gain: f32) -> Self {
        Self {
            sample_rate,
            frequency,
            gain,
        }
    }
}

/// Core trait for audio processing graph nodes
pub trait GraphNode: Send {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx);

    /// Triggered when a sound starts. Passthrough nodes ignore it.
    fn note_on(&mut self, _ctx: &RenderCtx) {}

    /// Triggered when a sound is released. Passthrough nodes ignore it.
    fn note_off(&mut self, _ctx: &RenderCtx) {}

    /// Check if this node is still producing sound
    ///
    /// The mixer uses this to drop finished click voices.
    fn is_active(&self) -> bool {
        true
    }
}

impl GraphNode for Box<dyn GraphNode> {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        (**self).render_block(out, ctx)
    }

    fn note_on(&mut self, ctx: &RenderCtx) {
        (**self).note_on(ctx)
    }

    fn note_off(&mut self, ctx: &RenderCtx) {
        (**self).note_off(ctx)
    }

    fn is_active(&self) -> bool {
        (**self).is_active()
    }
}
