use crate::gpu::{ContextAttributes, GraphicsContext};

use super::config::Fallback;
use super::epoch::{DeferredRelease, EpochCounter};

/// Platform services a [`RenderSurface`](super::RenderSurface) needs.
///
/// The host owns the render target and the frame scheduler. It calls back
/// into the surface (`tick`, `recover`, `context_lost`, ...) when the
/// matching platform event fires; the surface never blocks on the host.
pub trait SurfaceHost {
    /// Context type this host hands out.
    type Context: GraphicsContext;

    /// Acquire a context for the render target. `None` when the platform
    /// has no usable GPU API.
    fn acquire_context(
        &mut self,
        attributes: &ContextAttributes,
    ) -> Option<Self::Context>;

    /// Monotonic time in milliseconds.
    fn now_ms(&self) -> f64;

    /// Arrange for `tick` to be called on the next display frame.
    fn request_frame(&mut self);

    /// Drop any pending frame request.
    fn cancel_frame(&mut self);

    /// Whether the user asked the OS to reduce motion.
    fn prefers_reduced_motion(&self) -> bool;

    /// Arrange for `recover` to be called after `delay_ms`.
    fn schedule_recovery(&mut self, delay_ms: u32);

    /// Drop a pending recovery timer.
    fn cancel_recovery(&mut self);

    /// Run `release` on a later turn.
    fn defer_release(&mut self, release: DeferredRelease<Self::Context>);

    /// Mount counter of the render target.
    fn epoch(&self) -> &EpochCounter;

    /// Resize the drawing buffer in physical pixels.
    fn set_backing_size(&mut self, width: u32, height: u32);

    /// Replace the canvas with `content`. Called once when the surface
    /// enters fallback.
    fn show_fallback(&mut self, content: &Fallback);

    /// Stop delivering platform events (resize, context loss, pointer).
    fn detach(&mut self);
}
