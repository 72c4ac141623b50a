//! Buffer Capture Hooks
//!
//! Optional frame-dump support for offline debugging of the peeling loop.
//! [`DepthPeeling::visit_buffers`](crate::controller::DepthPeeling::visit_buffers)
//! walks every live target between passes and hands the host a
//! [`CaptureFrame`] per buffer; the host decides whether to read pixels
//! back, dump to disk, or visualize. Nothing in the production compositing
//! path depends on this module.

/// Which logical buffer a captured frame shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureBuffer {
    /// Front-color accumulator of a peel buffer set.
    FrontColor,
    /// Back-color target of a peel buffer set.
    BackColor,
    /// Near channel of the depth-extrema target (stored negated).
    DepthNear,
    /// Far channel of the depth-extrema target.
    DepthFar,
    /// The persistent blend-back accumulator.
    BlendBack,
}

/// Role the owning buffer held when the frame was captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureRole {
    /// The set being read this pass.
    Read,
    /// The set being written this pass.
    Write,
    /// The blend-back accumulator (no ping-pong role).
    Accumulator,
}

/// One capturable buffer surface.
pub struct CaptureFrame<'a> {
    /// Which buffer this is.
    pub buffer: CaptureBuffer,
    /// Role of the owning set at capture time.
    pub role: CaptureRole,
    /// Label of the owning set ("Set A", "Set B", "BlendBack").
    pub label: &'static str,
    /// The GPU texture. Depth frames alias the same texture for the near
    /// and far channels; the host selects the channel when visualizing.
    pub texture: &'a wgpu::Texture,
}
