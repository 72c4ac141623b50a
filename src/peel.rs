//! Depth Interval Encoding & Layer Compositing Math
//!
//! Dual depth peeling resolves the nearest and farthest unresolved layer of
//! every pixel in the same pass. Both depths live in one two-channel float
//! texel, written through hardware MAX blending. To make MAX behave as MIN
//! for the near side, the near depth is stored negated:
//!
//! ```text
//! texel = (x, y)    where    nearest = -x,   farthest = y
//! ```
//!
//! A fragment that must be peeled in a later pass contributes `(-d, d)`;
//! MAX-merging all such contributions tightens the interval from both ends
//! at once.
//!
//! This module is the CPU mirror of the `peel_prologue` / `peel_epilogue`
//! WGSL chunks. The controller takes its clear values from here, and the
//! property tests drive the whole pass protocol through these functions.

use glam::Vec4;

use crate::gamma::{delinearize, delinearize3, linearize, linearize3};

/// Write-side clear value: an arbitrarily large negative number that loses
/// every MAX-blend comparison, meaning "no layer found yet this pass".
pub const DEPTH_CLEAR_VALUE: f32 = -99999.0;

/// Nearest representable scene depth (viewport convention, near plane).
pub const MIN_DEPTH: f32 = 0.0;

/// Farthest representable scene depth (far plane).
pub const MAX_DEPTH: f32 = 1.0;

/// Encoded clear value for the write set's depth-extrema target: an empty
/// interval that any fragment contribution replaces.
pub const CLEAR_EMPTY: [f32; 2] = [DEPTH_CLEAR_VALUE, DEPTH_CLEAR_VALUE];

/// Encoded clear value for the read set on pass 0: the full unresolved
/// `[0, 1]` range, near depth negated.
pub const CLEAR_FULL_RANGE: [f32; 2] = [-MIN_DEPTH, MAX_DEPTH];

/// Componentwise max of two encoded texels — the arithmetic the hardware
/// MAX blend equation performs on the depth-extrema attachment.
#[inline]
#[must_use]
pub fn merge_max(a: [f32; 2], b: [f32; 2]) -> [f32; 2] {
    [a[0].max(b[0]), a[1].max(b[1])]
}

// ============================================================================
// DepthInterval
// ============================================================================

/// The decoded `[nearest, farthest]` unresolved-depth interval of one pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthInterval {
    /// Nearest not-yet-resolved depth.
    pub nearest: f32,
    /// Farthest not-yet-resolved depth.
    pub farthest: f32,
}

impl DepthInterval {
    /// Decodes a stored texel (negated-near convention).
    #[inline]
    #[must_use]
    pub fn decode(texel: [f32; 2]) -> Self {
        Self {
            nearest: -texel[0],
            farthest: texel[1],
        }
    }

    /// Encodes back to the stored form.
    #[inline]
    #[must_use]
    pub fn encode(self) -> [f32; 2] {
        [-self.nearest, self.farthest]
    }
}

/// Outcome of the per-fragment peel depth test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthClass {
    /// Resolved in an earlier pass (or outside the pixel's remaining range):
    /// no depth or color contribution.
    Outside,
    /// Strictly inside the interval: contributes `(-d, d)` to narrow the
    /// bounds for the next pass, no color.
    Between,
    /// Exactly the nearest unresolved layer: shade and composite under the
    /// carried front color.
    Front,
    /// Exactly the farthest unresolved layer: shade and emit as this pass's
    /// back color.
    Back,
}

/// Classifies a fragment depth against a pixel's stored interval.
///
/// When the interval has collapsed to a single depth (silhouette edges, the
/// last remaining layer) the front branch wins: equality with `nearest` is
/// checked before equality with `farthest`.
#[must_use]
pub fn classify(frag_depth: f32, interval: DepthInterval) -> DepthClass {
    if frag_depth < interval.nearest || frag_depth > interval.farthest {
        return DepthClass::Outside;
    }
    if frag_depth > interval.nearest && frag_depth < interval.farthest {
        return DepthClass::Between;
    }
    if frag_depth == interval.nearest {
        DepthClass::Front
    } else {
        DepthClass::Back
    }
}

// ============================================================================
// Compositing operators
// ============================================================================

/// Composites a freshly shaded front layer **under** the carried front color,
/// gamma-correct:
///
/// ```text
/// rgb' = delin( lin(front.rgb) + (1 - lin(front.a)) * lin(shaded.rgb) )
/// a'   = delin( lin(front.a)   + (1 - lin(front.a)) * lin(shaded.a)   )
/// ```
///
/// Because layers resolve front-to-back, the existing accumulator is the
/// *nearer* color and the new layer slides underneath with the remaining
/// transmittance. With an opaque accumulator (`a == 1`) the new layer
/// contributes nothing.
#[must_use]
pub fn composite_under(front: Vec4, shaded: Vec4) -> Vec4 {
    let front_a_lin = linearize(front.w);
    let transmittance = 1.0 - front_a_lin;
    let rgb = delinearize3(linearize3(front.truncate()) + transmittance * linearize3(shaded.truncate()));
    let a = delinearize(front_a_lin + transmittance * linearize(shaded.w));
    rgb.extend(a)
}

/// The final on-screen merge of the fully accumulated front color over the
/// fully accumulated back color:
///
/// ```text
/// rgb = delin( lin(front.rgb) + (1 - lin(front.a)) * lin(back.rgb) )
/// a   = delin( lin(front.a) + lin(back.a) )
/// ```
#[must_use]
pub fn composite_final(front: Vec4, back: Vec4) -> Vec4 {
    let transmittance = 1.0 - linearize(front.w);
    let rgb = delinearize3(linearize3(front.truncate()) + transmittance * linearize3(back.truncate()));
    let a = delinearize(linearize(front.w) + linearize(back.w));
    rgb.extend(a)
}

/// The blend-back accumulation step: `src` (this pass's back color) blended
/// over the accumulator with `SRC_ALPHA / ONE_MINUS_SRC_ALPHA` color factors
/// and `ONE / ONE_MINUS_SRC_ALPHA` alpha factors — the arithmetic float
/// render targets perform on stored values.
///
/// Zero-alpha sources leave the accumulator untouched (the blend-back shader
/// discards those texels before blending).
#[must_use]
pub fn blend_over(accum: Vec4, src: Vec4) -> Vec4 {
    if src.w == 0.0 {
        return accum;
    }
    let rgb = src.w * src.truncate() + (1.0 - src.w) * accum.truncate();
    let a = src.w + (1.0 - src.w) * accum.w;
    rgb.extend(a)
}

/// Epilogue sanitation for the shaded color: clamp to `[0, 1]`, and replace
/// anything that still fails the range check (NaN channels survive a clamp)
/// with pure red so shading bugs are visible instead of silently corrupting
/// the blend accumulators.
#[must_use]
pub fn clamp_or_flag(color: Vec4) -> Vec4 {
    if !color.is_finite() {
        return Vec4::new(1.0, 0.0, 0.0, 1.0);
    }
    color.clamp(Vec4::ZERO, Vec4::ONE)
}
