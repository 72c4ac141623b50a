//! Display ↔ Linear Color Conversion
//!
//! The peeling shaders blend layers themselves instead of relying on
//! hardware output merging, so blending math must run on linear (physically
//! additive) values while textures carry display-encoded (gamma 2.2) values.
//!
//! These functions are the CPU source of truth for the `gamma.wgsl` shader
//! chunk — both sides implement the same power curve and the round-trip
//! property is asserted in `tests/gamma_tests.rs`.

use glam::{Vec3, Vec4};

/// Display gamma exponent.
pub const GAMMA: f32 = 2.2;

/// Converts a display-encoded channel to linear space (`c^2.2`).
#[inline]
#[must_use]
pub fn linearize(c: f32) -> f32 {
    c.powf(GAMMA)
}

/// Converts a linear channel to display encoding (`c^(1/2.2)`).
#[inline]
#[must_use]
pub fn delinearize(c: f32) -> f32 {
    c.powf(1.0 / GAMMA)
}

/// Linearizes an RGB triple componentwise.
#[inline]
#[must_use]
pub fn linearize3(c: Vec3) -> Vec3 {
    Vec3::new(linearize(c.x), linearize(c.y), linearize(c.z))
}

/// Delinearizes an RGB triple componentwise.
#[inline]
#[must_use]
pub fn delinearize3(c: Vec3) -> Vec3 {
    Vec3::new(delinearize(c.x), delinearize(c.y), delinearize(c.z))
}

/// Linearizes an RGBA color. Alpha gets the same curve — the peeling
/// compositing formulas accumulate alpha in linear space as well.
#[inline]
#[must_use]
pub fn linearize4(c: Vec4) -> Vec4 {
    linearize3(c.truncate()).extend(linearize(c.w))
}

/// Delinearizes an RGBA color.
#[inline]
#[must_use]
pub fn delinearize4(c: Vec4) -> Vec4 {
    delinearize3(c.truncate()).extend(delinearize(c.w))
}
