//! Depth Peeling Configuration
//!
//! This module defines depth peeling settings as a pure data structure,
//! consumed by [`DepthPeeling`](crate::controller::DepthPeeling) each frame.
//!
//! The pass count is the quality/performance dial: each dual pass resolves
//! one layer from the front *and* one from the back, so `num_passes = n`
//! correctly orders up to `2n` overlapping transparent surfaces per pixel.
//! It is a fixed configuration value, never auto-detected.
//!
//! # Usage
//!
//! ```rust,ignore
//! let mut peeling = DepthPeeling::new(DepthPeelingSettings::new().with_passes(4));
//!
//! peeling.settings_mut().set_enabled(true);
//! peeling.settings_mut().set_num_passes(6);
//! ```

/// Upper bound on the configured pass count. 16 dual passes resolve 32
/// overlapping layers per pixel, beyond any practical scene.
pub const MAX_PASSES: u32 = 16;

/// Default number of peeling passes.
pub const DEFAULT_PASSES: u32 = 4;

/// Depth peeling configuration (pure data).
#[derive(Debug, Clone)]
pub struct DepthPeelingSettings {
    /// Whether the peeling path is requested at all.
    pub enabled: bool,

    /// Number of dual peeling passes per frame, clamped to `1..=MAX_PASSES`.
    num_passes: u32,
}

impl Default for DepthPeelingSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            num_passes: DEFAULT_PASSES,
        }
    }
}

impl DepthPeelingSettings {
    /// Creates new settings with default values (disabled, 4 passes).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style pass count override.
    #[must_use]
    pub fn with_passes(mut self, passes: u32) -> Self {
        self.set_num_passes(passes);
        self
    }

    /// Sets whether depth peeling is enabled.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Sets the number of peeling passes, clamped to `1..=MAX_PASSES`.
    pub fn set_num_passes(&mut self, passes: u32) {
        self.num_passes = passes.clamp(1, MAX_PASSES);
    }

    /// Returns the configured pass count.
    #[inline]
    #[must_use]
    pub fn num_passes(&self) -> u32 {
        self.num_passes
    }

    /// Returns `true` when the peeling loop should run.
    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled && self.num_passes > 0
    }
}
