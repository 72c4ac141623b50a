//! Error Types
//!
//! The main error type [`VeilError`] covers the failure modes of the depth
//! peeling subsystem: shader injection contract violations, template
//! rendering failures, and configuration problems detected at setup time.
//!
//! Lifecycle hooks on [`DepthPeeling`](crate::controller::DepthPeeling) never
//! propagate errors into the host's render loop; configuration failures are
//! logged and the affected operation degrades to a no-op. `VeilError` is
//! returned only from APIs the host calls *outside* the frame loop (shader
//! injection, explicit validation).

use thiserror::Error;

/// The main error type for the veil depth peeling subsystem.
#[derive(Error, Debug)]
pub enum VeilError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// A required GPU feature is not available on the device.
    #[error("Missing required GPU feature: {0}")]
    MissingFeature(String),

    /// Requested buffer dimensions are below the minimum texel threshold.
    #[error("Buffer size {width}x{height} is below the minimum of {min} texels per side")]
    BufferTooSmall {
        /// Requested width in texels
        width: u32,
        /// Requested height in texels
        height: u32,
        /// Minimum allowed extent per side
        min: u32,
    },

    // ========================================================================
    // Shader Composition Errors
    // ========================================================================
    /// The base shader does not satisfy the injection contract.
    #[error("Shader injection failed ({stage} stage): {reason}")]
    ShaderInjection {
        /// Which shader stage was being transformed
        stage: &'static str,
        /// What part of the contract was violated
        reason: String,
    },

    /// A WGSL template failed to render.
    #[error("Shader template error: {0}")]
    TemplateRender(#[from] minijinja::Error),
}

/// Alias for `Result<T, VeilError>`.
pub type Result<T> = std::result::Result<T, VeilError>;
