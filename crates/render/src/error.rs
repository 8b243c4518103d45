//! Renderer-level error types.
//!
//! The configuration variants mark client bugs (bad registration or
//! enqueue arguments); there is no retry path for them. Recoverable
//! swapchain conditions never surface here: acquire and present report
//! them as a "needs rebuild" bool instead.

use thiserror::Error;

/// Error type for the frame orchestrator and pass registry.
#[derive(Error, Debug)]
pub enum RenderError {
    /// GPU-side failure propagated from the RHI layer
    #[error(transparent)]
    Rhi(#[from] kiln_rhi::RhiError),

    /// Platform failure (window handles, surface creation)
    #[error(transparent)]
    Platform(#[from] kiln_core::Error),

    /// A pass was registered under a name that already exists
    #[error("render pass '{0}' is already registered")]
    PassAlreadyRegistered(String),

    /// A pass name was used that was never registered
    #[error("render pass '{0}' does not exist")]
    UnknownPass(String),

    /// An enqueue targeted a framebuffer the pass does not own
    #[error(
        "not able to bind framebuffer[{index}] to render pass '{pass}': \
         only {count} framebuffer(s) exist for this render pass"
    )]
    FramebufferIndexOutOfRange {
        /// Name of the pass being enqueued.
        pass: String,
        /// Requested framebuffer index.
        index: usize,
        /// Number of framebuffers the pass owns.
        count: usize,
    },
}

/// Result type alias for renderer operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;
