//! Engine-level error types.

use thiserror::Error;

/// Error type for platform and engine plumbing.
///
/// GPU-side failures carry their own error type in `kiln_rhi`; this covers
/// everything around it (windowing, IO, configuration).
#[derive(Error, Debug)]
pub enum Error {
    /// Window creation or handle access failed
    #[error("window error: {0}")]
    Window(String),

    /// Vulkan errors surfaced outside the RHI layer (surface creation)
    #[error("Vulkan error: {0}")]
    Vulkan(String),

    /// Filesystem access failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Anything that does not fit the other variants
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias using the engine's [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;
