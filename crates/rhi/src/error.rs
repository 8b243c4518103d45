//! RHI-specific error types.
//!
//! Every failure in this crate is either a raw Vulkan result code wrapped in
//! [`RhiError::VulkanError`] or one of the structured variants below. The
//! two recoverable swapchain conditions (out-of-date, suboptimal) are never
//! reported through this type; acquire/present signal them as a bool.

use thiserror::Error;

/// RHI-specific error type.
#[derive(Error, Debug)]
pub enum RhiError {
    /// Vulkan API error
    #[error("Vulkan error: {0}")]
    VulkanError(#[from] ash::vk::Result),

    /// Failed to load the Vulkan library
    #[error("failed to load Vulkan: {0}")]
    LoadingError(#[from] ash::LoadingError),

    /// GPU allocator error
    #[error("allocator error: {0}")]
    AllocatorError(#[from] gpu_allocator::AllocationError),

    /// No GPU satisfied the device requirements
    #[error("no suitable GPU found")]
    NoSuitableGpu,

    /// Shader loading or validation error
    #[error("shader error: {0}")]
    ShaderError(String),

    /// Swapchain creation error
    #[error("swapchain error: {0}")]
    SwapchainError(String),

    /// Pipeline creation error
    #[error("pipeline error: {0}")]
    PipelineError(String),

    /// Invalid parameter or handle
    #[error("invalid handle: {0}")]
    InvalidHandle(String),
}

/// Result type alias for RHI operations.
pub type RhiResult<T> = std::result::Result<T, RhiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_error_carries_the_driver_result() {
        let err = RhiError::PipelineError(
            "graphics pipeline creation failed: ERROR_UNKNOWN".to_owned(),
        );
        assert_eq!(
            err.to_string(),
            "pipeline error: graphics pipeline creation failed: ERROR_UNKNOWN"
        );
    }

    #[test]
    fn test_vulkan_result_converts() {
        let err = RhiError::from(ash::vk::Result::ERROR_DEVICE_LOST);
        assert!(matches!(err, RhiError::VulkanError(_)));
    }
}
