//! Render hardware interface: thin RAII wrappers over `ash`.
//!
//! Everything Vulkan-specific the frame orchestrator builds on lives
//! here:
//! - Instance bring-up, GPU selection, logical device with allocator
//! - Swapchain management with rebuild signalling
//! - Render pass, framebuffer, and graphics pipeline creation
//! - Offscreen color and depth render targets
//! - Command buffer recording
//! - Synchronization primitives sized to frames-in-flight

mod error;

pub mod command;
pub mod device;
pub mod framebuffer;
pub mod image;
pub mod instance;
pub mod physical_device;
pub mod pipeline;
pub mod render_pass;
pub mod shader;
pub mod swapchain;
pub mod sync;
pub mod vertex;

pub use error::{RhiError, RhiResult};

// Callers build vk::* structs (areas, clear values) against this crate
pub use ash::vk;
