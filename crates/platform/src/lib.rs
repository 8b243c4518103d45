//! Platform layer: windowing, surfaces, and input.
//!
//! This crate provides the pieces that sit between the OS and the
//! renderer:
//! - Window management via winit
//! - Vulkan surface creation (RAII wrapped)
//! - Keyboard and mouse state tracking

mod input;
mod window;

pub use input::{InputState, KeyCode, MouseButton};
pub use window::{Surface, Window};

// Re-export winit types that users might need
pub use winit::event::{Event, WindowEvent};
pub use winit::event_loop::EventLoop;
