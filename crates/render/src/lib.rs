//! Frame orchestration over the RHI: named render passes, a per-frame
//! dispatch queue, and the begin/render/end lifecycle.
//!
//! Client code registers passes up front with [`Renderer::add_render_pass`]
//! or [`Renderer::add_present_pass`], then each frame enqueues delegates
//! that record draw commands when the renderer dispatches the queue.
//!
//! ```no_run
//! use kiln_render::{Renderer, RendererConfig, RenderPassConfig};
//!
//! # fn run(window: &kiln_platform::Window) -> kiln_render::RenderResult<()> {
//! let mut renderer = Renderer::new(window, RendererConfig::default())?;
//! renderer.add_present_pass(
//!     "present",
//!     &RenderPassConfig {
//!         vertex_shader_path: "shaders/triangle.vert.spv".into(),
//!         fragment_shader_path: "shaders/triangle.frag.spv".into(),
//!         ..Default::default()
//!     },
//! )?;
//!
//! loop {
//!     if renderer.begin_frame()? {
//!         let extent = renderer.swapchain_extent();
//!         renderer.rebuild_swapchain(extent.width, extent.height)?;
//!         continue;
//!     }
//!     let area = ash::vk::Rect2D {
//!         offset: ash::vk::Offset2D { x: 0, y: 0 },
//!         extent: renderer.swapchain_extent(),
//!     };
//!     renderer.enqueue_present_pass("present", area, Box::new(|_ctx| {
//!         // record draws here
//!     }))?;
//!     renderer.render_frame()?;
//!     if renderer.end_frame()? {
//!         let extent = renderer.swapchain_extent();
//!         renderer.rebuild_swapchain(extent.width, extent.height)?;
//!     }
//! }
//! # }
//! ```

mod context;
mod error;
mod frame;
mod pass;
mod renderer;

pub use context::RenderContext;
pub use error::{RenderError, RenderResult};
pub use frame::FrameSlot;
pub use pass::{RenderPassConfig, RenderPassContext, RenderPassDelegate};
pub use renderer::{Renderer, RendererConfig};

pub use kiln_rhi::command::CommandBuffer;
pub use kiln_rhi::sync::MAX_FRAMES_IN_FLIGHT;
