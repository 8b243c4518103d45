//! Vulkan bring-up bundled into one context object.
//!
//! [`RenderContext`] owns the instance, the window surface, and the
//! logical device (with its queues and allocator). It is constructed
//! once from a window and passed by reference into everything that
//! needs GPU access, which keeps the renderer's dependencies explicit
//! instead of reaching through globals.

use std::sync::Arc;

use tracing::info;

use kiln_platform::{Surface, Window};
use kiln_rhi::device::Device;
use kiln_rhi::instance::Instance;
use kiln_rhi::physical_device::select_physical_device;

use crate::error::RenderResult;
use crate::renderer::RendererConfig;

/// Instance, surface, and device for one window.
///
/// Field order matters: the device's last `Arc` is usually the one held
/// here, so it is torn down first, then the surface, then the instance.
pub struct RenderContext {
    device: Arc<Device>,
    surface: Surface,
    instance: Instance,
}

impl RenderContext {
    /// Brings up Vulkan against the given window.
    ///
    /// Creates the instance (with validation per the config), the
    /// window surface, selects the best physical device, and creates
    /// the logical device.
    ///
    /// # Errors
    ///
    /// Returns an error if any stage of bring-up fails or no suitable
    /// GPU is found.
    pub fn new(window: &Window, config: &RendererConfig) -> RenderResult<Self> {
        let instance = Instance::new(&config.app_name, config.enable_validation)?;
        let surface = window.create_surface(instance.entry(), instance.handle())?;

        let physical_device =
            select_physical_device(instance.handle(), surface.handle(), surface.loader())?;
        info!(
            "Using GPU: {} ({})",
            physical_device.device_name(),
            physical_device.device_type_name()
        );

        let device = Device::new(&instance, &physical_device)?;

        Ok(Self {
            device,
            surface,
            instance,
        })
    }

    /// Returns the logical device.
    #[inline]
    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }

    /// Returns the window surface.
    #[inline]
    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Returns the instance wrapper.
    #[inline]
    pub fn instance(&self) -> &Instance {
        &self.instance
    }
}
