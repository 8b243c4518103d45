//! Swapchain management.
//!
//! [`Swapchain`] owns the `VkSwapchainKHR`, its image views, and the
//! index of the most recently acquired image. Acquire and present both
//! return a needs-rebuild flag instead of leaking raw `VkResult`s:
//! `Ok(true)` means the chain no longer matches the surface and the
//! caller should rebuild it, while genuinely fatal results surface as
//! errors.
//!
//! The recoverable cases follow the usual swapchain etiquette: an
//! out-of-date chain forces a rebuild on either call, a merely
//! suboptimal chain still renders the frame on acquire but asks for a
//! rebuild on present.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use kiln_rhi::instance::Instance;
//! use kiln_rhi::device::Device;
//! use kiln_rhi::swapchain::Swapchain;
//! use ash::vk;
//!
//! # fn example(
//! #     instance: &Instance,
//! #     device: Arc<Device>,
//! #     surface: vk::SurfaceKHR,
//! #     semaphore: vk::Semaphore,
//! # ) -> Result<(), kiln_rhi::RhiError> {
//! let mut swapchain = Swapchain::new(instance, device.clone(), surface, 1280, 720)?;
//!
//! // In the frame loop:
//! if swapchain.acquire_next_image(semaphore)? {
//!     swapchain.rebuild(1280, 720)?;
//!     return Ok(()); // skip this frame
//! }
//! // ... render to swapchain.image_view(swapchain.current_image() as usize) ...
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use ash::vk;
use tracing::{debug, info, warn};

use crate::device::Device;
use crate::error::{RhiError, RhiResult};
use crate::instance::Instance;

/// What the surface can do, as reported by the driver.
#[derive(Debug, Clone)]
pub struct SwapchainSupportDetails {
    /// Surface capabilities (image count bounds, extents, transforms)
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    /// Supported surface formats (format and color space pairs)
    pub formats: Vec<vk::SurfaceFormatKHR>,
    /// Supported present modes
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl SwapchainSupportDetails {
    /// Queries swapchain support for a physical device and surface.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the surface queries fail.
    pub fn query(
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
        surface_loader: &ash::khr::surface::Instance,
    ) -> RhiResult<Self> {
        let capabilities = unsafe {
            surface_loader.get_physical_device_surface_capabilities(physical_device, surface)?
        };

        let formats = unsafe {
            surface_loader.get_physical_device_surface_formats(physical_device, surface)?
        };

        let present_modes = unsafe {
            surface_loader.get_physical_device_surface_present_modes(physical_device, surface)?
        };

        debug!(
            "Surface reports {} format(s), {} present mode(s), image count {}..={}",
            formats.len(),
            present_modes.len(),
            capabilities.min_image_count,
            if capabilities.max_image_count == 0 {
                "unbounded".to_string()
            } else {
                capabilities.max_image_count.to_string()
            }
        );

        Ok(Self {
            capabilities,
            formats,
            present_modes,
        })
    }

    /// True if at least one format and one present mode are available.
    #[inline]
    pub fn is_adequate(&self) -> bool {
        !self.formats.is_empty() && !self.present_modes.is_empty()
    }
}

/// Everything one concrete chain owns; swapped wholesale on rebuild.
struct ChainData {
    swapchain: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    image_views: Vec<vk::ImageView>,
    format: vk::Format,
    color_space: vk::ColorSpaceKHR,
    extent: vk::Extent2D,
    present_mode: vk::PresentModeKHR,
}

/// The presentable image chain and its selection results.
///
/// Not thread-safe; the frame loop drives it from a single thread. The
/// surface handle and loaders are kept so [`Swapchain::rebuild`] needs
/// nothing but the new framebuffer size.
pub struct Swapchain {
    /// Reference to the logical device
    device: Arc<Device>,
    /// Surface this chain presents to (owned by the platform layer)
    surface: vk::SurfaceKHR,
    /// Loader for surface capability queries
    surface_loader: ash::khr::surface::Instance,
    /// Loader for the swapchain device extension
    swapchain_loader: ash::khr::swapchain::Device,
    /// Current chain handle
    swapchain: vk::SwapchainKHR,
    /// Presentable images (owned by the swapchain itself)
    images: Vec<vk::Image>,
    /// Image views over the swapchain images
    image_views: Vec<vk::ImageView>,
    /// Selected image format
    format: vk::Format,
    /// Selected color space
    color_space: vk::ColorSpaceKHR,
    /// Current chain extent in pixels
    extent: vk::Extent2D,
    /// Selected present mode
    present_mode: vk::PresentModeKHR,
    /// Index of the most recently acquired image
    current_image: u32,
}

impl Swapchain {
    /// Creates a new swapchain for `surface`.
    ///
    /// Selection policy:
    /// - format: 8-bit SRGB (`B8G8R8A8_SRGB` or `R8G8B8A8_SRGB`) with a
    ///   nonlinear SRGB color space, else the first reported format
    /// - present mode: MAILBOX when available, else FIFO
    /// - image count: minimum plus one, clamped to the reported maximum
    ///
    /// `width` and `height` are the framebuffer size in pixels; they only
    /// matter when the surface leaves the extent up to the application.
    ///
    /// # Errors
    ///
    /// Returns an error if surface queries, swapchain creation, or image
    /// view creation fail.
    pub fn new(
        instance: &Instance,
        device: Arc<Device>,
        surface: vk::SurfaceKHR,
        width: u32,
        height: u32,
    ) -> RhiResult<Self> {
        let surface_loader =
            ash::khr::surface::Instance::new(instance.entry(), instance.handle());
        let swapchain_loader =
            ash::khr::swapchain::Device::new(instance.handle(), device.handle());

        let chain = create_chain(
            &device,
            surface,
            &surface_loader,
            &swapchain_loader,
            width,
            height,
        )?;

        Ok(Self {
            device,
            surface,
            surface_loader,
            swapchain_loader,
            swapchain: chain.swapchain,
            images: chain.images,
            image_views: chain.image_views,
            format: chain.format,
            color_space: chain.color_space,
            extent: chain.extent,
            present_mode: chain.present_mode,
            current_image: 0,
        })
    }

    /// Rebuilds the swapchain at a new framebuffer size.
    ///
    /// Waits for the device to go idle, destroys the image views and the
    /// old chain, then creates a fresh one with the same selection
    /// policy. Anything referencing the old views (framebuffers) must be
    /// recreated by the caller afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the idle wait or chain creation fails.
    pub fn rebuild(&mut self, width: u32, height: u32) -> RhiResult<()> {
        self.device.wait_idle()?;

        info!("Rebuilding swapchain at {}x{}", width, height);

        self.destroy_chain();

        let chain = create_chain(
            &self.device,
            self.surface,
            &self.surface_loader,
            &self.swapchain_loader,
            width,
            height,
        )?;

        self.swapchain = chain.swapchain;
        self.images = chain.images;
        self.image_views = chain.image_views;
        self.format = chain.format;
        self.color_space = chain.color_space;
        self.extent = chain.extent;
        self.present_mode = chain.present_mode;
        self.current_image = 0;

        Ok(())
    }

    /// Acquires the next swapchain image, signaling `semaphore` when the
    /// image is ready.
    ///
    /// The acquired index is stored and readable via
    /// [`Swapchain::current_image`]. Returns `Ok(true)` when the chain is
    /// out of date and must be rebuilt before rendering; in that case no
    /// image was acquired. A suboptimal chain still acquires and returns
    /// `Ok(false)`, so the frame in progress completes.
    ///
    /// # Errors
    ///
    /// Returns an error for any result other than success, suboptimal,
    /// or out-of-date.
    pub fn acquire_next_image(&mut self, semaphore: vk::Semaphore) -> RhiResult<bool> {
        let result = unsafe {
            self.swapchain_loader.acquire_next_image(
                self.swapchain,
                u64::MAX,
                semaphore,
                vk::Fence::null(),
            )
        };

        match result {
            Ok((index, suboptimal)) => {
                self.current_image = index;
                if suboptimal {
                    debug!("Swapchain suboptimal on acquire, finishing the frame anyway");
                }
                Ok(false)
            }
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                debug!("Swapchain out of date on acquire");
                Ok(true)
            }
            Err(e) => Err(RhiError::VulkanError(e)),
        }
    }

    /// Presents the most recently acquired image on `queue` after
    /// `wait_semaphore` signals.
    ///
    /// Returns `Ok(true)` when the chain should be rebuilt: either the
    /// present reported suboptimal or the chain was out of date. An
    /// out-of-date present has still consumed the acquired image, so the
    /// frame counts as presented.
    ///
    /// # Errors
    ///
    /// Returns an error for any result other than success, suboptimal,
    /// or out-of-date.
    pub fn present(&self, queue: vk::Queue, wait_semaphore: vk::Semaphore) -> RhiResult<bool> {
        let swapchains = [self.swapchain];
        let image_indices = [self.current_image];
        let wait_semaphores = [wait_semaphore];

        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        let result = unsafe { self.swapchain_loader.queue_present(queue, &present_info) };

        match result {
            Ok(false) => Ok(false),
            Ok(true) => {
                debug!("Swapchain suboptimal on present");
                Ok(true)
            }
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                debug!("Swapchain out of date on present");
                Ok(true)
            }
            Err(e) => Err(RhiError::VulkanError(e)),
        }
    }

    /// Returns the swapchain handle.
    #[inline]
    pub fn handle(&self) -> vk::SwapchainKHR {
        self.swapchain
    }

    /// Returns the swapchain image format.
    #[inline]
    pub fn format(&self) -> vk::Format {
        self.format
    }

    /// Returns the swapchain color space.
    #[inline]
    pub fn color_space(&self) -> vk::ColorSpaceKHR {
        self.color_space
    }

    /// Returns the current extent in pixels.
    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    /// Returns the present mode.
    #[inline]
    pub fn present_mode(&self) -> vk::PresentModeKHR {
        self.present_mode
    }

    /// Returns how many images the chain owns.
    #[inline]
    pub fn image_count(&self) -> u32 {
        self.images.len() as u32
    }

    /// Returns the index stored by the last successful acquire.
    #[inline]
    pub fn current_image(&self) -> u32 {
        self.current_image
    }

    /// Returns the image view at the given index.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[inline]
    pub fn image_view(&self, index: usize) -> vk::ImageView {
        self.image_views[index]
    }

    /// Returns all image views.
    #[inline]
    pub fn image_views(&self) -> &[vk::ImageView] {
        &self.image_views
    }

    /// Destroys the image views and the chain itself.
    ///
    /// The images belong to the swapchain and go with it.
    fn destroy_chain(&mut self) {
        for &image_view in &self.image_views {
            unsafe {
                self.device.handle().destroy_image_view(image_view, None);
            }
        }
        self.image_views.clear();
        self.images.clear();

        if self.swapchain != vk::SwapchainKHR::null() {
            unsafe {
                self.swapchain_loader
                    .destroy_swapchain(self.swapchain, None);
            }
            self.swapchain = vk::SwapchainKHR::null();
        }
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        let extent = self.extent;
        let image_count = self.images.len();
        self.destroy_chain();
        info!(
            "Swapchain destroyed (was {}x{}, {} images)",
            extent.width, extent.height, image_count
        );
    }
}

/// Creates a chain plus views against `surface` with the selection
/// policy described on [`Swapchain::new`].
fn create_chain(
    device: &Arc<Device>,
    surface: vk::SurfaceKHR,
    surface_loader: &ash::khr::surface::Instance,
    swapchain_loader: &ash::khr::swapchain::Device,
    width: u32,
    height: u32,
) -> RhiResult<ChainData> {
    let support = SwapchainSupportDetails::query(device.physical_device(), surface, surface_loader)?;

    if !support.is_adequate() {
        return Err(RhiError::SwapchainError(
            "Inadequate swapchain support (no formats or present modes)".to_string(),
        ));
    }

    let surface_format = choose_surface_format(&support.formats);
    let present_mode = choose_present_mode(&support.present_modes);
    let extent = choose_extent(&support.capabilities, width, height);
    let image_count = determine_image_count(&support.capabilities);

    info!(
        "Creating swapchain: {}x{}, format {:?}, color space {:?}, present mode {:?}, {} images",
        extent.width,
        extent.height,
        surface_format.format,
        surface_format.color_space,
        present_mode,
        image_count
    );

    let queue_families = device.queue_families();
    let graphics_family = queue_families.graphics_family.ok_or(RhiError::NoSuitableGpu)?;
    let present_family = queue_families.present_family.ok_or(RhiError::NoSuitableGpu)?;
    let queue_family_indices = [graphics_family, present_family];

    let (sharing_mode, queue_family_indices_slice) = if graphics_family != present_family {
        debug!(
            "Using CONCURRENT sharing between graphics ({}) and present ({}) families",
            graphics_family, present_family
        );
        (vk::SharingMode::CONCURRENT, queue_family_indices.as_slice())
    } else {
        debug!("Using EXCLUSIVE sharing (graphics and present share a family)");
        (vk::SharingMode::EXCLUSIVE, &[][..])
    };

    let create_info = vk::SwapchainCreateInfoKHR::default()
        .surface(surface)
        .min_image_count(image_count)
        .image_format(surface_format.format)
        .image_color_space(surface_format.color_space)
        .image_extent(extent)
        .image_array_layers(1)
        .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
        .image_sharing_mode(sharing_mode)
        .queue_family_indices(queue_family_indices_slice)
        .pre_transform(support.capabilities.current_transform)
        .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
        .present_mode(present_mode)
        .clipped(true);

    let swapchain = unsafe { swapchain_loader.create_swapchain(&create_info, None)? };

    let images = unsafe { swapchain_loader.get_swapchain_images(swapchain)? };
    info!("Swapchain ready: {} image(s)", images.len());

    let image_views = create_image_views(device, &images, surface_format.format)?;

    Ok(ChainData {
        swapchain,
        images,
        image_views,
        format: surface_format.format,
        color_space: surface_format.color_space,
        extent,
        present_mode,
    })
}

/// Chooses the surface format.
///
/// Any 8-bit SRGB format with a nonlinear SRGB color space qualifies;
/// without one the first reported format is used as-is.
fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> vk::SurfaceFormatKHR {
    let preferred = formats.iter().find(|f| {
        matches!(
            f.format,
            vk::Format::B8G8R8A8_SRGB | vk::Format::R8G8B8A8_SRGB
        ) && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
    });

    if let Some(&format) = preferred {
        debug!("Selected SRGB surface format: {:?}", format.format);
        return format;
    }

    warn!(
        "No 8-bit SRGB surface format available, using {:?}",
        formats[0].format
    );
    formats[0]
}

/// Chooses the present mode.
///
/// MAILBOX gives low latency without tearing; FIFO is the only mode every
/// driver must support, so it is the fallback.
fn choose_present_mode(present_modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    if present_modes.contains(&vk::PresentModeKHR::MAILBOX) {
        debug!("Selected MAILBOX present mode");
        return vk::PresentModeKHR::MAILBOX;
    }

    debug!("Falling back to FIFO present mode (vsync)");
    vk::PresentModeKHR::FIFO
}

/// Chooses the swapchain extent.
///
/// A `u32::MAX` current extent means the surface lets the application
/// pick; the framebuffer size is then clamped to the surface limits.
fn choose_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    width: u32,
    height: u32,
) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        debug!(
            "Surface fixes the extent at {}x{}",
            capabilities.current_extent.width, capabilities.current_extent.height
        );
        return capabilities.current_extent;
    }

    let extent = vk::Extent2D {
        width: width.clamp(
            capabilities.min_image_extent.width,
            capabilities.max_image_extent.width,
        ),
        height: height.clamp(
            capabilities.min_image_extent.height,
            capabilities.max_image_extent.height,
        ),
    };

    debug!(
        "Calculated extent: {}x{} (requested: {}x{})",
        extent.width, extent.height, width, height
    );

    extent
}

/// Determines the number of swapchain images.
///
/// One above the minimum avoids stalling on the driver; a nonzero
/// maximum caps it (zero means unbounded).
fn determine_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let preferred = capabilities.min_image_count + 1;

    if capabilities.max_image_count > 0 {
        preferred.min(capabilities.max_image_count)
    } else {
        preferred
    }
}

/// Creates one color image view per swapchain image.
fn create_image_views(
    device: &Device,
    images: &[vk::Image],
    format: vk::Format,
) -> RhiResult<Vec<vk::ImageView>> {
    let mut image_views = Vec::with_capacity(images.len());

    for (i, &image) in images.iter().enumerate() {
        let create_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .components(vk::ComponentMapping {
                r: vk::ComponentSwizzle::IDENTITY,
                g: vk::ComponentSwizzle::IDENTITY,
                b: vk::ComponentSwizzle::IDENTITY,
                a: vk::ComponentSwizzle::IDENTITY,
            })
            .subresource_range(
                vk::ImageSubresourceRange::default()
                    .aspect_mask(vk::ImageAspectFlags::COLOR)
                    .base_mip_level(0)
                    .level_count(1)
                    .base_array_layer(0)
                    .layer_count(1),
            );

        let image_view = unsafe {
            device
                .handle()
                .create_image_view(&create_info, None)
                .map_err(|e| {
                    RhiError::SwapchainError(format!("image view {i} creation failed: {e:?}"))
                })?
        };

        image_views.push(image_view);
    }

    debug!("Created {} swapchain image views", image_views.len());
    Ok(image_views)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choose_surface_format_prefers_bgra_srgb() {
        let formats = vec![
            vk::SurfaceFormatKHR {
                format: vk::Format::R8G8B8A8_UNORM,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
            vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_SRGB,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
        ];

        let selected = choose_surface_format(&formats);
        assert_eq!(selected.format, vk::Format::B8G8R8A8_SRGB);
        assert_eq!(selected.color_space, vk::ColorSpaceKHR::SRGB_NONLINEAR);
    }

    #[test]
    fn test_choose_surface_format_accepts_rgba_srgb() {
        let formats = vec![
            vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_UNORM,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
            vk::SurfaceFormatKHR {
                format: vk::Format::R8G8B8A8_SRGB,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
        ];

        let selected = choose_surface_format(&formats);
        assert_eq!(selected.format, vk::Format::R8G8B8A8_SRGB);
    }

    #[test]
    fn test_choose_surface_format_requires_srgb_color_space() {
        // SRGB format in the wrong color space doesn't qualify
        let formats = vec![
            vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_SRGB,
                color_space: vk::ColorSpaceKHR::EXTENDED_SRGB_LINEAR_EXT,
            },
            vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_UNORM,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
        ];

        let selected = choose_surface_format(&formats);
        assert_eq!(selected.format, vk::Format::B8G8R8A8_SRGB);
        assert_eq!(
            selected.color_space,
            vk::ColorSpaceKHR::EXTENDED_SRGB_LINEAR_EXT
        );
    }

    #[test]
    fn test_choose_surface_format_falls_back_to_first() {
        let formats = vec![vk::SurfaceFormatKHR {
            format: vk::Format::R8G8B8A8_UNORM,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        }];

        let selected = choose_surface_format(&formats);
        assert_eq!(selected.format, vk::Format::R8G8B8A8_UNORM);
    }

    #[test]
    fn test_choose_present_mode_prefers_mailbox() {
        let modes = vec![
            vk::PresentModeKHR::FIFO,
            vk::PresentModeKHR::MAILBOX,
            vk::PresentModeKHR::IMMEDIATE,
        ];

        assert_eq!(choose_present_mode(&modes), vk::PresentModeKHR::MAILBOX);
    }

    #[test]
    fn test_choose_present_mode_falls_back_to_fifo() {
        let modes = vec![vk::PresentModeKHR::FIFO, vk::PresentModeKHR::IMMEDIATE];

        assert_eq!(choose_present_mode(&modes), vk::PresentModeKHR::FIFO);
    }

    #[test]
    fn test_choose_extent_uses_current() {
        let capabilities = vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D {
                width: 1920,
                height: 1080,
            },
            min_image_extent: vk::Extent2D {
                width: 1,
                height: 1,
            },
            max_image_extent: vk::Extent2D {
                width: 4096,
                height: 4096,
            },
            ..Default::default()
        };

        let extent = choose_extent(&capabilities, 800, 600);
        assert_eq!(extent.width, 1920);
        assert_eq!(extent.height, 1080);
    }

    #[test]
    fn test_choose_extent_clamps_to_limits() {
        let capabilities = vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D {
                width: u32::MAX,
                height: u32::MAX,
            },
            min_image_extent: vk::Extent2D {
                width: 100,
                height: 100,
            },
            max_image_extent: vk::Extent2D {
                width: 2000,
                height: 2000,
            },
            ..Default::default()
        };

        let too_big = choose_extent(&capabilities, 3000, 3000);
        assert_eq!(too_big.width, 2000);
        assert_eq!(too_big.height, 2000);

        let too_small = choose_extent(&capabilities, 50, 50);
        assert_eq!(too_small.width, 100);
        assert_eq!(too_small.height, 100);

        let in_range = choose_extent(&capabilities, 800, 600);
        assert_eq!(in_range.width, 800);
        assert_eq!(in_range.height, 600);
    }

    #[test]
    fn test_determine_image_count() {
        let capped = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 3,
            ..Default::default()
        };
        assert_eq!(determine_image_count(&capped), 3);

        let roomy = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 8,
            ..Default::default()
        };
        assert_eq!(determine_image_count(&roomy), 3);

        // max_image_count == 0 means no upper bound
        let unbounded = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 0,
            ..Default::default()
        };
        assert_eq!(determine_image_count(&unbounded), 3);

        // preferred already at the cap
        let tight = vk::SurfaceCapabilitiesKHR {
            min_image_count: 3,
            max_image_count: 3,
            ..Default::default()
        };
        assert_eq!(determine_image_count(&tight), 3);
    }

    #[test]
    fn test_swapchain_support_details_is_adequate() {
        let adequate = SwapchainSupportDetails {
            capabilities: vk::SurfaceCapabilitiesKHR::default(),
            formats: vec![vk::SurfaceFormatKHR::default()],
            present_modes: vec![vk::PresentModeKHR::FIFO],
        };
        assert!(adequate.is_adequate());

        let no_formats = SwapchainSupportDetails {
            capabilities: vk::SurfaceCapabilitiesKHR::default(),
            formats: vec![],
            present_modes: vec![vk::PresentModeKHR::FIFO],
        };
        assert!(!no_formats.is_adequate());

        let no_modes = SwapchainSupportDetails {
            capabilities: vk::SurfaceCapabilitiesKHR::default(),
            formats: vec![vk::SurfaceFormatKHR::default()],
            present_modes: vec![],
        };
        assert!(!no_modes.is_adequate());
    }
}
