//! Classic render pass objects.
//!
//! [`RenderPass`] wraps a single-subpass `VkRenderPass` with one color
//! attachment and an optional depth attachment. The pass kind decides
//! the color attachment's final layout: [`RenderPassKind::Present`]
//! hands the image to the presentation engine, while
//! [`RenderPassKind::Offscreen`] leaves it attachment-optimal for later
//! passes to consume.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use kiln_rhi::device::Device;
//! use kiln_rhi::render_pass::{RenderPass, RenderPassConfig, RenderPassKind};
//! use ash::vk;
//!
//! # fn example(device: Arc<Device>) -> Result<(), kiln_rhi::RhiError> {
//! let pass = RenderPass::new(
//!     device,
//!     &RenderPassConfig {
//!         color_format: vk::Format::B8G8R8A8_SRGB,
//!         kind: RenderPassKind::Present,
//!         depth_format: None,
//!     },
//! )?;
//! let _handle = pass.handle();
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::device::Device;
use crate::error::RhiResult;

/// What happens to the color attachment after the pass ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderPassKind {
    /// Renders into an offscreen target; the image stays
    /// attachment-optimal for downstream passes.
    Offscreen,
    /// Renders into a swapchain image and transitions it for
    /// presentation.
    Present,
}

/// Plain-data description of a render pass.
#[derive(Clone, Copy, Debug)]
pub struct RenderPassConfig {
    /// Format of the color attachment.
    pub color_format: vk::Format,
    /// Destination of the color output.
    pub kind: RenderPassKind,
    /// Depth attachment format, if the pass depth-tests.
    pub depth_format: Option<vk::Format>,
}

/// Single-subpass render pass wrapper.
pub struct RenderPass {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan render pass handle.
    render_pass: vk::RenderPass,
    /// Pass kind the attachments were described for.
    kind: RenderPassKind,
    /// Color attachment format.
    color_format: vk::Format,
    /// Depth attachment format, when enabled.
    depth_format: Option<vk::Format>,
}

impl RenderPass {
    /// Creates a render pass from its description.
    ///
    /// The color attachment clears on load and stores; the optional
    /// depth attachment (index 1) clears depth and stencil on load.
    /// Both start in `UNDEFINED`, so previous contents are discarded.
    ///
    /// # Errors
    ///
    /// Returns an error if render pass creation fails.
    pub fn new(device: Arc<Device>, config: &RenderPassConfig) -> RhiResult<Self> {
        let color_attachment = vk::AttachmentDescription::default()
            .format(config.color_format)
            .samples(vk::SampleCountFlags::TYPE_1)
            .load_op(vk::AttachmentLoadOp::CLEAR)
            .store_op(vk::AttachmentStoreOp::STORE)
            .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
            .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .final_layout(color_final_layout(config.kind));

        let mut attachments = vec![color_attachment];

        let color_refs = [vk::AttachmentReference {
            attachment: 0,
            layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        }];
        let depth_ref = vk::AttachmentReference {
            attachment: 1,
            layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        };

        let mut subpass = vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&color_refs);

        if let Some(depth_format) = config.depth_format {
            let depth_attachment = vk::AttachmentDescription::default()
                .format(depth_format)
                .samples(vk::SampleCountFlags::TYPE_1)
                .load_op(vk::AttachmentLoadOp::CLEAR)
                .store_op(vk::AttachmentStoreOp::STORE)
                .stencil_load_op(vk::AttachmentLoadOp::CLEAR)
                .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                .initial_layout(vk::ImageLayout::UNDEFINED)
                .final_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);

            attachments.push(depth_attachment);
            subpass = subpass.depth_stencil_attachment(&depth_ref);
        }

        let subpasses = [subpass];
        let dependencies = subpass_dependencies(config.kind, config.depth_format.is_some());

        let create_info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(&subpasses)
            .dependencies(&dependencies);

        let render_pass = unsafe { device.handle().create_render_pass(&create_info, None)? };

        debug!(
            "Created {:?} render pass ({:?}, depth: {})",
            config.kind,
            config.color_format,
            config.depth_format.is_some()
        );

        Ok(Self {
            device,
            render_pass,
            kind: config.kind,
            color_format: config.color_format,
            depth_format: config.depth_format,
        })
    }

    /// Returns the Vulkan render pass handle.
    #[inline]
    pub fn handle(&self) -> vk::RenderPass {
        self.render_pass
    }

    /// Returns the pass kind.
    #[inline]
    pub fn kind(&self) -> RenderPassKind {
        self.kind
    }

    /// Returns the color attachment format.
    #[inline]
    pub fn color_format(&self) -> vk::Format {
        self.color_format
    }

    /// Returns the depth attachment format, when the pass has one.
    #[inline]
    pub fn depth_format(&self) -> Option<vk::Format> {
        self.depth_format
    }

    /// True if the pass carries a depth attachment.
    #[inline]
    pub fn has_depth(&self) -> bool {
        self.depth_format.is_some()
    }
}

impl Drop for RenderPass {
    fn drop(&mut self) {
        unsafe {
            self.device
                .handle()
                .destroy_render_pass(self.render_pass, None);
        }
        debug!("Destroyed {:?} render pass", self.kind);
    }
}

/// Final layout of the color attachment per pass kind.
fn color_final_layout(kind: RenderPassKind) -> vk::ImageLayout {
    match kind {
        RenderPassKind::Offscreen => vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        RenderPassKind::Present => vk::ImageLayout::PRESENT_SRC_KHR,
    }
}

/// External dependencies guarding the attachment layout transitions.
fn subpass_dependencies(kind: RenderPassKind, has_depth: bool) -> Vec<vk::SubpassDependency> {
    match kind {
        RenderPassKind::Present => {
            // Chained to the semaphore wait at color-attachment-output;
            // the acquire has finished by the time writes begin.
            let mut stages = vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT;
            let mut dst_access = vk::AccessFlags::COLOR_ATTACHMENT_WRITE;
            if has_depth {
                stages |= vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS;
                dst_access |= vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE;
            }

            vec![
                vk::SubpassDependency::default()
                    .src_subpass(vk::SUBPASS_EXTERNAL)
                    .dst_subpass(0)
                    .src_stage_mask(stages)
                    .dst_stage_mask(stages)
                    .src_access_mask(vk::AccessFlags::empty())
                    .dst_access_mask(dst_access),
            ]
        }
        RenderPassKind::Offscreen => {
            let mut dependencies = vec![
                vk::SubpassDependency::default()
                    .src_subpass(vk::SUBPASS_EXTERNAL)
                    .dst_subpass(0)
                    .src_stage_mask(vk::PipelineStageFlags::BOTTOM_OF_PIPE)
                    .dst_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
                    .src_access_mask(vk::AccessFlags::MEMORY_READ)
                    .dst_access_mask(
                        vk::AccessFlags::COLOR_ATTACHMENT_READ
                            | vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
                    )
                    .dependency_flags(vk::DependencyFlags::BY_REGION),
            ];

            if has_depth {
                // Make the results visible to whatever reads them next
                dependencies.push(
                    vk::SubpassDependency::default()
                        .src_subpass(0)
                        .dst_subpass(vk::SUBPASS_EXTERNAL)
                        .src_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
                        .dst_stage_mask(vk::PipelineStageFlags::BOTTOM_OF_PIPE)
                        .src_access_mask(
                            vk::AccessFlags::COLOR_ATTACHMENT_READ
                                | vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
                        )
                        .dst_access_mask(vk::AccessFlags::MEMORY_READ)
                        .dependency_flags(vk::DependencyFlags::BY_REGION),
                );
            }

            dependencies
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_present_pass_ends_presentable() {
        assert_eq!(
            color_final_layout(RenderPassKind::Present),
            vk::ImageLayout::PRESENT_SRC_KHR
        );
    }

    #[test]
    fn test_offscreen_pass_stays_attachment_optimal() {
        assert_eq!(
            color_final_layout(RenderPassKind::Offscreen),
            vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL
        );
    }

    #[test]
    fn test_offscreen_depth_adds_reverse_dependency() {
        assert_eq!(subpass_dependencies(RenderPassKind::Offscreen, false).len(), 1);
        assert_eq!(subpass_dependencies(RenderPassKind::Offscreen, true).len(), 2);
        assert_eq!(subpass_dependencies(RenderPassKind::Present, true).len(), 1);
    }
}
