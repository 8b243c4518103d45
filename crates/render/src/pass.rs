//! Render pass containers and the enqueue staging state.
//!
//! A [`RenderPassContainer`] bundles everything one named logical pass
//! needs to dispatch: the pass object, its graphics pipeline, clear
//! values, framebuffers, and any offscreen images it owns. Present
//! passes hold one framebuffer per swapchain image and follow the
//! swapchain's rotation; offscreen passes hold one per frame in flight
//! and follow the frame rotation. The two cardinalities are distinct
//! and never interchangeable.
//!
//! Enqueueing stages a framebuffer index, a draw area, and a delegate
//! on the container. Staging is last-write-wins: if a name is enqueued
//! twice before dispatch, both dispatches run with the most recently
//! staged state. Delegates live for exactly one `render_frame` call
//! and are reset to a no-op afterwards.

use std::path::PathBuf;
use std::sync::Arc;

use ash::vk;
use tracing::debug;

use kiln_rhi::device::Device;
use kiln_rhi::framebuffer::Framebuffer;
use kiln_rhi::image::{DEFAULT_DEPTH_FORMAT, RenderImage};
use kiln_rhi::pipeline::{Pipeline, PipelineConfig};
use kiln_rhi::render_pass::{
    RenderPass, RenderPassConfig as RhiRenderPassConfig, RenderPassKind,
};
use kiln_rhi::swapchain::Swapchain;
use kiln_rhi::vertex::VertexLayout;

use crate::error::{RenderError, RenderResult};

/// Ephemeral per-dispatch state handed to a pass delegate.
///
/// Valid only for the duration of the delegate call; never store it.
/// The command buffer is already inside the pass's begin/end bracket
/// with the pipeline bound and viewport/scissor set.
#[derive(Clone, Copy, Debug)]
pub struct RenderPassContext {
    /// Raw command buffer currently recording.
    pub command_buffer: vk::CommandBuffer,
    /// Layout of the pass's pipeline, for push constants and
    /// descriptor binds.
    pub pipeline_layout: vk::PipelineLayout,
    /// Swapchain image index this frame renders to.
    pub image_index: u32,
    /// Frame-in-flight index (0..MAX_FRAMES_IN_FLIGHT).
    pub frame_index: u32,
}

/// Client callback recording draw commands for one pass dispatch.
pub type RenderPassDelegate = Box<dyn FnMut(RenderPassContext)>;

/// Delegate that records nothing. Containers rest in this state
/// between frames.
pub(crate) fn noop_delegate() -> RenderPassDelegate {
    Box::new(|_| {})
}

/// Plain-data description of a logical render pass.
///
/// Used by both `add_render_pass` (offscreen) and `add_present_pass`;
/// the registration call decides the pass kind and where its
/// framebuffers come from.
#[derive(Debug)]
pub struct RenderPassConfig {
    /// Color attachment format. `None` means the swapchain's format.
    pub color_format: Option<vk::Format>,
    /// Attach a depth buffer and enable depth test/write.
    pub depth: bool,
    /// Clear color for the color attachment.
    pub clear_color: [f32; 4],
    /// Offscreen target size. `None` means the swapchain extent at
    /// registration time. Ignored for present passes.
    pub extent: Option<vk::Extent2D>,
    /// Path to the SPIR-V vertex shader.
    pub vertex_shader_path: PathBuf,
    /// Path to the SPIR-V fragment shader.
    pub fragment_shader_path: PathBuf,
    /// Vertex input layout for the pipeline.
    pub vertex_layout: VertexLayout,
    /// Push constant ranges visible to the shaders.
    pub push_constant_ranges: Vec<vk::PushConstantRange>,
    /// Descriptor set layouts bound by the shaders.
    pub descriptor_set_layouts: Vec<vk::DescriptorSetLayout>,
}

impl Default for RenderPassConfig {
    fn default() -> Self {
        Self {
            color_format: None,
            depth: false,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            extent: None,
            vertex_shader_path: PathBuf::new(),
            fragment_shader_path: PathBuf::new(),
            vertex_layout: VertexLayout::default(),
            push_constant_ranges: Vec::new(),
            descriptor_set_layouts: Vec::new(),
        }
    }
}

/// Pending dispatch state, refreshed on every enqueue.
pub(crate) struct PassStage {
    /// Framebuffer the next dispatch targets.
    pub(crate) framebuffer_index: usize,
    /// Render area for the next dispatch.
    pub(crate) area: vk::Rect2D,
    /// Delegate invoked inside the pass bracket.
    pub(crate) delegate: RenderPassDelegate,
}

impl Default for PassStage {
    fn default() -> Self {
        Self {
            framebuffer_index: 0,
            area: vk::Rect2D::default(),
            delegate: noop_delegate(),
        }
    }
}

impl PassStage {
    /// Replaces the pending state. Last write before dispatch wins.
    pub(crate) fn set(
        &mut self,
        framebuffer_index: usize,
        area: vk::Rect2D,
        delegate: RenderPassDelegate,
    ) {
        self.framebuffer_index = framebuffer_index;
        self.area = area;
        self.delegate = delegate;
    }

    /// Drops the staged delegate, restoring the no-op.
    pub(crate) fn clear(&mut self) {
        self.delegate = noop_delegate();
    }
}

/// Rejects framebuffer indices a pass does not own.
///
/// Runs at enqueue time, before any GPU call; an out-of-range index is
/// a registration bug, not a runtime condition.
pub(crate) fn validate_framebuffer_index(
    pass: &str,
    index: usize,
    count: usize,
) -> RenderResult<()> {
    if index >= count {
        return Err(RenderError::FramebufferIndexOutOfRange {
            pass: pass.to_owned(),
            index,
            count,
        });
    }
    Ok(())
}

/// One registered logical render pass and everything it dispatches
/// with.
///
/// Field order fixes teardown: framebuffers are destroyed before the
/// image views they bind (owned color/depth targets below, swapchain
/// views by the renderer's own field order).
pub struct RenderPassContainer {
    pub(crate) pass: RenderPass,
    pub(crate) pipeline: Pipeline,
    pub(crate) clear_values: Vec<vk::ClearValue>,
    pub(crate) framebuffers: Vec<Framebuffer>,
    pub(crate) color_targets: Vec<RenderImage>,
    pub(crate) depth_target: Option<RenderImage>,
    pub(crate) stage: PassStage,
    device: Arc<Device>,
}

impl RenderPassContainer {
    /// Builds a present-kind container: pass + pipeline from the
    /// config, one depth image when declared, and one framebuffer per
    /// swapchain image over the swapchain's views.
    pub(crate) fn new_present(
        device: Arc<Device>,
        swapchain: &Swapchain,
        config: &RenderPassConfig,
    ) -> RenderResult<Self> {
        let color_format = config.color_format.unwrap_or_else(|| swapchain.format());
        let mut container = Self::build(device, RenderPassKind::Present, color_format, config)?;
        container.rebuild_swapchain_framebuffers(swapchain)?;
        Ok(container)
    }

    /// Builds an offscreen-kind container: pass + pipeline, one color
    /// target and framebuffer per frame in flight at the given extent,
    /// and one shared depth image when declared.
    pub(crate) fn new_offscreen(
        device: Arc<Device>,
        frames: usize,
        extent: vk::Extent2D,
        fallback_format: vk::Format,
        config: &RenderPassConfig,
    ) -> RenderResult<Self> {
        let color_format = config.color_format.unwrap_or(fallback_format);
        let mut container =
            Self::build(device.clone(), RenderPassKind::Offscreen, color_format, config)?;

        if container.pass.has_depth() {
            container.depth_target = Some(RenderImage::new_depth(
                device.clone(),
                extent.width,
                extent.height,
                DEFAULT_DEPTH_FORMAT,
            )?);
        }

        for _ in 0..frames {
            container.color_targets.push(RenderImage::new_color_target(
                device.clone(),
                extent.width,
                extent.height,
                color_format,
            )?);
        }

        for target in &container.color_targets {
            let mut attachments = vec![target.view()];
            if let Some(depth) = &container.depth_target {
                attachments.push(depth.view());
            }
            container.framebuffers.push(Framebuffer::new(
                device.clone(),
                container.pass.handle(),
                extent,
                &attachments,
            )?);
        }

        debug!(
            "Built offscreen pass targets: {} framebuffer(s) at {}x{}",
            frames, extent.width, extent.height
        );

        Ok(container)
    }

    /// Pass + pipeline + clear values, no framebuffers yet.
    fn build(
        device: Arc<Device>,
        kind: RenderPassKind,
        color_format: vk::Format,
        config: &RenderPassConfig,
    ) -> RenderResult<Self> {
        let depth_format = config.depth.then_some(DEFAULT_DEPTH_FORMAT);

        let pass = RenderPass::new(
            device.clone(),
            &RhiRenderPassConfig {
                color_format,
                kind,
                depth_format,
            },
        )?;

        let pipeline = Pipeline::new(
            device.clone(),
            &PipelineConfig {
                render_pass: pass.handle(),
                vertex_layout: config.vertex_layout.clone(),
                vertex_shader_path: config.vertex_shader_path.clone(),
                fragment_shader_path: config.fragment_shader_path.clone(),
                push_constant_ranges: config.push_constant_ranges.clone(),
                descriptor_set_layouts: config.descriptor_set_layouts.clone(),
                depth_test: config.depth,
            },
        )?;

        let mut clear_values = vec![vk::ClearValue {
            color: vk::ClearColorValue {
                float32: config.clear_color,
            },
        }];
        if config.depth {
            clear_values.push(vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue {
                    depth: 1.0,
                    stencil: 0,
                },
            });
        }

        Ok(Self {
            pass,
            pipeline,
            clear_values,
            framebuffers: Vec::new(),
            color_targets: Vec::new(),
            depth_target: None,
            stage: PassStage::default(),
            device,
        })
    }

    /// (Re)builds the framebuffer list over the current swapchain
    /// views, one per image, recreating the depth image when its
    /// extent no longer matches.
    ///
    /// Idempotent for an unchanged swapchain. The caller must ensure
    /// no submitted work still references the old framebuffers.
    pub(crate) fn rebuild_swapchain_framebuffers(
        &mut self,
        swapchain: &Swapchain,
    ) -> RenderResult<()> {
        let extent = swapchain.extent();

        if self.pass.has_depth() {
            let stale = self
                .depth_target
                .as_ref()
                .is_none_or(|depth| depth.extent() != extent);
            if stale {
                self.depth_target = Some(RenderImage::new_depth(
                    self.device.clone(),
                    extent.width,
                    extent.height,
                    DEFAULT_DEPTH_FORMAT,
                )?);
            }
        }

        self.framebuffers.clear();
        self.framebuffers = build_swapchain_framebuffers(
            &self.device,
            &self.pass,
            self.depth_target.as_ref(),
            swapchain,
        )?;

        debug!(
            "Rebuilt {} swapchain framebuffer(s) at {}x{}",
            self.framebuffers.len(),
            extent.width,
            extent.height
        );

        Ok(())
    }

    /// Returns the pass kind.
    #[inline]
    pub fn kind(&self) -> RenderPassKind {
        self.pass.kind()
    }

    /// Number of framebuffers this pass currently owns.
    #[inline]
    pub fn framebuffer_count(&self) -> usize {
        self.framebuffers.len()
    }
}

/// Builds one framebuffer per swapchain image over the swapchain's
/// views, appending `depth` when the pass declares it.
///
/// Pure function of the swapchain state: the same swapchain yields a
/// list of the same length and extents every time.
pub(crate) fn build_swapchain_framebuffers(
    device: &Arc<Device>,
    pass: &RenderPass,
    depth: Option<&RenderImage>,
    swapchain: &Swapchain,
) -> RenderResult<Vec<Framebuffer>> {
    let extent = swapchain.extent();
    let mut framebuffers = Vec::with_capacity(swapchain.image_count() as usize);

    for index in 0..swapchain.image_count() as usize {
        let mut attachments = vec![swapchain.image_view(index)];
        if let Some(depth) = depth {
            attachments.push(depth.view());
        }
        framebuffers.push(Framebuffer::new(
            device.clone(),
            pass.handle(),
            extent,
            &attachments,
        )?);
    }

    Ok(framebuffers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn null_context() -> RenderPassContext {
        RenderPassContext {
            command_buffer: vk::CommandBuffer::null(),
            pipeline_layout: vk::PipelineLayout::null(),
            image_index: 0,
            frame_index: 0,
        }
    }

    #[test]
    fn test_stage_last_set_wins() {
        let counter = Rc::new(Cell::new(0u32));
        let mut stage = PassStage::default();

        let c = counter.clone();
        stage.set(
            0,
            vk::Rect2D::default(),
            Box::new(move |_| c.set(c.get() + 1)),
        );
        let c = counter.clone();
        stage.set(
            1,
            vk::Rect2D::default(),
            Box::new(move |_| c.set(c.get() + 10)),
        );

        (stage.delegate)(null_context());
        assert_eq!(counter.get(), 10);
        assert_eq!(stage.framebuffer_index, 1);
    }

    #[test]
    fn test_cleared_stage_records_nothing() {
        let counter = Rc::new(Cell::new(0u32));
        let mut stage = PassStage::default();

        let c = counter.clone();
        stage.set(
            0,
            vk::Rect2D::default(),
            Box::new(move |_| c.set(c.get() + 1)),
        );
        stage.clear();

        (stage.delegate)(null_context());
        assert_eq!(counter.get(), 0);
    }

    #[test]
    fn test_framebuffer_index_validation() {
        assert!(validate_framebuffer_index("pass", 2, 3).is_ok());
        assert!(validate_framebuffer_index("pass", 0, 1).is_ok());

        let err = validate_framebuffer_index("present", 5, 3).unwrap_err();
        match err {
            RenderError::FramebufferIndexOutOfRange { pass, index, count } => {
                assert_eq!(pass, "present");
                assert_eq!(index, 5);
                assert_eq!(count, 3);
            }
            other => panic!("unexpected error: {other}"),
        }

        // A pass with no framebuffers accepts nothing
        assert!(validate_framebuffer_index("empty", 0, 0).is_err());
    }

    #[test]
    fn test_context_is_copy() {
        fn assert_copy<T: Copy>() {}
        assert_copy::<RenderPassContext>();
    }

    #[test]
    fn test_config_default_targets_swapchain() {
        let config = RenderPassConfig::default();
        assert!(config.color_format.is_none());
        assert!(config.extent.is_none());
        assert!(!config.depth);
        assert_eq!(config.clear_color, [0.0, 0.0, 0.0, 1.0]);
    }
}
