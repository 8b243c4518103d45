//! Graphics pipeline creation.
//!
//! [`Pipeline`] wraps a graphics `VkPipeline` together with the
//! `VkPipelineLayout` it was built against. Pipelines come from a plain
//! [`PipelineConfig`]: render pass, vertex layout, shader paths, and
//! the resource interface (push constants, descriptor set layouts).
//!
//! Fixed-function state is deliberately opinionated: triangle lists,
//! filled polygons, back-face culling with counter-clockwise front
//! faces, no blending, and dynamic viewport/scissor so pipelines
//! survive swapchain rebuilds. Depth test and write follow
//! [`PipelineConfig::depth_test`].
//!
//! # Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use std::sync::Arc;
//! use kiln_rhi::device::Device;
//! use kiln_rhi::pipeline::{Pipeline, PipelineConfig};
//! use ash::vk;
//!
//! # fn example(device: Arc<Device>, render_pass: vk::RenderPass) -> Result<(), kiln_rhi::RhiError> {
//! let pipeline = Pipeline::new(
//!     device,
//!     &PipelineConfig {
//!         render_pass,
//!         vertex_shader_path: PathBuf::from("shaders/main.vert.spv"),
//!         fragment_shader_path: PathBuf::from("shaders/main.frag.spv"),
//!         ..Default::default()
//!     },
//! )?;
//! let _layout = pipeline.layout();
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use ash::vk;
use tracing::{debug, info};

use crate::device::Device;
use crate::error::{RhiError, RhiResult};
use crate::shader::{Shader, ShaderStage};
use crate::vertex::VertexLayout;

/// Plain-data description of a graphics pipeline.
#[derive(Clone, Debug, Default)]
pub struct PipelineConfig {
    /// Render pass the pipeline executes in (subpass 0).
    pub render_pass: vk::RenderPass,
    /// Vertex input bindings and attributes.
    pub vertex_layout: VertexLayout,
    /// Path to the SPIR-V vertex shader.
    pub vertex_shader_path: PathBuf,
    /// Path to the SPIR-V fragment shader.
    pub fragment_shader_path: PathBuf,
    /// Push constant ranges visible to the shaders.
    pub push_constant_ranges: Vec<vk::PushConstantRange>,
    /// Descriptor set layouts bound by the shaders.
    pub descriptor_set_layouts: Vec<vk::DescriptorSetLayout>,
    /// Enable depth test and write. Requires the render pass to carry
    /// a depth attachment.
    pub depth_test: bool,
}

/// Graphics pipeline plus the layout it owns.
///
/// # Thread Safety
///
/// Immutable after creation; safe to share between threads.
pub struct Pipeline {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan pipeline handle.
    pipeline: vk::Pipeline,
    /// Layout describing push constants and descriptor sets.
    layout: vk::PipelineLayout,
}

impl Pipeline {
    /// Creates a graphics pipeline from its description.
    ///
    /// Shader modules are loaded from the configured paths and
    /// released once the pipeline exists.
    ///
    /// # Errors
    ///
    /// Returns an error if a shader file fails to load or if layout or
    /// pipeline creation fails.
    pub fn new(device: Arc<Device>, config: &PipelineConfig) -> RhiResult<Self> {
        let vertex_shader = Shader::from_spirv_file(
            device.clone(),
            &config.vertex_shader_path,
            ShaderStage::Vertex,
            "main",
        )?;
        let fragment_shader = Shader::from_spirv_file(
            device.clone(),
            &config.fragment_shader_path,
            ShaderStage::Fragment,
            "main",
        )?;

        let layout_info = vk::PipelineLayoutCreateInfo::default()
            .set_layouts(&config.descriptor_set_layouts)
            .push_constant_ranges(&config.push_constant_ranges);

        let layout = unsafe { device.handle().create_pipeline_layout(&layout_info, None)? };

        debug!(
            "Pipeline layout: {} set layout(s), {} push constant range(s)",
            config.descriptor_set_layouts.len(),
            config.push_constant_ranges.len()
        );

        let shader_stages = [
            vertex_shader.stage_create_info(),
            fragment_shader.stage_create_info(),
        ];

        let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&config.vertex_layout.bindings)
            .vertex_attribute_descriptions(&config.vertex_layout.attributes);

        let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
            .primitive_restart_enable(false);

        // Viewport and scissor are dynamic; only the counts matter here.
        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewport_count(1)
            .scissor_count(1);

        let rasterization_state = vk::PipelineRasterizationStateCreateInfo::default()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(vk::PolygonMode::FILL)
            .line_width(1.0)
            .cull_mode(vk::CullModeFlags::BACK)
            .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
            .depth_bias_enable(false);

        let multisample_state = vk::PipelineMultisampleStateCreateInfo::default()
            .sample_shading_enable(false)
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);

        let depth_stencil_state = vk::PipelineDepthStencilStateCreateInfo::default()
            .depth_test_enable(config.depth_test)
            .depth_write_enable(config.depth_test)
            .depth_compare_op(vk::CompareOp::LESS)
            .depth_bounds_test_enable(false)
            .stencil_test_enable(false);

        let color_blend_attachments = [vk::PipelineColorBlendAttachmentState {
            blend_enable: vk::FALSE,
            color_write_mask: vk::ColorComponentFlags::RGBA,
            ..Default::default()
        }];

        let color_blend_state = vk::PipelineColorBlendStateCreateInfo::default()
            .logic_op_enable(false)
            .attachments(&color_blend_attachments);

        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_state =
            vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&dynamic_states);

        let pipeline_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&shader_stages)
            .vertex_input_state(&vertex_input_state)
            .input_assembly_state(&input_assembly_state)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization_state)
            .multisample_state(&multisample_state)
            .depth_stencil_state(&depth_stencil_state)
            .color_blend_state(&color_blend_state)
            .dynamic_state(&dynamic_state)
            .layout(layout)
            .render_pass(config.render_pass)
            .subpass(0);

        let pipeline = match unsafe {
            device
                .handle()
                .create_graphics_pipelines(vk::PipelineCache::null(), &[pipeline_info], None)
        } {
            Ok(pipelines) => pipelines[0],
            Err((_, result)) => {
                unsafe { device.handle().destroy_pipeline_layout(layout, None) };
                return Err(RhiError::PipelineError(format!(
                    "graphics pipeline creation failed: {result:?}"
                )));
            }
        };

        info!(
            "Graphics pipeline created ({:?} + {:?})",
            config.vertex_shader_path, config.fragment_shader_path
        );

        Ok(Self {
            device,
            pipeline,
            layout,
        })
    }

    /// Returns the Vulkan pipeline handle.
    #[inline]
    pub fn handle(&self) -> vk::Pipeline {
        self.pipeline
    }

    /// Returns the pipeline layout handle.
    #[inline]
    pub fn layout(&self) -> vk::PipelineLayout {
        self.layout
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_pipeline(self.pipeline, None);
            self.device.handle().destroy_pipeline_layout(self.layout, None);
        }
        debug!("Graphics pipeline destroyed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_config_default_is_empty() {
        let config = PipelineConfig::default();
        assert_eq!(config.render_pass, vk::RenderPass::null());
        assert!(config.vertex_layout.bindings.is_empty());
        assert!(config.push_constant_ranges.is_empty());
        assert!(config.descriptor_set_layouts.is_empty());
        assert!(!config.depth_test);
    }

    #[test]
    fn test_pipeline_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Pipeline>();
    }
}
