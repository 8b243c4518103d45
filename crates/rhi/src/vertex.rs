//! Vertex input layout description.
//!
//! [`VertexLayout`] is the plain-data description of a pipeline's vertex
//! input state: which buffer bindings exist and which attributes read
//! from them. Pipelines that generate geometry in the vertex shader use
//! [`VertexLayout::empty`].

use ash::vk;

/// Vertex input bindings and attributes for one pipeline.
///
/// The descriptions are passed through to
/// `VkPipelineVertexInputStateCreateInfo` untouched; this struct only
/// keeps them together and owned.
#[derive(Clone, Debug, Default)]
pub struct VertexLayout {
    /// Buffer bindings (stride and input rate per bound buffer).
    pub bindings: Vec<vk::VertexInputBindingDescription>,
    /// Attributes (location, format, offset) reading from the bindings.
    pub attributes: Vec<vk::VertexInputAttributeDescription>,
}

impl VertexLayout {
    /// A layout with no bindings and no attributes.
    ///
    /// For pipelines whose vertex shader derives positions from the
    /// vertex index alone.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A single interleaved vertex buffer at binding 0.
    ///
    /// `stride` is the byte distance between consecutive vertices;
    /// `attributes` must reference binding 0.
    pub fn interleaved(stride: u32, attributes: Vec<vk::VertexInputAttributeDescription>) -> Self {
        Self {
            bindings: vec![vk::VertexInputBindingDescription {
                binding: 0,
                stride,
                input_rate: vk::VertexInputRate::VERTEX,
            }],
            attributes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_layout_has_no_inputs() {
        let layout = VertexLayout::empty();
        assert!(layout.bindings.is_empty());
        assert!(layout.attributes.is_empty());
    }

    #[test]
    fn test_interleaved_layout_single_binding() {
        let attributes = vec![
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 0,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: 0,
            },
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 1,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: 12,
            },
        ];

        let layout = VertexLayout::interleaved(24, attributes);

        assert_eq!(layout.bindings.len(), 1);
        assert_eq!(layout.bindings[0].binding, 0);
        assert_eq!(layout.bindings[0].stride, 24);
        assert_eq!(layout.bindings[0].input_rate, vk::VertexInputRate::VERTEX);
        assert_eq!(layout.attributes.len(), 2);
    }
}
