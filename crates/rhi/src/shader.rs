//! Shader module management.
//!
//! Loads SPIR-V binaries from disk or memory and wraps the resulting
//! `VkShaderModule` together with its stage and entry point, ready to
//! plug into pipeline creation.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::path::Path;
//! use kiln_rhi::device::Device;
//! use kiln_rhi::shader::{Shader, ShaderStage};
//!
//! # fn example(device: Arc<Device>) -> Result<(), kiln_rhi::RhiError> {
//! let vertex_shader = Shader::from_spirv_file(
//!     device.clone(),
//!     Path::new("shaders/triangle.vert.spv"),
//!     ShaderStage::Vertex,
//!     "main",
//! )?;
//!
//! let fragment_shader = Shader::from_spirv_file(
//!     device.clone(),
//!     Path::new("shaders/triangle.frag.spv"),
//!     ShaderStage::Fragment,
//!     "main",
//! )?;
//!
//! let _stages = [
//!     vertex_shader.stage_create_info(),
//!     fragment_shader.stage_create_info(),
//! ];
//! # Ok(())
//! # }
//! ```

use std::ffi::CString;
use std::path::Path;
use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::device::Device;
use crate::error::{RhiError, RhiResult};

/// Pipeline stage a shader module is compiled for.
///
/// The raster pipelines built here use exactly these two stages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex shader stage
    Vertex,
    /// Fragment shader stage
    Fragment,
}

impl ShaderStage {
    /// Maps the stage to its `vk::ShaderStageFlags` bit.
    pub fn to_vk_stage(self) -> vk::ShaderStageFlags {
        match self {
            ShaderStage::Vertex => vk::ShaderStageFlags::VERTEX,
            ShaderStage::Fragment => vk::ShaderStageFlags::FRAGMENT,
        }
    }

    /// Lowercase stage name, for logs and messages.
    pub fn name(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        }
    }
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A compiled SPIR-V module plus the metadata pipelines need from it.
///
/// Immutable after creation; the module is destroyed on drop. Pipelines
/// only need the module during creation, so shaders can be dropped once
/// the pipeline exists.
pub struct Shader {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan shader module handle.
    module: vk::ShaderModule,
    /// Stage the module was compiled for.
    stage: ShaderStage,
    /// Entry function name, NUL-terminated for the create info.
    entry_point: CString,
}

impl Shader {
    /// Creates a shader module from a SPIR-V file on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the SPIR-V data is
    /// misaligned, or module creation fails.
    pub fn from_spirv_file(
        device: Arc<Device>,
        path: &Path,
        stage: ShaderStage,
        entry_point: &str,
    ) -> RhiResult<Self> {
        debug!("Loading {stage} shader from {path:?}");

        let bytes = std::fs::read(path).map_err(|e| {
            RhiError::ShaderError(format!("could not read SPIR-V file {path:?}: {e}"))
        })?;

        Self::from_spirv_bytes(device, &bytes, stage, entry_point)
    }

    /// Creates a shader module from SPIR-V bytes in memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the byte length is not a multiple of 4, the
    /// entry point name contains interior NUL bytes, or module creation
    /// fails.
    pub fn from_spirv_bytes(
        device: Arc<Device>,
        bytes: &[u8],
        stage: ShaderStage,
        entry_point: &str,
    ) -> RhiResult<Self> {
        let code = spirv_words(bytes)?;

        let create_info = vk::ShaderModuleCreateInfo::default().code(&code);

        let module = unsafe { device.handle().create_shader_module(&create_info, None)? };

        let entry_point_cstring = CString::new(entry_point)
            .map_err(|e| RhiError::ShaderError(format!("entry point name has a NUL byte: {e}")))?;

        debug!("Created {stage} shader module, entry point '{entry_point}'");

        Ok(Self {
            device,
            module,
            stage,
            entry_point: entry_point_cstring,
        })
    }

    /// Returns the Vulkan shader module handle.
    #[inline]
    pub fn handle(&self) -> vk::ShaderModule {
        self.module
    }

    /// Returns the shader stage.
    #[inline]
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    /// Returns the entry point function name.
    #[inline]
    pub fn entry_point(&self) -> &std::ffi::CStr {
        &self.entry_point
    }

    /// Builds the pipeline stage description for this shader.
    ///
    /// The returned structure borrows from this shader and must not
    /// outlive it.
    pub fn stage_create_info(&self) -> vk::PipelineShaderStageCreateInfo<'_> {
        vk::PipelineShaderStageCreateInfo::default()
            .stage(self.stage.to_vk_stage())
            .module(self.module)
            .name(&self.entry_point)
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        unsafe {
            self.device
                .handle()
                .destroy_shader_module(self.module, None);
        }
        debug!("Dropped {} shader module", self.stage);
    }
}

/// Repacks SPIR-V bytes into the little-endian code words Vulkan wants.
fn spirv_words(bytes: &[u8]) -> RhiResult<Vec<u32>> {
    if !bytes.len().is_multiple_of(4) {
        return Err(RhiError::ShaderError(format!(
            "SPIR-V code must be 4-byte aligned, got {} bytes",
            bytes.len()
        )));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shader_stage_to_vk_stage() {
        assert_eq!(
            ShaderStage::Vertex.to_vk_stage(),
            vk::ShaderStageFlags::VERTEX
        );
        assert_eq!(
            ShaderStage::Fragment.to_vk_stage(),
            vk::ShaderStageFlags::FRAGMENT
        );
    }

    #[test]
    fn test_shader_stage_display() {
        assert_eq!(format!("{}", ShaderStage::Vertex), "vertex");
        assert_eq!(format!("{}", ShaderStage::Fragment), "fragment");
    }

    #[test]
    fn test_spirv_words_rejects_misaligned_input() {
        let misaligned = vec![0u8; 5];
        assert!(matches!(
            spirv_words(&misaligned),
            Err(RhiError::ShaderError(_))
        ));
    }

    #[test]
    fn test_spirv_words_packs_little_endian() {
        // The SPIR-V magic number as it appears on disk
        let bytes = [0x03, 0x02, 0x23, 0x07];
        let words = spirv_words(&bytes).unwrap();
        assert_eq!(words, vec![0x0723_0203]);
    }

    #[test]
    fn test_spirv_words_empty_input() {
        let words = spirv_words(&[]).unwrap();
        assert!(words.is_empty());
    }
}
