//! Per-frame-in-flight resources.
//!
//! Each [`FrameSlot`] owns everything one frame in flight records and
//! waits on: a synchronization set (pre-signaled fence plus the
//! image-available/render-finished semaphore pair), its own command
//! pool, and one primary command buffer. Slots are created at renderer
//! init, sized to [`MAX_FRAMES_IN_FLIGHT`] rather than the swapchain
//! image count, and survive swapchain rebuilds untouched.

use std::sync::Arc;

use tracing::{debug, info};

use kiln_rhi::command::{CommandBuffer, CommandPool};
use kiln_rhi::device::Device;
use kiln_rhi::sync::{FrameSync, MAX_FRAMES_IN_FLIGHT};
use kiln_rhi::{RhiError, RhiResult};

/// Synchronization set plus command recording state for one frame slot.
pub struct FrameSlot {
    sync: FrameSync,
    command_pool: CommandPool,
    command_buffer: CommandBuffer,
}

impl FrameSlot {
    /// Creates one frame slot on the graphics queue family.
    ///
    /// The pool is created with per-buffer reset so the slot's command
    /// buffer can be re-recorded without a pool-level reset.
    ///
    /// # Errors
    ///
    /// Returns an error if pool, buffer, or sync object creation fails.
    pub fn new(device: Arc<Device>) -> RhiResult<Self> {
        let graphics_family = device
            .queue_families()
            .graphics_family
            .ok_or(RhiError::NoSuitableGpu)?;

        let sync = FrameSync::new(device.clone())?;
        let command_pool = CommandPool::new(device.clone(), graphics_family)?;
        let command_buffer = CommandBuffer::new(device, &command_pool)?;

        Ok(Self {
            sync,
            command_pool,
            command_buffer,
        })
    }

    /// Returns the slot's synchronization set.
    #[inline]
    pub fn sync(&self) -> &FrameSync {
        &self.sync
    }

    /// Returns the slot's command pool.
    #[inline]
    pub fn command_pool(&self) -> &CommandPool {
        &self.command_pool
    }

    /// Returns the slot's primary command buffer.
    #[inline]
    pub fn command_buffer(&self) -> &CommandBuffer {
        &self.command_buffer
    }
}

/// Creates the full set of frame slots.
///
/// # Errors
///
/// Returns an error if any slot fails to build.
pub fn create_frame_slots(device: &Arc<Device>) -> RhiResult<Vec<FrameSlot>> {
    let mut slots = Vec::with_capacity(MAX_FRAMES_IN_FLIGHT);
    for i in 0..MAX_FRAMES_IN_FLIGHT {
        slots.push(FrameSlot::new(device.clone())?);
        debug!("Created frame slot {}", i);
    }

    info!("Created {} frame slots", MAX_FRAMES_IN_FLIGHT);
    Ok(slots)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_slot_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<FrameSlot>();
    }
}
