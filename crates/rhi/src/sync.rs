//! Synchronization primitives for the frame loop.
//!
//! Three objects drive every frame:
//!
//! - [`Semaphore`] - GPU-to-GPU ordering between queue operations
//!   (acquire before render, render before present)
//! - [`Fence`] - GPU-to-CPU signalling so the host knows when a frame's
//!   command buffer has retired
//! - [`FrameSync`] - the bundle of both that a single frame in flight owns
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use kiln_rhi::device::Device;
//! use kiln_rhi::sync::{Fence, Semaphore};
//!
//! # fn example(device: Arc<Device>) -> Result<(), kiln_rhi::RhiError> {
//! let image_available = Semaphore::new(device.clone())?;
//!
//! // Fences guarding frame slots start signaled so the first wait
//! // returns immediately.
//! let in_flight = Fence::new(device.clone(), true)?;
//! in_flight.wait(u64::MAX)?;
//! in_flight.reset()?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::device::Device;
use crate::error::RhiResult;

/// Number of frames the CPU may record ahead of the GPU.
///
/// With 2, the CPU records frame N+1 while the GPU executes frame N.
/// Frame-slot arrays (sync objects, command pools) are sized by this.
pub const MAX_FRAMES_IN_FLIGHT: usize = 2;

/// Binary semaphore for GPU-to-GPU ordering.
///
/// The swapchain acquire signals one, the graphics submit waits on it
/// and signals another, the present waits on that.
pub struct Semaphore {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan semaphore handle.
    semaphore: vk::Semaphore,
}

impl Semaphore {
    /// Creates a new binary semaphore in the unsignaled state.
    ///
    /// # Errors
    ///
    /// Returns an error if semaphore creation fails.
    pub fn new(device: Arc<Device>) -> RhiResult<Self> {
        let create_info = vk::SemaphoreCreateInfo::default();

        let semaphore = unsafe { device.handle().create_semaphore(&create_info, None)? };

        debug!("Created semaphore");

        Ok(Self { device, semaphore })
    }

    /// Returns the Vulkan semaphore handle.
    #[inline]
    pub fn handle(&self) -> vk::Semaphore {
        self.semaphore
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_semaphore(self.semaphore, None);
        }
        debug!("Destroyed semaphore");
    }
}

/// Host-waitable fence.
///
/// Lets the CPU block until submitted GPU work completes. The frame
/// loop waits on a slot's fence before reusing that slot's command
/// buffer.
pub struct Fence {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan fence handle.
    fence: vk::Fence,
}

impl Fence {
    /// Creates a fence, optionally already signaled.
    ///
    /// Pass `signaled = true` for fences that are waited on before the
    /// first submission that would signal them, so the initial wait does
    /// not block forever.
    ///
    /// # Errors
    ///
    /// Returns an error if fence creation fails.
    pub fn new(device: Arc<Device>, signaled: bool) -> RhiResult<Self> {
        let flags = if signaled {
            vk::FenceCreateFlags::SIGNALED
        } else {
            vk::FenceCreateFlags::empty()
        };

        let create_info = vk::FenceCreateInfo::default().flags(flags);

        let fence = unsafe { device.handle().create_fence(&create_info, None)? };

        debug!(
            "Created fence ({})",
            if signaled { "signaled" } else { "unsignaled" }
        );

        Ok(Self { device, fence })
    }

    /// Returns the Vulkan fence handle.
    #[inline]
    pub fn handle(&self) -> vk::Fence {
        self.fence
    }

    /// Blocks until the fence is signaled or `timeout` nanoseconds pass.
    ///
    /// Use `u64::MAX` for an unbounded wait.
    ///
    /// # Errors
    ///
    /// Returns an error if the wait times out or the device is lost.
    pub fn wait(&self, timeout: u64) -> RhiResult<()> {
        let fences = [self.fence];
        unsafe {
            self.device
                .handle()
                .wait_for_fences(&fences, true, timeout)?
        };
        Ok(())
    }

    /// Queries the fence state without blocking.
    ///
    /// Returns `true` when signaled, `false` while still pending.
    ///
    /// # Errors
    ///
    /// Returns an error if the device is lost.
    pub fn is_signaled(&self) -> RhiResult<bool> {
        let signaled = unsafe { self.device.handle().get_fence_status(self.fence)? };
        Ok(signaled)
    }

    /// Puts the fence back into the unsignaled state.
    ///
    /// The fence must not be pending on any queue when this is called.
    ///
    /// # Errors
    ///
    /// Returns an error if the reset fails.
    pub fn reset(&self) -> RhiResult<()> {
        let fences = [self.fence];
        unsafe { self.device.handle().reset_fences(&fences)? };
        Ok(())
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_fence(self.fence, None);
        }
        debug!("Destroyed fence");
    }
}

/// Synchronization objects owned by one frame in flight.
///
/// Each of the [`MAX_FRAMES_IN_FLIGHT`] slots carries its own set:
///
/// ```text
/// 1. wait + reset in_flight fence           (host)
/// 2. acquire image, signals image_available (swapchain)
/// 3. submit: wait image_available at color-output,
///            signal render_finished, signal in_flight (queue)
/// 4. present: wait render_finished          (swapchain)
/// ```
pub struct FrameSync {
    /// Signaled when the acquired swapchain image is ready to render to.
    image_available: Semaphore,
    /// Signaled when the frame's command buffer finishes executing.
    render_finished: Semaphore,
    /// Signaled with the submit; gates reuse of the frame slot.
    in_flight: Fence,
}

impl FrameSync {
    /// Creates the semaphore pair and fence for one frame slot.
    ///
    /// The fence starts signaled so the first frame's wait falls through.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the objects fail to create.
    pub fn new(device: Arc<Device>) -> RhiResult<Self> {
        let image_available = Semaphore::new(device.clone())?;
        let render_finished = Semaphore::new(device.clone())?;
        let in_flight = Fence::new(device, true)?;

        debug!("Created frame synchronization set");

        Ok(Self {
            image_available,
            render_finished,
            in_flight,
        })
    }

    /// Semaphore signaled by swapchain image acquisition.
    #[inline]
    pub fn image_available(&self) -> &Semaphore {
        &self.image_available
    }

    /// Semaphore signaled when the frame's rendering completes.
    #[inline]
    pub fn render_finished(&self) -> &Semaphore {
        &self.render_finished
    }

    /// Fence signaled when the frame's command buffer retires.
    #[inline]
    pub fn in_flight(&self) -> &Fence {
        &self.in_flight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_in_flight_is_double_buffered() {
        // The frame loop advances modulo this; slot arrays depend on it.
        assert_eq!(MAX_FRAMES_IN_FLIGHT, 2);
    }

    #[test]
    fn test_semaphore_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Semaphore>();
    }

    #[test]
    fn test_fence_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Fence>();
    }

    #[test]
    fn test_frame_sync_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FrameSync>();
    }
}
