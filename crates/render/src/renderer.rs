//! Frame orchestration: pass registry, per-frame dispatch queue, and
//! the begin/render/end lifecycle over the swapchain.
//!
//! The driving loop each frame is:
//!
//! 1. [`Renderer::begin_frame`] waits on the frame slot's fence and
//!    acquires the next swapchain image. `Ok(true)` means the
//!    swapchain is stale; call [`Renderer::rebuild_swapchain`] and
//!    restart the frame.
//! 2. One or more `enqueue_*` calls stage delegates on registered
//!    passes. Bookkeeping only, nothing touches the GPU.
//! 3. [`Renderer::render_frame`] records a single primary command
//!    buffer, dispatching the queued passes in FIFO order, then
//!    submits it to the graphics queue.
//! 4. [`Renderer::end_frame`] presents and advances the frame index.
//!    `Ok(true)` again means rebuild before the next frame.
//!
//! All calls must come from one thread. Work for frame N+1 may be
//! recorded while frame N is still executing on the GPU; the fence
//! wait in `begin_frame` caps the overlap at
//! [`MAX_FRAMES_IN_FLIGHT`] frames.

use std::collections::{HashMap, VecDeque};

use ash::vk;
use tracing::{debug, error, info, warn};

use kiln_platform::Window;
use kiln_rhi::render_pass::RenderPassKind;
use kiln_rhi::swapchain::Swapchain;
use kiln_rhi::sync::MAX_FRAMES_IN_FLIGHT;

use crate::context::RenderContext;
use crate::error::{RenderError, RenderResult};
use crate::frame::{FrameSlot, create_frame_slots};
use crate::pass::{
    RenderPassConfig, RenderPassContainer, RenderPassContext, RenderPassDelegate,
    validate_framebuffer_index,
};

/// Knobs for renderer construction.
#[derive(Clone, Debug)]
pub struct RendererConfig {
    /// Application name reported to the driver.
    pub app_name: String,
    /// Enable the validation layer when available.
    pub enable_validation: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            app_name: "kiln".to_owned(),
            enable_validation: cfg!(debug_assertions),
        }
    }
}

/// Owns the GPU context, swapchain, frame slots, and every registered
/// render pass, and drives the per-frame lifecycle.
///
/// Field order fixes teardown: pass containers (framebuffers over
/// swapchain views) go before the swapchain, which goes before the
/// device context.
pub struct Renderer {
    passes: HashMap<String, RenderPassContainer>,
    render_queue: VecDeque<String>,
    frames: Vec<FrameSlot>,
    current_frame: usize,
    swapchain: Swapchain,
    context: RenderContext,
}

impl Renderer {
    /// Brings up the full GPU stack against the given window: context
    /// (instance, surface, device), swapchain at the window's size,
    /// and one frame slot per frame in flight.
    pub fn new(window: &Window, config: RendererConfig) -> RenderResult<Self> {
        let context = RenderContext::new(window, &config)?;
        let device = context.device().clone();

        let swapchain = Swapchain::new(
            context.instance(),
            device.clone(),
            context.surface().handle(),
            window.width(),
            window.height(),
        )?;

        let frames = create_frame_slots(&device)?;

        info!(
            "Renderer ready: {} swapchain image(s), {} frame(s) in flight",
            swapchain.image_count(),
            frames.len()
        );

        Ok(Self {
            passes: HashMap::new(),
            render_queue: VecDeque::new(),
            frames,
            current_frame: 0,
            swapchain,
            context,
        })
    }

    // =========================================================================
    // Pass Registry
    // =========================================================================

    /// Registers an offscreen render pass under `name`.
    ///
    /// Allocates one color target and framebuffer per frame in flight
    /// at `config.extent` (the swapchain extent when `None`), plus a
    /// shared depth image when the pass declares depth. Offscreen
    /// targets keep their registration-time size across swapchain
    /// rebuilds.
    ///
    /// # Errors
    ///
    /// [`RenderError::PassAlreadyRegistered`] if the name is taken.
    pub fn add_render_pass(
        &mut self,
        name: impl Into<String>,
        config: &RenderPassConfig,
    ) -> RenderResult<()> {
        let name = name.into();
        if self.passes.contains_key(&name) {
            return Err(RenderError::PassAlreadyRegistered(name));
        }

        let extent = config.extent.unwrap_or_else(|| self.swapchain.extent());
        let container = RenderPassContainer::new_offscreen(
            self.context.device().clone(),
            self.frames.len(),
            extent,
            self.swapchain.format(),
            config,
        )?;

        info!(
            "Registered offscreen pass '{}' ({} target(s) at {}x{})",
            name,
            container.framebuffer_count(),
            extent.width,
            extent.height
        );
        self.passes.insert(name, container);
        Ok(())
    }

    /// Registers a presentable render pass under `name`.
    ///
    /// Allocates one framebuffer per swapchain image over the
    /// swapchain's views, so the pass can target whichever image is
    /// acquired. These framebuffers are replaced on every swapchain
    /// rebuild.
    ///
    /// # Errors
    ///
    /// [`RenderError::PassAlreadyRegistered`] if the name is taken.
    pub fn add_present_pass(
        &mut self,
        name: impl Into<String>,
        config: &RenderPassConfig,
    ) -> RenderResult<()> {
        let name = name.into();
        if self.passes.contains_key(&name) {
            return Err(RenderError::PassAlreadyRegistered(name));
        }

        let container = RenderPassContainer::new_present(
            self.context.device().clone(),
            &self.swapchain,
            config,
        )?;

        info!(
            "Registered present pass '{}' ({} framebuffer(s))",
            name,
            container.framebuffer_count()
        );
        self.passes.insert(name, container);
        Ok(())
    }

    /// Rebuilds a present pass's framebuffers over the current
    /// swapchain views. Idempotent; safe to call after
    /// [`Renderer::rebuild_swapchain`], which already does this for
    /// every present pass.
    ///
    /// # Errors
    ///
    /// [`RenderError::UnknownPass`] if no pass is registered under
    /// `name`.
    pub fn create_swapchain_framebuffers(&mut self, name: &str) -> RenderResult<()> {
        let container = self
            .passes
            .get_mut(name)
            .ok_or_else(|| RenderError::UnknownPass(name.to_owned()))?;
        container.rebuild_swapchain_framebuffers(&self.swapchain)
    }

    // =========================================================================
    // Enqueue
    // =========================================================================

    /// Queues `name` for dispatch this frame, targeting the pass's
    /// framebuffer at `framebuffer_index` over `area`.
    ///
    /// Pure bookkeeping; the delegate runs inside `render_frame`.
    /// Enqueueing the same name again before `render_frame` queues a
    /// second dispatch but replaces the staged state, so both
    /// dispatches use the last-staged index, area, and delegate.
    ///
    /// # Errors
    ///
    /// [`RenderError::UnknownPass`] for an unregistered name,
    /// [`RenderError::FramebufferIndexOutOfRange`] for an index the
    /// pass does not own.
    pub fn enqueue_render_pass(
        &mut self,
        name: &str,
        framebuffer_index: usize,
        area: vk::Rect2D,
        delegate: RenderPassDelegate,
    ) -> RenderResult<()> {
        let container = self
            .passes
            .get_mut(name)
            .ok_or_else(|| RenderError::UnknownPass(name.to_owned()))?;
        validate_framebuffer_index(name, framebuffer_index, container.framebuffer_count())?;

        container.stage.set(framebuffer_index, area, delegate);
        self.render_queue.push_back(name.to_owned());
        Ok(())
    }

    /// Queues a present pass against the currently acquired swapchain
    /// image. Call between `begin_frame` and `render_frame`.
    pub fn enqueue_present_pass(
        &mut self,
        name: &str,
        area: vk::Rect2D,
        delegate: RenderPassDelegate,
    ) -> RenderResult<()> {
        let index = self.swapchain.current_image() as usize;
        self.enqueue_render_pass(name, index, area, delegate)
    }

    /// Queues an offscreen pass against the current frame-in-flight
    /// slot's target.
    pub fn enqueue_common_pass(
        &mut self,
        name: &str,
        area: vk::Rect2D,
        delegate: RenderPassDelegate,
    ) -> RenderResult<()> {
        self.enqueue_render_pass(name, self.current_frame, area, delegate)
    }

    // =========================================================================
    // Frame Lifecycle
    // =========================================================================

    /// Starts a frame: waits for this slot's previous submission to
    /// finish, then acquires the next swapchain image.
    ///
    /// Returns `Ok(true)` when the swapchain is out of date. Nothing
    /// was acquired and no work may be recorded; rebuild and restart
    /// the frame. The slot's fence is left signaled in that case so
    /// the retry's wait passes immediately.
    pub fn begin_frame(&mut self) -> RenderResult<bool> {
        let sync = self.frames[self.current_frame].sync();
        sync.in_flight().wait(u64::MAX)?;

        let needs_rebuild = self
            .swapchain
            .acquire_next_image(sync.image_available().handle())?;
        self.finish_acquire(needs_rebuild)
    }

    /// Applies the acquire outcome to the current frame slot.
    ///
    /// A rebuild request leaves the slot untouched: the fence stays
    /// signaled and no dispatch state is bound, so the caller can
    /// rebuild and retry on the same slot. Otherwise the fence is
    /// reset; render_frame's submit is now the one thing that
    /// re-signals it.
    fn finish_acquire(&mut self, needs_rebuild: bool) -> RenderResult<bool> {
        if needs_rebuild {
            return Ok(true);
        }

        self.frames[self.current_frame].sync().in_flight().reset()?;
        Ok(false)
    }

    /// Records and submits this frame's command buffer.
    ///
    /// Drains the queue in FIFO order. Each dispatched pass is
    /// bracketed by its own begin/end, with the pipeline bound and
    /// viewport/scissor set from the staged area before the delegate
    /// runs. Names with no registered pass are dropped with a warning
    /// rather than stalling the queue. The submission waits on the
    /// image-available semaphore at color-attachment output and
    /// signals the render-finished semaphore plus the slot's fence.
    ///
    /// All staged delegates are released afterwards, whether or not
    /// they were dispatched.
    pub fn render_frame(&mut self) -> RenderResult<()> {
        let image_index = self.swapchain.current_image();
        let frame_index = self.current_frame as u32;

        let command_buffer = self.frames[self.current_frame].command_buffer();
        command_buffer.reset()?;
        command_buffer.begin()?;

        while let Some(name) = drain_next(&mut self.render_queue, &self.passes) {
            let container = match self.passes.get_mut(&name) {
                Some(container) => container,
                None => continue,
            };

            let area = container.stage.area;
            let framebuffer = container.framebuffers[container.stage.framebuffer_index].handle();

            command_buffer.begin_render_pass(
                container.pass.handle(),
                framebuffer,
                area,
                &container.clear_values,
            );
            command_buffer
                .bind_pipeline(vk::PipelineBindPoint::GRAPHICS, container.pipeline.handle());
            command_buffer.set_viewport(&vk::Viewport {
                x: area.offset.x as f32,
                y: area.offset.y as f32,
                width: area.extent.width as f32,
                height: area.extent.height as f32,
                min_depth: 0.0,
                max_depth: 1.0,
            });
            command_buffer.set_scissor(&area);

            (container.stage.delegate)(RenderPassContext {
                command_buffer: command_buffer.handle(),
                pipeline_layout: container.pipeline.layout(),
                image_index,
                frame_index,
            });

            command_buffer.end_render_pass();
            debug!("Dispatched render pass '{name}'");
        }

        command_buffer.end()?;

        // Delegates live for exactly one frame
        for container in self.passes.values_mut() {
            container.stage.clear();
        }

        let sync = self.frames[self.current_frame].sync();
        let wait_semaphores = [sync.image_available().handle()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = [command_buffer.handle()];
        let signal_semaphores = [sync.render_finished().handle()];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        // SAFETY: the command buffer finished recording above, and the
        // fence was reset in begin_frame after its last wait.
        unsafe {
            self.context
                .device()
                .submit_graphics(&[submit_info], sync.in_flight().handle())?;
        }

        Ok(())
    }

    /// Finishes a frame: presents the acquired image, waiting on the
    /// render-finished semaphore.
    ///
    /// Returns `Ok(true)` when the swapchain is stale (out of date, or
    /// suboptimal at present time). The frame index does not advance
    /// in that case; rebuild and start over on the same slot.
    /// Otherwise advances to the next frame slot and returns
    /// `Ok(false)`.
    pub fn end_frame(&mut self) -> RenderResult<bool> {
        let sync = self.frames[self.current_frame].sync();
        let needs_rebuild = self.swapchain.present(
            self.context.device().present_queue(),
            sync.render_finished().handle(),
        )?;
        if needs_rebuild {
            return Ok(true);
        }

        self.current_frame = advance_frame(self.current_frame);
        Ok(false)
    }

    /// Tears down and rebuilds the swapchain at the given size, then
    /// re-creates every present pass's framebuffers over the new
    /// views. Blocks until the device is idle first.
    ///
    /// Offscreen passes are untouched; their targets keep their
    /// registration-time extent.
    pub fn rebuild_swapchain(&mut self, width: u32, height: u32) -> RenderResult<()> {
        self.context.device().wait_idle()?;

        // Old framebuffers reference views the rebuild destroys
        for container in self.passes.values_mut() {
            if container.kind() == RenderPassKind::Present {
                container.framebuffers.clear();
            }
        }

        self.swapchain.rebuild(width, height)?;

        for container in self.passes.values_mut() {
            if container.kind() == RenderPassKind::Present {
                container.rebuild_swapchain_framebuffers(&self.swapchain)?;
            }
        }

        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Swapchain color format.
    #[inline]
    pub fn swapchain_format(&self) -> vk::Format {
        self.swapchain.format()
    }

    /// Current swapchain extent.
    #[inline]
    pub fn swapchain_extent(&self) -> vk::Extent2D {
        self.swapchain.extent()
    }

    /// Number of images in the swapchain.
    #[inline]
    pub fn swapchain_image_count(&self) -> u32 {
        self.swapchain.image_count()
    }

    /// Index of the most recently acquired swapchain image.
    #[inline]
    pub fn swapchain_current_image(&self) -> u32 {
        self.swapchain.current_image()
    }

    /// Number of frames that may be in flight at once.
    #[inline]
    pub fn frames_in_flight(&self) -> usize {
        self.frames.len()
    }

    /// Current frame-in-flight index.
    #[inline]
    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    /// The instance/surface/device bundle.
    #[inline]
    pub fn context(&self) -> &RenderContext {
        &self.context
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        if let Err(e) = self.context.device().wait_idle() {
            error!("Failed to wait for device idle during renderer teardown: {e}");
        }
        debug!("Renderer destroyed");
    }
}

/// Pops queue entries until one names a registered pass.
///
/// Unregistered names are discarded with a warning so a stray enqueue
/// can never wedge the queue.
fn drain_next<T>(queue: &mut VecDeque<String>, passes: &HashMap<String, T>) -> Option<String> {
    while let Some(name) = queue.pop_front() {
        if passes.contains_key(&name) {
            return Some(name);
        }
        warn!("Dropping queued render pass '{name}': no such pass is registered");
    }
    None
}

/// Next frame-in-flight index, wrapping at [`MAX_FRAMES_IN_FLIGHT`].
fn advance_frame(current: usize) -> usize {
    (current + 1) % MAX_FRAMES_IN_FLIGHT
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue_of(names: &[&str]) -> VecDeque<String> {
        names.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn test_queue_drains_in_fifo_order() {
        let mut passes: HashMap<String, ()> = HashMap::new();
        passes.insert("shadow".to_owned(), ());
        passes.insert("present".to_owned(), ());

        // Duplicates are legal and dispatch once per enqueue
        let mut queue = queue_of(&["shadow", "present", "shadow"]);

        assert_eq!(drain_next(&mut queue, &passes).as_deref(), Some("shadow"));
        assert_eq!(drain_next(&mut queue, &passes).as_deref(), Some("present"));
        assert_eq!(drain_next(&mut queue, &passes).as_deref(), Some("shadow"));
        assert_eq!(drain_next(&mut queue, &passes), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_unknown_queued_name_is_dropped() {
        let mut passes: HashMap<String, ()> = HashMap::new();
        passes.insert("a".to_owned(), ());
        passes.insert("b".to_owned(), ());

        let mut queue = queue_of(&["a", "ghost", "b"]);

        assert_eq!(drain_next(&mut queue, &passes).as_deref(), Some("a"));
        assert_eq!(drain_next(&mut queue, &passes).as_deref(), Some("b"));
        assert_eq!(drain_next(&mut queue, &passes), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_drain_of_only_unknown_names_empties_queue() {
        let passes: HashMap<String, ()> = HashMap::new();
        let mut queue = queue_of(&["ghost", "phantom"]);

        assert_eq!(drain_next(&mut queue, &passes), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_frame_index_wraps() {
        assert_eq!(advance_frame(0), 1);
        assert_eq!(advance_frame(MAX_FRAMES_IN_FLIGHT - 1), 0);
    }

    #[test]
    fn test_renderer_config_default() {
        let config = RendererConfig::default();
        assert_eq!(config.app_name, "kiln");
    }

    /// Live-device checks against a real window and swapchain.
    ///
    /// winit allows one event loop per process, so every scenario that
    /// needs hardware runs inside this single test. Skips cleanly when
    /// no display server or Vulkan driver is available.
    #[cfg(target_os = "linux")]
    #[test]
    fn test_frame_lifecycle_against_live_device() {
        use winit::application::ApplicationHandler;
        use winit::event::WindowEvent;
        use winit::event_loop::{ActiveEventLoop, EventLoop};
        use winit::window::WindowId;

        use crate::pass::build_swapchain_framebuffers;
        use kiln_rhi::render_pass::{RenderPass, RenderPassConfig as RhiRenderPassConfig};

        struct LiveTest {
            resumed: bool,
            skip: Option<String>,
        }

        impl LiveTest {
            fn exercise(event_loop: &ActiveEventLoop) -> Result<(), String> {
                let window = Window::new(event_loop, 640, 480, "kiln test")
                    .map_err(|e| format!("no window ({e})"))?;
                let mut renderer = Renderer::new(&window, RendererConfig::default())
                    .map_err(|e| format!("Vulkan not available ({e})"))?;

                // One sync set and command buffer per frame in flight,
                // fences pre-signaled so the first wait falls through
                assert_eq!(renderer.frames_in_flight(), MAX_FRAMES_IN_FLIGHT);
                assert_eq!(renderer.current_frame(), 0);
                for slot in &renderer.frames {
                    assert_ne!(
                        slot.sync().image_available().handle(),
                        vk::Semaphore::null()
                    );
                    assert_ne!(
                        slot.sync().render_finished().handle(),
                        vk::Semaphore::null()
                    );
                    assert_ne!(slot.command_buffer().handle(), vk::CommandBuffer::null());
                    assert!(slot.sync().in_flight().is_signaled().unwrap());
                }

                // A presentable pass gets one framebuffer per swapchain
                // image, and rebuilding against an unchanged swapchain
                // reproduces the same list
                let device = renderer.context.device().clone();
                let pass = RenderPass::new(
                    device.clone(),
                    &RhiRenderPassConfig {
                        color_format: renderer.swapchain_format(),
                        kind: RenderPassKind::Present,
                        depth_format: None,
                    },
                )
                .unwrap();
                let framebuffers =
                    build_swapchain_framebuffers(&device, &pass, None, &renderer.swapchain)
                        .unwrap();
                assert_eq!(
                    framebuffers.len(),
                    renderer.swapchain_image_count() as usize
                );
                let again =
                    build_swapchain_framebuffers(&device, &pass, None, &renderer.swapchain)
                        .unwrap();
                assert_eq!(again.len(), framebuffers.len());
                for (a, b) in framebuffers.iter().zip(&again) {
                    assert_eq!(a.extent(), b.extent());
                }
                drop(again);
                drop(framebuffers);
                drop(pass);

                // A rebuild-signaling acquire binds nothing: the fence
                // stays signaled and the queue stays empty, so the retry
                // runs on the same slot without blocking
                assert!(renderer.finish_acquire(true).unwrap());
                assert!(renderer.render_queue.is_empty());
                assert!(
                    renderer.frames[renderer.current_frame]
                        .sync()
                        .in_flight()
                        .is_signaled()
                        .unwrap()
                );

                // Full frame with an empty queue: the acquired image
                // index holds through render_frame, and the frame index
                // advances exactly when present says the chain is current
                let frame_before = renderer.current_frame();
                if renderer.begin_frame().unwrap() {
                    return Err("swapchain stale right after creation".to_owned());
                }
                assert!(!renderer.frames[frame_before]
                    .sync()
                    .in_flight()
                    .is_signaled()
                    .unwrap());
                let image = renderer.swapchain_current_image();
                renderer.render_frame().unwrap();
                assert_eq!(renderer.swapchain_current_image(), image);
                if renderer.end_frame().unwrap() {
                    assert_eq!(renderer.current_frame(), frame_before);
                } else {
                    assert_eq!(
                        renderer.current_frame(),
                        (frame_before + 1) % MAX_FRAMES_IN_FLIGHT
                    );
                }

                Ok(())
            }
        }

        impl ApplicationHandler for LiveTest {
            fn resumed(&mut self, event_loop: &ActiveEventLoop) {
                if !self.resumed {
                    self.resumed = true;
                    self.skip = Self::exercise(event_loop).err();
                }
                event_loop.exit();
            }

            fn window_event(
                &mut self,
                _event_loop: &ActiveEventLoop,
                _id: WindowId,
                _event: WindowEvent,
            ) {
            }
        }

        let mut builder = EventLoop::builder();
        {
            // Test threads are never the main thread
            use winit::platform::wayland::EventLoopBuilderExtWayland;
            use winit::platform::x11::EventLoopBuilderExtX11;
            EventLoopBuilderExtX11::with_any_thread(&mut builder, true);
            EventLoopBuilderExtWayland::with_any_thread(&mut builder, true);
        }
        let event_loop = match builder.build() {
            Ok(event_loop) => event_loop,
            Err(e) => {
                eprintln!("Skipping test: no display server ({e})");
                return;
            }
        };

        let mut live = LiveTest {
            resumed: false,
            skip: None,
        };
        if let Err(e) = event_loop.run_app(&mut live) {
            eprintln!("Skipping test: event loop failed ({e})");
            return;
        }
        assert!(live.resumed, "event loop exited without resuming");
        if let Some(reason) = live.skip {
            eprintln!("Skipping test: {reason}");
        }
    }
}
