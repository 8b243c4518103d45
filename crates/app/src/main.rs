//! kiln demo binary: brings up the renderer against a winit window and
//! drives a clear-and-triangle frame loop through the pass queue.

use std::time::Duration;

use anyhow::Result;
use ash::vk;
use tracing::{debug, error, info};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::WindowId;

use kiln_core::{FrameStats, Timer};
use kiln_platform::{InputState, KeyCode, Window};
use kiln_render::{CommandBuffer, RenderPassConfig, Renderer, RendererConfig};

const PRESENT_PASS: &str = "triangle";

struct App {
    window: Option<Window>,
    renderer: Option<Renderer>,
    input: InputState,
    timer: Timer,
    stats: FrameStats,
}

impl App {
    fn new() -> Self {
        Self {
            window: None,
            renderer: None,
            input: InputState::new(),
            timer: Timer::new(),
            stats: FrameStats::new(Duration::from_secs(1)),
        }
    }
}

/// Window, renderer, and the one present pass this demo draws with.
fn init(event_loop: &ActiveEventLoop) -> Result<(Window, Renderer)> {
    let window = Window::new(event_loop, 1280, 720, "kiln")?;
    let mut renderer = Renderer::new(&window, RendererConfig::default())?;

    renderer.add_present_pass(
        PRESENT_PASS,
        &RenderPassConfig {
            clear_color: [0.02, 0.02, 0.05, 1.0],
            vertex_shader_path: "shaders/triangle.vert.spv".into(),
            fragment_shader_path: "shaders/triangle.frag.spv".into(),
            ..Default::default()
        },
    )?;

    Ok((window, renderer))
}

/// One full frame: begin, enqueue the triangle, record and submit,
/// present. A `true` from begin or end means the swapchain went stale;
/// rebuild it and let the next redraw retry.
fn draw_frame(window: &Window, renderer: &mut Renderer) -> kiln_render::RenderResult<()> {
    if renderer.begin_frame()? {
        renderer.rebuild_swapchain(window.width(), window.height())?;
        return Ok(());
    }

    let area = vk::Rect2D {
        offset: vk::Offset2D { x: 0, y: 0 },
        extent: renderer.swapchain_extent(),
    };

    let device = renderer.context().device().clone();
    renderer.enqueue_present_pass(
        PRESENT_PASS,
        area,
        Box::new(move |ctx| {
            let cmd = CommandBuffer::from_handle(device.clone(), ctx.command_buffer);
            // Positions come from gl_VertexIndex; nothing to bind
            cmd.draw(3, 1, 0, 0);
        }),
    )?;

    renderer.render_frame()?;

    if renderer.end_frame()? {
        renderer.rebuild_swapchain(window.width(), window.height())?;
    }

    Ok(())
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        match init(event_loop) {
            Ok((window, renderer)) => {
                info!("Initialization complete, entering main loop");
                self.window = Some(window);
                self.renderer = Some(renderer);
            }
            Err(e) => {
                error!("Failed to initialize: {e:?}");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Window close requested, exiting");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(ref mut window) = self.window {
                    window.resize(size.width, size.height);
                }
                // Zero-sized while minimized; nothing to present to
                if size.width == 0 || size.height == 0 {
                    return;
                }
                if let Some(ref mut renderer) = self.renderer
                    && let Err(e) = renderer.rebuild_swapchain(size.width, size.height)
                {
                    error!("Swapchain rebuild failed: {e}");
                    event_loop.exit();
                }
            }
            WindowEvent::RedrawRequested => {
                if let Some(report) = self.stats.record(self.timer.tick()) {
                    debug!(
                        "{} frame(s), avg {:.2} ms/frame",
                        report.frames, report.average_frame_ms
                    );
                }

                if let (Some(window), Some(renderer)) =
                    (self.window.as_ref(), self.renderer.as_mut())
                    && let Err(e) = draw_frame(window, renderer)
                {
                    error!("Render error: {e:?}");
                    event_loop.exit();
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    if event.state.is_pressed() {
                        self.input.on_key_pressed(key);
                    } else {
                        self.input.on_key_released(key);
                    }
                }
                if self.input.is_key_just_pressed(KeyCode::Escape) {
                    info!("Escape pressed, shutting down");
                    event_loop.exit();
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.input
                    .on_mouse_moved(position.x as f32, position.y as f32);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if state.is_pressed() {
                    self.input.on_mouse_pressed(button.into());
                } else {
                    self.input.on_mouse_released(button.into());
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        self.input.begin_frame();
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    kiln_core::init_logging();
    info!("Starting kiln");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new();
    event_loop.run_app(&mut app)?;

    Ok(())
}
