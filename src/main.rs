//! Static 3D viewer for a set chess board.
//!
//! Loads the board and piece models, places every piece on its starting
//! square and renders the scene under a single point light, with an
//! orbit camera driven from the keyboard.

use anyhow::Context as _;
use glutin::config::ConfigTemplateBuilder;
use glutin::context::{ContextApi, ContextAttributesBuilder, Version};
use glutin::display::GetGlDisplay;
use glutin::prelude::*;
use glutin::surface::{SurfaceAttributesBuilder, WindowSurface};
use glutin_winit::DisplayBuilder;
use raw_window_handle::HasWindowHandle;
use std::collections::HashSet;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

mod config;
mod engine;
mod game;

use engine::camera::OrbitCamera;
use game::scene::{RenderParams, Scene};

const WINDOW_TITLE: &str = "Game Of Chess 3D";
const WINDOW_WIDTH: u32 = 1024;
const WINDOW_HEIGHT: u32 = 768;

/// Counts frames and reports the mean frame time once per second.
struct FrameMeter {
    window_start: Instant,
    frames: u32,
}

impl FrameMeter {
    fn new() -> Self {
        Self {
            window_start: Instant::now(),
            frames: 0,
        }
    }

    fn tick(&mut self) {
        self.frames += 1;
        let elapsed = self.window_start.elapsed();
        if elapsed.as_secs_f32() >= 1.0 {
            debug!(
                "{:.3} ms/frame over {} frames",
                elapsed.as_secs_f32() * 1000.0 / self.frames as f32,
                self.frames
            );
            self.window_start = Instant::now();
            self.frames = 0;
        }
    }
}

struct App {
    assets_root: PathBuf,
    camera: OrbitCamera,
    held_keys: HashSet<KeyCode>,
    last_frame: Option<Instant>,
    meter: FrameMeter,
    fatal: Option<anyhow::Error>,
    // Field order carries the teardown contract: the scene must release
    // its GL objects while the context and surface below are still alive.
    scene: Option<Scene>,
    gl_surface: Option<glutin::surface::Surface<WindowSurface>>,
    gl_context: Option<glutin::context::PossiblyCurrentContext>,
    window: Option<Window>,
}

impl App {
    fn new(assets_root: PathBuf) -> Self {
        Self {
            assets_root,
            camera: OrbitCamera::default(),
            held_keys: HashSet::new(),
            last_frame: None,
            meter: FrameMeter::new(),
            fatal: None,
            scene: None,
            gl_surface: None,
            gl_context: None,
            window: None,
        }
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        match event.state {
            ElementState::Pressed => match code {
                KeyCode::Escape => event_loop.exit(),
                KeyCode::KeyL => {
                    if !event.repeat {
                        self.camera.toggle_light();
                    }
                }
                _ => {
                    self.held_keys.insert(code);
                }
            },
            ElementState::Released => {
                self.held_keys.remove(&code);
            }
        }
    }

    fn redraw(&mut self) {
        let (Some(surface), Some(ctx), Some(scene), Some(window)) = (
            &self.gl_surface,
            &self.gl_context,
            &self.scene,
            &self.window,
        ) else {
            return;
        };

        let now = Instant::now();
        let dt = self
            .last_frame
            .map(|last| (now - last).as_secs_f32())
            .unwrap_or(0.0);
        self.last_frame = Some(now);
        self.camera.apply_input(&self.held_keys, dt);

        let size = window.inner_size();
        let params = RenderParams {
            width: size.width,
            height: size.height,
            projection: self.camera.projection_matrix(size.width, size.height),
            view: self.camera.view_matrix(),
            light_enabled: self.camera.light_enabled(),
        };
        scene.render(&params);
        self.meter.tick();

        surface.swap_buffers(ctx).unwrap();
        window.request_redraw();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = event_loop
            .create_window(
                Window::default_attributes()
                    .with_title(WINDOW_TITLE)
                    .with_inner_size(PhysicalSize::new(WINDOW_WIDTH, WINDOW_HEIGHT)),
            )
            .unwrap();

        let display_builder = DisplayBuilder::new();
        let (_, gl_config) = display_builder
            .build(event_loop, ConfigTemplateBuilder::new(), |mut c| {
                c.next().unwrap()
            })
            .unwrap();

        let display = gl_config.display();
        let ctx_attrs = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
            .build(Some(window.window_handle().unwrap().as_raw()));

        let not_current = unsafe { display.create_context(&gl_config, &ctx_attrs).unwrap() };

        let size = window.inner_size();
        let attrs = SurfaceAttributesBuilder::<WindowSurface>::new().build(
            window.window_handle().unwrap().as_raw(),
            NonZeroU32::new(size.width.max(1)).unwrap(),
            NonZeroU32::new(size.height.max(1)).unwrap(),
        );
        let surface = unsafe { display.create_window_surface(&gl_config, &attrs).unwrap() };
        let ctx = not_current.make_current(&surface).unwrap();

        let gl = unsafe {
            glow::Context::from_loader_function(|s| {
                display.get_proc_address(&std::ffi::CString::new(s).unwrap()) as *const _
            })
        };

        match Scene::new(gl, &self.assets_root) {
            Ok(scene) => self.scene = Some(scene),
            Err(err) => {
                error!("scene setup failed: {err}");
                self.fatal = Some(anyhow::Error::new(err).context("scene setup failed"));
                event_loop.exit();
                return;
            }
        }

        self.last_frame = Some(Instant::now());
        window.request_redraw();

        self.window = Some(window);
        self.gl_context = Some(ctx);
        self.gl_surface = Some(surface);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::Resized(size) => {
                if size.width > 0 && size.height > 0 {
                    if let (Some(surface), Some(ctx)) = (&self.gl_surface, &self.gl_context) {
                        surface.resize(
                            ctx,
                            NonZeroU32::new(size.width).unwrap(),
                            NonZeroU32::new(size.height).unwrap(),
                        );
                    }
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                self.handle_key(event_loop, &event);
            }

            WindowEvent::RedrawRequested => self.redraw(),

            _ => {}
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().without_time().compact().init();

    let assets_root = config::assets_root();
    info!("assets root: {}", assets_root.display());

    let event_loop = EventLoop::new().context("failed to create the event loop")?;
    let mut app = App::new(assets_root);
    event_loop.run_app(&mut app).context("event loop failed")?;

    if let Some(fatal) = app.fatal.take() {
        return Err(fatal);
    }
    Ok(())
}
