use std::collections::HashSet;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::Context;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use grid_raycaster::present::{ScaleLut, blit_nearest};
use grid_raycaster::{
    Camera, FrameRenderer, MapDefinition, MoveIntent, Scene, Vec2, ViewerConfig,
    load_texture_set,
};

// Internal framebuffer never gets narrower than this
const MIN_INTERNAL_WIDTH: usize = 160;

struct App {
    window: Option<Rc<Window>>,
    surface: Option<softbuffer::Surface<Rc<Window>, Rc<Window>>>,
    config: ViewerConfig,
    scene: Scene,
    camera: Camera,
    renderer: FrameRenderer,
    scale_lut: ScaleLut,

    // HUD
    frame_counter: u32,
    last_fps_print: Instant,

    // Input, applied once per frame before rendering
    keys_down: HashSet<KeyCode>,
    last_tick: Instant,
}

impl App {
    fn new(config: ViewerConfig) -> anyhow::Result<Self> {
        let map = match &config.map {
            Some(path) => MapDefinition::load(path)?,
            None => MapDefinition::demo().context("built-in demo map")?,
        };

        let files = config.texture_files()?;
        let textures = load_texture_set(config.texture_size, &files, &map.grid)?;
        let scene = Scene::new(map.grid, textures).context("world and textures disagree")?;

        let spawn = map
            .spawn
            .map(|cell| cell.center())
            .unwrap_or(Vec2::new(0.5, 0.5));
        // facing north, into the map
        let camera = Camera::facing(spawn, std::f32::consts::FRAC_PI_2, config.fov_radians())?;
        let renderer = FrameRenderer::new(config.render.clone())?;

        Ok(Self {
            window: None,
            surface: None,
            config,
            scene,
            camera,
            renderer,
            scale_lut: ScaleLut::empty(),
            frame_counter: 0,
            last_fps_print: Instant::now(),
            keys_down: HashSet::new(),
            last_tick: Instant::now(),
        })
    }

    fn tick(&mut self) {
        // Cap dt so a stalled window doesn't teleport the camera
        let now = Instant::now();
        let dt = now.duration_since(self.last_tick).min(Duration::from_millis(100));
        self.last_tick = now;

        let axis = |pos: &[KeyCode], neg: &[KeyCode]| {
            let held = |keys: &[KeyCode]| keys.iter().any(|k| self.keys_down.contains(k));
            held(pos) as i32 as f32 - held(neg) as i32 as f32
        };
        let intent = MoveIntent {
            forward: axis(&[KeyCode::KeyW, KeyCode::ArrowUp], &[KeyCode::KeyS, KeyCode::ArrowDown]),
            strafe: axis(&[KeyCode::KeyD], &[KeyCode::KeyA]),
            turn: axis(&[KeyCode::KeyQ, KeyCode::ArrowLeft], &[KeyCode::KeyE, KeyCode::ArrowRight]),
        };

        if !intent.is_idle() {
            intent.apply(
                &mut self.camera,
                self.scene.world(),
                dt.as_secs_f32(),
                self.config.move_speed,
                self.config.turn_speed,
            );
        }
    }

    fn rebuild_internal_fb_and_lut(&mut self, dst_w: usize, dst_h: usize) {
        if dst_w == 0 || dst_h == 0 {
            return;
        }
        // Keep internal height fixed (controls pixel size look), derive width from aspect
        let target_h = self.config.render.height;
        let aspect = dst_w as f32 / dst_h as f32;
        let target_w = ((target_h as f32 * aspect).round() as usize).max(MIN_INTERNAL_WIDTH);

        if let Err(e) = self.renderer.resize(target_w, target_h) {
            log::error!("cannot resize framebuffer: {e}");
            return;
        }
        self.scale_lut = ScaleLut::new(dst_w, dst_h, target_w, target_h);
    }

    fn redraw(&mut self, id: WindowId) -> anyhow::Result<()> {
        self.tick();

        let (window, surface) = match (&self.window, &mut self.surface) {
            (Some(w), Some(s)) if w.id() == id => (w, s),
            _ => return Ok(()),
        };

        let size = window.inner_size();
        let (Some(w), Some(h)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
        else {
            return Ok(()); // Minimized window, skip drawing
        };
        if self.scale_lut.dst_width() != size.width as usize
            || self.scale_lut.dst_height() != size.height as usize
        {
            // resize event not seen yet
            return Ok(());
        }

        surface
            .resize(w, h)
            .map_err(|e| anyhow::anyhow!("surface resize: {e}"))?;

        let frame = self.renderer.render(&self.camera, &self.scene);

        let mut buf = surface
            .buffer_mut()
            .map_err(|e| anyhow::anyhow!("buffer_mut: {e}"))?;
        blit_nearest(&mut buf, frame.pixels(), frame.width(), &self.scale_lut);
        buf.present().map_err(|e| anyhow::anyhow!("present: {e}"))?;

        self.frame_counter += 1;
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_fps_print).as_secs_f32();
        if elapsed >= 1.0 {
            let pos = self.camera.position();
            log::info!(
                "FPS: {:.1} at ({:.2}, {:.2})",
                self.frame_counter as f32 / elapsed,
                pos.x,
                pos.y
            );
            self.frame_counter = 0;
            self.last_fps_print = now;
        }
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let attributes = Window::default_attributes()
            .with_title("Grid Raycaster")
            .with_inner_size(LogicalSize::new(
                self.config.window_width as f64,
                self.config.window_height as f64,
            ));

        let window = match event_loop.create_window(attributes) {
            Ok(w) => Rc::new(w),
            Err(e) => {
                log::error!("cannot create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let surface = softbuffer::Context::new(window.clone())
            .and_then(|context| softbuffer::Surface::new(&context, window.clone()));
        let surface = match surface {
            Ok(s) => s,
            Err(e) => {
                log::error!("cannot create drawing surface: {e}");
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        self.rebuild_internal_fb_and_lut(size.width as usize, size.height as usize);

        self.surface = Some(surface);
        self.last_tick = Instant::now();
        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("close requested, exiting");
                event_loop.exit();
            }

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        ..
                    },
                ..
            } => match state {
                ElementState::Pressed if code == KeyCode::Escape => event_loop.exit(),
                ElementState::Pressed => {
                    self.keys_down.insert(code);
                }
                ElementState::Released => {
                    self.keys_down.remove(&code);
                }
            },

            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw(id) {
                    log::error!("{e:#}");
                    event_loop.exit();
                    return;
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }

            WindowEvent::Resized(new_size) => {
                self.rebuild_internal_fb_and_lut(new_size.width as usize, new_size.height as usize);
            }
            _ => (),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => ViewerConfig::load(&path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => ViewerConfig::default(),
    };

    let mut app = App::new(config)?;

    let event_loop = EventLoop::new().context("creating event loop")?;
    // Redraws are requested continuously from about_to_wait
    event_loop.set_control_flow(ControlFlow::Wait);
    event_loop.run_app(&mut app).context("event loop")?;
    Ok(())
}
