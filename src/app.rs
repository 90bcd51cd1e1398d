//! Drivers: the interactive window and the headless snapshot.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::config::Config;
use crate::error::AppError;
use crate::gpu::{GpuState, SpriteBatch};
use crate::input::KeyCode;
use crate::modes::{RUNES, SNOWFLAKES};
use crate::presets::{self, SUPERNOVA_BOOST_MS};
use crate::render::{FontSet, Framebuffer, GlyphAtlas};
use crate::simulation::Simulation;
use crate::time::FrameClock;

const WINDOW_TITLE: &str = "Lumina";
const WINDOW_SIZE: (u32, u32) = (1280, 720);
/// Fixed step used by headless runs, roughly 60 fps.
pub const SNAPSHOT_STEP_MS: f64 = 16.0;

/// Interactive window driver.
pub struct App {
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    simulation: Simulation,
    batch: SpriteBatch,
    clock: FrameClock,
    next_token: u64,
    glow_restore_at: Option<f64>,
    error: Option<AppError>,
}

impl App {
    pub fn new(config: Config, seed: Option<u64>, fonts: &FontSet) -> Self {
        let (width, height) = WINDOW_SIZE;
        let mut builder = Simulation::builder()
            .with_config(config)
            .with_canvas(width as f32, height as f32);
        if let Some(seed) = seed {
            builder = builder.with_seed(seed);
        }

        let atlas = GlyphAtlas::build(fonts, RUNES.iter().chain(SNOWFLAKES).copied());
        log::debug!("built glyph atlas with {} entries", atlas.len());

        Self {
            window: None,
            gpu: None,
            simulation: builder.build(),
            batch: SpriteBatch::new(width as f32, height as f32, Arc::new(atlas)),
            clock: FrameClock::new(),
            next_token: 0,
            glow_restore_at: None,
            error: None,
        }
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    /// Boost the config and start a supernova with a fresh token.
    pub fn request_supernova(&mut self, now: f64) {
        let base = self
            .simulation
            .pending_config()
            .unwrap_or(self.simulation.config())
            .clone();
        self.simulation.set_config(presets::supernova_boost(&base));

        self.next_token += 1;
        if self.simulation.trigger_supernova(self.next_token) {
            log::debug!("supernova {} started", self.next_token);
        }
        self.glow_restore_at = Some(now + SUPERNOVA_BOOST_MS);
    }

    /// Switch to the next mode with its preset applied.
    pub fn cycle_mode(&mut self) {
        let current = self
            .simulation
            .pending_config()
            .unwrap_or(self.simulation.config())
            .clone();
        let next = current.mode.next();
        self.simulation.set_config(presets::preset_for(next, &current));
        if let Some(window) = &self.window {
            window.set_title(&format!("{WINDOW_TITLE} - {next}"));
        }
    }

    /// React to keys pressed since the last frame and expire the glow boost.
    fn process_input(&mut self, now: f64, event_loop: &ActiveEventLoop) {
        let input = self.simulation.input();
        let supernova = input.key_pressed(KeyCode::Space);
        let cycle = input.key_pressed(KeyCode::Tab);
        let quit = input.key_pressed(KeyCode::Escape);
        self.simulation.input_mut().begin_frame();

        if quit {
            self.simulation.shutdown();
            event_loop.exit();
            return;
        }
        if cycle {
            self.cycle_mode();
        }
        if supernova {
            self.request_supernova(now);
        }

        if self.glow_restore_at.is_some_and(|at| now >= at) {
            self.glow_restore_at = None;
            let base = self
                .simulation
                .pending_config()
                .unwrap_or(self.simulation.config())
                .clone();
            self.simulation.set_config(presets::supernova_restore(&base));
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = self.clock.tick();
        self.process_input(now, event_loop);
        if !self.simulation.is_running() {
            return;
        }

        self.batch.clear();
        self.simulation.frame(now, &mut self.batch);
        if self.clock.frame() % 300 == 0 {
            log::debug!(
                "{} particles at {:.1} fps",
                self.simulation.pool().len(),
                self.clock.fps()
            );
        }

        let Some(gpu) = &mut self.gpu else {
            return;
        };
        match gpu.render(&self.batch) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => gpu.reconfigure(),
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("surface out of memory");
                self.error = Some(AppError::OutOfMemory);
                self.simulation.shutdown();
                event_loop.exit();
            }
            Err(e) => log::warn!("surface error: {e:?}"),
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: AppError) {
        log::error!("{error}");
        self.error = Some(error);
        self.simulation.shutdown();
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let (width, height) = WINDOW_SIZE;
        let attrs = Window::default_attributes()
            .with_title(format!("{WINDOW_TITLE} - {}", self.simulation.mode()))
            .with_inner_size(winit::dpi::PhysicalSize::new(width, height));

        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e.into()),
        };
        let size = window.inner_size();

        match pollster::block_on(GpuState::new(window.clone(), self.batch.atlas())) {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(e) => return self.fail(event_loop, e.into()),
        }

        self.batch.resize(size.width as f32, size.height as f32);
        self.simulation
            .resize_canvas(size.width as f32, size.height as f32);
        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        self.simulation.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                self.simulation.shutdown();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(size);
                }
                self.batch.resize(size.width as f32, size.height as f32);
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.simulation.shutdown();
    }
}

/// Open a window and run until it is closed.
pub fn run_windowed(config: Config, seed: Option<u64>, fonts: &FontSet) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config, seed, fonts);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Options for a headless run.
#[derive(Debug, Clone)]
pub struct SnapshotOptions {
    pub width: u32,
    pub height: u32,
    pub frames: u32,
    pub seed: u64,
    /// Frame at which to trigger a supernova, if any.
    pub supernova_at: Option<u32>,
    /// Extra fonts tried before the bundled one.
    pub fonts: Vec<PathBuf>,
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            frames: 120,
            seed: 0,
            supernova_at: None,
            fonts: Vec::new(),
        }
    }
}

/// Run `options.frames` fixed-step frames without a window.
pub fn render_headless(config: Config, options: &SnapshotOptions) -> Result<Framebuffer, AppError> {
    let fonts = if options.fonts.is_empty() {
        FontSet::shared()
    } else {
        Arc::new(FontSet::load(&options.fonts)?)
    };
    let mut simulation = Simulation::builder()
        .with_config(config)
        .with_canvas(options.width as f32, options.height as f32)
        .with_seed(options.seed)
        .build();
    let mut framebuffer = Framebuffer::with_fonts(options.width, options.height, fonts);
    let mut clock = FrameClock::fixed(SNAPSHOT_STEP_MS);

    for frame in 0..options.frames {
        let now = clock.tick();
        if options.supernova_at == Some(frame) {
            simulation.trigger_supernova(u64::from(frame) + 1);
        }
        simulation.frame(now, &mut framebuffer);
    }
    simulation.shutdown();
    Ok(framebuffer)
}

/// Render headlessly and write the last frame to `path` as PNG.
pub fn snapshot(
    config: Config,
    options: &SnapshotOptions,
    path: impl AsRef<Path>,
) -> Result<(), AppError> {
    let path = path.as_ref();
    let framebuffer = render_headless(config, options)?;
    framebuffer.save_png(path)?;
    log::info!(
        "wrote {}x{} snapshot after {} frames to {}",
        options.width,
        options.height,
        options.frames,
        path.display()
    );
    Ok(())
}
