//! Simulation context and frame loop.
//!
//! [`Simulation`] owns everything that changes from frame to frame: the
//! particle pool, the shared target point, the supernova state and the
//! random source. A frame is
//!
//! 1. apply the staged config, if any (resize, then re-letter glyphs)
//! 2. fire a due supernova deadline, kicking every particle on detonation
//! 3. for each particle in pool order: recompute its color, then move it
//! 4. draw the pool onto the canvas
//!
//! ```ignore
//! let mut sim = Simulation::builder()
//!     .with_config(Config::default().with_mode(Mode::Galaxy))
//!     .with_canvas(1280.0, 720.0)
//!     .build();
//!
//! let mut canvas = Framebuffer::new(1280, 720);
//! let mut clock = FrameClock::new();
//! loop {
//!     sim.frame(clock.tick(), &mut canvas);
//! }
//! ```

use glam::Vec2;
use rand::SeedableRng;
use winit::event::WindowEvent;

use crate::animation::{AnimationState, Supernova, Transition};
use crate::config::Config;
use crate::input::InputTracker;
use crate::modes::{Mode, ModeBehavior, ModeRegistry, StepContext};
use crate::pool::ParticlePool;
use crate::render::{Canvas, FrameStyle, Renderer};
use crate::SimRng;

/// Builder for [`Simulation`].
pub struct SimulationBuilder {
    config: Config,
    canvas: Vec2,
    spawn_extent: Option<Vec2>,
    seed: Option<u64>,
    registry: Option<ModeRegistry>,
}

impl SimulationBuilder {
    /// Initial configuration.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Canvas size in pixels.
    pub fn with_canvas(mut self, width: f32, height: f32) -> Self {
        self.canvas = Vec2::new(width, height);
        self
    }

    /// Area new particles spawn in. Defaults to the initial canvas size.
    pub fn with_spawn_extent(mut self, width: f32, height: f32) -> Self {
        self.spawn_extent = Some(Vec2::new(width, height));
        self
    }

    /// Seed the random source for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Replace the built-in mode behaviors.
    pub fn with_registry(mut self, registry: ModeRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn build(self) -> Simulation {
        let rng = match self.seed {
            Some(seed) => SimRng::seed_from_u64(seed),
            None => SimRng::from_entropy(),
        };
        let extent = self.spawn_extent.unwrap_or(self.canvas);

        let mut sim = Simulation {
            config: self.config.clone(),
            pending: None,
            pool: ParticlePool::new(extent),
            registry: self.registry.unwrap_or_default(),
            supernova: Supernova::new(self.config.reentry),
            input: InputTracker::new(self.canvas.x, self.canvas.y),
            renderer: Renderer::new(),
            rng,
            now: 0.0,
            frames: 0,
            running: true,
        };
        sim.apply_config(self.config);
        sim
    }
}

/// The particle simulation.
pub struct Simulation {
    config: Config,
    pending: Option<Config>,
    pool: ParticlePool,
    registry: ModeRegistry,
    supernova: Supernova,
    input: InputTracker,
    renderer: Renderer,
    rng: SimRng,
    now: f64,
    frames: u64,
    running: bool,
}

impl Simulation {
    pub fn builder() -> SimulationBuilder {
        SimulationBuilder {
            config: Config::default(),
            canvas: Vec2::new(800.0, 600.0),
            spawn_extent: None,
            seed: None,
            registry: None,
        }
    }

    /// Simulation with `config` on a `width` x `height` canvas.
    pub fn new(config: Config, width: f32, height: f32) -> Self {
        Self::builder()
            .with_config(config)
            .with_canvas(width, height)
            .build()
    }

    /// The config in effect for the current frame.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Stage a config to take effect at the top of the next frame.
    ///
    /// Staging twice before a frame keeps only the latest.
    pub fn set_config(&mut self, config: Config) {
        self.pending = Some(config);
    }

    /// The staged config, if one is waiting.
    pub fn pending_config(&self) -> Option<&Config> {
        self.pending.as_ref()
    }

    /// Offer a supernova trigger token. Returns whether a cycle started.
    pub fn trigger_supernova(&mut self, token: u64) -> bool {
        matches!(
            self.supernova.trigger(token, self.now),
            Some(Transition::Gather)
        )
    }

    /// Move the shared target. Ignored while gathering.
    pub fn pointer_moved(&mut self, x: f32, y: f32) -> bool {
        self.input
            .pointer_moved(Vec2::new(x, y), self.supernova.state())
    }

    /// Record a new canvas size.
    pub fn resize_canvas(&mut self, width: f32, height: f32) {
        self.input.canvas_resized(width, height);
    }

    /// Route a window event to the input tracker.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        let state = self.supernova.state();
        self.input.handle_event(event, state);
    }

    /// Advance every particle to clock time `now` (milliseconds).
    pub fn update(&mut self, now: f64) {
        if !self.running {
            return;
        }
        self.now = now;
        self.frames += 1;

        if let Some(config) = self.pending.take() {
            self.apply_config(config);
        }

        if let Some(Transition::Explode) = self.supernova.advance(now) {
            for p in self.pool.iter_mut() {
                p.explode(&mut self.rng);
            }
        }

        let canvas = self.input.canvas_size();
        let mut ctx = StepContext {
            target: self.input.target(),
            width: canvas.x,
            height: canvas.y,
            index: 0,
            count: self.pool.len(),
            speed: self.config.base_speed,
            time: now,
        };
        let state = self.supernova.state();
        let center = ctx.center();
        let behavior = self.registry.get(self.config.mode);

        for (index, p) in self.pool.iter_mut().enumerate() {
            p.color = behavior.color(p, index, &mut self.rng);
            match state {
                AnimationState::Gathering => p.gather_toward(center),
                AnimationState::Exploding => p.coast(),
                AnimationState::Normal => {
                    ctx.index = index;
                    behavior.step(p, &ctx, &mut self.rng);
                }
            }
        }
    }

    /// Draw the current pool onto `canvas`.
    pub fn render<C: Canvas + ?Sized>(&self, canvas: &mut C) {
        let style = FrameStyle::new(
            self.behavior(),
            self.supernova.state(),
            self.config.glow_intensity,
        );
        self.renderer.render(canvas, self.pool.as_slice(), &style);
    }

    /// One full frame: update, then render.
    pub fn frame<C: Canvas + ?Sized>(&mut self, now: f64, canvas: &mut C) {
        self.update(now);
        if self.running {
            self.render(canvas);
        }
    }

    /// Stop the loop and cancel any running supernova.
    pub fn shutdown(&mut self) {
        if self.running {
            log::debug!("simulation shut down after {} frames", self.frames);
        }
        self.running = false;
        self.supernova.cancel();
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn state(&self) -> AnimationState {
        self.supernova.state()
    }

    pub fn supernova(&self) -> &Supernova {
        &self.supernova
    }

    pub fn mode(&self) -> Mode {
        self.config.mode
    }

    pub fn behavior(&self) -> &dyn ModeBehavior {
        self.registry.get(self.config.mode)
    }

    pub fn pool(&self) -> &ParticlePool {
        &self.pool
    }

    pub fn target(&self) -> Vec2 {
        self.input.target()
    }

    pub fn input(&self) -> &InputTracker {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputTracker {
        &mut self.input
    }

    /// Clock time of the last update, in milliseconds.
    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    fn apply_config(&mut self, config: Config) {
        if config.mode != self.config.mode {
            log::info!("mode {} -> {}", self.config.mode, config.mode);
        }
        self.supernova.set_policy(config.reentry);
        self.pool.resize(
            config.particle_count as usize,
            config.particle_size,
            &mut self.rng,
        );
        self.pool.assign_glyphs(config.mode, &mut self.rng);
        self.config = config;
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        self.supernova.cancel();
    }
}
