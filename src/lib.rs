//! # Lumina
//!
//! Real-time 2D particle simulations that arrange themselves into shapes,
//! orbit a pointer or fall under simple physics.
//!
//! A few thousand particles share one target point driven by the mouse or
//! the first touch contact. Each [`Mode`] decides where a particle wants to
//! be, how it moves there, what color it takes and how it is drawn. A
//! supernova can be triggered at any time: every particle collapses onto the
//! canvas centre, detonates outwards, then settles back into the current
//! mode.
//!
//! ## Quick Start
//!
//! ```ignore
//! use lumina::prelude::*;
//!
//! let mut sim = Simulation::builder()
//!     .with_config(Config::default().with_mode(Mode::Heart))
//!     .with_canvas(800.0, 600.0)
//!     .with_seed(7)
//!     .build();
//!
//! let mut canvas = Framebuffer::new(800, 600);
//! let mut clock = FrameClock::fixed(16.0);
//! for _ in 0..120 {
//!     sim.frame(clock.tick(), &mut canvas);
//! }
//! canvas.save_png("heart.png")?;
//! ```
//!
//! ## Core Concepts
//!
//! ### Modes
//!
//! Shape modes ease every particle toward a computed destination
//! (`HEART`, `SWORD`, `FACE`, ...). Orbit modes spin particles around the
//! target (`VORTEX`, `GALAXY`, `SATURN`, ...). Free-physics modes integrate
//! forces directly and recycle particles that leave the canvas (`TNT`,
//! `SNOW`, `MATRIX`, `RAIN`, `BLACKHOLE`, `GHOST`).
//!
//! Behaviors live behind the [`ModeBehavior`] trait and are looked up in a
//! [`ModeRegistry`], so a custom registry can replace any of them.
//!
//! ### Configuration
//!
//! [`Config`] holds particle count, speed, size, glow and mode. Changes are
//! staged with [`Simulation::set_config`] and applied atomically at the top
//! of the next frame. [`presets`] carries the per-mode tuning.
//!
//! ### Rendering
//!
//! [`Renderer`] draws through the [`Canvas`] trait. The window records each
//! frame into a [`SpriteBatch`] and draws it as instanced sprites with wgpu,
//! keeping trails in an offscreen target and blurring glow on the GPU.
//! [`Framebuffer`] is the software rasteriser used for headless snapshots;
//! [`DrawList`] records calls. Rune and snowflake glyphs come from real font
//! outlines through a [`FontSet`].

pub mod animation;
pub mod app;
pub mod color;
pub mod config;
pub mod error;
pub mod gpu;
pub mod input;
pub mod modes;
pub mod particle;
pub mod pool;
pub mod presets;
pub mod render;
pub mod simulation;
pub mod time;

pub use animation::{AnimationState, ReentryPolicy, Supernova, Transition};
pub use color::Rgba;
pub use config::Config;
pub use error::{AppError, ConfigError, FontError, GpuError};
pub use gpu::SpriteBatch;
pub use glam::Vec2;
pub use input::{InputTracker, KeyCode};
pub use modes::{Mode, ModeBehavior, ModeRegistry, Primitive, StepContext};
pub use particle::{Group, Particle};
pub use pool::ParticlePool;
pub use render::{
    Canvas, DrawCommand, DrawList, FontSet, FrameStyle, Framebuffer, GlyphAtlas, Renderer,
};
pub use simulation::{Simulation, SimulationBuilder};
pub use time::FrameClock;

/// Random source used throughout the simulation.
pub type SimRng = rand::rngs::SmallRng;

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use lumina::prelude::*;
/// ```
pub mod prelude {
    pub use crate::animation::{AnimationState, ReentryPolicy};
    pub use crate::config::Config;
    pub use crate::modes::Mode;
    pub use crate::render::{Canvas, Framebuffer};
    pub use crate::simulation::Simulation;
    pub use crate::time::FrameClock;
    pub use glam::Vec2;
}
