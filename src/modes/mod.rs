//! Particle modes.
//!
//! A mode decides three things for every particle on every frame: where it
//! moves ([`ModeBehavior::step`]), what color it has ([`ModeBehavior::color`])
//! and how it is drawn ([`ModeBehavior::primitive`]).
//!
//! Two families exist:
//!
//! | Family | Modes | Motion |
//! |--------|-------|--------|
//! | Ease-to-target | shapes, curves, silhouettes | damped spring toward [`ModeBehavior::destination`] |
//! | Free physics | TNT, snow, matrix, rain, black hole, ghost | direct force integration plus a recycle rule |
//!
//! Behaviors are looked up through a [`ModeRegistry`] keyed by [`Mode`].
//!
//! # Example
//!
//! ```ignore
//! let registry = ModeRegistry::standard();
//! let behavior = registry.get(Mode::Heart);
//! behavior.step(&mut particle, &ctx, &mut rng);
//! ```

mod curve;
mod face;
mod orbit;
mod physics;
mod silhouette;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::color::Rgba;
use crate::particle::Particle;
use crate::SimRng;

pub use curve::{heart_point, Angel, Heart, HEART_SCALE};
pub use face::Face;
pub use orbit::{Circle, Dna, Galaxy, Saturn, Sorcerer, Star, Swarm, Vortex};
pub use physics::{
    BlackHole, Ghost, Matrix, Rain, Snow, Tnt, EVENT_HORIZON, MATRIX_COLUMN_WIDTH,
};
pub use silhouette::{Duel, Hourglass, Phoenix, Shield, Spear, Sword};

/// Default trail fade alpha painted over the canvas each frame.
pub const DEFAULT_TRAIL_ALPHA: f32 = 0.15;

/// Default glow tint.
pub const DEFAULT_GLOW_TINT: Rgba = Rgba::new(255, 255, 255, 0.8);

/// Runic alphabet drawn by [`Mode::Sorcerer`].
pub const RUNES: &[&str] = &[
    "ᚠ", "ᚢ", "ᚦ", "ᚨ", "ᚱ", "ᚲ", "ᚷ", "ᚹ", "ᚺ", "ᚾ", "ᛁ", "ᛃ", "ᛇ", "ᛈ", "ᛉ", "ᛊ", "ᛏ", "ᛒ",
    "ᛖ", "ᛗ", "ᛚ", "ᛜ", "ᛞ", "ᛟ", "✨", "⚡", "✴️",
];

/// Snowflake alphabet drawn by [`Mode::Snow`].
pub const SNOWFLAKES: &[&str] = &["❄️", "❅", "❆", "•"];

/// Every particle mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    #[default]
    Swarm,
    Vortex,
    Circle,
    Star,
    Heart,
    Saturn,
    Sword,
    Spear,
    Shield,
    Hourglass,
    Duel,
    Galaxy,
    Dna,
    Face,
    Phoenix,
    #[serde(rename = "BLACKHOLE")]
    BlackHole,
    Matrix,
    Rain,
    Angel,
    Sorcerer,
    Tnt,
    Snow,
    Ghost,
}

impl Mode {
    /// All modes in menu order.
    pub const ALL: [Mode; 23] = [
        Mode::Swarm,
        Mode::Vortex,
        Mode::Circle,
        Mode::Star,
        Mode::Heart,
        Mode::Saturn,
        Mode::Sword,
        Mode::Spear,
        Mode::Shield,
        Mode::Hourglass,
        Mode::Duel,
        Mode::Galaxy,
        Mode::Dna,
        Mode::Face,
        Mode::Phoenix,
        Mode::BlackHole,
        Mode::Matrix,
        Mode::Rain,
        Mode::Angel,
        Mode::Sorcerer,
        Mode::Tnt,
        Mode::Snow,
        Mode::Ghost,
    ];

    /// Canonical upper-case name.
    pub fn name(self) -> &'static str {
        match self {
            Mode::Swarm => "SWARM",
            Mode::Vortex => "VORTEX",
            Mode::Circle => "CIRCLE",
            Mode::Star => "STAR",
            Mode::Heart => "HEART",
            Mode::Saturn => "SATURN",
            Mode::Sword => "SWORD",
            Mode::Spear => "SPEAR",
            Mode::Shield => "SHIELD",
            Mode::Hourglass => "HOURGLASS",
            Mode::Duel => "DUEL",
            Mode::Galaxy => "GALAXY",
            Mode::Dna => "DNA",
            Mode::Face => "FACE",
            Mode::Phoenix => "PHOENIX",
            Mode::BlackHole => "BLACKHOLE",
            Mode::Matrix => "MATRIX",
            Mode::Rain => "RAIN",
            Mode::Angel => "ANGEL",
            Mode::Sorcerer => "SORCERER",
            Mode::Tnt => "TNT",
            Mode::Snow => "SNOW",
            Mode::Ghost => "GHOST",
        }
    }

    /// The mode after this one in menu order, wrapping around.
    pub fn next(self) -> Mode {
        let i = Mode::ALL.iter().position(|&m| m == self).unwrap_or(0);
        Mode::ALL[(i + 1) % Mode::ALL.len()]
    }

    /// Glyph alphabet for glyph-rendering modes.
    pub fn glyph_alphabet(self) -> Option<&'static [&'static str]> {
        match self {
            Mode::Sorcerer => Some(RUNES),
            Mode::Snow => Some(SNOWFLAKES),
            _ => None,
        }
    }

    /// Whether particles of this mode are drawn as text glyphs.
    pub fn renders_glyphs(self) -> bool {
        self.glyph_alphabet().is_some()
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown mode name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown mode '{0}'")]
pub struct UnknownMode(pub String);

impl FromStr for Mode {
    type Err = UnknownMode;

    /// Parse a canonical mode name, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Mode::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownMode(s.to_string()))
    }
}

/// Shape used to draw a particle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    /// Filled circle of the particle radius.
    Circle,
    /// Axis-aligned square of side `2 * radius` anchored at the position.
    Square,
    /// Rotated text glyph sized from the radius; circles when no glyph is set.
    Glyph,
    /// Rotated ellipse with radii `(3 * radius, radius)`.
    Feather,
}

/// Everything one particle step may read besides the particle itself.
#[derive(Debug, Clone, Copy)]
pub struct StepContext {
    /// Shared target point.
    pub target: Vec2,
    /// Canvas width in pixels.
    pub width: f32,
    /// Canvas height in pixels.
    pub height: f32,
    /// Position of the particle in the pool.
    pub index: usize,
    /// Pool size, at least `index + 1`.
    pub count: usize,
    /// Speed multiplier from the configuration.
    pub speed: f32,
    /// Milliseconds since the simulation clock started.
    pub time: f64,
}

impl StepContext {
    /// `index / count` as a fraction in `[0, 1)`.
    #[inline]
    pub fn fraction(&self) -> f32 {
        self.index as f32 / self.count.max(1) as f32
    }

    /// Frame time scaled by `rate`, as `f32`.
    #[inline]
    pub fn phase(&self, rate: f64) -> f32 {
        (self.time * rate) as f32
    }

    /// Canvas center.
    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }
}

/// Per-mode strategy: motion, color and drawing.
pub trait ModeBehavior: Send + Sync {
    /// The mode this behavior implements.
    fn mode(&self) -> Mode;

    /// Destination for ease-to-target modes. Defaults to the target point.
    fn destination(&self, _particle: &mut Particle, ctx: &StepContext, _rng: &mut SimRng) -> Vec2 {
        ctx.target
    }

    /// Advance one particle by one frame.
    ///
    /// The default eases toward [`ModeBehavior::destination`]; free-physics
    /// modes override this completely.
    fn step(&self, particle: &mut Particle, ctx: &StepContext, rng: &mut SimRng) {
        let destination = self.destination(particle, ctx, rng);
        particle.ease_toward(destination, ctx.speed);
    }

    /// Display color for this frame.
    fn color(&self, particle: &Particle, _index: usize, _rng: &mut SimRng) -> Rgba {
        particle.base_color
    }

    fn primitive(&self) -> Primitive {
        Primitive::Circle
    }

    /// Alpha of the black rectangle painted each frame; lower means longer trails.
    fn trail_alpha(&self) -> f32 {
        DEFAULT_TRAIL_ALPHA
    }

    fn glow_tint(&self) -> Rgba {
        DEFAULT_GLOW_TINT
    }
}

/// Behaviors keyed by mode.
pub struct ModeRegistry {
    behaviors: HashMap<Mode, Box<dyn ModeBehavior>>,
}

impl ModeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            behaviors: HashMap::new(),
        }
    }

    /// Registry with the built-in behavior for every mode.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(Swarm));
        registry.register(Box::new(Vortex));
        registry.register(Box::new(Circle));
        registry.register(Box::new(Star));
        registry.register(Box::new(Heart));
        registry.register(Box::new(Saturn));
        registry.register(Box::new(Sword));
        registry.register(Box::new(Spear));
        registry.register(Box::new(Shield));
        registry.register(Box::new(Hourglass));
        registry.register(Box::new(Duel));
        registry.register(Box::new(Galaxy));
        registry.register(Box::new(Dna));
        registry.register(Box::new(Face));
        registry.register(Box::new(Phoenix));
        registry.register(Box::new(BlackHole));
        registry.register(Box::new(Matrix));
        registry.register(Box::new(Rain));
        registry.register(Box::new(Angel));
        registry.register(Box::new(Sorcerer));
        registry.register(Box::new(Tnt));
        registry.register(Box::new(Snow));
        registry.register(Box::new(Ghost));
        registry
    }

    /// Add or replace the behavior for its mode.
    pub fn register(&mut self, behavior: Box<dyn ModeBehavior>) {
        self.behaviors.insert(behavior.mode(), behavior);
    }

    /// Behavior for `mode`, falling back to [`Swarm`] when none is registered.
    pub fn get(&self, mode: Mode) -> &dyn ModeBehavior {
        match self.behaviors.get(&mode) {
            Some(behavior) => behavior.as_ref(),
            None => &Swarm,
        }
    }

    pub fn contains(&self, mode: Mode) -> bool {
        self.behaviors.contains_key(&mode)
    }

    pub fn len(&self) -> usize {
        self.behaviors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.behaviors.is_empty()
    }
}

impl Default for ModeRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
