//! A single simulated particle.
//!
//! Particles are point-like: they never look at each other, only at the
//! shared target point, the animation state and the clock. Everything a mode
//! needs to tell particles apart is fixed when the particle is created
//! (`ease`, `friction`, `phase`, `group`), so resizing the pool never changes
//! the character of the particles that survive it.

use glam::Vec2;
use rand::Rng;
use std::f32::consts::TAU;

use crate::color::{random_alpha, Rgba};
use crate::SimRng;

/// Velocity damping applied by the ease-to-target integration.
pub const FRICTION: f32 = 0.94;

/// Immutable two-way split assigned once at construction.
///
/// Modes give it their own meaning: the two teams of a duel, the two strands
/// of a helix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    Primary,
    Secondary,
}

impl Group {
    /// Numeric form, `0` or `1`.
    #[inline]
    pub fn index(self) -> u32 {
        match self {
            Group::Primary => 0,
            Group::Secondary => 1,
        }
    }

    /// Fair coin flip.
    pub fn random(rng: &mut SimRng) -> Self {
        if rng.gen::<bool>() {
            Group::Primary
        } else {
            Group::Secondary
        }
    }
}

/// Simulation state of one particle.
#[derive(Debug, Clone)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Draw radius in pixels, always positive.
    pub radius: f32,
    /// Fallback color for modes without their own policy.
    pub base_color: Rgba,
    /// Color for the current frame, rewritten before every draw.
    pub color: Rgba,
    /// Random angular offset used by orbiting modes.
    pub phase: f32,
    /// Glyph drawn by glyph-rendering modes, `None` everywhere else.
    pub glyph: Option<&'static str>,
    /// Rotation in radians.
    pub rotation: f32,
    friction: f32,
    ease: f32,
    group: Group,
}

impl Particle {
    /// Create a particle at a uniformly random spot inside `extent`.
    ///
    /// `size` is the configured particle size; the actual radius is jittered
    /// to `size * u + 0.5`.
    pub fn spawn(rng: &mut SimRng, extent: Vec2, size: f32) -> Self {
        let position = Vec2::new(rng.gen::<f32>() * extent.x, rng.gen::<f32>() * extent.y);
        let velocity = Vec2::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0));
        let radius = rng.gen::<f32>() * size.max(0.0) + 0.5;
        let base_color = Rgba::WHITE.with_alpha(random_alpha(rng));

        Self {
            position,
            velocity,
            radius,
            base_color,
            color: base_color,
            phase: rng.gen::<f32>() * TAU,
            glyph: None,
            rotation: rng.gen::<f32>() * TAU,
            friction: FRICTION,
            ease: 0.05 + rng.gen::<f32>() * 0.05,
            group: Group::random(rng),
        }
    }

    /// Velocity damping factor, fixed at construction.
    #[inline]
    pub fn friction(&self) -> f32 {
        self.friction
    }

    /// Spring stiffness toward the destination, in `[0.05, 0.10)`.
    #[inline]
    pub fn ease(&self) -> f32 {
        self.ease
    }

    #[inline]
    pub fn group(&self) -> Group {
        self.group
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    /// Damped spring step toward `destination`.
    pub fn ease_toward(&mut self, destination: Vec2, speed: f32) {
        let pull = (destination - self.position) * self.ease * 0.1 * speed;
        self.velocity = (self.velocity + pull) * self.friction;
        self.position += self.velocity;
    }

    /// Advance by the current velocity.
    #[inline]
    pub fn integrate(&mut self) {
        self.position += self.velocity;
    }

    /// Stiff, heavily damped pull used while a supernova gathers.
    pub fn gather_toward(&mut self, center: Vec2) {
        self.velocity = (self.velocity + (center - self.position) * 0.1) * 0.8;
        self.position += self.velocity;
    }

    /// Ballistic drift with light drag used after a supernova detonates.
    pub fn coast(&mut self) {
        self.position += self.velocity;
        self.velocity *= 0.98;
    }

    /// Random outward kick used when a supernova detonates.
    pub fn explode(&mut self, rng: &mut SimRng) {
        let angle = rng.gen::<f32>() * TAU;
        let force = 30.0 + rng.gen::<f32>() * 50.0;
        self.velocity = Vec2::from_angle(angle) * force;
    }

    #[cfg(test)]
    pub(crate) fn with_ease(mut self, ease: f32) -> Self {
        self.ease = ease;
        self
    }

    #[cfg(test)]
    pub(crate) fn with_group(mut self, group: Group) -> Self {
        self.group = group;
        self
    }
}
