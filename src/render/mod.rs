//! Drawing particles onto a 2D surface.
//!
//! The [`Renderer`] talks to an immediate-mode [`Canvas`]. Each frame it
//!
//! 1. paints a translucent black rectangle over everything, leaving trails
//! 2. turns the glow on with the mode's tint
//! 3. draws every particle in pool order with the mode's primitive
//! 4. turns the glow off
//!
//! The crate ships the software [`Framebuffer`] for headless runs, the
//! recording [`DrawList`], and the GPU sprite batch in [`crate::gpu`] that
//! the window draws with.

mod framebuffer;
pub mod glyphs;

pub use framebuffer::Framebuffer;
pub use glyphs::{AtlasEntry, FontSet, GlyphAtlas, GlyphMask};

use glam::Vec2;

use crate::animation::AnimationState;
use crate::color::Rgba;
use crate::modes::{ModeBehavior, Primitive};
use crate::particle::Particle;

/// Trail alpha while the supernova is exploding.
pub const EXPLOSION_TRAIL_ALPHA: f32 = 0.05;

/// A 2D immediate-mode drawing surface.
///
/// Glow set by [`Canvas::set_glow`] applies to every shape drawn until it is
/// changed again, like a canvas shadow.
pub trait Canvas {
    fn width(&self) -> f32;
    fn height(&self) -> f32;

    /// Fill an axis-aligned rectangle with its top-left corner at `origin`.
    fn fill_rect(&mut self, origin: Vec2, size: Vec2, color: Rgba);

    /// Fill a circle.
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba);

    /// Fill an ellipse with semi-axes `radii`, rotated by `rotation` radians.
    fn fill_ellipse(&mut self, center: Vec2, radii: Vec2, rotation: f32, color: Rgba);

    /// Draw `glyph` at `size` pixels, rotated about `position`.
    ///
    /// The glyph's baseline-left corner sits at `(-size / 4, size / 4)`
    /// relative to `position` before rotation.
    fn fill_glyph(&mut self, glyph: &str, position: Vec2, size: f32, rotation: f32, color: Rgba);

    /// Set the glow blur radius (0 disables it) and tint.
    fn set_glow(&mut self, blur: f32, tint: Rgba);
}

/// Per-frame drawing parameters derived from the mode and animation state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStyle {
    pub trail_alpha: f32,
    pub glow_blur: f32,
    pub glow_tint: Rgba,
    pub primitive: Primitive,
}

impl FrameStyle {
    pub fn new(behavior: &dyn ModeBehavior, state: AnimationState, glow_intensity: u32) -> Self {
        let trail_alpha = if state == AnimationState::Exploding {
            EXPLOSION_TRAIL_ALPHA
        } else {
            behavior.trail_alpha()
        };
        Self {
            trail_alpha,
            glow_blur: glow_intensity as f32,
            glow_tint: behavior.glow_tint(),
            primitive: behavior.primitive(),
        }
    }
}

/// Paints a particle pool onto a [`Canvas`].
#[derive(Debug, Default, Clone, Copy)]
pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Self
    }

    /// Draw one frame.
    pub fn render<C: Canvas + ?Sized>(&self, canvas: &mut C, particles: &[Particle], style: &FrameStyle) {
        let size = Vec2::new(canvas.width(), canvas.height());
        canvas.fill_rect(Vec2::ZERO, size, Rgba::BLACK.with_alpha(style.trail_alpha));

        canvas.set_glow(style.glow_blur, style.glow_tint);
        for p in particles {
            self.draw_particle(canvas, p, style.primitive);
        }
        canvas.set_glow(0.0, Rgba::TRANSPARENT);
    }

    fn draw_particle<C: Canvas + ?Sized>(&self, canvas: &mut C, p: &Particle, primitive: Primitive) {
        match (primitive, p.glyph) {
            (Primitive::Square, _) => {
                canvas.fill_rect(p.position, Vec2::splat(p.radius * 2.0), p.color);
            }
            (Primitive::Glyph, Some(glyph)) => {
                canvas.fill_glyph(glyph, p.position, p.radius * 4.0, p.rotation, p.color);
            }
            (Primitive::Feather, _) => {
                let radii = Vec2::new(p.radius * 3.0, p.radius);
                canvas.fill_ellipse(p.position, radii, p.rotation, p.color);
            }
            (Primitive::Circle, _) | (Primitive::Glyph, None) => {
                canvas.fill_circle(p.position, p.radius, p.color);
            }
        }
    }
}

/// One recorded drawing call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Rect { origin: Vec2, size: Vec2, color: Rgba },
    Circle { center: Vec2, radius: f32, color: Rgba },
    Ellipse { center: Vec2, radii: Vec2, rotation: f32, color: Rgba },
    Glyph { glyph: String, position: Vec2, size: f32, rotation: f32, color: Rgba },
    Glow { blur: f32, tint: Rgba },
}

/// A [`Canvas`] that records calls instead of drawing.
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    width: f32,
    height: f32,
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Canvas for DrawList {
    fn width(&self) -> f32 {
        self.width
    }

    fn height(&self) -> f32 {
        self.height
    }

    fn fill_rect(&mut self, origin: Vec2, size: Vec2, color: Rgba) {
        self.commands.push(DrawCommand::Rect { origin, size, color });
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        self.commands.push(DrawCommand::Circle {
            center,
            radius,
            color,
        });
    }

    fn fill_ellipse(&mut self, center: Vec2, radii: Vec2, rotation: f32, color: Rgba) {
        self.commands.push(DrawCommand::Ellipse {
            center,
            radii,
            rotation,
            color,
        });
    }

    fn fill_glyph(&mut self, glyph: &str, position: Vec2, size: f32, rotation: f32, color: Rgba) {
        self.commands.push(DrawCommand::Glyph {
            glyph: glyph.to_string(),
            position,
            size,
            rotation,
            color,
        });
    }

    fn set_glow(&mut self, blur: f32, tint: Rgba) {
        self.commands.push(DrawCommand::Glow { blur, tint });
    }
}
