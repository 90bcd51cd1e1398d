//! Canvas calls recorded as instanced sprites.
//!
//! The window draws through a [`SpriteBatch`] instead of the software
//! framebuffer. Every shape becomes one [`SpriteInstance`]; the sprite
//! shader evaluates the same signed distances the software canvas uses, and
//! glyphs sample the [`GlyphAtlas`].
//!
//! Glow is a screen-space pass: shapes drawn while glow is on are also
//! rendered into a glow layer that is blurred and composited under them.
//! A frame uses a single blur radius, the largest one set while drawing.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use std::ops::Range;
use std::sync::Arc;

use crate::color::Rgba;
use crate::render::glyphs::{ATLAS_EM, ATLAS_MIP_LEVELS};
use crate::render::{Canvas, GlyphAtlas};

/// Shape selector read by the sprite shader.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpriteShape {
    Circle = 0,
    Rect = 1,
    Ellipse = 2,
    Glyph = 3,
}

/// One instanced quad.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct SpriteInstance {
    /// Shape centre in canvas pixels.
    pub center: [f32; 2],
    /// Half extents before rotation.
    pub half_size: [f32; 2],
    pub rotation: f32,
    pub shape: u32,
    /// Atlas mip level, glyphs only.
    pub lod: f32,
    /// Straight-alpha fill, channels in `[0, 1]`.
    pub color: [f32; 4],
    /// Glow tint with its effective alpha. Zero alpha casts no glow.
    pub glow: [f32; 4],
    /// Atlas rect, glyphs only: min x, min y, max x, max y.
    pub uv: [f32; 4],
}

impl SpriteInstance {
    const ATTRIBUTES: [wgpu::VertexAttribute; 8] = wgpu::vertex_attr_array![
        0 => Float32x2,
        1 => Float32x2,
        2 => Float32,
        3 => Uint32,
        4 => Float32,
        5 => Float32x4,
        6 => Float32x4,
        7 => Float32x4,
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SpriteInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }

    fn new(shape: SpriteShape, center: Vec2, half_size: Vec2, rotation: f32, color: Rgba) -> Self {
        Self {
            center: center.to_array(),
            half_size: half_size.to_array(),
            rotation,
            shape: shape as u32,
            lod: 0.0,
            color: color.to_array(),
            glow: [0.0; 4],
            uv: [0.0; 4],
        }
    }
}

/// A [`Canvas`] recording one frame of sprites for the GPU.
#[derive(Debug, Clone)]
pub struct SpriteBatch {
    width: f32,
    height: f32,
    atlas: Arc<GlyphAtlas>,
    glow_blur: f32,
    glow_tint: Rgba,
    frame_blur: f32,
    glow_start: Option<usize>,
    instances: Vec<SpriteInstance>,
}

impl SpriteBatch {
    pub fn new(width: f32, height: f32, atlas: Arc<GlyphAtlas>) -> Self {
        Self {
            width,
            height,
            atlas,
            glow_blur: 0.0,
            glow_tint: Rgba::TRANSPARENT,
            frame_blur: 0.0,
            glow_start: None,
            instances: Vec::new(),
        }
    }

    /// Start a new frame.
    pub fn clear(&mut self) {
        self.instances.clear();
        self.glow_start = None;
        self.frame_blur = 0.0;
        self.glow_blur = 0.0;
        self.glow_tint = Rgba::TRANSPARENT;
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    pub fn atlas(&self) -> &GlyphAtlas {
        &self.atlas
    }

    pub fn instances(&self) -> &[SpriteInstance] {
        &self.instances
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Blur radius for this frame's glow layer, 0 when nothing glows.
    pub fn glow_blur(&self) -> f32 {
        if self.glow_start.is_some() {
            self.frame_blur
        } else {
            0.0
        }
    }

    /// Instances drawn before the first glowing one; the glow layer is
    /// composited between this range and the rest.
    pub fn before_glow(&self) -> Range<u32> {
        0..self.glow_start.unwrap_or(self.instances.len()) as u32
    }

    /// Instances from the first glowing one on.
    pub fn from_glow(&self) -> Range<u32> {
        self.before_glow().end..self.instances.len() as u32
    }

    fn push(&mut self, mut instance: SpriteInstance, alpha: f32) {
        let finite = instance.center.iter().chain(&instance.half_size).all(|v| v.is_finite());
        if !finite || alpha <= 0.0 {
            return;
        }
        if self.glow_blur > 0.0 && self.glow_tint.is_visible() {
            let tint = self.glow_tint.to_array();
            instance.glow = [tint[0], tint[1], tint[2], tint[3] * alpha];
            self.glow_start.get_or_insert(self.instances.len());
            self.frame_blur = self.frame_blur.max(self.glow_blur);
        }
        self.instances.push(instance);
    }
}

/// Mip level that brings an [`ATLAS_EM`] glyph down to about `size` pixels.
pub fn atlas_lod(size: f32) -> f32 {
    (ATLAS_EM / size.max(1e-3))
        .log2()
        .clamp(0.0, (ATLAS_MIP_LEVELS - 1) as f32)
}

impl Canvas for SpriteBatch {
    fn width(&self) -> f32 {
        self.width
    }

    fn height(&self) -> f32 {
        self.height
    }

    fn fill_rect(&mut self, origin: Vec2, size: Vec2, color: Rgba) {
        let half = size.abs() * 0.5;
        let center = origin + size * 0.5;
        self.push(SpriteInstance::new(SpriteShape::Rect, center, half, 0.0, color), color.a);
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        let r = Vec2::splat(radius.max(0.0));
        self.push(SpriteInstance::new(SpriteShape::Circle, center, r, 0.0, color), color.a);
    }

    fn fill_ellipse(&mut self, center: Vec2, radii: Vec2, rotation: f32, color: Rgba) {
        let radii = radii.max(Vec2::splat(1e-3));
        self.push(
            SpriteInstance::new(SpriteShape::Ellipse, center, radii, rotation, color),
            color.a,
        );
    }

    fn fill_glyph(&mut self, glyph: &str, position: Vec2, size: f32, rotation: f32, color: Rgba) {
        if !(size.is_finite() && size > 0.0) {
            return;
        }
        let Some(entry) = self.atlas.get(glyph).copied() else {
            log::trace!("{glyph:?} is not in the atlas");
            self.fill_circle(position, size / 4.0, color);
            return;
        };
        if entry.extent == Vec2::ZERO {
            return;
        }

        let pen = Vec2::new(-size / 4.0, size / 4.0);
        let half = entry.extent * size * 0.5;
        let local_center = pen + entry.origin * size + half;
        let center = position + Vec2::from_angle(rotation).rotate(local_center);

        let mut instance = SpriteInstance::new(SpriteShape::Glyph, center, half, rotation, color);
        instance.lod = atlas_lod(size);
        instance.uv = entry.uv;
        self.push(instance, color.a);
    }

    fn set_glow(&mut self, blur: f32, tint: Rgba) {
        self.glow_blur = if blur.is_finite() { blur.max(0.0) } else { 0.0 };
        self.glow_tint = tint;
    }
}
