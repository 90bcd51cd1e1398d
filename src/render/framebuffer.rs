//! Software canvas on an RGBA image.
//!
//! Shapes are rasterised from signed distance functions evaluated at pixel
//! centres: coverage is `clamp(0.5 - d, 0, 1)`, which gives one pixel of
//! antialiasing. Glow paints a halo around the shape out to `blur` pixels,
//! fading quadratically, before the shape itself is blended on top.
//! Glyphs are real font outlines rasterised at the requested size; their
//! glow is the coverage mask blurred with a Gaussian of `sigma = blur / 2`.
//! Blending is source-over on straight alpha. The image stays opaque.

use glam::Vec2;
use image::{Rgba as Pixel, RgbaImage};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use super::glyphs::{FontSet, GlyphMask};
use super::Canvas;
use crate::color::Rgba;

#[derive(Debug, Clone, Copy)]
struct Glow {
    blur: f32,
    tint: Rgba,
}

/// Rasterised glyphs keyed by text and whole-pixel size.
#[derive(Debug, Clone)]
struct GlyphCache {
    fonts: Arc<FontSet>,
    masks: HashMap<(String, u32), Arc<GlyphMask>>,
    halos: HashMap<(String, u32, u32), Arc<GlyphMask>>,
}

impl GlyphCache {
    fn new(fonts: Arc<FontSet>) -> Self {
        Self {
            fonts,
            masks: HashMap::new(),
            halos: HashMap::new(),
        }
    }

    fn mask(&mut self, glyph: &str, size: u32) -> Arc<GlyphMask> {
        let fonts = &self.fonts;
        self.masks
            .entry((glyph.to_string(), size))
            .or_insert_with(|| Arc::new(fonts.rasterize(glyph, size as f32)))
            .clone()
    }

    fn halo(&mut self, glyph: &str, size: u32, blur: u32) -> Arc<GlyphMask> {
        let key = (glyph.to_string(), size, blur);
        if let Some(halo) = self.halos.get(&key) {
            return halo.clone();
        }
        let halo = Arc::new(self.mask(glyph, size).blurred(blur as f32 * 0.5));
        self.halos.insert(key, halo.clone());
        halo
    }
}

/// A [`Canvas`] rasterising into an [`RgbaImage`].
#[derive(Debug, Clone)]
pub struct Framebuffer {
    image: RgbaImage,
    glow: Glow,
    glyphs: GlyphCache,
}

impl Framebuffer {
    /// Opaque black framebuffer using the shared font chain. Zero sizes are
    /// bumped to one pixel.
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_fonts(width, height, FontSet::shared())
    }

    pub fn with_fonts(width: u32, height: u32, fonts: Arc<FontSet>) -> Self {
        Self {
            image: RgbaImage::from_pixel(width.max(1), height.max(1), Pixel([0, 0, 0, 255])),
            glow: Glow {
                blur: 0.0,
                tint: Rgba::TRANSPARENT,
            },
            glyphs: GlyphCache::new(fonts),
        }
    }

    /// Reallocate at a new size, clearing to black.
    pub fn resize(&mut self, width: u32, height: u32) {
        if (width.max(1), height.max(1)) != self.image.dimensions() {
            self.image = RgbaImage::from_pixel(width.max(1), height.max(1), Pixel([0, 0, 0, 255]));
        }
    }

    pub fn clear(&mut self) {
        for px in self.image.pixels_mut() {
            *px = Pixel([0, 0, 0, 255]);
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Raw RGBA8 bytes, row-major.
    pub fn pixels(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// RGBA of one pixel, `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.image.get_pixel_checked(x, y).map(|p| p.0)
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Write the frame as a PNG.
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<(), image::ImageError> {
        self.image
            .save_with_format(path.as_ref(), image::ImageFormat::Png)
    }

    #[inline]
    fn blend(&mut self, x: u32, y: u32, color: Rgba, alpha: f32) {
        if alpha <= 0.0 {
            return;
        }
        let a = alpha.min(1.0);
        let px = self.image.get_pixel_mut(x, y);
        for (dst, src) in px.0.iter_mut().zip([color.r, color.g, color.b]) {
            let v = src as f32 * a + *dst as f32 * (1.0 - a);
            *dst = v.round().clamp(0.0, 255.0) as u8;
        }
    }

    /// Rasterise a shape given its bounds and signed distance function.
    fn draw_sdf(&mut self, min: Vec2, max: Vec2, color: Rgba, sdf: impl Fn(Vec2) -> f32) {
        if !color.is_visible() || !(min.is_finite() && max.is_finite()) {
            return;
        }

        let glow = (self.glow.blur > 0.0 && self.glow.tint.is_visible()).then_some(self.glow);
        let pad = glow.map_or(1.0, |g| g.blur + 1.0);
        let (w, h) = self.image.dimensions();

        let x0 = (min.x - pad).floor().max(0.0) as u32;
        let y0 = (min.y - pad).floor().max(0.0) as u32;
        let x1 = ((max.x + pad).ceil().max(0.0) as u32).min(w);
        let y1 = ((max.y + pad).ceil().max(0.0) as u32).min(h);

        for y in y0..y1 {
            for x in x0..x1 {
                let d = sdf(Vec2::new(x as f32 + 0.5, y as f32 + 0.5));
                if let Some(g) = glow {
                    if d > 0.0 && d < g.blur {
                        let falloff = 1.0 - d / g.blur;
                        self.blend(x, y, g.tint, g.tint.a * color.a * falloff * falloff);
                    }
                }
                let coverage = (0.5 - d).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    self.blend(x, y, color, color.a * coverage);
                }
            }
        }
    }
}

impl Framebuffer {
    /// Blend `mask` scaled by `scale`, with its pen origin at `pen` in the
    /// local frame that `rotate` turns about `position`.
    #[allow(clippy::too_many_arguments)]
    fn stamp(
        &mut self,
        mask: &GlyphMask,
        position: Vec2,
        pen: Vec2,
        scale: f32,
        rotate: Vec2,
        color: Rgba,
        alpha: f32,
    ) {
        if mask.is_empty() || alpha <= 0.0 {
            return;
        }
        let min = pen + mask.origin * scale;
        let max = min + mask.size() * scale;
        let corners = [min, Vec2::new(max.x, min.y), max, Vec2::new(min.x, max.y)]
            .map(|c| position + rotate.rotate(c));
        let lo = corners.iter().fold(Vec2::INFINITY, |a, &c| a.min(c));
        let hi = corners.iter().fold(Vec2::NEG_INFINITY, |a, &c| a.max(c));
        if !(lo.is_finite() && hi.is_finite()) {
            return;
        }

        let (w, h) = self.image.dimensions();
        let x0 = lo.x.floor().max(0.0) as u32;
        let y0 = lo.y.floor().max(0.0) as u32;
        let x1 = (hi.x.ceil().max(0.0) as u32).min(w);
        let y1 = (hi.y.ceil().max(0.0) as u32).min(h);
        let unrotate = Vec2::new(rotate.x, -rotate.y);

        for y in y0..y1 {
            for x in x0..x1 {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let local = unrotate.rotate(p - position);
                let coverage = mask.sample((local - min) / scale);
                if coverage > 0.0 {
                    self.blend(x, y, color, alpha * coverage);
                }
            }
        }
    }
}

/// Signed distance to an axis-aligned box given by its half extents.
fn box_sdf(p: Vec2, half: Vec2) -> f32 {
    let q = p.abs() - half;
    q.max(Vec2::ZERO).length() + q.x.max(q.y).min(0.0)
}

impl Canvas for Framebuffer {
    fn width(&self) -> f32 {
        self.image.width() as f32
    }

    fn height(&self) -> f32 {
        self.image.height() as f32
    }

    fn fill_rect(&mut self, origin: Vec2, size: Vec2, color: Rgba) {
        let (w, h) = self.image.dimensions();
        let covers_canvas = origin.x <= 0.0
            && origin.y <= 0.0
            && origin.x + size.x >= w as f32
            && origin.y + size.y >= h as f32;

        // Full-canvas fills are the per-frame trail fade; skip the SDF walk.
        if covers_canvas && self.glow.blur <= 0.0 {
            if color.is_visible() {
                for y in 0..h {
                    for x in 0..w {
                        self.blend(x, y, color, color.a);
                    }
                }
            }
            return;
        }

        let half = size.abs() * 0.5;
        let center = origin + size * 0.5;
        self.draw_sdf(center - half, center + half, color, |p| box_sdf(p - center, half));
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        let r = radius.max(0.0);
        self.draw_sdf(center - r, center + r, color, |p| p.distance(center) - r);
    }

    fn fill_ellipse(&mut self, center: Vec2, radii: Vec2, rotation: f32, color: Rgba) {
        let radii = radii.max(Vec2::splat(1e-3));
        let extent = radii.max_element();
        let unrotate = Vec2::from_angle(-rotation);
        let scale = radii.min_element();
        self.draw_sdf(center - extent, center + extent, color, |p| {
            let local = unrotate.rotate(p - center);
            // First-order distance estimate, exact on the minor axis.
            ((local / radii).length() - 1.0) * scale
        });
    }

    fn fill_glyph(&mut self, glyph: &str, position: Vec2, size: f32, rotation: f32, color: Rgba) {
        if !(size.is_finite() && size > 0.0) || !color.is_visible() || !position.is_finite() {
            return;
        }
        // Rasterise at the nearest whole pixel size and scale the rest.
        let px = size.round().max(1.0);
        let scale = size / px;
        let pen = Vec2::new(-size / 4.0, size / 4.0);
        let rotate = Vec2::from_angle(rotation);

        let glow = self.glow;
        if glow.blur > 0.0 && glow.tint.is_visible() {
            let halo = self.glyphs.halo(glyph, px as u32, (glow.blur / scale).round() as u32);
            self.stamp(&halo, position, pen, scale, rotate, glow.tint, glow.tint.a * color.a);
        }
        let mask = self.glyphs.mask(glyph, px as u32);
        self.stamp(&mask, position, pen, scale, rotate, color, color.a);
    }

    fn set_glow(&mut self, blur: f32, tint: Rgba) {
        self.glow = Glow {
            blur: if blur.is_finite() { blur.max(0.0) } else { 0.0 },
            tint,
        };
    }
}
