//! Glyph rasterisation from real fonts.
//!
//! Text goes through a [`FontSet`], an ordered fallback chain: fonts the user
//! passes in, then well-known system fonts with Runic coverage, then the
//! embedded DejaVu Sans. Each character is drawn with the first font that
//! maps it. A character no font maps gets the embedded font's missing-glyph
//! box, the same tofu a browser shows.
//!
//! [`GlyphMask`] is a coverage bitmap for the software canvas. [`GlyphAtlas`]
//! packs the mode alphabets into one mipmapped texture for the GPU.

use ab_glyph::{point, Font, FontArc, GlyphId, OutlinedGlyph, PxScale, ScaleFont};
use glam::Vec2;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use crate::error::FontError;

/// DejaVu Sans (Bitstream Vera license, see `assets/DejaVuSans-LICENSE.txt`).
const EMBEDDED_FONT: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

/// System fonts known to cover the Runic block, tried before the embedded font.
pub const SYSTEM_FALLBACKS: &[&str] = &[
    "/usr/share/fonts/truetype/noto/NotoSansRunic-Regular.ttf",
    "/usr/share/fonts/noto/NotoSansRunic-Regular.ttf",
    "/usr/share/fonts/google-noto/NotoSansRunic-Regular.ttf",
    "/usr/share/fonts/opentype/noto/NotoSansRunic-Regular.ttf",
    "/usr/share/fonts/truetype/junicode/Junicode.ttf",
    "C:\\Windows\\Fonts\\seguihis.ttf",
    "C:\\Windows\\Fonts\\seguisym.ttf",
];

/// Pixels per em of the atlas base level.
pub const ATLAS_EM: f32 = 64.0;
/// Mip levels in the atlas, base included.
pub const ATLAS_MIP_LEVELS: u32 = 4;
const ATLAS_WIDTH: u32 = 512;
// Cells start on multiples of this so the padding survives every mip level.
const ATLAS_ALIGN: u32 = 1 << ATLAS_MIP_LEVELS;

/// Variation selectors and joiners carry no ink of their own.
fn is_invisible(c: char) -> bool {
    matches!(c, '\u{FE00}'..='\u{FE0F}' | '\u{200D}')
}

/// Scale so that one em spans `size` pixels, like a CSS font size.
fn em_scale(font: &FontArc, size: f32) -> PxScale {
    match font.units_per_em() {
        Some(upem) if upem > 0.0 => PxScale::from(size * font.height_unscaled() / upem),
        _ => PxScale::from(size),
    }
}

/// Ordered font fallback chain.
#[derive(Debug, Clone)]
pub struct FontSet {
    fonts: Vec<FontArc>,
}

impl FontSet {
    /// Just the embedded font.
    pub fn embedded() -> Self {
        let mut fonts = Vec::new();
        Self::push_embedded(&mut fonts);
        Self { fonts }
    }

    /// `paths` in order, then any [`SYSTEM_FALLBACKS`] present, then the
    /// embedded font. Missing system fonts are skipped; a bad user font is an
    /// error.
    pub fn load(paths: &[PathBuf]) -> Result<Self, FontError> {
        let mut fonts = Vec::with_capacity(paths.len() + 2);
        for path in paths {
            fonts.push(load_font(path)?);
        }

        for candidate in SYSTEM_FALLBACKS {
            let path = Path::new(candidate);
            if !path.is_file() {
                continue;
            }
            match load_font(path) {
                Ok(font) => {
                    log::debug!("using fallback font {}", path.display());
                    fonts.push(font);
                }
                Err(e) => log::warn!("{e}"),
            }
        }

        Self::push_embedded(&mut fonts);
        Ok(Self { fonts })
    }

    /// Process-wide default chain: system fallbacks, then the embedded font.
    pub fn shared() -> Arc<FontSet> {
        static SHARED: OnceLock<Arc<FontSet>> = OnceLock::new();
        SHARED
            .get_or_init(|| {
                Arc::new(Self::load(&[]).unwrap_or_else(|e| {
                    log::warn!("{e}");
                    Self::embedded()
                }))
            })
            .clone()
    }

    fn push_embedded(fonts: &mut Vec<FontArc>) {
        match FontArc::try_from_slice(EMBEDDED_FONT) {
            Ok(font) => fonts.push(font),
            Err(e) => log::error!("embedded font is unusable: {e}"),
        }
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    /// Whether some font in the chain maps `c`.
    pub fn covers(&self, c: char) -> bool {
        self.fonts.iter().any(|f| f.glyph_id(c) != GlyphId(0))
    }

    /// First font mapping `c`, or the last font's missing-glyph box.
    fn resolve(&self, c: char) -> Option<(&FontArc, GlyphId)> {
        self.fonts
            .iter()
            .find_map(|f| {
                let id = f.glyph_id(c);
                (id != GlyphId(0)).then_some((f, id))
            })
            .or_else(|| {
                log::debug!("no font maps {c:?}");
                self.fonts.last().map(|f| (f, GlyphId(0)))
            })
    }

    /// Rasterise `text` at `size` pixels per em, laid out along the baseline.
    pub fn rasterize(&self, text: &str, size: f32) -> GlyphMask {
        if !(size.is_finite() && size > 0.0) {
            return GlyphMask::empty();
        }

        let mut pen_x = 0.0;
        let mut outlines: Vec<OutlinedGlyph> = Vec::new();
        for c in text.chars().filter(|c| !is_invisible(*c)) {
            let Some((font, id)) = self.resolve(c) else {
                continue;
            };
            let scale = em_scale(font, size);
            let glyph = id.with_scale_and_position(scale, point(pen_x, 0.0));
            pen_x += font.as_scaled(scale).h_advance(id);
            if let Some(outlined) = font.outline_glyph(glyph) {
                outlines.push(outlined);
            }
        }

        let Some(first) = outlines.first() else {
            return GlyphMask::empty();
        };
        let mut min = first.px_bounds().min;
        let mut max = first.px_bounds().max;
        for g in &outlines[1..] {
            let b = g.px_bounds();
            min = point(min.x.min(b.min.x), min.y.min(b.min.y));
            max = point(max.x.max(b.max.x), max.y.max(b.max.y));
        }

        let width = (max.x - min.x).ceil().max(0.0) as u32;
        let height = (max.y - min.y).ceil().max(0.0) as u32;
        let mut coverage = vec![0.0f32; (width * height) as usize];
        for g in &outlines {
            let b = g.px_bounds();
            let dx = (b.min.x - min.x) as u32;
            let dy = (b.min.y - min.y) as u32;
            g.draw(|x, y, c| {
                let (x, y) = (dx + x, dy + y);
                if x < width && y < height {
                    let v = &mut coverage[(y * width + x) as usize];
                    *v = (*v + c).min(1.0);
                }
            });
        }

        GlyphMask {
            width,
            height,
            origin: Vec2::new(min.x, min.y),
            coverage,
        }
    }
}

fn load_font(path: &Path) -> Result<FontArc, FontError> {
    let data = std::fs::read(path).map_err(|source| FontError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    FontArc::try_from_vec(data).map_err(|source| FontError::Invalid {
        path: path.to_path_buf(),
        source,
    })
}

/// Coverage bitmap of rendered text.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphMask {
    pub width: u32,
    pub height: u32,
    /// Top-left corner of the bitmap relative to the baseline-left pen
    /// origin, y down.
    pub origin: Vec2,
    /// Row-major coverage in `[0, 1]`.
    pub coverage: Vec<f32>,
}

impl GlyphMask {
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            origin: Vec2::ZERO,
            coverage: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    /// Coverage of one texel, zero outside the bitmap.
    #[inline]
    pub fn at(&self, x: i32, y: i32) -> f32 {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return 0.0;
        }
        self.coverage[(y as u32 * self.width + x as u32) as usize]
    }

    /// Bilinear coverage at bitmap coordinates; texel centres sit at `+0.5`.
    pub fn sample(&self, p: Vec2) -> f32 {
        let q = p - 0.5;
        let base = q.floor();
        let t = q - base;
        let (x, y) = (base.x as i32, base.y as i32);
        let top = self.at(x, y) * (1.0 - t.x) + self.at(x + 1, y) * t.x;
        let bottom = self.at(x, y + 1) * (1.0 - t.x) + self.at(x + 1, y + 1) * t.x;
        top * (1.0 - t.y) + bottom * t.y
    }

    /// Total ink, in texels.
    pub fn ink(&self) -> f32 {
        self.coverage.iter().sum()
    }

    /// Gaussian blur with standard deviation `sigma`, padded so nothing is cut off.
    pub fn blurred(&self, sigma: f32) -> GlyphMask {
        if self.is_empty() || !(sigma.is_finite() && sigma > 0.0) {
            return self.clone();
        }
        let radius = (sigma * 3.0).ceil() as i32;
        let kernel = gaussian_kernel(sigma, radius as u32);
        let width = self.width + 2 * radius as u32;
        let height = self.height + 2 * radius as u32;

        // Horizontal pass over the source rows only; the rest stay empty.
        let mut rows = vec![0.0f32; (width * self.height) as usize];
        for y in 0..self.height as i32 {
            for x in 0..width as i32 {
                let sum: f32 = kernel
                    .iter()
                    .enumerate()
                    .map(|(k, w)| w * self.at(x - radius + k as i32 - radius, y))
                    .sum();
                rows[(y as u32 * width + x as u32) as usize] = sum;
            }
        }

        let mut coverage = vec![0.0f32; (width * height) as usize];
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                let mut sum = 0.0;
                for (k, w) in kernel.iter().enumerate() {
                    let sy = y - radius + k as i32 - radius;
                    if (0..self.height as i32).contains(&sy) {
                        sum += w * rows[(sy as u32 * width + x as u32) as usize];
                    }
                }
                coverage[(y as u32 * width + x as u32) as usize] = sum;
            }
        }

        GlyphMask {
            width,
            height,
            origin: self.origin - radius as f32,
            coverage,
        }
    }
}

/// Normalised Gaussian weights for offsets `-radius..=radius`.
pub fn gaussian_kernel(sigma: f32, radius: u32) -> Vec<f32> {
    let r = radius as i32;
    let weights: Vec<f32> = (-r..=r)
        .map(|i| (-(i * i) as f32 / (2.0 * sigma * sigma)).exp())
        .collect();
    let total: f32 = weights.iter().sum();
    weights.into_iter().map(|w| w / total).collect()
}

/// Where one glyph lives in a [`GlyphAtlas`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtlasEntry {
    /// Normalised texture rect: min x, min y, max x, max y.
    pub uv: [f32; 4],
    /// Bitmap top-left relative to the pen origin, in ems.
    pub origin: Vec2,
    /// Bitmap size in ems.
    pub extent: Vec2,
}

/// Glyph bitmaps packed into one R8 coverage texture with a mip chain.
#[derive(Debug, Clone)]
pub struct GlyphAtlas {
    width: u32,
    height: u32,
    levels: Vec<Vec<u8>>,
    entries: HashMap<String, AtlasEntry>,
}

impl GlyphAtlas {
    /// Rasterise `glyphs` at [`ATLAS_EM`] and shelf-pack them.
    pub fn build<'a>(fonts: &FontSet, glyphs: impl IntoIterator<Item = &'a str>) -> Self {
        let mut masks: Vec<(String, GlyphMask)> = Vec::new();
        for glyph in glyphs {
            if !masks.iter().any(|(g, _)| g == glyph) {
                masks.push((glyph.to_string(), fonts.rasterize(glyph, ATLAS_EM)));
            }
        }

        let align = |v: u32| v.div_ceil(ATLAS_ALIGN) * ATLAS_ALIGN;
        let mut placed = Vec::with_capacity(masks.len());
        let (mut x, mut y, mut shelf) = (ATLAS_ALIGN, ATLAS_ALIGN, 0);
        for (glyph, mask) in masks {
            let cell_w = align(mask.width) + ATLAS_ALIGN;
            if x + cell_w > ATLAS_WIDTH && x > ATLAS_ALIGN {
                x = ATLAS_ALIGN;
                y += shelf;
                shelf = 0;
            }
            shelf = shelf.max(align(mask.height) + ATLAS_ALIGN);
            placed.push((glyph, mask, x, y));
            x += cell_w;
        }
        let width = ATLAS_WIDTH;
        let height = align(y + shelf).max(ATLAS_ALIGN);

        let mut base = vec![0u8; (width * height) as usize];
        let mut entries = HashMap::with_capacity(placed.len());
        for (glyph, mask, x0, y0) in placed {
            for my in 0..mask.height {
                for mx in 0..mask.width {
                    let v = mask.coverage[(my * mask.width + mx) as usize];
                    let (tx, ty) = (x0 + mx, y0 + my);
                    if tx < width && ty < height {
                        base[(ty * width + tx) as usize] = (v * 255.0).round() as u8;
                    }
                }
            }
            entries.insert(
                glyph,
                AtlasEntry {
                    uv: [
                        x0 as f32 / width as f32,
                        y0 as f32 / height as f32,
                        (x0 + mask.width) as f32 / width as f32,
                        (y0 + mask.height) as f32 / height as f32,
                    ],
                    origin: mask.origin / ATLAS_EM,
                    extent: mask.size() / ATLAS_EM,
                },
            );
        }

        let mut levels = vec![base];
        let (mut w, mut h) = (width, height);
        for _ in 1..ATLAS_MIP_LEVELS {
            let Some(prev) = levels.last() else { break };
            let next = downsample(prev, w, h);
            w = (w / 2).max(1);
            h = (h / 2).max(1);
            levels.push(next);
        }

        Self {
            width,
            height,
            levels,
            entries,
        }
    }

    pub fn get(&self, glyph: &str) -> Option<&AtlasEntry> {
        self.entries.get(glyph)
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Mip levels, base first. Level `n` is `width >> n` by `height >> n`.
    pub fn levels(&self) -> &[Vec<u8>] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 2x2 box filter.
fn downsample(src: &[u8], width: u32, height: u32) -> Vec<u8> {
    let (w, h) = ((width / 2).max(1), (height / 2).max(1));
    let at = |x: u32, y: u32| src[(y.min(height - 1) * width + x.min(width - 1)) as usize] as u32;
    let mut out = vec![0u8; (w * h) as usize];
    for y in 0..h {
        for x in 0..w {
            let sum = at(2 * x, 2 * y) + at(2 * x + 1, 2 * y) + at(2 * x, 2 * y + 1) + at(2 * x + 1, 2 * y + 1);
            out[(y * w + x) as usize] = ((sum + 2) / 4) as u8;
        }
    }
    out
}
