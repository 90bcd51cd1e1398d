//! Display colors and the shared building blocks of per-mode color policies.
//!
//! Colors follow the CSS `rgba()` convention used throughout the modes:
//! 8-bit red/green/blue channels and a floating point alpha in `0.0..=1.0`.
//!
//! Color policies are re-evaluated for every particle on every frame with
//! fresh random draws, so the flicker they produce is part of the look.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::SimRng;

/// An RGBA color with 8-bit color channels and a unit-range alpha.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0.0);

    /// Create a color from channels and alpha.
    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// Create a color from floating point channels in `0.0..=255.0`.
    ///
    /// Channels are rounded and clamped; NaN maps to 0.
    pub fn from_channels(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self::new(channel(r), channel(g), channel(b), unit(a))
    }

    /// Same color with a different alpha.
    pub fn with_alpha(self, a: f32) -> Self {
        Self { a: unit(a), ..self }
    }

    /// Normalized `[r, g, b, a]`, all in `0.0..=1.0`.
    pub fn to_array(self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a,
        ]
    }

    /// Whether drawing with this color can change a pixel.
    pub fn is_visible(self) -> bool {
        self.a > 0.0
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::WHITE
    }
}

fn channel(v: f32) -> u8 {
    if v.is_nan() {
        0
    } else {
        v.round().clamp(0.0, 255.0) as u8
    }
}

fn unit(v: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

/// Per-evaluation alpha jitter shared by most policies: uniform in `[0.5, 1.0)`.
pub fn random_alpha(rng: &mut SimRng) -> f32 {
    rng.gen::<f32>() * 0.5 + 0.5
}

/// Pick a band for `draw` against descending cutoffs.
///
/// Returns the index of the first cutoff that `draw` exceeds, or
/// `cutoffs.len()` when it exceeds none. With cutoffs `[0.9, 0.6, 0.3]` and a
/// uniform draw the bands have probabilities `0.1, 0.3, 0.3, 0.3`.
pub fn descending_band(draw: f32, cutoffs: &[f32]) -> usize {
    cutoffs
        .iter()
        .position(|&cutoff| draw > cutoff)
        .unwrap_or(cutoffs.len())
}

/// Pick a band for `draw` against ascending cutoffs.
///
/// Returns the index of the first cutoff that `draw` is below, or
/// `cutoffs.len()` when it is below none.
pub fn ascending_band(draw: f32, cutoffs: &[f32]) -> usize {
    cutoffs
        .iter()
        .position(|&cutoff| draw < cutoff)
        .unwrap_or(cutoffs.len())
}

/// Cumulative cutoffs of the four-band fire gradient (spark, yellow, orange, smoke).
pub const FIRE_CUTOFFS: [f32; 3] = [0.9, 0.6, 0.3];

/// Four-band fire gradient: white-hot sparks, yellow, orange and grey smoke.
pub fn fire_gradient(rng: &mut SimRng) -> Rgba {
    let life = rng.gen::<f32>();
    let alpha = random_alpha(rng);
    match descending_band(life, &FIRE_CUTOFFS) {
        0 => Rgba::new(255, 255, 200, 1.0),
        1 => Rgba::new(255, 200, 0, alpha),
        2 => Rgba::new(255, 60, 0, alpha),
        _ => Rgba::new(100, 100, 100, alpha * 0.5),
    }
}
