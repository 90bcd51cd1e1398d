//! Simulation configuration.
//!
//! A [`Config`] is replaced wholesale on every change and sampled once per
//! frame. It serializes to JSON so drivers can load and save it:
//!
//! ```json
//! {
//!   "particle_count": 1500,
//!   "base_speed": 1.2,
//!   "particle_size": 2.5,
//!   "glow_intensity": 15,
//!   "mode": "SWARM"
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;

use crate::animation::ReentryPolicy;
use crate::error::ConfigError;
use crate::modes::Mode;

/// Particle count range offered by the control surface.
pub const PARTICLE_COUNT_RANGE: RangeInclusive<u32> = 100..=4000;
/// Speed multiplier range offered by the control surface.
pub const BASE_SPEED_RANGE: RangeInclusive<f32> = 0.5..=3.0;
/// Glow blur range offered by the control surface.
pub const GLOW_RANGE: RangeInclusive<u32> = 0..=40;

/// Complete simulation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub particle_count: u32,
    /// Multiplier on every mode's motion.
    pub base_speed: f32,
    /// Upper bound of the random particle radius jitter.
    pub particle_size: f32,
    /// Glow blur radius in pixels.
    pub glow_intensity: u32,
    pub mode: Mode,
    /// Supernova trigger handling while a cycle runs.
    pub reentry: ReentryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            particle_count: 1500,
            base_speed: 1.2,
            particle_size: 2.5,
            glow_intensity: 15,
            mode: Mode::Swarm,
            reentry: ReentryPolicy::WhileActive,
        }
    }
}

impl Config {
    /// Same config with `mode` swapped in.
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Clamp every field into the control surface ranges.
    ///
    /// The simulation accepts any value; this is for drivers that take raw
    /// user input.
    pub fn clamped(&self) -> Self {
        let speed = if self.base_speed.is_finite() {
            self.base_speed
        } else {
            *BASE_SPEED_RANGE.start()
        };
        let size = if self.particle_size.is_finite() {
            self.particle_size.max(0.0)
        } else {
            Config::default().particle_size
        };

        Self {
            particle_count: self
                .particle_count
                .clamp(*PARTICLE_COUNT_RANGE.start(), *PARTICLE_COUNT_RANGE.end()),
            base_speed: speed.clamp(*BASE_SPEED_RANGE.start(), *BASE_SPEED_RANGE.end()),
            particle_size: size,
            glow_intensity: self.glow_intensity.min(*GLOW_RANGE.end()),
            mode: self.mode,
            reentry: self.reentry,
        }
    }

    /// Write the config as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }

    /// Read a config from JSON. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&json)?;
        Ok(config)
    }
}
