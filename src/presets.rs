//! Per-mode auto-tune presets.
//!
//! Switching modes through a driver applies the preset tuned for that mode.
//! Modes without one keep the current count, speed and glow and reset the
//! particle size.

use crate::config::Config;
use crate::modes::Mode;

/// Tuned parameters for one mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preset {
    pub mode: Mode,
    pub particle_count: u32,
    pub base_speed: f32,
    pub glow_intensity: u32,
    pub particle_size: f32,
}

const fn preset(mode: Mode, count: u32, speed: f32, glow: u32, size: f32) -> Preset {
    Preset {
        mode,
        particle_count: count,
        base_speed: speed,
        glow_intensity: glow,
        particle_size: size,
    }
}

pub static PRESETS: &[Preset] = &[
    preset(Mode::Face, 2500, 1.0, 10, 2.5),
    preset(Mode::Phoenix, 3000, 1.5, 30, 2.5),
    preset(Mode::Matrix, 2000, 2.0, 5, 2.5),
    preset(Mode::BlackHole, 4000, 2.5, 40, 2.0),
    preset(Mode::Rain, 1500, 2.2, 2, 2.5),
    preset(Mode::Galaxy, 3000, 0.8, 15, 2.5),
    preset(Mode::Dna, 1200, 1.2, 12, 3.0),
    preset(Mode::Duel, 1800, 1.8, 20, 2.5),
    // Feathers and glyphs are large, so fewer of them.
    preset(Mode::Angel, 1200, 1.0, 25, 2.0),
    preset(Mode::Sorcerer, 800, 1.2, 20, 4.0),
    preset(Mode::Tnt, 1000, 2.0, 30, 3.0),
    preset(Mode::Snow, 600, 0.5, 5, 4.0),
    preset(Mode::Ghost, 2000, 1.0, 15, 5.0),
];

/// Size restored for modes without a preset.
pub const DEFAULT_PARTICLE_SIZE: f32 = 2.5;

/// Particle count requested alongside a supernova.
pub const SUPERNOVA_PARTICLE_COUNT: u32 = 4000;
/// Glow requested alongside a supernova.
pub const SUPERNOVA_GLOW: u32 = 30;
/// Glow restored once the supernova boost expires.
pub const SUPERNOVA_GLOW_RESTORE: u32 = 15;
/// How long the supernova glow boost lasts.
pub const SUPERNOVA_BOOST_MS: f64 = 2000.0;

/// Preset registered for `mode`, if any.
pub fn find(mode: Mode) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.mode == mode)
}

/// Config for switching to `mode` from `current`.
pub fn preset_for(mode: Mode, current: &Config) -> Config {
    let mut next = current.clone().with_mode(mode);
    match find(mode) {
        Some(p) => {
            next.particle_count = p.particle_count;
            next.base_speed = p.base_speed;
            next.glow_intensity = p.glow_intensity;
            next.particle_size = p.particle_size;
        }
        None => next.particle_size = DEFAULT_PARTICLE_SIZE,
    }
    next
}

/// Config boosted for a supernova: full pool and strong glow.
pub fn supernova_boost(current: &Config) -> Config {
    Config {
        particle_count: SUPERNOVA_PARTICLE_COUNT,
        glow_intensity: SUPERNOVA_GLOW,
        ..current.clone()
    }
}

/// Config with the supernova glow boost removed.
pub fn supernova_restore(current: &Config) -> Config {
    Config {
        glow_intensity: SUPERNOVA_GLOW_RESTORE,
        ..current.clone()
    }
}
