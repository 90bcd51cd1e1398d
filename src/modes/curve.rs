//! Closed parametric curves: the heart and the angel wings.

use glam::Vec2;
use std::f32::consts::{PI, TAU};

use super::{Mode, ModeBehavior, Primitive, StepContext};
use crate::color::{random_alpha, Rgba};
use crate::particle::Particle;
use crate::SimRng;

/// Pixels per heart-curve unit.
pub const HEART_SCALE: f32 = 12.0;

/// Unscaled point on the classic heart curve for `fraction` of a full turn.
///
/// `fraction = 0` is the notch at the top (`(0, -5)`), `0.5` the tip at the
/// bottom (`(0, 17)`). Y grows downward.
pub fn heart_point(fraction: f32) -> Vec2 {
    let t = fraction * TAU;
    let x = 16.0 * t.sin().powi(3);
    let y = -(13.0 * t.cos() - 5.0 * (2.0 * t).cos() - 2.0 * (3.0 * t).cos() - (4.0 * t).cos());
    Vec2::new(x, y)
}

pub struct Heart;

impl ModeBehavior for Heart {
    fn mode(&self) -> Mode {
        Mode::Heart
    }

    fn destination(&self, _p: &mut Particle, ctx: &StepContext, _rng: &mut SimRng) -> Vec2 {
        ctx.target + heart_point(ctx.fraction()) * HEART_SCALE
    }
}

/// Flapping wings drawn with feather strokes.
pub struct Angel;

const WING_SPAN: f32 = 300.0;
const WING_HEIGHT: f32 = 250.0;

impl ModeBehavior for Angel {
    fn mode(&self) -> Mode {
        Mode::Angel
    }

    fn destination(&self, _p: &mut Particle, ctx: &StepContext, _rng: &mut SimRng) -> Vec2 {
        let flap = (ctx.phase(0.003) * ctx.speed).sin() * 0.5;
        let i = ctx.fraction();
        let (side, progress) = if i < 0.5 {
            (1.0, i * 2.0)
        } else {
            (-1.0, (i - 0.5) * 2.0)
        };

        let r = WING_SPAN * progress;
        let theta = progress * PI * 1.2;
        let wx = side * r * theta.cos();
        let wy = -WING_HEIGHT * theta.sin() * progress + wx.abs() * flap * 0.5;
        ctx.target + Vec2::new(wx, wy - 50.0)
    }

    fn color(&self, _p: &Particle, index: usize, rng: &mut SimRng) -> Rgba {
        let alpha = random_alpha(rng);
        if index % 10 == 0 {
            Rgba::new(255, 215, 0, alpha)
        } else {
            Rgba::new(240, 248, 255, alpha * 0.8)
        }
    }

    fn primitive(&self) -> Primitive {
        Primitive::Feather
    }

    fn glow_tint(&self) -> Rgba {
        Rgba::new(255, 223, 0, 0.6)
    }
}
