//! Talking, blinking face.
//!
//! Particle ranges by pool fraction:
//!
//! - `[0.00, 0.70)` head: points on a stretched sphere, slowly turning
//! - `[0.70, 0.85)` eyes: two discs that squash shut when blinking
//! - `[0.85, 1.00)` mouth: a lip-shaped band that opens and closes

use glam::Vec2;
use rand::Rng;
use std::f32::consts::{FRAC_PI_2, PI, TAU};

use super::{Mode, ModeBehavior, StepContext};
use crate::color::{random_alpha, Rgba};
use crate::particle::Particle;
use crate::SimRng;

const HEAD_END: f32 = 0.70;
const EYES_END: f32 = 0.85;
const LEFT_EYE_END: f32 = 0.775;

/// Points with depth below this are drawn foreshortened behind the face.
const BACK_FACE_DEPTH: f32 = -30.0;

const EYE_OFFSET: Vec2 = Vec2::new(35.0, -10.0);
const EYE_RADIUS: f32 = 12.0;
const MOUTH_WIDTH: f32 = 40.0;
const MOUTH_Y: f32 = 60.0;

pub struct Face;

impl Face {
    fn head(ctx: &StepContext, t: f32, rng: &mut SimRng) -> Vec2 {
        let theta = ctx.fraction() * PI * 60.0;
        let phi = (2.0 * rng.gen::<f32>() - 1.0).clamp(-1.0, 1.0).acos();
        let r = if phi > FRAC_PI_2 { 85.0 } else { 100.0 };

        let x = r * phi.sin() * theta.cos();
        let y = r * phi.cos() * 1.4;
        let z = r * phi.sin() * theta.sin();

        if z < BACK_FACE_DEPTH {
            ctx.target + Vec2::new(x, y) * 0.5
        } else {
            let turn = (t * 0.5).sin() * 0.2;
            ctx.target + Vec2::new(x * turn.cos() - z * turn.sin(), y)
        }
    }

    fn eye(ctx: &StepContext, t: f32, rng: &mut SimRng) -> Vec2 {
        let side = if ctx.fraction() < LEFT_EYE_END { -1.0 } else { 1.0 };
        let openness = if (t * 2.0).sin() > 0.95 { 0.1 } else { 1.0 };
        let angle = rng.gen::<f32>() * TAU;
        let r = rng.gen::<f32>() * EYE_RADIUS;

        let center = Vec2::new(EYE_OFFSET.x * side, EYE_OFFSET.y);
        ctx.target + center + Vec2::new(angle.cos() * r, angle.sin() * r * openness)
    }

    fn mouth(ctx: &StepContext, t: f32, rng: &mut SimRng) -> Vec2 {
        let x = (rng.gen::<f32>() - 0.5) * MOUTH_WIDTH;
        let talk = (t * 8.0).sin() * (t * 3.0).sin();
        let open = 5.0 + talk.abs() * 15.0;
        let lip = (x / MOUTH_WIDTH * PI).cos();
        let sign = if rng.gen::<f32>() > 0.5 { 1.0 } else { -1.0 };
        let y = MOUTH_Y + sign * rng.gen::<f32>() * open * lip;
        ctx.target + Vec2::new(x, y)
    }
}

impl ModeBehavior for Face {
    fn mode(&self) -> Mode {
        Mode::Face
    }

    fn destination(&self, _p: &mut Particle, ctx: &StepContext, rng: &mut SimRng) -> Vec2 {
        let t = ctx.phase(0.002);
        let frac = ctx.fraction();
        if frac < HEAD_END {
            Self::head(ctx, t, rng)
        } else if frac < EYES_END {
            Self::eye(ctx, t, rng)
        } else {
            Self::mouth(ctx, t, rng)
        }
    }

    fn color(&self, _p: &Particle, _index: usize, rng: &mut SimRng) -> Rgba {
        Rgba::new(200, 240, 255, random_alpha(rng))
    }
}
