//! Free-physics modes.
//!
//! These skip the destination spring and integrate forces directly. Each has
//! a recycle rule that respawns a particle at a mode-defined origin. TNT
//! checks before forces apply. The falling modes check on both sides of the
//! move, so no particle ends a step below the floor.

use glam::Vec2;
use rand::Rng;
use std::f32::consts::{FRAC_PI_2, TAU};

use super::{Mode, ModeBehavior, Primitive, StepContext};
use crate::color::{fire_gradient, random_alpha, Rgba};
use crate::particle::Particle;
use crate::SimRng;

/// Distance from the target at which black hole particles are swallowed.
pub const EVENT_HORIZON: f32 = 30.0;

/// Width of the columns matrix rain snaps to.
pub const MATRIX_COLUMN_WIDTH: f32 = 10.0;

const GRAVITY: f32 = 0.5;

/// Spark fountain erupting from the target, falling under gravity.
pub struct Tnt;

impl Tnt {
    fn stalled(p: &Particle) -> bool {
        p.velocity.x.abs() < 0.1 && p.velocity.y.abs() < 0.1
    }
}

impl ModeBehavior for Tnt {
    fn mode(&self) -> Mode {
        Mode::Tnt
    }

    fn step(&self, p: &mut Particle, ctx: &StepContext, rng: &mut SimRng) {
        if p.position.y > ctx.height || Self::stalled(p) {
            p.position = ctx.target;
            let angle = -FRAC_PI_2 + (rng.gen::<f32>() - 0.5) * 2.0;
            let force = rng.gen::<f32>() * 15.0 * ctx.speed;
            p.velocity = Vec2::from_angle(angle) * force;
        }

        p.velocity.y += GRAVITY;
        p.velocity.x *= 0.95;

        if p.position.y >= ctx.height && p.velocity.y > 0.0 {
            p.velocity.y *= -0.6;
            p.position.y = ctx.height;
        }

        p.integrate();
    }

    fn color(&self, _p: &Particle, _index: usize, rng: &mut SimRng) -> Rgba {
        fire_gradient(rng)
    }

    fn primitive(&self) -> Primitive {
        Primitive::Square
    }

    fn trail_alpha(&self) -> f32 {
        0.3
    }

    fn glow_tint(&self) -> Rgba {
        Rgba::new(255, 50, 0, 0.8)
    }
}

/// Snowflakes drifting down, blown sideways by the pointer.
pub struct Snow;

impl Snow {
    fn recycle(p: &mut Particle, ctx: &StepContext, rng: &mut SimRng) {
        if p.position.y > ctx.height {
            p.position.y = -20.0;
            p.position.x = rng.gen::<f32>() * ctx.width;
        }
    }
}

impl ModeBehavior for Snow {
    fn mode(&self) -> Mode {
        Mode::Snow
    }

    fn step(&self, p: &mut Particle, ctx: &StepContext, rng: &mut SimRng) {
        Self::recycle(p, ctx, rng);

        let wind = (ctx.phase(0.001) + p.position.x * 0.01).sin() * 0.5;
        p.velocity.x = wind + (ctx.target.x - ctx.width / 2.0) * 0.002;
        p.velocity.y = (1.0 + rng.gen::<f32>() * 2.0) * ctx.speed;
        p.integrate();
        p.rotation += 0.02;

        Self::recycle(p, ctx, rng);
    }

    fn color(&self, _p: &Particle, _index: usize, rng: &mut SimRng) -> Rgba {
        Rgba::WHITE.with_alpha(random_alpha(rng) * 0.9)
    }

    fn primitive(&self) -> Primitive {
        Primitive::Glyph
    }
}

/// Digital rain falling in fixed columns.
pub struct Matrix;

impl Matrix {
    fn recycle(p: &mut Particle, ctx: &StepContext, rng: &mut SimRng) {
        if p.position.y > ctx.height {
            p.position.y = -rng.gen::<f32>() * 100.0;
            let columns = ctx.width / MATRIX_COLUMN_WIDTH;
            p.position.x = (rng.gen::<f32>() * columns).floor() * MATRIX_COLUMN_WIDTH;
        }
    }
}

impl ModeBehavior for Matrix {
    fn mode(&self) -> Mode {
        Mode::Matrix
    }

    fn step(&self, p: &mut Particle, ctx: &StepContext, rng: &mut SimRng) {
        Self::recycle(p, ctx, rng);

        p.velocity.y = (5.0 + rng.gen::<f32>() * 5.0) * ctx.speed;
        p.position.y += p.velocity.y;

        Self::recycle(p, ctx, rng);
    }

    fn color(&self, _p: &Particle, _index: usize, rng: &mut SimRng) -> Rgba {
        let head = rng.gen::<f32>() > 0.95;
        let alpha = random_alpha(rng);
        if head {
            Rgba::new(200, 255, 200, 1.0)
        } else {
            Rgba::new(0, 255, 50, alpha * 0.6)
        }
    }

    fn glow_tint(&self) -> Rgba {
        Rgba::new(0, 255, 50, 0.5)
    }
}

/// Accelerating rain slanted by the pointer.
pub struct Rain;

impl Rain {
    fn recycle(p: &mut Particle, ctx: &StepContext, rng: &mut SimRng) {
        if p.position.y > ctx.height {
            p.position.y = -10.0;
            p.position.x = rng.gen::<f32>() * ctx.width;
            p.velocity.y = 0.0;
        }
    }
}

impl ModeBehavior for Rain {
    fn mode(&self) -> Mode {
        Mode::Rain
    }

    fn step(&self, p: &mut Particle, ctx: &StepContext, rng: &mut SimRng) {
        Self::recycle(p, ctx, rng);

        p.velocity.y += GRAVITY * ctx.speed;
        p.velocity.x = (ctx.target.x - ctx.width / 2.0) * 0.005;
        p.integrate();

        Self::recycle(p, ctx, rng);
    }

    fn color(&self, _p: &Particle, _index: usize, rng: &mut SimRng) -> Rgba {
        Rgba::new(150, 200, 255, random_alpha(rng) * 0.5)
    }
}

/// Inverse-distance attractor with a swirl; swallowed particles reappear on a far ring.
pub struct BlackHole;

impl ModeBehavior for BlackHole {
    fn mode(&self) -> Mode {
        Mode::BlackHole
    }

    fn step(&self, p: &mut Particle, ctx: &StepContext, rng: &mut SimRng) {
        let delta = ctx.target - p.position;
        let dist = delta.length();

        if dist < EVENT_HORIZON {
            let angle = rng.gen::<f32>() * TAU;
            let radius = 300.0 + rng.gen::<f32>() * 50.0;
            p.position = ctx.target + Vec2::from_angle(angle) * radius;
            p.velocity = Vec2::ZERO;
            return;
        }

        let angle = delta.to_angle();
        let force = 500.0 / (dist + 1.0);
        p.velocity += Vec2::from_angle(angle) * force + Vec2::from_angle(angle + FRAC_PI_2) * 2.0;
        p.integrate();
    }

    fn color(&self, _p: &Particle, _index: usize, rng: &mut SimRng) -> Rgba {
        let depth = rng.gen::<f32>();
        let alpha = random_alpha(rng);
        if depth > 0.8 {
            Rgba::WHITE.with_alpha(alpha)
        } else {
            Rgba::from_channels(100.0 * depth, 0.0, 255.0 * depth, alpha)
        }
    }

    fn glow_tint(&self) -> Rgba {
        Rgba::new(100, 0, 255, 0.6)
    }
}

/// Wisps wandering loosely after the pointer.
pub struct Ghost;

impl ModeBehavior for Ghost {
    fn mode(&self) -> Mode {
        Mode::Ghost
    }

    fn step(&self, p: &mut Particle, ctx: &StepContext, _rng: &mut SimRng) {
        let wander_angle = (ctx.time * 0.002 + ctx.index as f64) as f32;
        let wander = Vec2::new(wander_angle.cos(), wander_angle.sin()) * 0.2;
        p.velocity += (ctx.target - p.position) * 0.005 + wander;
        p.velocity *= 0.92;
        p.integrate();
    }

    fn color(&self, _p: &Particle, _index: usize, rng: &mut SimRng) -> Rgba {
        Rgba::new(150, 255, 200, random_alpha(rng) * 0.3)
    }

    fn trail_alpha(&self) -> f32 {
        0.05
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modes::test_support::{ctx, particle_at, rng};

    const EPS: f32 = 1e-3;

    #[test]
    fn test_tnt_recycles_below_floor_in_same_step() {
        let mut rng = rng();
        let c = ctx(0, 1);
        let mut p = particle_at(&mut rng, Vec2::new(100.0, c.height + 5.0));
        p.velocity = Vec2::new(3.0, 4.0);
        Tnt.step(&mut p, &c, &mut rng);
        // Respawned at the target, then moved by one step of launch velocity.
        assert!(p.position.distance(c.target) <= 15.0 + GRAVITY + EPS);
        assert!(p.position.y <= c.target.y + GRAVITY + EPS);
    }

    #[test]
    fn test_tnt_recycles_stalled_spark() {
        let mut rng = rng();
        let c = ctx(0, 1);
        let mut p = particle_at(&mut rng, Vec2::new(10.0, 10.0));
        p.velocity = Vec2::new(0.05, -0.05);
        Tnt.step(&mut p, &c, &mut rng);
        assert!(p.position.distance(c.target) < 20.0);
    }

    #[test]
    fn test_tnt_bounces_on_floor() {
        let mut rng = rng();
        let c = ctx(0, 1);
        let mut p = particle_at(&mut rng, Vec2::new(50.0, c.height));
        p.velocity = Vec2::new(1.0, 4.0);
        Tnt.step(&mut p, &c, &mut rng);
        assert!(p.velocity.y < 0.0);
        assert!((p.velocity.y - (4.5 * -0.6)).abs() < EPS);
        assert!(p.position.y < c.height);
    }

    #[test]
    fn test_tnt_gravity_pulls_down() {
        let mut rng = rng();
        let c = ctx(0, 1);
        let mut p = particle_at(&mut rng, Vec2::new(50.0, 100.0));
        p.velocity = Vec2::new(2.0, -3.0);
        Tnt.step(&mut p, &c, &mut rng);
        assert!((p.velocity.y - (-2.5)).abs() < EPS);
        assert!((p.velocity.x - 1.9).abs() < EPS);
    }

    #[test]
    fn test_snow_recycles_to_top() {
        let mut rng = rng();
        let c = ctx(0, 1);
        let mut p = particle_at(&mut rng, Vec2::new(100.0, c.height + 1.0));
        let rotation = p.rotation;
        Snow.step(&mut p, &c, &mut rng);
        assert!(p.position.y < -20.0 + 3.0 + EPS);
        assert!(p.position.y >= -20.0 + 1.0 - EPS);
        assert!((p.rotation - rotation - 0.02).abs() < EPS);
    }

    #[test]
    fn test_snow_wind_follows_pointer() {
        let mut rng = rng();
        let mut c = ctx(0, 1);
        c.target.x = c.width;
        let mut p = particle_at(&mut rng, Vec2::new(0.0, 10.0));
        Snow.step(&mut p, &c, &mut rng);
        // sin(0) wind is zero at x = 0, leaving only the pointer push.
        assert!((p.velocity.x - 400.0 * 0.002).abs() < EPS);
    }

    #[test]
    fn test_matrix_snaps_to_columns() {
        let mut rng = rng();
        let c = ctx(0, 1);
        for _ in 0..100 {
            let mut p = particle_at(&mut rng, Vec2::new(33.0, c.height + 1.0));
            Matrix.step(&mut p, &c, &mut rng);
            assert_eq!(p.position.x % MATRIX_COLUMN_WIDTH, 0.0);
            assert!(p.position.x < c.width);
            assert!(p.position.y <= 10.0 + EPS && p.position.y > -100.0 + 5.0 - EPS);
        }
    }

    #[test]
    fn test_matrix_only_moves_down() {
        let mut rng = rng();
        let c = ctx(0, 1);
        let mut p = particle_at(&mut rng, Vec2::new(40.0, 50.0));
        Matrix.step(&mut p, &c, &mut rng);
        assert_eq!(p.position.x, 40.0);
        assert!((55.0 - EPS..60.0 + EPS).contains(&p.position.y));
    }

    #[test]
    fn test_rain_recycle_resets_velocity() {
        let mut rng = rng();
        let c = ctx(0, 1);
        let mut p = particle_at(&mut rng, Vec2::new(5.0, c.height + 1.0));
        p.velocity.y = 40.0;
        Rain.step(&mut p, &c, &mut rng);
        assert!((p.velocity.y - GRAVITY).abs() < EPS);
        assert!((p.position.y - (-10.0 + GRAVITY)).abs() < EPS);
    }

    #[test]
    fn test_falling_modes_never_end_below_floor() {
        let mut rng = rng();
        let c = ctx(0, 1);
        let behaviors: [&dyn ModeBehavior; 3] = [&Rain, &Matrix, &Snow];
        for behavior in behaviors {
            for _ in 0..50 {
                let mut p = particle_at(&mut rng, Vec2::new(200.0, c.height - 0.5));
                p.velocity = Vec2::new(0.0, 12.0);
                behavior.step(&mut p, &c, &mut rng);
                assert!(
                    p.position.y <= 0.0,
                    "{} left a particle at {}",
                    behavior.mode(),
                    p.position
                );
                assert!((0.0..c.width).contains(&p.position.x));
            }
        }
    }

    #[test]
    fn test_rain_crossing_resets_velocity_in_same_step() {
        let mut rng = rng();
        let c = ctx(0, 1);
        let mut p = particle_at(&mut rng, Vec2::new(200.0, c.height - 2.0));
        p.velocity.y = 12.0;
        Rain.step(&mut p, &c, &mut rng);
        assert_eq!(p.position.y, -10.0);
        assert_eq!(p.velocity.y, 0.0);
    }

    #[test]
    fn test_tnt_stall_check_is_start_only() {
        let mut rng = rng();
        let c = ctx(0, 1);
        // Apex of a vertical launch: gravity brings vy to zero during the step.
        let mut p = particle_at(&mut rng, Vec2::new(50.0, 100.0));
        p.velocity = Vec2::new(0.0, -GRAVITY);
        Tnt.step(&mut p, &c, &mut rng);
        assert_eq!(p.position, Vec2::new(50.0, 100.0));
        assert_eq!(p.velocity, Vec2::ZERO);
    }

    #[test]
    fn test_black_hole_swallows_inside_horizon() {
        let mut rng = rng();
        let c = ctx(0, 1);
        let mut p = particle_at(&mut rng, c.target + Vec2::new(10.0, 0.0));
        p.velocity = Vec2::new(5.0, 5.0);
        BlackHole.step(&mut p, &c, &mut rng);
        let dist = p.position.distance(c.target);
        assert!((300.0 - EPS..350.0 + EPS).contains(&dist));
        assert_eq!(p.velocity, Vec2::ZERO);
    }

    #[test]
    fn test_black_hole_pulls_inward() {
        let mut rng = rng();
        let c = ctx(0, 1);
        let start = c.target + Vec2::new(200.0, 0.0);
        let mut p = particle_at(&mut rng, start);
        BlackHole.step(&mut p, &c, &mut rng);
        assert!(p.position.distance(c.target) < 200.0);
    }

    #[test]
    fn test_ghost_drifts_toward_target() {
        let mut rng = rng();
        let c = ctx(0, 1);
        let mut p = particle_at(&mut rng, c.target + Vec2::new(-300.0, 0.0));
        for _ in 0..50 {
            Ghost.step(&mut p, &c, &mut rng);
        }
        assert!(p.position.distance(c.target) < 300.0);
    }

    #[test]
    fn test_trail_and_primitives() {
        assert_eq!(Tnt.trail_alpha(), 0.3);
        assert_eq!(Ghost.trail_alpha(), 0.05);
        assert_eq!(Rain.trail_alpha(), crate::modes::DEFAULT_TRAIL_ALPHA);
        assert_eq!(Tnt.primitive(), Primitive::Square);
        assert_eq!(Snow.primitive(), Primitive::Glyph);
    }

    #[test]
    fn test_matrix_heads_are_rare() {
        let mut rng = rng();
        let p = particle_at(&mut rng, Vec2::ZERO);
        let heads = (0..10_000)
            .filter(|_| Matrix.color(&p, 0, &mut rng).a == 1.0)
            .count();
        assert!((350..650).contains(&heads), "{heads}");
    }
}
