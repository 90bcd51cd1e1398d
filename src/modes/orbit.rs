//! Orbit family: destinations placed on rings, spirals and helices around the target.

use glam::Vec2;
use rand::Rng;
use std::f32::consts::{FRAC_PI_2, FRAC_PI_6, PI, TAU};

use super::{Mode, ModeBehavior, Primitive, StepContext};
use crate::color::{random_alpha, Rgba};
use crate::particle::{Group, Particle};
use crate::SimRng;

/// Loose cloud jittering around the target.
pub struct Swarm;

impl ModeBehavior for Swarm {
    fn mode(&self) -> Mode {
        Mode::Swarm
    }

    fn destination(&self, _p: &mut Particle, ctx: &StepContext, rng: &mut SimRng) -> Vec2 {
        ctx.target + Vec2::new(rng.gen::<f32>() - 0.5, rng.gen::<f32>() - 0.5) * 120.0
    }
}

/// Particles circling the target at their own phase, radius wobbling with index.
pub struct Vortex;

impl ModeBehavior for Vortex {
    fn mode(&self) -> Mode {
        Mode::Vortex
    }

    fn destination(&self, p: &mut Particle, ctx: &StepContext, _rng: &mut SimRng) -> Vec2 {
        let angle = ctx.phase(0.001) * ctx.speed + p.phase;
        let dist = 100.0 + (ctx.index as f32 * 0.1).sin() * 50.0;
        ctx.target + Vec2::from_angle(angle) * dist
    }
}

/// Slowly rotating ring of radius 150.
pub struct Circle;

impl ModeBehavior for Circle {
    fn mode(&self) -> Mode {
        Mode::Circle
    }

    fn destination(&self, _p: &mut Particle, ctx: &StepContext, _rng: &mut SimRng) -> Vec2 {
        let angle = ctx.fraction() * TAU + ctx.phase(0.0005);
        ctx.target + Vec2::from_angle(angle) * 150.0
    }
}

/// Five-pointed star: a ring whose radius follows `cos(5θ)`.
pub struct Star;

impl ModeBehavior for Star {
    fn mode(&self) -> Mode {
        Mode::Star
    }

    fn destination(&self, _p: &mut Particle, ctx: &StepContext, _rng: &mut SimRng) -> Vec2 {
        let angle = ctx.fraction() * TAU - FRAC_PI_2;
        let radius = 100.0 + (angle * 5.0).cos() * 50.0;
        ctx.target + Vec2::from_angle(angle) * radius
    }
}

/// Planet disc plus a tilted, flattened ring.
pub struct Saturn;

/// Ring tilt applied to fake perspective.
const SATURN_TILT: f32 = FRAC_PI_6;

impl ModeBehavior for Saturn {
    fn mode(&self) -> Mode {
        Mode::Saturn
    }

    fn destination(&self, _p: &mut Particle, ctx: &StepContext, rng: &mut SimRng) -> Vec2 {
        let n = ctx.count as f32;
        let is_ring = ctx.index as f32 > n * 0.6;

        if is_ring {
            let angle = (ctx.index as f32 / (n * 0.4)) * TAU * 3.0 + ctx.phase(0.0002);
            let radius = 140.0 + rng.gen::<f32>() * 40.0;
            let flat = Vec2::new(angle.cos() * radius, angle.sin() * radius * 0.3);
            ctx.target + Vec2::from_angle(SATURN_TILT).rotate(flat)
        } else {
            let angle = rng.gen::<f32>() * TAU;
            let r = rng.gen::<f32>().sqrt() * 80.0;
            ctx.target + Vec2::from_angle(angle) * r
        }
    }
}

/// Two-armed spiral galaxy.
pub struct Galaxy;

impl ModeBehavior for Galaxy {
    fn mode(&self) -> Mode {
        Mode::Galaxy
    }

    fn destination(&self, _p: &mut Particle, ctx: &StepContext, rng: &mut SimRng) -> Vec2 {
        let arm_offset = if ctx.index % 2 == 0 { 0.0 } else { PI };
        let spin = ctx.phase(0.0001) * ctx.speed;
        let r = ctx.fraction() * 300.0;
        let angle = arm_offset + r * 0.05 + spin;
        let jitter = (rng.gen::<f32>() - 0.5) * (r * 0.4);
        ctx.target + Vec2::from_angle(angle) * r + Vec2::splat(jitter)
    }

    fn color(&self, _p: &Particle, _index: usize, rng: &mut SimRng) -> Rgba {
        let red = 100.0 + rng.gen::<f32>() * 100.0;
        let alpha = random_alpha(rng);
        Rgba::from_channels(red, 100.0, 255.0, alpha)
    }
}

/// Double helix; the particle group picks the strand.
pub struct Dna;

impl ModeBehavior for Dna {
    fn mode(&self) -> Mode {
        Mode::Dna
    }

    fn destination(&self, p: &mut Particle, ctx: &StepContext, _rng: &mut SimRng) -> Vec2 {
        let strand = p.group().index() as f32;
        let t = ctx.phase(0.002) * ctx.speed;
        let height = 400.0;
        let y = ctx.fraction() * height - height / 2.0;
        let x = (y * 0.02 + t + strand * PI).sin() * 60.0;
        ctx.target + Vec2::new(x, y)
    }

    fn color(&self, p: &Particle, _index: usize, rng: &mut SimRng) -> Rgba {
        let alpha = random_alpha(rng);
        match p.group() {
            Group::Primary => Rgba::new(0, 255, 150, alpha),
            Group::Secondary => Rgba::new(180, 0, 255, alpha),
        }
    }
}

/// Five counter-rotating rings of runes.
pub struct Sorcerer;

const SORCERER_RINGS: usize = 5;

impl ModeBehavior for Sorcerer {
    fn mode(&self) -> Mode {
        Mode::Sorcerer
    }

    fn destination(&self, p: &mut Particle, ctx: &StepContext, _rng: &mut SimRng) -> Vec2 {
        let ring = ctx.index % SORCERER_RINGS;
        let radius = 60.0 + ring as f32 * 50.0;
        let dir = if ring % 2 == 0 { 1.0 } else { -1.0 };
        let angular_speed = (0.001 + ring as f64 * 0.0005) * dir * ctx.speed as f64;
        let per_ring = ctx.count as f32 / SORCERER_RINGS as f32;
        let angle = (ctx.index as f32 / per_ring) * TAU + (ctx.time * angular_speed) as f32;

        p.rotation = angle + FRAC_PI_2;
        ctx.target + Vec2::from_angle(angle) * radius
    }

    fn color(&self, _p: &Particle, index: usize, rng: &mut SimRng) -> Rgba {
        let alpha = random_alpha(rng);
        match index % 3 {
            0 => Rgba::new(0, 255, 255, alpha),
            1 => Rgba::new(180, 50, 255, alpha),
            _ => Rgba::new(255, 200, 100, alpha),
        }
    }

    fn primitive(&self) -> Primitive {
        Primitive::Glyph
    }

    fn glow_tint(&self) -> Rgba {
        Rgba::new(0, 255, 255, 0.6)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modes::test_support::{ctx, particle_at, rng};

    const EPS: f32 = 1e-3;

    #[test]
    fn test_circle_destination_on_radius() {
        let mut rng = rng();
        let mut p = particle_at(&mut rng, Vec2::ZERO);
        for i in [0, 10, 50, 99] {
            let c = ctx(i, 100);
            let dest = Circle.destination(&mut p, &c, &mut rng);
            assert!((dest.distance(c.target) - 150.0).abs() < EPS);
        }
    }

    #[test]
    fn test_circle_first_particle_at_angle_zero() {
        let mut rng = rng();
        let mut p = particle_at(&mut rng, Vec2::ZERO);
        let c = ctx(0, 100);
        let dest = Circle.destination(&mut p, &c, &mut rng);
        assert!((dest - (c.target + Vec2::new(150.0, 0.0))).length() < EPS);
    }

    #[test]
    fn test_star_tips_and_valleys() {
        let mut rng = rng();
        let mut p = particle_at(&mut rng, Vec2::ZERO);
        // index 0 sits at -pi/2 where cos(5 * -pi/2) = 0
        let c = ctx(0, 100);
        let dest = Star.destination(&mut p, &c, &mut rng);
        assert!((dest.distance(c.target) - 100.0).abs() < EPS);
        assert!(dest.y < c.target.y);
    }

    #[test]
    fn test_swarm_stays_within_box() {
        let mut rng = rng();
        let mut p = particle_at(&mut rng, Vec2::ZERO);
        let c = ctx(3, 10);
        for _ in 0..500 {
            let d = Swarm.destination(&mut p, &c, &mut rng) - c.target;
            assert!(d.x.abs() <= 60.0 && d.y.abs() <= 60.0);
        }
    }

    #[test]
    fn test_vortex_radius_band() {
        let mut rng = rng();
        let mut p = particle_at(&mut rng, Vec2::ZERO);
        for i in 0..200 {
            let c = ctx(i, 200);
            let dist = Vortex.destination(&mut p, &c, &mut rng).distance(c.target);
            assert!((50.0 - EPS..=150.0 + EPS).contains(&dist));
        }
    }

    #[test]
    fn test_saturn_planet_and_ring_split() {
        let mut rng = rng();
        let mut p = particle_at(&mut rng, Vec2::ZERO);
        for _ in 0..200 {
            let planet = ctx(10, 100);
            let d = Saturn.destination(&mut p, &planet, &mut rng);
            assert!(d.distance(planet.target) <= 80.0 + EPS);

            let ring = ctx(90, 100);
            let d = Saturn.destination(&mut p, &ring, &mut rng) - ring.target;
            // Undo the tilt: ring points lie in an ellipse with semi-axes (180, 54).
            let local = Vec2::from_angle(-SATURN_TILT).rotate(d);
            let k = (local.x / 180.0).powi(2) + (local.y / 54.0).powi(2);
            assert!(k <= 1.0 + EPS);
            assert!(d.length() >= 140.0 * 0.3 - EPS);
        }
    }

    #[test]
    fn test_galaxy_arms_alternate() {
        let mut rng = rng();
        let mut p = particle_at(&mut rng, Vec2::ZERO);
        // Large index with tiny jitter would still leave arms on opposite sides.
        let even = ctx(500, 1000);
        let odd = ctx(501, 1000);
        let mut sum_even = Vec2::ZERO;
        let mut sum_odd = Vec2::ZERO;
        for _ in 0..400 {
            sum_even += Galaxy.destination(&mut p, &even, &mut rng) - even.target;
            sum_odd += Galaxy.destination(&mut p, &odd, &mut rng) - odd.target;
        }
        assert!(sum_even.dot(sum_odd) < 0.0);
    }

    #[test]
    fn test_dna_strands_are_mirrored() {
        let mut rng = rng();
        let c = ctx(25, 100);
        let mut a = particle_at(&mut rng, Vec2::ZERO).with_group(Group::Primary);
        let mut b = particle_at(&mut rng, Vec2::ZERO).with_group(Group::Secondary);
        let da = Dna.destination(&mut a, &c, &mut rng) - c.target;
        let db = Dna.destination(&mut b, &c, &mut rng) - c.target;
        assert!((da.x + db.x).abs() < EPS);
        assert!((da.y - db.y).abs() < EPS);
        assert!((da.y - (-100.0)).abs() < EPS);
    }

    #[test]
    fn test_dna_colors_follow_group() {
        let mut rng = rng();
        let a = particle_at(&mut rng, Vec2::ZERO).with_group(Group::Primary);
        let b = particle_at(&mut rng, Vec2::ZERO).with_group(Group::Secondary);
        let ca = Dna.color(&a, 0, &mut rng);
        let cb = Dna.color(&b, 0, &mut rng);
        assert_eq!((ca.r, ca.g, ca.b), (0, 255, 150));
        assert_eq!((cb.r, cb.g, cb.b), (180, 0, 255));
    }

    #[test]
    fn test_sorcerer_rings_and_rotation() {
        let mut rng = rng();
        let mut p = particle_at(&mut rng, Vec2::ZERO);
        for i in 0..20 {
            let c = ctx(i, 20);
            let dest = Sorcerer.destination(&mut p, &c, &mut rng);
            let expected = 60.0 + (i % 5) as f32 * 50.0;
            assert!((dest.distance(c.target) - expected).abs() < EPS);
            let angle = (dest - c.target).to_angle();
            let rot = Vec2::from_angle(p.rotation - FRAC_PI_2);
            assert!((rot - Vec2::from_angle(angle)).length() < EPS);
        }
    }

    #[test]
    fn test_sorcerer_palette_by_index() {
        let mut rng = rng();
        let p = particle_at(&mut rng, Vec2::ZERO);
        let cyan = Sorcerer.color(&p, 3, &mut rng);
        let purple = Sorcerer.color(&p, 4, &mut rng);
        let gold = Sorcerer.color(&p, 5, &mut rng);
        assert_eq!((cyan.r, cyan.g, cyan.b), (0, 255, 255));
        assert_eq!((purple.r, purple.g, purple.b), (180, 50, 255));
        assert_eq!((gold.r, gold.g, gold.b), (255, 200, 100));
    }
}
