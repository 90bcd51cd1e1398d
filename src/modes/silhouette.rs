//! Filled silhouettes: weapons, an hourglass, a phoenix and two fighters.
//!
//! These modes scatter destinations randomly inside a shape every frame, so
//! particles shimmer inside the outline instead of settling on fixed points.

use glam::Vec2;
use rand::Rng;
use std::f32::consts::TAU;

use super::{Mode, ModeBehavior, StepContext};
use crate::color::{ascending_band, random_alpha, Rgba};
use crate::particle::{Group, Particle};
use crate::SimRng;

/// Uniform draw in `[-0.5, 0.5)`.
#[inline]
fn centered(rng: &mut SimRng) -> f32 {
    rng.gen::<f32>() - 0.5
}

/// Blade, cross guard and hilt.
pub struct Sword;

const BLADE_HEIGHT: f32 = 250.0;

impl ModeBehavior for Sword {
    fn mode(&self) -> Mode {
        Mode::Sword
    }

    fn destination(&self, _p: &mut Particle, ctx: &StepContext, rng: &mut SimRng) -> Vec2 {
        let frac = ctx.fraction();
        let offset = if frac < 0.7 {
            let y = -BLADE_HEIGHT + (frac / 0.7) * BLADE_HEIGHT;
            Vec2::new(centered(rng) * 20.0 * (1.0 - y.abs() / 300.0), y)
        } else if frac < 0.85 {
            Vec2::new(centered(rng) * 140.0, centered(rng) * 20.0)
        } else {
            Vec2::new(centered(rng) * 20.0, 40.0 + rng.gen::<f32>() * 60.0)
        };
        ctx.target + offset
    }
}

/// Triangular tip on a long thin shaft.
pub struct Spear;

impl ModeBehavior for Spear {
    fn mode(&self) -> Mode {
        Mode::Spear
    }

    fn destination(&self, _p: &mut Particle, ctx: &StepContext, rng: &mut SimRng) -> Vec2 {
        let offset = if ctx.fraction() < 0.15 {
            let y_rel = rng.gen::<f32>() * 60.0;
            Vec2::new(centered(rng) * y_rel * 0.5, -200.0 + y_rel)
        } else {
            Vec2::new(centered(rng) * 8.0, -140.0 + rng.gen::<f32>() * 400.0)
        };
        ctx.target + offset
    }
}

/// Heater shield: straight top, tapering to a point.
pub struct Shield;

impl ModeBehavior for Shield {
    fn mode(&self) -> Mode {
        Mode::Shield
    }

    fn destination(&self, _p: &mut Particle, ctx: &StepContext, rng: &mut SimRng) -> Vec2 {
        let y_rel = centered(rng) * 200.0;
        let width = if y_rel < -50.0 {
            120.0
        } else {
            (120.0 * (1.0 - (y_rel + 50.0) / 150.0)).max(0.0)
        };
        ctx.target + Vec2::new(centered(rng) * width * 1.5, y_rel)
    }
}

/// Two cones meeting at a narrow waist.
pub struct Hourglass;

const HOURGLASS_HALF_HEIGHT: f32 = 120.0;
const HOURGLASS_WIDTH: f32 = 100.0;

impl ModeBehavior for Hourglass {
    fn mode(&self) -> Mode {
        Mode::Hourglass
    }

    fn destination(&self, _p: &mut Particle, ctx: &StepContext, rng: &mut SimRng) -> Vec2 {
        let y_rel = centered(rng) * 2.0 * HOURGLASS_HALF_HEIGHT;
        let width = y_rel.abs() / HOURGLASS_HALF_HEIGHT * HOURGLASS_WIDTH + 5.0;
        ctx.target + Vec2::new(centered(rng) * width, y_rel)
    }
}

/// Firebird with flapping wings and a swaying tail.
pub struct Phoenix;

/// Ascending cutoffs for white, yellow, orange; the rest is deep red.
const PHOENIX_CUTOFFS: [f32; 3] = [0.1, 0.4, 0.7];

impl ModeBehavior for Phoenix {
    fn mode(&self) -> Mode {
        Mode::Phoenix
    }

    fn destination(&self, _p: &mut Particle, ctx: &StepContext, rng: &mut SimRng) -> Vec2 {
        let t = ctx.phase(0.005) * ctx.speed;
        let frac = ctx.fraction();

        let offset = if frac < 0.2 {
            Vec2::new(centered(rng) * 20.0, centered(rng) * 60.0)
        } else if frac < 0.7 {
            let side = if frac < 0.45 { -1.0 } else { 1.0 };
            let d = rng.gen::<f32>() * 200.0;
            let flap = (t + d * 0.01).sin() * 60.0;
            Vec2::new(side * d, flap - 20.0 - d * 0.2)
        } else {
            let d = rng.gen::<f32>() * 150.0;
            let sway = (t + d * 0.05).sin() * 20.0;
            Vec2::new(sway + centered(rng) * 10.0, 50.0 + d)
        };
        ctx.target + offset
    }

    fn color(&self, _p: &Particle, _index: usize, rng: &mut SimRng) -> Rgba {
        let heat = rng.gen::<f32>();
        let alpha = random_alpha(rng);
        match ascending_band(heat, &PHOENIX_CUTOFFS) {
            0 => Rgba::new(255, 255, 255, alpha),
            1 => Rgba::new(255, 200, 0, alpha),
            2 => Rgba::new(255, 100, 0, alpha),
            _ => Rgba::new(200, 20, 0, alpha),
        }
    }

    fn glow_tint(&self) -> Rgba {
        Rgba::new(255, 100, 0, 0.6)
    }
}

/// Two stick fighters swinging toward each other; the group picks the team.
pub struct Duel;

const DUEL_SEPARATION: f32 = 150.0;

impl ModeBehavior for Duel {
    fn mode(&self) -> Mode {
        Mode::Duel
    }

    fn destination(&self, p: &mut Particle, ctx: &StepContext, rng: &mut SimRng) -> Vec2 {
        let osc = ctx.phase(0.005).sin() * 100.0;
        let center_x = match p.group() {
            Group::Primary => ctx.target.x - DUEL_SEPARATION + osc,
            Group::Secondary => ctx.target.x + DUEL_SEPARATION - osc,
        };

        let part = rng.gen::<f32>();
        let mut offset = if part < 0.2 {
            let angle = rng.gen::<f32>() * TAU;
            let r = rng.gen::<f32>() * 15.0;
            Vec2::new(angle.cos() * r, -50.0 + angle.sin() * r)
        } else if part < 0.6 {
            Vec2::new(centered(rng) * 20.0, centered(rng) * 50.0)
        } else {
            Vec2::new(centered(rng) * 60.0, centered(rng) * 60.0)
        };

        // Clash: fighters flare out when they meet.
        if osc.abs() > 80.0 {
            offset *= Vec2::new(2.0, 1.5);
        }
        Vec2::new(center_x, ctx.target.y) + offset
    }

    fn color(&self, p: &Particle, _index: usize, rng: &mut SimRng) -> Rgba {
        let alpha = random_alpha(rng);
        match p.group() {
            Group::Primary => Rgba::new(0, 200, 255, alpha),
            Group::Secondary => Rgba::new(255, 60, 0, alpha),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modes::test_support::{ctx, particle_at, rng};

    const EPS: f32 = 1e-3;

    #[test]
    fn test_sword_parts() {
        let mut rng = rng();
        let mut p = particle_at(&mut rng, Vec2::ZERO);

        let blade_tip = ctx(0, 100);
        let d = Sword.destination(&mut p, &blade_tip, &mut rng) - blade_tip.target;
        assert!((d.y + BLADE_HEIGHT).abs() < EPS);
        assert!(d.x.abs() <= 10.0 * (1.0 - 250.0 / 300.0) + EPS);

        for _ in 0..100 {
            let guard = ctx(75, 100);
            let d = Sword.destination(&mut p, &guard, &mut rng) - guard.target;
            assert!(d.x.abs() <= 70.0 && d.y.abs() <= 10.0);

            let hilt = ctx(90, 100);
            let d = Sword.destination(&mut p, &hilt, &mut rng) - hilt.target;
            assert!(d.x.abs() <= 10.0 && (40.0..100.0).contains(&d.y));
        }
    }

    #[test]
    fn test_spear_tip_and_shaft() {
        let mut rng = rng();
        let mut p = particle_at(&mut rng, Vec2::ZERO);
        for _ in 0..100 {
            let tip = ctx(5, 100);
            let d = Spear.destination(&mut p, &tip, &mut rng) - tip.target;
            assert!((-200.0..-140.0).contains(&d.y));
            assert!(d.x.abs() <= (d.y + 200.0) * 0.25 + EPS);

            let shaft = ctx(50, 100);
            let d = Spear.destination(&mut p, &shaft, &mut rng) - shaft.target;
            assert!(d.x.abs() <= 4.0 && (-140.0..260.0).contains(&d.y));
        }
    }

    #[test]
    fn test_shield_tapers() {
        let mut rng = rng();
        let mut p = particle_at(&mut rng, Vec2::ZERO);
        let c = ctx(0, 1);
        for _ in 0..500 {
            let d = Shield.destination(&mut p, &c, &mut rng) - c.target;
            let limit = if d.y < -50.0 {
                90.0
            } else {
                (90.0 * (1.0 - (d.y + 50.0) / 150.0)).max(0.0)
            };
            assert!(d.x.abs() <= limit + EPS, "{d}");
        }
    }

    #[test]
    fn test_hourglass_waist_is_narrow() {
        let mut rng = rng();
        let mut p = particle_at(&mut rng, Vec2::ZERO);
        let c = ctx(0, 1);
        for _ in 0..500 {
            let d = Hourglass.destination(&mut p, &c, &mut rng) - c.target;
            assert!(d.y.abs() <= HOURGLASS_HALF_HEIGHT);
            let half_width = (d.y.abs() / HOURGLASS_HALF_HEIGHT * HOURGLASS_WIDTH + 5.0) / 2.0;
            assert!(d.x.abs() <= half_width + EPS);
        }
    }

    #[test]
    fn test_phoenix_wing_sides() {
        let mut rng = rng();
        let mut p = particle_at(&mut rng, Vec2::ZERO);
        for _ in 0..100 {
            let left = ctx(30, 100);
            assert!(Phoenix.destination(&mut p, &left, &mut rng).x <= left.target.x);
            let right = ctx(60, 100);
            assert!(Phoenix.destination(&mut p, &right, &mut rng).x >= right.target.x);
            let tail = ctx(80, 100);
            assert!(Phoenix.destination(&mut p, &tail, &mut rng).y >= tail.target.y + 50.0);
        }
    }

    #[test]
    fn test_duel_teams_face_each_other() {
        let mut rng = rng();
        let c = ctx(0, 1);
        let mut blue = particle_at(&mut rng, Vec2::ZERO).with_group(Group::Primary);
        let mut red = particle_at(&mut rng, Vec2::ZERO).with_group(Group::Secondary);
        for _ in 0..100 {
            // time 0: no oscillation, so no clash scaling either
            let b = Duel.destination(&mut blue, &c, &mut rng) - c.target;
            let r = Duel.destination(&mut red, &c, &mut rng) - c.target;
            assert!((b.x + DUEL_SEPARATION).abs() <= 30.0 + EPS);
            assert!((r.x - DUEL_SEPARATION).abs() <= 30.0 + EPS);
        }
        let bc = Duel.color(&blue, 0, &mut rng);
        let rc = Duel.color(&red, 0, &mut rng);
        assert_eq!((bc.r, bc.g, bc.b), (0, 200, 255));
        assert_eq!((rc.r, rc.g, rc.b), (255, 60, 0));
    }

    #[test]
    fn test_phoenix_palette_is_fire() {
        let mut rng = rng();
        let p = particle_at(&mut rng, Vec2::ZERO);
        for _ in 0..200 {
            let c = Phoenix.color(&p, 0, &mut rng);
            assert!(c.r >= 200);
            assert!((0.5..1.0).contains(&c.a));
        }
    }
}
