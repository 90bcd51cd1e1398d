//! Ordered particle storage with resize and glyph policies.

use glam::Vec2;
use rand::seq::SliceRandom;

use crate::modes::Mode;
use crate::particle::Particle;
use crate::SimRng;

/// The live particle collection.
///
/// Order is stable: growth appends and shrinking truncates the tail, so the
/// index a particle is updated and drawn at never changes while it lives.
#[derive(Debug, Clone)]
pub struct ParticlePool {
    particles: Vec<Particle>,
    spawn_extent: Vec2,
}

impl ParticlePool {
    /// Create an empty pool spawning new particles inside `spawn_extent`.
    pub fn new(spawn_extent: Vec2) -> Self {
        Self {
            particles: Vec::new(),
            spawn_extent: spawn_extent.max(Vec2::ONE),
        }
    }

    /// Grow or shrink to exactly `count` particles.
    pub fn resize(&mut self, count: usize, size: f32, rng: &mut SimRng) {
        let before = self.particles.len();
        if count > before {
            self.particles.reserve(count - before);
            let extent = self.spawn_extent;
            self.particles
                .extend((before..count).map(|_| Particle::spawn(rng, extent, size)));
        } else {
            self.particles.truncate(count);
        }

        if before != count {
            log::debug!("particle pool resized {} -> {}", before, count);
        }
    }

    /// Give every particle a random glyph from `mode`'s alphabet, or clear
    /// all glyphs when the mode draws none.
    pub fn assign_glyphs(&mut self, mode: Mode, rng: &mut SimRng) {
        match mode.glyph_alphabet() {
            Some(alphabet) => {
                for p in &mut self.particles {
                    p.glyph = alphabet.choose(rng).copied();
                }
            }
            None => {
                for p in &mut self.particles {
                    p.glyph = None;
                }
            }
        }
    }

    pub fn spawn_extent(&self) -> Vec2 {
        self.spawn_extent
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Particle> {
        self.particles.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Particle> {
        self.particles.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Particle> {
        self.particles.iter_mut()
    }

    pub fn as_slice(&self) -> &[Particle] {
        &self.particles
    }
}

impl<'a> IntoIterator for &'a ParticlePool {
    type Item = &'a Particle;
    type IntoIter = std::slice::Iter<'a, Particle>;

    fn into_iter(self) -> Self::IntoIter {
        self.particles.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modes::{RUNES, SNOWFLAKES};
    use rand::SeedableRng;

    fn pool() -> (ParticlePool, SimRng) {
        (
            ParticlePool::new(Vec2::new(1920.0, 1080.0)),
            SimRng::seed_from_u64(11),
        )
    }

    #[test]
    fn test_resize_grow_and_shrink() {
        let (mut pool, mut rng) = pool();
        for n in [0, 1, 100, 4000, 37, 0, 2500] {
            pool.resize(n, 2.5, &mut rng);
            assert_eq!(pool.len(), n);
        }
    }

    #[test]
    fn test_shrink_keeps_prefix() {
        let (mut pool, mut rng) = pool();
        pool.resize(10, 2.5, &mut rng);
        let before: Vec<Vec2> = pool.iter().map(|p| p.position).collect();
        pool.resize(4, 2.5, &mut rng);
        let after: Vec<Vec2> = pool.iter().map(|p| p.position).collect();
        assert_eq!(&before[..4], &after[..]);

        pool.resize(8, 2.5, &mut rng);
        let grown: Vec<Vec2> = pool.iter().map(|p| p.position).collect();
        assert_eq!(&before[..4], &grown[..4]);
    }

    #[test]
    fn test_new_particles_spawn_inside_extent() {
        let (mut pool, mut rng) = pool();
        pool.resize(1000, 2.5, &mut rng);
        let extent = pool.spawn_extent();
        assert!(pool.iter().all(|p| {
            (0.0..extent.x).contains(&p.position.x) && (0.0..extent.y).contains(&p.position.y)
        }));
    }

    #[test]
    fn test_glyphs_follow_mode() {
        let (mut pool, mut rng) = pool();
        pool.resize(200, 2.5, &mut rng);

        pool.assign_glyphs(Mode::Sorcerer, &mut rng);
        assert!(pool
            .iter()
            .all(|p| p.glyph.is_some_and(|g| RUNES.contains(&g))));

        let positions: Vec<Vec2> = pool.iter().map(|p| p.position).collect();
        pool.assign_glyphs(Mode::Snow, &mut rng);
        assert!(pool
            .iter()
            .all(|p| p.glyph.is_some_and(|g| SNOWFLAKES.contains(&g))));
        assert!(pool.iter().map(|p| p.position).eq(positions.into_iter()));

        pool.assign_glyphs(Mode::Heart, &mut rng);
        assert!(pool.iter().all(|p| p.glyph.is_none()));
    }

    #[test]
    fn test_empty_pool_glyph_assignment_is_noop() {
        let (mut pool, mut rng) = pool();
        pool.assign_glyphs(Mode::Snow, &mut rng);
        assert!(pool.is_empty());
    }
}
