//! Discharge Particle Emitter
//!
//! CPU particle pool for partial-discharge sparks around the joint.
//!
//! Architecture:
//! 1. Fixed pool allocated at mount, never grown
//! 2. Live particles packed at the front of the pool (swap-remove on death)
//! 3. Continuous emission while the effect asks for particles
//! 4. The live prefix is handed to the backend as raw bytes each frame
//!
//! Motion runs every frame; only spawning depends on the effect state.

use bytemuck::{Pod, Zeroable};
use cablesight_shared::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Pool capacity.
pub const MAX_DISCHARGE_PARTICLES: usize = 512;

/// A single spark, laid out for upload.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct DischargeParticle {
    /// Position (xyz) + age (w, 0-1 normalized)
    pub position_age: [f32; 4],
    /// Velocity (xyz) + lifetime (w, in seconds)
    pub velocity_lifetime: [f32; 4],
    /// Color (rgba)
    pub color: [f32; 4],
}

impl DischargeParticle {
    /// Size of a particle in bytes
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Normalized age.
    #[inline]
    #[must_use]
    pub const fn age(&self) -> f32 {
        self.position_age[3]
    }

    /// Current position.
    #[inline]
    #[must_use]
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.position_age[0], self.position_age[1], self.position_age[2])
    }
}

/// Emission parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DischargeConfig {
    /// Particles per second while emitting
    pub spawn_rate: f32,
    /// Minimum lifetime in seconds
    pub lifetime_min: f32,
    /// Maximum lifetime in seconds
    pub lifetime_max: f32,
    /// Outward speed
    pub speed: f32,
    /// Half-length of the emission band along the cable
    pub band: f32,
    /// Starting color (RGBA), fades to transparent
    pub color: [f32; 4],
}

impl Default for DischargeConfig {
    fn default() -> Self {
        Self {
            spawn_rate: 120.0,
            lifetime_min: 0.25,
            lifetime_max: 0.8,
            speed: 0.6,
            band: 0.35,
            color: [0.75, 0.85, 1.0, 1.0],
        }
    }
}

/// Statistics from one update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParticleStats {
    /// Total particles in pool
    pub pool_size: u32,
    /// Currently alive particles
    pub alive_count: u32,
    /// Particles spawned this frame
    pub spawned_this_frame: u32,
    /// Particles died this frame
    pub died_this_frame: u32,
}

/// Where sparks are born: a ring around the cable axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmissionRing {
    /// Center of the ring.
    pub origin: Vec3,
    /// Cable direction at the ring.
    pub axis: Vec3,
    /// Ring radius.
    pub radius: f32,
}

/// The discharge emitter and its pool
#[derive(Debug)]
pub struct DischargeEmitter {
    pool: Vec<DischargeParticle>,
    alive: usize,
    config: DischargeConfig,
    rng: ChaCha8Rng,
    spawn_accumulator: f32,
    stats: ParticleStats,
}

impl DischargeEmitter {
    /// Creates an emitter with a fixed pool
    #[must_use]
    pub fn new(capacity: usize, config: DischargeConfig, seed: u64) -> Self {
        let capacity = capacity.max(1);
        Self {
            pool: vec![DischargeParticle::default(); capacity],
            alive: 0,
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
            spawn_accumulator: 0.0,
            stats: ParticleStats {
                pool_size: capacity as u32,
                ..Default::default()
            },
        }
    }

    /// Advances every live particle and, if `emitting`, spawns new ones.
    ///
    /// Call once per frame BEFORE rendering.
    pub fn update(&mut self, dt: f32, emitting: bool, ring: &EmissionRing) -> ParticleStats {
        self.stats.spawned_this_frame = 0;
        self.stats.died_this_frame = 0;

        // Age and move; dead particles are swapped out of the live prefix
        let mut i = 0;
        while i < self.alive {
            let p = &mut self.pool[i];
            let lifetime = p.velocity_lifetime[3].max(1e-3);
            p.position_age[3] += dt / lifetime;
            if p.position_age[3] >= 1.0 {
                self.alive -= 1;
                self.pool.swap(i, self.alive);
                self.stats.died_this_frame += 1;
                continue;
            }
            for k in 0..3 {
                p.position_age[k] += p.velocity_lifetime[k] * dt;
            }
            p.color[3] = self.config.color[3] * (1.0 - p.position_age[3]);
            i += 1;
        }

        if emitting {
            self.spawn_accumulator += self.config.spawn_rate * dt;
            let wanted = self.spawn_accumulator.floor();
            self.spawn_accumulator -= wanted;
            let free = self.pool.len() - self.alive;
            let count = (wanted as usize).min(free);
            for _ in 0..count {
                self.spawn(ring);
            }
        } else {
            self.spawn_accumulator = 0.0;
        }

        self.stats.alive_count = self.alive as u32;
        self.stats
    }

    fn spawn(&mut self, ring: &EmissionRing) {
        let axis = ring.axis.normalize();
        let u = axis.any_perpendicular();
        let v = axis.cross(u).normalize();

        let angle = self.rng.gen_range(0.0..std::f32::consts::TAU);
        let along = self.rng.gen_range(-self.config.band..=self.config.band);
        let radial = u * angle.cos() + v * angle.sin();
        let position = ring.origin + axis * along + radial * ring.radius;
        let jitter = self.rng.gen_range(0.5..=1.5);
        let velocity = radial * (self.config.speed * jitter) + axis * self.rng.gen_range(-0.1..=0.1);
        let lifetime = self.rng.gen_range(self.config.lifetime_min..=self.config.lifetime_max);

        self.pool[self.alive] = DischargeParticle {
            position_age: [position.x, position.y, position.z, 0.0],
            velocity_lifetime: [velocity.x, velocity.y, velocity.z, lifetime],
            color: self.config.color,
        };
        self.alive += 1;
        self.stats.spawned_this_frame += 1;
    }

    /// Live particles.
    #[must_use]
    pub fn particles(&self) -> &[DischargeParticle] {
        &self.pool[..self.alive]
    }

    /// Live particles as bytes for upload
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.particles())
    }

    /// Number of live particles.
    #[must_use]
    pub fn alive_count(&self) -> u32 {
        self.alive as u32
    }

    /// Returns current statistics
    #[must_use]
    pub const fn stats(&self) -> ParticleStats {
        self.stats
    }

    /// Kills every particle.
    pub fn clear(&mut self) {
        self.alive = 0;
        self.spawn_accumulator = 0.0;
        self.stats = ParticleStats {
            pool_size: self.pool.len() as u32,
            ..Default::default()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring() -> EmissionRing {
        EmissionRing {
            origin: Vec3::ZERO,
            axis: Vec3::X,
            radius: 0.6,
        }
    }

    #[test]
    fn test_particle_size() {
        // Must be aligned for GPU
        assert_eq!(DischargeParticle::SIZE, 48);
        assert_eq!(DischargeParticle::SIZE % 16, 0);
    }

    #[test]
    fn test_emits_only_when_visible() {
        let mut emitter = DischargeEmitter::new(64, DischargeConfig::default(), 7);
        let stats = emitter.update(0.1, false, &ring());
        assert_eq!(stats.alive_count, 0);

        let stats = emitter.update(0.1, true, &ring());
        assert_eq!(stats.spawned_this_frame, 12);
        assert_eq!(emitter.as_bytes().len(), 12 * DischargeParticle::SIZE);
    }

    #[test]
    fn test_pool_never_overflows() {
        let mut emitter = DischargeEmitter::new(16, DischargeConfig::default(), 7);
        for _ in 0..10 {
            emitter.update(0.05, true, &ring());
            assert!(emitter.alive_count() <= 16);
        }
    }

    #[test]
    fn test_particles_die_after_lifetime() {
        let mut emitter = DischargeEmitter::new(64, DischargeConfig::default(), 7);
        emitter.update(0.1, true, &ring());
        for _ in 0..10 {
            emitter.update(0.1, false, &ring());
        }
        assert_eq!(emitter.alive_count(), 0);
    }

    #[test]
    fn test_spawn_on_ring() {
        let mut emitter = DischargeEmitter::new(64, DischargeConfig::default(), 3);
        emitter.update(0.1, true, &ring());
        for p in emitter.particles() {
            let pos = p.position();
            let radial = Vec3::new(0.0, pos.y, pos.z).length();
            assert!((radial - 0.6).abs() < 1e-3);
            assert!(pos.x.abs() <= 0.35 + 1e-4);
        }
    }
}
