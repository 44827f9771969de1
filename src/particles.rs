use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

const BURST_SIZE: usize = 20;
const SPREAD: f32 = 0.4;
const LIFT: f32 = 0.2;
const FALL_PER_FRAME: f32 = 0.01;
const SHRINK_PER_FRAME: f32 = 0.92;
const VISIBLE_SCALE: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Particle {
    pub position: Vec3,
    pub velocity: Vec3,
    pub scale: f32,
}

/// Celebratory burst spawned where a body was scored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticleBurst {
    pub origin: Vec3,
    pub color: String,
    pub particles: Vec<Particle>,
    pub age_frames: u32,
}

impl ParticleBurst {
    pub fn new(origin: Vec3, color: impl Into<String>, rng: &mut impl Rng) -> Self {
        let particles = (0..BURST_SIZE)
            .map(|_| {
                let mut jitter = || (rng.gen::<f32>() - 0.5) * SPREAD;
                let velocity = Vec3::new(jitter(), jitter() + LIFT, jitter());
                Particle { position: origin, velocity, scale: rng.gen::<f32>() * SPREAD + 0.1 }
            })
            .collect();
        Self { origin, color: color.into(), particles, age_frames: 0 }
    }

    pub fn step(&mut self) {
        for particle in &mut self.particles {
            particle.position += particle.velocity;
            particle.velocity.y -= FALL_PER_FRAME;
            particle.scale *= SHRINK_PER_FRAME;
        }
        self.age_frames += 1;
    }

    pub fn is_finished(&self) -> bool {
        self.particles.iter().all(|particle| particle.scale <= VISIBLE_SCALE)
    }
}

/// Live bursts plus the RNG that seeds new ones.
#[derive(Debug)]
pub struct Bursts {
    rng: StdRng,
    live: Vec<ParticleBurst>,
}

impl Default for Bursts {
    fn default() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl Bursts {
    pub fn new(rng: StdRng) -> Self {
        Self { rng, live: Vec::new() }
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn spawn(&mut self, origin: Vec3, color: &str) {
        let burst = ParticleBurst::new(origin, color, &mut self.rng);
        self.live.push(burst);
    }

    /// Advances every burst one frame and drops the finished ones.
    pub fn step(&mut self) {
        for burst in &mut self.live {
            burst.step();
        }
        self.live.retain(|burst| !burst.is_finished());
    }

    pub fn live(&self) -> &[ParticleBurst] {
        &self.live
    }

    pub fn clear(&mut self) {
        self.live.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_has_twenty_particles_within_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        let burst = ParticleBurst::new(Vec3::ONE, "#fee685", &mut rng);
        assert_eq!(burst.particles.len(), 20);
        for particle in &burst.particles {
            assert!(particle.velocity.x.abs() <= 0.2);
            assert!(particle.velocity.y >= 0.0 && particle.velocity.y <= 0.4);
            assert!(particle.scale >= 0.1 && particle.scale <= 0.5);
            assert_eq!(particle.position, Vec3::ONE);
        }
    }

    #[test]
    fn bursts_expire() {
        let mut bursts = Bursts::seeded(1);
        bursts.spawn(Vec3::ZERO, "#ffffff");
        // Scales start in 0.1..0.5, so every burst is visible for 10 frames and gone by 60.
        for _ in 0..10 {
            bursts.step();
        }
        assert_eq!(bursts.live().len(), 1);
        for _ in 0..50 {
            bursts.step();
        }
        assert!(bursts.live().is_empty());
    }
}
