use crate::config::{PARTICLE_BURST_COUNT, PARTICLE_DECAY_PER_STEP, STEP_MS};
use rand::Rng;

/// One spark of hit feedback. Pure side output; nothing in judgment or
/// scoring reads these back.
#[derive(Clone, Debug)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub life: f32,
    pub size: f32,
    /// Hue in degrees, warm golds around the hit zone.
    pub hue: f32,
}

/// Scatter a burst of particles from a successful hit.
pub fn spawn_burst<R: Rng>(particles: &mut Vec<Particle>, x: f32, y: f32, rng: &mut R) {
    for _ in 0..PARTICLE_BURST_COUNT {
        particles.push(Particle {
            x,
            y,
            vx: (rng.random::<f32>() - 0.5) * 200.0,
            vy: (rng.random::<f32>() - 0.5) * 200.0,
            life: 1.0,
            size: rng.random::<f32>() * 5.0 + 2.0,
            hue: rng.random::<f32>() * 60.0 + 40.0,
        });
    }
}

/// Integrate positions and fade lifetimes, dropping dead particles.
pub fn update(particles: &mut Vec<Particle>, dt_ms: f64) {
    let dt_sec = (dt_ms / 1000.0) as f32;
    let decay = PARTICLE_DECAY_PER_STEP * (dt_ms / STEP_MS) as f32;
    particles.retain_mut(|particle| {
        particle.x += particle.vx * dt_sec;
        particle.y += particle.vy * dt_sec;
        particle.life -= decay;
        particle.life > 0.0
    });
}
