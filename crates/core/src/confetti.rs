use crate::RngState;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

const PALETTE: [&str; 7] = [
    "#26ccff", "#a25afd", "#ff5e7e", "#88ff5a", "#fcff42", "#ffa62d", "#ff36ff",
];
const PER_CONE: usize = 60;
const SPREAD: f64 = 55.0 * PI / 180.0;
const GRAVITY: f64 = 1.2;
const DRAG: f64 = 0.9;

/// One confetti piece in normalised viewport space (0..1, y grows downward).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub color: String,
    /// Remaining life in seconds.
    pub lifetime: f64,
}

impl Particle {
    pub fn is_alive(&self) -> bool {
        self.lifetime > 0.0 && self.y < 1.2
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfettiField {
    particles: Vec<Particle>,
}

impl ConfettiField {
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    /// Two cones fired inward from the lower corners.
    pub fn burst(&mut self, rng: &mut RngState) {
        for (origin_x, angle) in [(0.0, -PI / 3.0), (1.0, -2.0 * PI / 3.0)] {
            for _ in 0..PER_CONE {
                let heading = angle + rng.range_f64(-SPREAD / 2.0, SPREAD / 2.0);
                let speed = rng.range_f64(1.0, 1.8);
                let color = rng
                    .index(PALETTE.len())
                    .map(|idx| PALETTE[idx])
                    .unwrap_or(PALETTE[0]);
                self.particles.push(Particle {
                    x: origin_x,
                    y: 0.7,
                    vx: heading.cos() * speed,
                    vy: heading.sin() * speed,
                    color: color.to_string(),
                    lifetime: rng.range_f64(2.0, 4.0),
                });
            }
        }
    }

    pub fn step(&mut self, dt_ms: u64) {
        if self.particles.is_empty() {
            return;
        }
        let dt = dt_ms as f64 / 1000.0;
        let damping = (1.0 - DRAG * dt).max(0.0);
        self.particles.retain_mut(|p| {
            p.x += p.vx * dt;
            p.y += p.vy * dt;
            p.vy += GRAVITY * dt;
            p.vx *= damping;
            p.lifetime -= dt;
            p.is_alive()
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_fires_two_cones_upward() {
        let mut field = ConfettiField::default();
        field.burst(&mut RngState::from_seed(3));
        assert_eq!(field.particles().len(), 2 * PER_CONE);
        assert!(field.particles().iter().all(|p| p.vy < 0.0));
        let left = field.particles().iter().filter(|p| p.x == 0.0).count();
        assert_eq!(left, PER_CONE);
        assert!(field.particles()[..PER_CONE].iter().all(|p| p.vx > 0.0));
    }

    #[test]
    fn particles_fall_and_expire() {
        let mut field = ConfettiField::default();
        field.burst(&mut RngState::from_seed(3));
        let before = field.particles()[0].vy;
        field.step(100);
        assert!(field.particles()[0].vy > before);
        for _ in 0..50 {
            field.step(100);
        }
        assert!(field.is_empty());
    }
}
