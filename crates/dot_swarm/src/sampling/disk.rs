//! Uniform sampling inside the circle inscribed in the canvas.
use glam::Vec2;
use rand::Rng as RngCore;

use crate::layout::Canvas;
use crate::sampling::rand01;

/// Uniform i.i.d. random points in a disk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformDiskSampling {
    pub center: Vec2,
    pub radius: f32,
}

impl UniformDiskSampling {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Disk inscribed in the canvas.
    pub fn inscribed(canvas: Canvas) -> Self {
        Self {
            center: canvas.center(),
            radius: canvas.width.min(canvas.height).max(0.0) * 0.5,
        }
    }

    /// Draws one point; `sqrt` on the radial term keeps the density uniform.
    pub fn sample(&self, rng: &mut dyn RngCore) -> Vec2 {
        let angle = rand01(rng) * std::f32::consts::TAU;
        let r = self.radius * rand01(rng).sqrt();
        self.center + Vec2::from_angle(angle) * r
    }

    pub fn generate(&self, count: usize, rng: &mut dyn RngCore) -> Vec<Vec2> {
        (0..count).map(|_| self.sample(rng)).collect()
    }
}
