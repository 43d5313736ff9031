//! Random helpers shared by the simulations and the dot pool.
//!
//! All randomness flows through a caller-supplied [`RngCore`], so a seeded RNG
//! makes every layout reproducible.
use rand::Rng as RngCore;

pub mod disk;

pub use disk::UniformDiskSampling;

/// Generate a random float in the range [0, 1].
#[inline]
pub(crate) fn rand01(rng: &mut dyn RngCore) -> f32 {
    (rng.next_u32() as f32) / ((u32::MAX as f32) + 1.0)
}

/// Tiny random offset used to separate coincident points.
#[inline]
pub(crate) fn jiggle(rng: &mut dyn RngCore) -> f32 {
    (rand01(rng) - 0.5) * 1e-6
}
