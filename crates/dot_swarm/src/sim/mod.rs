//! Velocity-Verlet force simulations for clusters and dots.
//!
//! Both solvers follow the same tick: cool `alpha`, accumulate forces into
//! velocities, decay velocities, integrate positions, then clamp positions into
//! the drawable area. Forces are plain functions over [`Body`] slices so the
//! two simulations share them.
//!
//! - [`cluster::ClusterSimulation`]: blocking relaxation run once per update.
//! - [`dot::DotSimulation`]: free-running, advanced one tick at a time by the host.
use glam::Vec2;
use rand::Rng as RngCore;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::layout::{Cluster, Dot};
use crate::sampling::jiggle;

pub mod cluster;
pub mod dot;
pub mod grid;

pub use cluster::{ClusterSimConfig, ClusterSimulation, RelaxationReport, SimState};
pub use dot::{DotSimConfig, DotSimulation};

/// Number of ticks a simulation takes to cool from 1 to `alpha_min`.
pub const TICKS_TO_COOL: f32 = 300.0;

/// Something with a position and a velocity.
pub trait Body {
    fn position(&self) -> Vec2;
    fn position_mut(&mut self) -> &mut Vec2;
    fn velocity(&self) -> Vec2;
    fn velocity_mut(&mut self) -> &mut Vec2;
}

impl Body for Cluster {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn position_mut(&mut self) -> &mut Vec2 {
        &mut self.position
    }

    fn velocity(&self) -> Vec2 {
        self.velocity
    }

    fn velocity_mut(&mut self) -> &mut Vec2 {
        &mut self.velocity
    }
}

impl Body for Dot {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn position_mut(&mut self) -> &mut Vec2 {
        &mut self.position
    }

    fn velocity(&self) -> Vec2 {
        self.velocity
    }

    fn velocity_mut(&mut self) -> &mut Vec2 {
        &mut self.velocity
    }
}

/// Decaying simulation temperature.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Alpha {
    pub value: f32,
    pub min: f32,
    pub decay: f32,
    pub target: f32,
}

impl Alpha {
    /// Alpha starting at `value` that cools below `min` in about [`TICKS_TO_COOL`] ticks.
    pub fn new(value: f32, min: f32) -> Self {
        Self {
            value,
            min,
            decay: 1.0 - min.powf(1.0 / TICKS_TO_COOL),
            target: 0.0,
        }
    }

    pub fn is_hot(&self) -> bool {
        self.value >= self.min
    }

    pub fn cool(&mut self) {
        self.value += (self.target - self.value) * self.decay;
    }
}

/// Pairwise inverse-distance force. Positive strength attracts.
///
/// Pairs closer than `distance_min` are softened; pairs beyond `distance_max`
/// are ignored.
pub fn apply_many_body<B: Body>(
    bodies: &mut [B],
    strength: f32,
    distance_min: f32,
    distance_max: f32,
    alpha: f32,
    rng: &mut dyn RngCore,
) {
    let min2 = distance_min * distance_min;
    let max2 = distance_max * distance_max;
    let n = bodies.len();
    for i in 0..n {
        let pi = bodies[i].position();
        let mut dv = Vec2::ZERO;
        for (j, other) in bodies.iter().enumerate() {
            if i == j {
                continue;
            }
            let mut d = other.position() - pi;
            let mut l = d.length_squared();
            if l >= max2 {
                continue;
            }
            if d.x == 0.0 {
                d.x = jiggle(rng);
                l += d.x * d.x;
            }
            if d.y == 0.0 {
                d.y = jiggle(rng);
                l += d.y * d.y;
            }
            if l < min2 {
                l = (min2 * l).sqrt();
            }
            dv += d * (strength * alpha / l);
        }
        *bodies[i].velocity_mut() += dv;
    }
}

/// Translates all bodies so their centroid sits on `center`.
pub fn apply_center<B: Body>(bodies: &mut [B], center: Vec2, strength: f32) {
    if bodies.is_empty() {
        return;
    }
    let sum: Vec2 = bodies.iter().map(Body::position).sum();
    let shift = (sum / bodies.len() as f32 - center) * strength;
    for body in bodies.iter_mut() {
        *body.position_mut() -= shift;
    }
}

/// Springs every body toward its own target, scaled by alpha.
pub fn apply_spring<B: Body>(
    bodies: &mut [B],
    target: impl Fn(&B) -> Vec2,
    strength: f32,
    alpha: f32,
) {
    for body in bodies.iter_mut() {
        let pull = (target(body) - body.position()) * strength * alpha;
        *body.velocity_mut() += pull;
    }
}

/// Resolves overlap between bodies `i` and `j` using velocity-predicted positions.
///
/// The push is split by squared radius so larger bodies move less.
pub(crate) fn collide_pair<B: Body>(
    bodies: &mut [B],
    i: usize,
    j: usize,
    ri: f32,
    rj: f32,
    strength: f32,
    rng: &mut dyn RngCore,
) {
    let r = ri + rj;
    let pi = bodies[i].position() + bodies[i].velocity();
    let pj = bodies[j].position() + bodies[j].velocity();
    let mut d = pi - pj;
    let mut l = d.length_squared();
    if l >= r * r {
        return;
    }
    if d.x == 0.0 {
        d.x = jiggle(rng);
        l += d.x * d.x;
    }
    if d.y == 0.0 {
        d.y = jiggle(rng);
        l += d.y * d.y;
    }
    let l = l.sqrt();
    let push = d * ((r - l) / l * strength);
    let ri2 = ri * ri;
    let rj2 = rj * rj;
    let share = if ri2 + rj2 > 0.0 { rj2 / (ri2 + rj2) } else { 0.5 };
    *bodies[i].velocity_mut() += push * share;
    *bodies[j].velocity_mut() -= push * (1.0 - share);
}

/// All-pairs collision for small body counts.
pub fn apply_collide<B: Body>(
    bodies: &mut [B],
    radius: impl Fn(&B) -> f32,
    strength: f32,
    rng: &mut dyn RngCore,
) {
    let radii: Vec<f32> = bodies.iter().map(&radius).collect();
    let n = bodies.len();
    for i in 0..n {
        for j in (i + 1)..n {
            collide_pair(bodies, i, j, radii[i], radii[j], strength, rng);
        }
    }
}

/// Applies velocity decay and moves every body by its velocity.
pub fn integrate<B: Body>(bodies: &mut [B], velocity_decay: f32) {
    let keep = 1.0 - velocity_decay;
    for body in bodies.iter_mut() {
        let v = body.velocity() * keep;
        *body.velocity_mut() = v;
        *body.position_mut() += v;
    }
}
