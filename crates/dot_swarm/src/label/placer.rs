//! Simulated annealing label placement.
//!
//! Each label is tied to an [`Anchor`]. The energy of a label penalizes long
//! leader lines, labels that are not up-right of their anchor, crossing leader
//! lines, and box overlap with other labels or anchors. A sweep performs one
//! Monte Carlo move (translation or rotation about the anchor) per label,
//! accepted by the Metropolis criterion while the temperature cools linearly
//! to zero.
//!
//! The best configuration seen is restored at the end, so the total energy
//! never ends above where it started.
use glam::Vec2;
use rand::Rng as RngCore;
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::label::{Anchor, LabelBox};
use crate::layout::Rect;
use crate::sampling::rand01;

/// Weights of the energy terms.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyWeights {
    /// Per pixel of leader line length.
    pub length: f32,
    /// Per crossing with another leader line.
    pub intersection: f32,
    /// Per square pixel of label/label overlap.
    pub label_overlap: f32,
    /// Per square pixel of label/anchor overlap.
    pub anchor_overlap: f32,
    /// Per orientation quadrant step away from up-right.
    pub orientation: f32,
}

impl Default for EnergyWeights {
    fn default() -> Self {
        Self {
            length: 0.2,
            intersection: 1.0,
            label_overlap: 30.0,
            anchor_overlap: 30.0,
            orientation: 3.0,
        }
    }
}

/// Energy of a single label against all others.
pub trait LabelEnergy {
    fn energy(&self, index: usize, labels: &[LabelBox], anchors: &[Anchor]) -> f32;
}

impl LabelEnergy for EnergyWeights {
    fn energy(&self, index: usize, labels: &[LabelBox], anchors: &[Anchor]) -> f32 {
        let label = &labels[index];
        let anchor = &anchors[index];
        let mut result = 0.0;

        let dx = label.x - anchor.x;
        let dy = anchor.y - label.y;
        let dist = (dx * dx + dy * dy).sqrt();
        if dist > 0.0 {
            result += dist * self.length;
        }
        result += orientation_quadrant(dx, dy) as f32 * self.orientation;

        let rect = label.rect();
        for (k, (other, other_anchor)) in labels.iter().zip(anchors).enumerate() {
            if k != index {
                if segments_intersect(
                    anchor.position(),
                    label.position(),
                    other_anchor.position(),
                    other.position(),
                ) {
                    result += self.intersection;
                }
                result += rect.overlap_area(&other.rect()) * self.label_overlap;
            }
            result += rect.overlap_area(&other_anchor.rect()) * self.anchor_overlap;
        }

        result
    }
}

/// Quadrant penalty of the anchor→label direction (`dy` points up).
///
/// Up-right is 0, up-left 1, down-left 2, anything else (including axis
/// aligned and zero-length) 3.
pub fn orientation_quadrant(dx: f32, dy: f32) -> u8 {
    if dx > 0.0 && dy > 0.0 {
        0
    } else if dx < 0.0 && dy > 0.0 {
        1
    } else if dx < 0.0 && dy < 0.0 {
        2
    } else {
        3
    }
}

/// Whether segments `a1-a2` and `b1-b2` intersect. Parallel segments never do.
pub fn segments_intersect(a1: Vec2, a2: Vec2, b1: Vec2, b2: Vec2) -> bool {
    let denom = (b2.y - b1.y) * (a2.x - a1.x) - (b2.x - b1.x) * (a2.y - a1.y);
    if denom == 0.0 {
        return false;
    }
    let numera = (b2.x - b1.x) * (a1.y - b1.y) - (b2.y - b1.y) * (a1.x - b1.x);
    let numerb = (a2.x - a1.x) * (a1.y - b1.y) - (a2.y - a1.y) * (a1.x - b1.x);
    let mua = numera / denom;
    let mub = numerb / denom;
    (0.0..=1.0).contains(&mua) && (0.0..=1.0).contains(&mub)
}

/// Temperature schedule between sweeps.
pub trait CoolingSchedule {
    fn next(&self, current: f32, initial: f32, sweeps: usize) -> f32;
}

/// Linear cooling from the initial temperature to zero over all sweeps.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearCooling;

impl CoolingSchedule for LinearCooling {
    fn next(&self, current: f32, initial: f32, sweeps: usize) -> f32 {
        current - initial / sweeps.max(1) as f32
    }
}

/// Move sizes and starting temperature.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnealConfig {
    /// Maximum translation per move along each axis.
    pub max_move: f32,
    /// Maximum rotation per move, in radians.
    pub max_angle: f32,
    pub initial_temperature: f32,
    pub weights: EnergyWeights,
}

impl Default for AnnealConfig {
    fn default() -> Self {
        Self {
            max_move: 5.0,
            max_angle: 0.2,
            initial_temperature: 1.0,
            weights: EnergyWeights::default(),
        }
    }
}

/// Outcome of one annealing run.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnnealReport {
    pub sweeps: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub initial_energy: f32,
    pub final_energy: f32,
}

/// Simulated annealing label placer.
pub struct LabelPlacer {
    config: AnnealConfig,
    energy: Box<dyn LabelEnergy>,
    schedule: Box<dyn CoolingSchedule>,
}

impl LabelPlacer {
    pub fn new(config: AnnealConfig) -> Self {
        Self {
            config,
            energy: Box::new(config.weights),
            schedule: Box::new(LinearCooling),
        }
    }

    /// Replaces the energy function.
    pub fn with_energy<E: LabelEnergy + 'static>(mut self, energy: E) -> Self {
        self.energy = Box::new(energy);
        self
    }

    /// Replaces the cooling schedule.
    pub fn with_schedule<S: CoolingSchedule + 'static>(mut self, schedule: S) -> Self {
        self.schedule = Box::new(schedule);
        self
    }

    pub fn config(&self) -> &AnnealConfig {
        &self.config
    }

    /// Sum of all label energies.
    pub fn total_energy(&self, labels: &[LabelBox], anchors: &[Anchor]) -> f32 {
        (0..labels.len())
            .map(|i| self.energy.energy(i, labels, anchors))
            .sum()
    }

    /// Anneals `labels` in place for `sweeps` sweeps, keeping boxes inside `bounds`.
    pub fn start<R: RngCore>(
        &self,
        labels: &mut [LabelBox],
        anchors: &[Anchor],
        bounds: Rect,
        sweeps: usize,
        rng: &mut R,
    ) -> AnnealReport {
        debug_assert_eq!(labels.len(), anchors.len(), "one anchor per label");
        let m = labels.len().min(anchors.len());
        let labels = &mut labels[..m];
        let anchors = &anchors[..m];

        let initial_energy = self.total_energy(labels, anchors);
        let mut report = AnnealReport {
            sweeps,
            initial_energy,
            final_energy: initial_energy,
            ..Default::default()
        };
        if m == 0 || sweeps == 0 {
            return report;
        }

        let mut best_energy = initial_energy;
        let mut best: Vec<Vec2> = labels.iter().map(LabelBox::position).collect();

        let initial_t = self.config.initial_temperature;
        let mut t = initial_t;
        for _ in 0..sweeps {
            for _ in 0..m {
                let i = (rng.next_u32() as usize) % m;
                let accepted = if rand01(rng) < 0.5 {
                    self.translate(i, labels, anchors, bounds, t, rng)
                } else {
                    self.rotate(i, labels, anchors, bounds, t, rng)
                };
                if accepted {
                    report.accepted += 1;
                } else {
                    report.rejected += 1;
                }
            }

            let energy = self.total_energy(labels, anchors);
            if energy < best_energy {
                best_energy = energy;
                best.clear();
                best.extend(labels.iter().map(LabelBox::position));
            }
            t = self.schedule.next(t, initial_t, sweeps);
        }

        let mut final_energy = self.total_energy(labels, anchors);
        if final_energy > best_energy {
            for (label, p) in labels.iter_mut().zip(&best) {
                label.set_position(*p);
            }
            final_energy = best_energy;
        }
        report.final_energy = final_energy;

        debug!(
            "Annealed {} labels over {} sweeps: energy {:.2} -> {:.2} ({} accepted, {} rejected).",
            m, sweeps, report.initial_energy, report.final_energy, report.accepted, report.rejected
        );
        report
    }

    fn translate<R: RngCore>(
        &self,
        i: usize,
        labels: &mut [LabelBox],
        anchors: &[Anchor],
        bounds: Rect,
        t: f32,
        rng: &mut R,
    ) -> bool {
        let old = labels[i].position();
        let old_energy = self.energy.energy(i, labels, anchors);

        let step = Vec2::new(rand01(rng) - 0.5, rand01(rng) - 0.5) * self.config.max_move;
        let candidate = keep_in_bounds(&labels[i], old, old + step, bounds);
        labels[i].set_position(candidate);

        self.metropolis(i, labels, anchors, old, old_energy, t, rng)
    }

    fn rotate<R: RngCore>(
        &self,
        i: usize,
        labels: &mut [LabelBox],
        anchors: &[Anchor],
        bounds: Rect,
        t: f32,
        rng: &mut R,
    ) -> bool {
        let old = labels[i].position();
        let old_energy = self.energy.energy(i, labels, anchors);

        let angle = (rand01(rng) - 0.5) * self.config.max_angle;
        let pivot = anchors[i].position();
        let rotated = pivot + Vec2::from_angle(angle).rotate(old - pivot);
        let candidate = keep_in_bounds(&labels[i], old, rotated, bounds);
        labels[i].set_position(candidate);

        self.metropolis(i, labels, anchors, old, old_energy, t, rng)
    }

    #[allow(clippy::too_many_arguments)]
    fn metropolis<R: RngCore>(
        &self,
        i: usize,
        labels: &mut [LabelBox],
        anchors: &[Anchor],
        old: Vec2,
        old_energy: f32,
        t: f32,
        rng: &mut R,
    ) -> bool {
        let delta = self.energy.energy(i, labels, anchors) - old_energy;
        if rand01(rng) < (-delta / t).exp() {
            true
        } else {
            labels[i].set_position(old);
            false
        }
    }
}

impl Default for LabelPlacer {
    fn default() -> Self {
        Self::new(AnnealConfig::default())
    }
}

/// Reverts each axis of `candidate` whose move would push the box further out of `bounds`.
fn keep_in_bounds(label: &LabelBox, old: Vec2, candidate: Vec2, bounds: Rect) -> Vec2 {
    let violation = |p: Vec2| {
        let rect = LabelBox { x: p.x, y: p.y, ..*label }.rect();
        let x = (bounds.min.x - rect.min.x).max(0.0) + (rect.max.x - bounds.max.x).max(0.0);
        let y = (bounds.min.y - rect.min.y).max(0.0) + (rect.max.y - bounds.max.y).max(0.0);
        Vec2::new(x, y)
    };
    let before = violation(old);
    let after = violation(candidate);
    Vec2::new(
        if after.x > 0.0 && after.x >= before.x { old.x } else { candidate.x },
        if after.y > 0.0 && after.y >= before.y { old.y } else { candidate.y },
    )
}
