//! Blocking force relaxation of cluster positions.
//!
//! One relaxation runs per applied update. Clusters are pulled toward the
//! gravity center, packed by a short-range attraction, kept apart by a
//! long-range repulsion and separated by collision on `radius + padding`.
//! After every tick each cluster is clamped into the drawable area, so the
//! result is always drawable even when the forces disagree with the canvas.
use glam::Vec2;
use rand::Rng as RngCore;
use tracing::{debug, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::layout::{Canvas, Cluster, Rect};
use crate::sim::{apply_center, apply_collide, apply_many_body, integrate, Alpha};

/// Force constants of the cluster relaxation.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterSimConfig {
    /// Fraction of the centroid offset removed per tick.
    pub gravity_strength: f32,
    pub attraction_strength: f32,
    /// Attraction is softened below this distance.
    pub attraction_distance_min: f32,
    /// Negative; repels.
    pub repulsion_strength: f32,
    /// Added to `min(width, height) - 2 * margin` to get the repulsion range.
    pub repulsion_extra_range: f32,
    pub collide_strength: f32,
    pub alpha_min: f32,
    pub velocity_decay: f32,
    /// Hard cap on ticks per relaxation.
    pub max_iterations: usize,
}

impl Default for ClusterSimConfig {
    fn default() -> Self {
        Self {
            gravity_strength: 1.0,
            attraction_strength: 1010.0,
            attraction_distance_min: 10.0,
            repulsion_strength: -1000.0,
            repulsion_extra_range: 90.0,
            collide_strength: 1.0,
            alpha_min: 0.001,
            velocity_decay: 0.4,
            max_iterations: 1000,
        }
    }
}

impl ClusterSimConfig {
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_alpha_min(mut self, alpha_min: f32) -> Self {
        self.alpha_min = alpha_min;
        self
    }

    pub fn with_velocity_decay(mut self, velocity_decay: f32) -> Self {
        self.velocity_decay = velocity_decay;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.alpha_min > 0.0 && self.alpha_min < 1.0) {
            return Err(Error::InvalidConfig(
                "cluster_sim.alpha_min must be in (0, 1)".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.velocity_decay) {
            return Err(Error::InvalidConfig(
                "cluster_sim.velocity_decay must be in [0, 1]".into(),
            ));
        }
        if self.max_iterations == 0 {
            return Err(Error::InvalidConfig(
                "cluster_sim.max_iterations must be > 0".into(),
            ));
        }
        if self.attraction_distance_min < 0.0 || !self.collide_strength.is_finite() {
            return Err(Error::InvalidConfig(
                "cluster_sim distances and strengths must be finite and non-negative".into(),
            ));
        }
        Ok(())
    }
}

/// Lifecycle of a relaxation.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimState {
    #[default]
    Idle,
    Relaxing,
    Converged,
}

/// Outcome of one [`ClusterSimulation::relax`] call.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RelaxationReport {
    pub ticks: usize,
    /// `false` when the iteration cap was hit before alpha cooled.
    pub converged: bool,
}

/// Cluster position solver.
#[derive(Debug, Clone)]
pub struct ClusterSimulation {
    config: ClusterSimConfig,
    padding: f32,
    bounds: Rect,
    gravity: Vec2,
    repulsion_distance_max: f32,
    alpha: Alpha,
    state: SimState,
}

impl ClusterSimulation {
    /// New idle simulation; collision keeps `padding` between cluster edges.
    pub fn new(config: ClusterSimConfig, padding: f32) -> Self {
        Self {
            config,
            padding,
            bounds: Rect::new(Vec2::ZERO, Vec2::ZERO),
            gravity: Vec2::ZERO,
            repulsion_distance_max: config.repulsion_extra_range,
            alpha: Alpha::new(1.0, config.alpha_min),
            state: SimState::Idle,
        }
    }

    /// Rebuilds the canvas-dependent constants.
    ///
    /// `headroom` lowers the top of the clamp rectangle to leave room for labels.
    pub fn set_canvas(&mut self, canvas: Canvas, margin: f32, headroom: f32) {
        let mut bounds = canvas.inset(margin);
        bounds.min.y += headroom;
        self.bounds = bounds;
        self.gravity = canvas.center();
        self.repulsion_distance_max =
            canvas.width.min(canvas.height) - 2.0 * margin + self.config.repulsion_extra_range;
    }

    pub fn set_gravity_center(&mut self, center: Vec2) {
        self.gravity = center;
    }

    pub fn gravity_center(&self) -> Vec2 {
        self.gravity
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn config(&self) -> &ClusterSimConfig {
        &self.config
    }

    pub fn state(&self) -> SimState {
        self.state
    }

    pub fn alpha(&self) -> f32 {
        self.alpha.value
    }

    /// Advances one tick and clamps the clusters into bounds.
    pub fn tick(&mut self, clusters: &mut [Cluster], rng: &mut dyn RngCore) {
        let c = &self.config;
        self.alpha.cool();
        let alpha = self.alpha.value;

        apply_center(clusters, self.gravity, c.gravity_strength);
        apply_many_body(
            clusters,
            c.attraction_strength,
            c.attraction_distance_min,
            f32::INFINITY,
            alpha,
            rng,
        );
        apply_many_body(
            clusters,
            c.repulsion_strength,
            1.0,
            self.repulsion_distance_max,
            alpha,
            rng,
        );
        let padding = self.padding;
        apply_collide(clusters, |cl| cl.radius + padding, c.collide_strength, rng);
        integrate(clusters, c.velocity_decay);
        self.clamp(clusters);
    }

    /// Clamps every cluster to `bounds` shrunk by its radius.
    pub fn clamp(&self, clusters: &mut [Cluster]) {
        for cluster in clusters.iter_mut() {
            cluster.position = self.bounds.clamp_inset(cluster.position, cluster.radius);
        }
    }

    /// Reheats and ticks until alpha cools or the iteration cap is reached.
    pub fn relax(&mut self, clusters: &mut [Cluster], rng: &mut dyn RngCore) -> RelaxationReport {
        self.alpha.value = 1.0;
        self.state = SimState::Relaxing;

        let mut ticks = 0;
        while self.alpha.is_hot() && ticks < self.config.max_iterations {
            self.tick(clusters, rng);
            ticks += 1;
        }

        let converged = !self.alpha.is_hot();
        if converged {
            debug!(
                "Relaxed {} clusters in {} ticks.",
                clusters.len(),
                ticks
            );
        } else {
            warn!(
                "Cluster relaxation hit the {} tick cap at alpha {:.4}; keeping approximate layout.",
                self.config.max_iterations, self.alpha.value
            );
        }
        self.state = SimState::Converged;
        RelaxationReport { ticks, converged }
    }
}

/// Deterministic spiral offset for the `index`-th new cluster around a seed point.
pub fn phyllotaxis_offset(index: usize) -> Vec2 {
    let initial_radius = 10.0;
    let initial_angle = std::f32::consts::PI * (3.0 - 5f32.sqrt());
    let i = index as f32;
    let radius = initial_radius * (0.5 + i).sqrt();
    Vec2::from_angle(i * initial_angle) * radius
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::color::Rgb;
    use crate::label::{Anchor, LabelBox};
    use crate::layout::{cluster_radius, ClusterKey};

    fn cluster(group: &str, value: f64, position: Vec2) -> Cluster {
        Cluster {
            key: ClusterKey::new("m", group),
            comparison: "c".into(),
            value,
            units: value as usize,
            radius: cluster_radius(value, 420.0),
            position,
            velocity: Vec2::ZERO,
            label_lines: vec![group.to_string()],
            label: LabelBox::default(),
            anchor: Anchor::default(),
            color: Rgb([0, 0, 0]),
        }
    }

    fn seeded(values: &[f64], canvas: Canvas) -> Vec<Cluster> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                cluster(&format!("g{i}"), v, canvas.center() + phyllotaxis_offset(i))
            })
            .collect()
    }

    fn assert_within_bounds(clusters: &[Cluster], canvas: Canvas, margin: f32) {
        for c in clusters {
            let r = c.radius;
            assert!(c.position.x >= margin + r - 1e-3, "{c:?}");
            assert!(c.position.x <= canvas.width - margin - r + 1e-3, "{c:?}");
            assert!(c.position.y >= margin + r - 1e-3, "{c:?}");
            assert!(c.position.y <= canvas.height - margin - r + 1e-3, "{c:?}");
        }
    }

    #[test]
    fn relaxation_separates_two_clusters() {
        let canvas = Canvas::new(400.0, 400.0);
        let mut sim = ClusterSimulation::new(ClusterSimConfig::default(), 20.0);
        sim.set_canvas(canvas, 10.0, 40.0);
        let mut clusters = seeded(&[40.0, 60.0], canvas);
        let mut rng = StdRng::seed_from_u64(42);

        let report = sim.relax(&mut clusters, &mut rng);

        assert!(report.converged);
        assert!(report.ticks > 0 && report.ticks < 1000);
        assert_eq!(sim.state(), SimState::Converged);
        let gap = clusters[0].position.distance(clusters[1].position);
        assert!(gap > clusters[0].radius + clusters[1].radius, "gap {gap}");
        assert_within_bounds(&clusters, canvas, 10.0);
    }

    #[test]
    fn clusters_respect_bounds_on_a_tight_canvas() {
        let canvas = Canvas::new(240.0, 200.0);
        let mut sim = ClusterSimulation::new(ClusterSimConfig::default(), 20.0);
        sim.set_canvas(canvas, 10.0, 0.0);
        let mut clusters = seeded(&[30.0, 25.0, 20.0, 15.0, 10.0], canvas);
        let mut rng = StdRng::seed_from_u64(3);
        sim.relax(&mut clusters, &mut rng);
        assert_within_bounds(&clusters, canvas, 10.0);
    }

    #[test]
    fn iteration_cap_bounds_the_loop() {
        let canvas = Canvas::new(400.0, 400.0);
        let config = ClusterSimConfig::default()
            .with_alpha_min(1e-9)
            .with_max_iterations(25);
        let mut sim = ClusterSimulation::new(config, 20.0);
        sim.set_canvas(canvas, 10.0, 0.0);
        let mut clusters = seeded(&[50.0, 50.0], canvas);
        let mut rng = StdRng::seed_from_u64(1);
        let report = sim.relax(&mut clusters, &mut rng);
        assert_eq!(report.ticks, 25);
        assert!(!report.converged);
    }

    #[test]
    fn relaxation_is_deterministic_for_a_seed() {
        let canvas = Canvas::new(500.0, 400.0);
        let run = || {
            let mut sim = ClusterSimulation::new(ClusterSimConfig::default(), 20.0);
            sim.set_canvas(canvas, 10.0, 40.0);
            let mut clusters = seeded(&[20.0, 30.0, 50.0], canvas);
            let mut rng = StdRng::seed_from_u64(99);
            sim.relax(&mut clusters, &mut rng);
            clusters.iter().map(|c| c.position).collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn headroom_lowers_the_top_bound() {
        let canvas = Canvas::new(400.0, 400.0);
        let mut sim = ClusterSimulation::new(ClusterSimConfig::default(), 20.0);
        sim.set_canvas(canvas, 10.0, 40.0);
        assert_eq!(sim.bounds().min, Vec2::new(10.0, 50.0));
        assert_eq!(sim.bounds().max, Vec2::new(390.0, 390.0));
        let mut clusters = vec![cluster("a", 10.0, Vec2::new(200.0, 0.0))];
        sim.clamp(&mut clusters);
        assert!((clusters[0].position.y - (50.0 + clusters[0].radius)).abs() < 1e-4);
    }

    #[test]
    fn gravity_center_pulls_single_cluster() {
        let canvas = Canvas::new(600.0, 400.0);
        let mut sim = ClusterSimulation::new(ClusterSimConfig::default(), 20.0);
        sim.set_canvas(canvas, 10.0, 0.0);
        sim.set_gravity_center(Vec2::new(200.0, 200.0));
        let mut clusters = vec![cluster("a", 20.0, Vec2::new(450.0, 150.0))];
        let mut rng = StdRng::seed_from_u64(5);
        sim.relax(&mut clusters, &mut rng);
        assert!(clusters[0].position.distance(Vec2::new(200.0, 200.0)) < 1.0);
    }

    #[test]
    fn phyllotaxis_offsets_are_distinct() {
        let offsets: Vec<Vec2> = (0..8).map(phyllotaxis_offset).collect();
        for (i, a) in offsets.iter().enumerate() {
            assert!(a.length() > 0.0);
            for b in &offsets[i + 1..] {
                assert!(a.distance(*b) > 1.0);
            }
        }
    }

    #[test]
    fn validate_rejects_bad_constants() {
        assert!(ClusterSimConfig::default().validate().is_ok());
        assert!(ClusterSimConfig::default()
            .with_max_iterations(0)
            .validate()
            .is_err());
        assert!(ClusterSimConfig::default().with_alpha_min(0.0).validate().is_err());
        assert!(ClusterSimConfig::default()
            .with_velocity_decay(1.5)
            .validate()
            .is_err());
    }
}
