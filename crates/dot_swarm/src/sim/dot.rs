//! Free-running dot swarm.
//!
//! The host advances the simulation one [`DotSimulation::tick`] per animation
//! frame. Each dot springs toward its cluster center and collides with nearby
//! dots through a [`NeighborGrid`]. A [`DotSimulation::restart`] reheats the
//! swarm after every applied update so retagged dots migrate visibly.
use std::collections::HashMap;

use glam::Vec2;
use rand::Rng as RngCore;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::layout::{Canvas, ClusterKey, Dot, Rect};
use crate::sim::grid::NeighborGrid;
use crate::sim::{apply_spring, collide_pair, integrate, Alpha};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DotSimConfig {
    /// Spring strength toward the cluster center, per axis.
    pub spring_strength: f32,
    /// Collision radius of a single dot.
    pub collide_radius: f32,
    pub collide_strength: f32,
    /// Alpha a restart reheats to.
    pub restart_alpha: f32,
    pub alpha_min: f32,
    pub velocity_decay: f32,
}

impl Default for DotSimConfig {
    fn default() -> Self {
        Self {
            spring_strength: 0.05,
            collide_radius: 7.0,
            collide_strength: 1.0,
            restart_alpha: 1.3,
            alpha_min: 0.001,
            velocity_decay: 0.4,
        }
    }
}

impl DotSimConfig {
    pub fn with_spring_strength(mut self, spring_strength: f32) -> Self {
        self.spring_strength = spring_strength;
        self
    }

    pub fn with_collide_radius(mut self, collide_radius: f32) -> Self {
        self.collide_radius = collide_radius;
        self
    }

    pub fn with_restart_alpha(mut self, restart_alpha: f32) -> Self {
        self.restart_alpha = restart_alpha;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.alpha_min > 0.0 && self.alpha_min < self.restart_alpha) {
            return Err(Error::InvalidConfig(
                "dot_sim.alpha_min must be in (0, restart_alpha)".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.velocity_decay) {
            return Err(Error::InvalidConfig(
                "dot_sim.velocity_decay must be in [0, 1]".into(),
            ));
        }
        if !(self.collide_radius >= 0.0 && self.spring_strength >= 0.0) {
            return Err(Error::InvalidConfig(
                "dot_sim.collide_radius and spring_strength must be >= 0".into(),
            ));
        }
        Ok(())
    }
}

/// Dot position solver.
#[derive(Debug, Clone)]
pub struct DotSimulation {
    config: DotSimConfig,
    bounds: Rect,
    fallback: Vec2,
    alpha: Alpha,
    ticks: u64,
}

impl DotSimulation {
    /// New simulation at rest; call [`Self::restart`] to start moving.
    pub fn new(config: DotSimConfig) -> Self {
        Self {
            config,
            bounds: Rect::new(Vec2::ZERO, Vec2::ZERO),
            fallback: Vec2::ZERO,
            alpha: Alpha::new(0.0, config.alpha_min),
            ticks: 0,
        }
    }

    /// Rebuilds the canvas-dependent constants.
    pub fn set_canvas(&mut self, canvas: Canvas, margin: f32) {
        self.bounds = canvas.inset(margin);
        self.fallback = canvas.center();
    }

    pub fn config(&self) -> &DotSimConfig {
        &self.config
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn alpha(&self) -> f32 {
        self.alpha.value
    }

    /// Ticks performed since creation.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Whether ticks still move dots.
    pub fn is_running(&self) -> bool {
        self.alpha.is_hot()
    }

    /// Reheats the swarm and drops all velocities.
    pub fn restart(&mut self, dots: &mut [Dot]) {
        self.alpha.value = self.config.restart_alpha;
        for dot in dots.iter_mut() {
            dot.velocity = Vec2::ZERO;
        }
    }

    /// Advances one tick. Returns `false` without touching the dots once cooled.
    ///
    /// Dots whose cluster is missing from `targets` drift to the canvas center.
    pub fn tick(
        &mut self,
        dots: &mut [Dot],
        targets: &HashMap<ClusterKey, Vec2>,
        rng: &mut dyn RngCore,
    ) -> bool {
        if !self.alpha.is_hot() {
            return false;
        }
        self.alpha.cool();
        let alpha = self.alpha.value;
        let c = self.config;

        let fallback = self.fallback;
        apply_spring(
            dots,
            |d: &Dot| targets.get(&d.cluster).copied().unwrap_or(fallback),
            c.spring_strength,
            alpha,
        );
        self.collide(dots, rng);
        integrate(dots, c.velocity_decay);
        for dot in dots.iter_mut() {
            dot.position = self.bounds.clamp_inset(dot.position, 0.0);
        }

        self.ticks += 1;
        true
    }

    fn collide(&self, dots: &mut [Dot], rng: &mut dyn RngCore) {
        let r = self.config.collide_radius;
        if r <= 0.0 || dots.len() < 2 {
            return;
        }
        let predicted: Vec<Vec2> = dots.iter().map(|d| d.position + d.velocity).collect();
        let grid = NeighborGrid::build(&predicted, 2.0 * r);
        let mut near = Vec::new();
        for i in 0..dots.len() {
            near.clear();
            grid.for_each_near(predicted[i], |j| {
                if j > i {
                    near.push(j);
                }
            });
            for &j in &near {
                collide_pair(dots, i, j, r, r, self.config.collide_strength, rng);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::layout::DotId;
    use crate::sampling::UniformDiskSampling;

    fn swarm(count: usize, key: &ClusterKey, canvas: Canvas, rng: &mut StdRng) -> Vec<Dot> {
        UniformDiskSampling::inscribed(canvas)
            .generate(count, rng)
            .into_iter()
            .enumerate()
            .map(|(i, p)| Dot::new(DotId(i as u64), p, key.clone(), 0))
            .collect()
    }

    fn run(sim: &mut DotSimulation, dots: &mut [Dot], targets: &HashMap<ClusterKey, Vec2>, rng: &mut StdRng) {
        while sim.tick(dots, targets, rng) {}
    }

    #[test]
    fn dots_gather_around_their_cluster() {
        let canvas = Canvas::new(400.0, 400.0);
        let key = ClusterKey::new("m", "a");
        let center = Vec2::new(120.0, 250.0);
        let targets = HashMap::from([(key.clone(), center)]);
        let mut rng = StdRng::seed_from_u64(8);
        let mut dots = swarm(30, &key, canvas, &mut rng);

        let mut sim = DotSimulation::new(DotSimConfig::default());
        sim.set_canvas(canvas, 10.0);
        sim.restart(&mut dots);
        run(&mut sim, &mut dots, &targets, &mut rng);

        let centroid: Vec2 = dots.iter().map(|d| d.position).sum::<Vec2>() / dots.len() as f32;
        assert!(centroid.distance(center) < 25.0, "centroid {centroid}");
        assert!(!sim.is_running());
        assert!(sim.ticks() > 250);
    }

    #[test]
    fn collision_keeps_dots_apart() {
        let canvas = Canvas::new(400.0, 400.0);
        let key = ClusterKey::new("m", "a");
        let targets = HashMap::from([(key.clone(), canvas.center())]);
        let mut rng = StdRng::seed_from_u64(21);
        let mut dots = swarm(20, &key, canvas, &mut rng);

        let mut sim = DotSimulation::new(DotSimConfig::default());
        sim.set_canvas(canvas, 10.0);
        sim.restart(&mut dots);
        run(&mut sim, &mut dots, &targets, &mut rng);

        let mut closest = f32::INFINITY;
        for (i, a) in dots.iter().enumerate() {
            for b in &dots[i + 1..] {
                closest = closest.min(a.position.distance(b.position));
            }
        }
        // Dot diameter is 10; collision aims for 14.
        assert!(closest > 10.0, "closest pair {closest}");
    }

    #[test]
    fn positions_are_clamped_every_tick() {
        let canvas = Canvas::new(200.0, 100.0);
        let key = ClusterKey::new("m", "a");
        let targets = HashMap::from([(key.clone(), Vec2::new(-500.0, 500.0))]);
        let mut rng = StdRng::seed_from_u64(2);
        let mut dots = vec![Dot::new(DotId(0), Vec2::new(100.0, 50.0), key, 0)];

        let mut sim = DotSimulation::new(DotSimConfig::default());
        sim.set_canvas(canvas, 10.0);
        sim.restart(&mut dots);
        for _ in 0..50 {
            sim.tick(&mut dots, &targets, &mut rng);
            let p = dots[0].position;
            assert!((10.0..=190.0).contains(&p.x) && (10.0..=90.0).contains(&p.y));
        }
    }

    #[test]
    fn unknown_cluster_falls_back_to_canvas_center() {
        let canvas = Canvas::new(300.0, 300.0);
        let mut rng = StdRng::seed_from_u64(4);
        let mut dots = vec![Dot::new(DotId(0), Vec2::new(20.0, 20.0), ClusterKey::new("m", "gone"), 0)];
        let mut sim = DotSimulation::new(DotSimConfig::default());
        sim.set_canvas(canvas, 10.0);
        sim.restart(&mut dots);
        run(&mut sim, &mut dots, &HashMap::new(), &mut rng);
        assert!(dots[0].position.distance(canvas.center()) < 10.0);
    }

    #[test]
    fn restart_reheats_and_clears_velocity() {
        let mut sim = DotSimulation::new(DotSimConfig::default());
        assert!(!sim.is_running());
        let mut dots = vec![Dot::new(DotId(0), Vec2::ZERO, ClusterKey::new("m", "a"), 0)];
        dots[0].velocity = Vec2::new(3.0, 4.0);
        sim.restart(&mut dots);
        assert_eq!(sim.alpha(), 1.3);
        assert_eq!(dots[0].velocity, Vec2::ZERO);
        assert!(sim.is_running());
    }

    #[test]
    fn cooled_simulation_does_not_move_dots() {
        let canvas = Canvas::new(100.0, 100.0);
        let mut sim = DotSimulation::new(DotSimConfig::default());
        sim.set_canvas(canvas, 10.0);
        let mut rng = StdRng::seed_from_u64(0);
        let mut dots = vec![Dot::new(DotId(0), Vec2::new(30.0, 30.0), ClusterKey::new("m", "a"), 0)];
        assert!(!sim.tick(&mut dots, &HashMap::new(), &mut rng));
        assert_eq!(dots[0].position, Vec2::new(30.0, 30.0));
    }

    #[test]
    fn validate_rejects_bad_constants() {
        assert!(DotSimConfig::default().validate().is_ok());
        assert!(DotSimConfig::default().with_collide_radius(-1.0).validate().is_err());
        assert!(DotSimConfig::default().with_restart_alpha(0.0).validate().is_err());
    }
}
