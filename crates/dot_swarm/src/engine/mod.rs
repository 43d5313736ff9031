//! The layout engine: sequences one update and owns all persisted layout state.
//!
//! An update runs strictly in order:
//!
//! 1. [`ClusterResolver`] derives the active clusters (hot-starting survivors);
//! 2. [`DotPoolReconciler`] rebuilds the dot pool against them;
//! 3. [`ClusterSimulation::relax`] settles the clusters (blocking);
//! 4. [`LabelPlacer::start`] anneals the labels (blocking);
//! 5. [`DotSimulation::restart`] reheats the swarm.
//!
//! The host then calls [`LayoutEngine::tick`] from its animation clock and
//! reads [`LayoutEngine::frame`] to draw. Updates take `&mut self`, so a new
//! update can never interleave with one in flight.
use std::collections::HashMap;

use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::color::{ColorScale, Rgb};
use crate::config::EngineConfig;
use crate::data::{DataCatalog, Marker};
use crate::error::{Error, Result};
use crate::label::{AnnealReport, Anchor, CharWidthMeasure, LabelBox, LabelPlacer, LeaderPath, TextMeasure};
use crate::layout::reconcile::{DotPoolReconciler, ReconcileStats};
use crate::layout::resolver::ClusterResolver;
use crate::layout::{Canvas, Cluster, ClusterKey, Dot};
use crate::sampling::UniformDiskSampling;
use crate::sim::{ClusterSimulation, DotSimulation, RelaxationReport};

pub mod events;
pub mod frame;

pub use events::{EngineEvent, EngineEventKind, EventSink, FnSink, MultiSink, VecSink};
pub use frame::{ClusterFrame, DotFrame, RenderFrame};

/// Why an update left the state untouched.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Zero, negative or non-finite canvas size.
    DegenerateCanvas,
    /// Same marker and canvas as the last applied update.
    Unchanged,
}

/// Summary of an applied update.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UpdateReport {
    /// Monotonic number of the applied update, starting at 1.
    pub serial: u64,
    pub clusters: usize,
    pub dots: usize,
    pub reconcile: ReconcileStats,
    pub relaxation: RelaxationReport,
    pub labels: AnnealReport,
}

/// Result of [`LayoutEngine::update`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpdateOutcome {
    Skipped(SkipReason),
    Applied(UpdateReport),
}

impl UpdateOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, UpdateOutcome::Applied(_))
    }

    pub fn report(&self) -> Option<&UpdateReport> {
        match self {
            UpdateOutcome::Applied(report) => Some(report),
            UpdateOutcome::Skipped(_) => None,
        }
    }
}

/// Owns the catalog, the active clusters, the dot pool and both simulations.
pub struct LayoutEngine {
    config: EngineConfig,
    catalog: DataCatalog,
    colors: ColorScale,
    text: Box<dyn TextMeasure>,
    placer: LabelPlacer,
    reconciler: DotPoolReconciler,
    cluster_sim: ClusterSimulation,
    dot_sim: DotSimulation,
    rng: StdRng,
    clusters: Vec<Cluster>,
    dots: Vec<Dot>,
    targets: HashMap<ClusterKey, Vec2>,
    canvas: Option<Canvas>,
    previous_marker: Option<Marker>,
    background: Rgb,
    serial: u64,
}

impl LayoutEngine {
    /// Creates an engine over `catalog`. Fails if `config` does not validate.
    pub fn new(catalog: DataCatalog, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let colors = config.color_scale()?;
        Ok(Self {
            colors,
            text: Box::new(CharWidthMeasure::default()),
            placer: LabelPlacer::new(config.anneal),
            reconciler: DotPoolReconciler::new(),
            cluster_sim: ClusterSimulation::new(config.cluster_sim, config.cluster_padding),
            dot_sim: DotSimulation::new(config.dot_sim),
            rng: StdRng::seed_from_u64(config.seed),
            clusters: Vec::new(),
            dots: Vec::new(),
            targets: HashMap::new(),
            canvas: None,
            previous_marker: None,
            background: Rgb::default(),
            serial: 0,
            catalog,
            config,
        })
    }

    /// Replaces the label text measurement.
    pub fn with_text_measure<T: TextMeasure + 'static>(mut self, text: T) -> Self {
        self.text = Box::new(text);
        self
    }

    /// Replaces the label placer, e.g. to plug in a custom energy.
    pub fn with_label_placer(mut self, placer: LabelPlacer) -> Self {
        self.placer = placer;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &DataCatalog {
        &self.catalog
    }

    /// Active clusters in dataset order.
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn cluster(&self, key: &ClusterKey) -> Option<&Cluster> {
        self.clusters.iter().find(|c| &c.key == key)
    }

    /// Current dot pool. Order carries no meaning.
    pub fn dots(&self) -> &[Dot] {
        &self.dots
    }

    /// Marker of the last applied update.
    pub fn previous_marker(&self) -> Option<&Marker> {
        self.previous_marker.as_ref()
    }

    /// Canvas of the last applied update.
    pub fn canvas(&self) -> Option<Canvas> {
        self.canvas
    }

    pub fn cluster_simulation(&self) -> &ClusterSimulation {
        &self.cluster_sim
    }

    pub fn dot_simulation(&self) -> &DotSimulation {
        &self.dot_sim
    }

    /// Applies `marker` on `canvas`.
    pub fn update(&mut self, marker: &Marker, canvas: Canvas) -> Result<UpdateOutcome> {
        self.update_with_events(marker, canvas, &mut ())
    }

    /// Applies `marker` on `canvas`, reporting progress to `sink`.
    ///
    /// On [`Error::DataIntegrity`] the previous clusters, dots and marker are
    /// left exactly as they were.
    pub fn update_with_events(
        &mut self,
        marker: &Marker,
        canvas: Canvas,
        sink: &mut dyn EventSink,
    ) -> Result<UpdateOutcome> {
        if canvas.is_degenerate() {
            warn!(
                "Canvas {}x{} has no drawable area; skipping update.",
                canvas.width, canvas.height
            );
            return Ok(self.skip(marker, SkipReason::DegenerateCanvas, sink));
        }
        if self.previous_marker.as_ref() == Some(marker) && self.canvas == Some(canvas) {
            return Ok(self.skip(marker, SkipReason::Unchanged, sink));
        }

        if sink.wants(EngineEventKind::UpdateStarted) {
            sink.send(EngineEvent::UpdateStarted {
                marker: marker.clone(),
                canvas,
            });
        }

        let resolver = ClusterResolver::new(&self.config, self.text.as_ref());
        let mut clusters = match resolver.resolve(
            &self.catalog,
            marker,
            &self.clusters,
            canvas,
            &mut self.colors,
        ) {
            Ok(clusters) => clusters,
            Err(err) => {
                if let Error::DataIntegrity {
                    total, expected, ..
                } = &err
                {
                    if sink.wants(EngineEventKind::UpdateRejected) {
                        sink.send(EngineEvent::UpdateRejected {
                            marker: marker.clone(),
                            total: *total,
                            expected: *expected,
                        });
                    }
                }
                return Err(err);
            }
        };
        if sink.wants(EngineEventKind::ClustersResolved) {
            let carried = clusters
                .iter()
                .filter(|c| self.clusters.iter().any(|p| p.key == c.key))
                .count();
            sink.send(EngineEvent::ClustersResolved {
                count: clusters.len(),
                carried,
            });
        }

        if self.canvas != Some(canvas) {
            self.cluster_sim
                .set_canvas(canvas, self.config.margin, self.config.label_headroom);
            self.dot_sim.set_canvas(canvas, self.config.margin);
        }
        self.cluster_sim
            .set_gravity_center(canvas.gravity_center(marker.align));

        self.serial += 1;
        let spawn = UniformDiskSampling::inscribed(canvas);
        let previous = std::mem::take(&mut self.dots);
        let (mut dots, reconcile) =
            self.reconciler
                .reconcile(previous, &clusters, self.serial, &spawn, &mut self.rng);
        if sink.wants(EngineEventKind::PoolReconciled) {
            sink.send(EngineEvent::PoolReconciled { stats: reconcile });
        }

        let mut relaxation = RelaxationReport::default();
        let mut labels = AnnealReport::default();
        if !clusters.is_empty() {
            let offsets: Vec<Vec2> = clusters.iter().map(Cluster::label_offset).collect();
            relaxation = self.cluster_sim.relax(&mut clusters, &mut self.rng);
            if !relaxation.converged && sink.wants(EngineEventKind::Warning) {
                sink.send(EngineEvent::Warning {
                    context: format!("{}/{}", marker.measure, marker.comparison),
                    message: format!(
                        "cluster relaxation stopped after {} ticks",
                        relaxation.ticks
                    ),
                });
            }
            if sink.wants(EngineEventKind::ClustersRelaxed) {
                sink.send(EngineEvent::ClustersRelaxed { report: relaxation });
            }

            labels = self.place_labels(&mut clusters, &offsets, canvas);
            if sink.wants(EngineEventKind::LabelsPlaced) {
                sink.send(EngineEvent::LabelsPlaced { report: labels });
            }

            self.dot_sim.restart(&mut dots);
        }

        self.targets = clusters
            .iter()
            .map(|c| (c.key.clone(), c.position))
            .collect();
        self.background = self.colors.marker_color(marker);
        self.clusters = clusters;
        self.dots = dots;
        self.canvas = Some(canvas);
        self.previous_marker = Some(marker.clone());

        let report = UpdateReport {
            serial: self.serial,
            clusters: self.clusters.len(),
            dots: self.dots.len(),
            reconcile,
            relaxation,
            labels,
        };
        info!(
            "Applied marker '{}'/'{}': {} clusters, {} dots ({} retained, {} retagged, {} created, {} discarded).",
            marker.measure,
            marker.comparison,
            report.clusters,
            report.dots,
            reconcile.retained,
            reconcile.retagged,
            reconcile.created,
            reconcile.discarded
        );
        if sink.wants(EngineEventKind::UpdateFinished) {
            sink.send(EngineEvent::UpdateFinished { report });
        }
        Ok(UpdateOutcome::Applied(report))
    }

    fn skip(&self, marker: &Marker, reason: SkipReason, sink: &mut dyn EventSink) -> UpdateOutcome {
        if sink.wants(EngineEventKind::UpdateSkipped) {
            sink.send(EngineEvent::UpdateSkipped {
                marker: marker.clone(),
                reason,
            });
        }
        UpdateOutcome::Skipped(reason)
    }

    /// Re-attaches labels to the relaxed clusters and anneals them.
    fn place_labels(&mut self, clusters: &mut [Cluster], offsets: &[Vec2], canvas: Canvas) -> AnnealReport {
        for (cluster, offset) in clusters.iter_mut().zip(offsets) {
            cluster.label.set_position(cluster.position + *offset);
            cluster.anchor = Anchor::new(
                cluster.position.x,
                cluster.position.y,
                cluster.radius + self.config.anchor_margin,
            );
        }

        let mut boxes: Vec<LabelBox> = clusters.iter().map(|c| c.label).collect();
        let anchors: Vec<Anchor> = clusters.iter().map(|c| c.anchor).collect();
        let sweeps = self.config.label_sweeps_per_cluster * clusters.len();
        let report = self.placer.start(
            &mut boxes,
            &anchors,
            canvas.inset(self.config.margin),
            sweeps,
            &mut self.rng,
        );
        for (cluster, label) in clusters.iter_mut().zip(boxes) {
            cluster.label = label;
        }
        report
    }

    /// Advances the dot swarm by one tick. Returns `false` once it has settled.
    pub fn tick(&mut self) -> bool {
        self.tick_with_events(&mut ())
    }

    pub fn tick_with_events(&mut self, sink: &mut dyn EventSink) -> bool {
        let moved = self.dot_sim.tick(&mut self.dots, &self.targets, &mut self.rng);
        if moved && sink.wants(EngineEventKind::DotsTicked) {
            sink.send(EngineEvent::DotsTicked {
                tick: self.dot_sim.ticks(),
                alpha: self.dot_sim.alpha(),
            });
        }
        moved
    }

    /// Ticks until the swarm settles or `max_ticks` is reached; returns the ticks run.
    pub fn settle(&mut self, max_ticks: usize) -> usize {
        let mut ticks = 0;
        while ticks < max_ticks && self.tick() {
            ticks += 1;
        }
        ticks
    }

    /// Whether further ticks would leave the dots where they are.
    pub fn is_settled(&self) -> bool {
        !self.dot_sim.is_running()
    }

    /// Snapshot for the renderer.
    pub fn frame(&self) -> RenderFrame {
        let Some(canvas) = self.canvas else {
            return RenderFrame::default();
        };
        let bounds = canvas.inset(self.config.margin);
        let colors: HashMap<&ClusterKey, Rgb> =
            self.clusters.iter().map(|c| (&c.key, c.color)).collect();

        let dots = self
            .dots
            .iter()
            .map(|d| DotFrame {
                id: d.id,
                position: bounds.clamp_inset(d.position, 0.0).into(),
                radius: self.config.mark_radius,
                cluster: d.cluster.clone(),
                color: colors.get(&d.cluster).copied().unwrap_or(self.background),
            })
            .collect();

        let clusters = self
            .clusters
            .iter()
            .map(|c| ClusterFrame {
                key: c.key.clone(),
                value: c.value,
                radius: c.radius,
                position: c.position.into(),
                label: c.label,
                label_lines: c.label_lines.clone(),
                anchor: c.anchor,
                leader: LeaderPath::new(c.position, c.radius, c.label.position()),
                color: c.color,
            })
            .collect();

        RenderFrame {
            width: canvas.width,
            height: canvas.height,
            background: self.background,
            panel_background: self.background.to_rgba_string(self.config.panel_alpha),
            dots,
            clusters,
        }
    }
}
