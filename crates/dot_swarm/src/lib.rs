#![forbid(unsafe_code)]
//! dot_swarm: headless layout engine for clustered, labeled unit swarms.
//!
//! A population of unit dots is grouped into labeled clusters whose composition
//! changes with every narrative marker. The engine keeps dot identities stable
//! across transitions, relaxes cluster positions with a force simulation,
//! swarms dots around their clusters, and anneals label positions.
//!
//! Modules:
//! - data: rows, markers, CSV loading and the read-only catalog
//! - layout: canvas geometry, clusters, dots, resolver and pool reconciler
//! - sim: cluster relaxation and the free-running dot simulation
//! - label: word wrapping, annealed label placement, leader paths
//! - color: ordinal palette keyed by measure, comparison or group
//! - engine: update sequencing, render frames, events
//!
//! For examples, see the `dot_swarm_examples` crate.
pub mod color;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod label;
pub mod layout;
pub mod sampling;
pub mod sim;

/// Convenient re-exports for common types. Import with `use dot_swarm::prelude::*;`.
pub mod prelude {
    pub use crate::color::{ColorProperty, ColorScale, Rgb, DEFAULT_PALETTE};
    pub use crate::config::EngineConfig;
    pub use crate::data::{Align, DataCatalog, Marker, Row};
    pub use crate::engine::{
        ClusterFrame, DotFrame, EngineEvent, EngineEventKind, EventSink, FnSink, LayoutEngine,
        MultiSink, RenderFrame, SkipReason, UpdateOutcome, UpdateReport, VecSink,
    };
    pub use crate::error::{Error, Result};
    pub use crate::label::{
        AnnealConfig, AnnealReport, Anchor, CharWidthMeasure, LabelBox, LabelPlacer, LeaderPath,
        TextMeasure,
    };
    pub use crate::layout::reconcile::{DotPoolReconciler, ReconcileStats};
    pub use crate::layout::resolver::ClusterResolver;
    pub use crate::layout::{Canvas, Cluster, ClusterKey, Dot, DotId};
    pub use crate::sim::{
        ClusterSimConfig, ClusterSimulation, DotSimConfig, DotSimulation, RelaxationReport,
        SimState,
    };
}
