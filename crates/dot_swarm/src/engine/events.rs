//! Event types and sinks for observing engine updates.
//!
//! This module defines [`EngineEvent`] and a set of sinks and adapters to emit,
//! collect, or forward events while a [`crate::engine::LayoutEngine`] applies
//! markers and ticks its dot simulation.
use crate::data::Marker;
use crate::engine::{SkipReason, UpdateReport};
use crate::label::AnnealReport;
use crate::layout::reconcile::ReconcileStats;
use crate::layout::Canvas;
use crate::sim::RelaxationReport;

/// Describes events emitted by the engine.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Emitted when an update begins.
    UpdateStarted {
        /// Marker being applied.
        marker: Marker,
        /// Canvas the update lays out for.
        canvas: Canvas,
    },

    /// Emitted when an update is skipped without touching state.
    UpdateSkipped { marker: Marker, reason: SkipReason },

    /// Emitted when an update is rejected because the totals do not add up.
    UpdateRejected {
        marker: Marker,
        /// Sum of the marker's values.
        total: f64,
        /// Configured total.
        expected: f64,
    },

    /// Emitted once the active clusters are known.
    ClustersResolved {
        /// Active clusters.
        count: usize,
        /// Clusters carried over from the previous update.
        carried: usize,
    },

    /// Emitted after the dot pool was rebuilt.
    PoolReconciled { stats: ReconcileStats },

    /// Emitted after the blocking cluster relaxation.
    ClustersRelaxed { report: RelaxationReport },

    /// Emitted after label annealing.
    LabelsPlaced { report: AnnealReport },

    /// Emitted when an update has been applied.
    UpdateFinished { report: UpdateReport },

    /// Emitted for every dot simulation tick that moved dots.
    DotsTicked {
        /// Ticks since the engine was created.
        tick: u64,
        /// Simulation alpha after the tick.
        alpha: f32,
    },

    /// Non-fatal warning.
    Warning {
        /// Context string (e.g. marker or cluster key).
        context: String,
        /// Human-readable message.
        message: String,
    },
}

/// Discriminant of [`EngineEvent`], used by sinks to opt out of event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineEventKind {
    UpdateStarted,
    UpdateSkipped,
    UpdateRejected,
    ClustersResolved,
    PoolReconciled,
    ClustersRelaxed,
    LabelsPlaced,
    UpdateFinished,
    DotsTicked,
    Warning,
}

impl EngineEvent {
    pub fn kind(&self) -> EngineEventKind {
        match self {
            EngineEvent::UpdateStarted { .. } => EngineEventKind::UpdateStarted,
            EngineEvent::UpdateSkipped { .. } => EngineEventKind::UpdateSkipped,
            EngineEvent::UpdateRejected { .. } => EngineEventKind::UpdateRejected,
            EngineEvent::ClustersResolved { .. } => EngineEventKind::ClustersResolved,
            EngineEvent::PoolReconciled { .. } => EngineEventKind::PoolReconciled,
            EngineEvent::ClustersRelaxed { .. } => EngineEventKind::ClustersRelaxed,
            EngineEvent::LabelsPlaced { .. } => EngineEventKind::LabelsPlaced,
            EngineEvent::UpdateFinished { .. } => EngineEventKind::UpdateFinished,
            EngineEvent::DotsTicked { .. } => EngineEventKind::DotsTicked,
            EngineEvent::Warning { .. } => EngineEventKind::Warning,
        }
    }
}

/// A generic event sink that accepts [`EngineEvent`]s.
pub trait EventSink {
    fn send(&mut self, event: EngineEvent);

    /// Whether this sink wants events of `kind`. Emitters skip building unwanted events.
    fn wants(&self, _kind: EngineEventKind) -> bool {
        true
    }

    fn send_many<I>(&mut self, events: I)
    where
        Self: Sized,
        I: IntoIterator<Item = EngineEvent>,
    {
        for e in events {
            self.send(e);
        }
    }
}

/// A no-op event sink.
impl EventSink for () {
    #[inline]
    fn send(&mut self, _event: EngineEvent) {}

    #[inline]
    fn wants(&self, _kind: EngineEventKind) -> bool {
        false
    }
}

/// An event sink that forwards to a user-provided closure.
pub struct FnSink<F>
where
    F: FnMut(EngineEvent),
{
    f: F,
}

impl<F> FnSink<F>
where
    F: FnMut(EngineEvent),
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> EventSink for FnSink<F>
where
    F: FnMut(EngineEvent),
{
    #[inline]
    fn send(&mut self, event: EngineEvent) {
        (self.f)(event);
    }
}

/// An event sink that collects events in a `Vec`, optionally only some kinds.
#[derive(Default)]
pub struct VecSink {
    events: Vec<EngineEvent>,
    only: Option<Vec<EngineEventKind>>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            events: Vec::with_capacity(cap),
            only: None,
        }
    }

    /// Collects only the listed kinds.
    pub fn only(kinds: impl IntoIterator<Item = EngineEventKind>) -> Self {
        Self {
            events: Vec::new(),
            only: Some(kinds.into_iter().collect()),
        }
    }

    pub fn into_inner(self) -> Vec<EngineEvent> {
        self.events
    }

    pub fn as_slice(&self) -> &[EngineEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSink for VecSink {
    #[inline]
    fn send(&mut self, event: EngineEvent) {
        if self.wants(event.kind()) {
            self.events.push(event);
        }
    }

    fn wants(&self, kind: EngineEventKind) -> bool {
        self.only.as_ref().is_none_or(|kinds| kinds.contains(&kind))
    }
}

/// Fan-out sink that forwards each event to all contained sinks.
pub struct MultiSink<S: EventSink> {
    pub(crate) sinks: Vec<S>,
}

impl<S: EventSink> MultiSink<S> {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn with_sinks(sinks: Vec<S>) -> Self {
        Self { sinks }
    }

    pub fn push(&mut self, sink: S) {
        self.sinks.push(sink);
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }
}

impl<S: EventSink> Default for MultiSink<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: EventSink> EventSink for MultiSink<S> {
    fn send(&mut self, event: EngineEvent) {
        let kind = event.kind();
        let targets: Vec<usize> = (0..self.sinks.len())
            .filter(|&i| self.sinks[i].wants(kind))
            .collect();
        let Some((&last, rest)) = targets.split_last() else {
            return;
        };
        for &i in rest {
            self.sinks[i].send(event.clone());
        }
        self.sinks[last].send(event);
    }

    fn wants(&self, kind: EngineEventKind) -> bool {
        self.sinks.iter().any(|s| s.wants(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warning(context: &str) -> EngineEvent {
        EngineEvent::Warning {
            context: context.into(),
            message: "msg".into(),
        }
    }

    #[test]
    fn vec_sink_collects_events() {
        let mut sink = VecSink::with_capacity(2);
        assert!(sink.is_empty());
        sink.send(warning("a"));
        sink.send(warning("b"));
        assert_eq!(sink.len(), 2);
        sink.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn vec_sink_filters_kinds() {
        let mut sink = VecSink::only([EngineEventKind::DotsTicked]);
        assert!(!sink.wants(EngineEventKind::Warning));
        sink.send(warning("a"));
        sink.send(EngineEvent::DotsTicked { tick: 1, alpha: 0.5 });
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.as_slice()[0].kind(), EngineEventKind::DotsTicked);
    }

    #[test]
    fn multi_sink_fans_out_events() {
        let mut multi = MultiSink::with_sinks(vec![
            VecSink::new(),
            VecSink::only([EngineEventKind::UpdateFinished]),
            VecSink::new(),
        ]);
        multi.send(warning("ctx"));
        assert_eq!(multi.len(), 3);
        assert_eq!(multi.sinks[0].len(), 1);
        assert_eq!(multi.sinks[1].len(), 0);
        assert_eq!(multi.sinks[2].len(), 1);
        assert!(matches!(
            multi.sinks[2].as_slice()[0],
            EngineEvent::Warning { .. }
        ));
    }

    #[test]
    fn fn_sink_invokes_callback() {
        let mut count = 0;
        let mut sink = FnSink::new(|_event| {
            count += 1;
        });
        sink.send(warning("ctx"));
        sink.send_many([warning("a"), warning("b")]);
        drop(sink);
        assert_eq!(count, 3);
    }

    #[test]
    fn unit_sink_wants_nothing() {
        assert!(!().wants(EngineEventKind::UpdateFinished));
    }
}
