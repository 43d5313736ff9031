//! Dot pool reconciliation.
//!
//! Rebuilds the pool so it holds exactly one dot per unit of active cluster
//! value while keeping as many existing dots, and their positions, as possible:
//!
//! 1. every cluster asks for `round(value)` dots;
//! 2. requests are first served by dots already tagged with the same group;
//! 3. the rest take leftover dots (retagged, position kept), the most recently
//!    reassigned first;
//! 4. only then are new dots sampled inside the canvas disk.
//!
//! Leftovers still unused at the end are discarded, so shrinking drops the
//! least recently reassigned dots. The matching is greedy, not a bipartite
//! optimum; dots are bucketed by group so it runs in linear time.
use std::collections::HashMap;

use rand::Rng as RngCore;
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::layout::{Cluster, Dot, DotId};
use crate::sampling::UniformDiskSampling;

/// What happened to the pool during one reconciliation.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileStats {
    /// Dots matched to a cluster of the same group.
    pub retained: usize,
    /// Leftover dots moved to a different group.
    pub retagged: usize,
    pub created: usize,
    pub discarded: usize,
}

/// Owns dot id allocation across reconciliations.
#[derive(Debug, Clone, Default)]
pub struct DotPoolReconciler {
    next_id: u64,
}

impl DotPoolReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next created dot will get.
    pub fn next_id(&self) -> DotId {
        DotId(self.next_id)
    }

    fn allocate(&mut self) -> DotId {
        let id = DotId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Reconciles `previous` against `clusters`.
    ///
    /// `serial` stamps every dot that is created or changes cluster. New dots are
    /// drawn from `spawn`.
    pub fn reconcile(
        &mut self,
        previous: Vec<Dot>,
        clusters: &[Cluster],
        serial: u64,
        spawn: &UniformDiskSampling,
        rng: &mut dyn RngCore,
    ) -> (Vec<Dot>, ReconcileStats) {
        let mut stats = ReconcileStats::default();

        let mut by_group: HashMap<String, Vec<Dot>> = HashMap::new();
        for dot in previous.into_iter().rev() {
            by_group.entry(dot.cluster.group.clone()).or_default().push(dot);
        }

        let required: usize = clusters.iter().map(Cluster::dot_count).sum();
        let mut pool: Vec<Dot> = Vec::with_capacity(required);
        let mut unmatched: Vec<&Cluster> = Vec::new();

        for cluster in clusters {
            let mut bucket = by_group.get_mut(cluster.group());
            for _ in 0..cluster.dot_count() {
                match bucket.as_mut().and_then(|b| b.pop()) {
                    Some(mut dot) => {
                        if dot.cluster != cluster.key {
                            dot.cluster = cluster.key.clone();
                            dot.reassigned_at = serial;
                        }
                        stats.retained += 1;
                        pool.push(dot);
                    }
                    None => unmatched.push(cluster),
                }
            }
        }

        let mut leftovers: Vec<Dot> = by_group.into_values().flatten().collect();
        // Most recently reassigned at the end, ties by id, so `pop` takes them first.
        leftovers.sort_by_key(|d| (d.reassigned_at, d.id));

        for cluster in unmatched {
            match leftovers.pop() {
                Some(mut dot) => {
                    dot.cluster = cluster.key.clone();
                    dot.reassigned_at = serial;
                    stats.retagged += 1;
                    pool.push(dot);
                }
                None => {
                    let id = self.allocate();
                    let position = spawn.sample(rng);
                    stats.created += 1;
                    pool.push(Dot::new(id, position, cluster.key.clone(), serial));
                }
            }
        }
        stats.discarded = leftovers.len();

        debug!(
            "Reconciled dot pool to {} dots: {} retained, {} retagged, {} created, {} discarded.",
            pool.len(),
            stats.retained,
            stats.retagged,
            stats.created,
            stats.discarded
        );
        (pool, stats)
    }
}
