#![allow(dead_code)]

use std::time::Duration;

use criterion::{Criterion, Throughput};
use dot_swarm::data::{DataCatalog, Marker, Row};

pub const SAMPLE_SIZE: usize = 20;
pub const WARM_UP: Duration = Duration::from_secs(1);
pub const MEASUREMENT_TIME: Duration = Duration::from_secs(2);

pub fn default_criterion() -> Criterion {
    Criterion::default()
        .configure_from_args()
        .sample_size(SAMPLE_SIZE)
        .warm_up_time(WARM_UP)
        .measurement_time(MEASUREMENT_TIME)
}

pub fn elements_throughput(elements: usize) -> Throughput {
    Throughput::Elements(elements.max(1) as u64)
}

/// Catalog with one marker `("bench", "c")` split into `groups` clusters summing to `total`.
pub fn split_catalog(groups: usize, total: u32) -> (DataCatalog, Marker) {
    let groups = groups.max(1) as u32;
    let base = total / groups;
    let rows = (0..groups)
        .map(|i| {
            let extra = if i < total % groups { 1 } else { 0 };
            Row::new("bench", "c", format!("Group {i}"), f64::from(base + extra))
        })
        .collect();
    (DataCatalog::new(rows), Marker::new("bench", "c"))
}
