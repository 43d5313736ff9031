mod common;

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use dot_swarm::config::EngineConfig;
use dot_swarm::label::CharWidthMeasure;
use dot_swarm::layout::resolver::ClusterResolver;
use dot_swarm::layout::Canvas;
use dot_swarm::sim::{ClusterSimConfig, ClusterSimulation};
use rand::rngs::StdRng;
use rand::SeedableRng;

const CLUSTER_COUNTS: [usize; 4] = [2, 5, 10, 20];

fn cluster_relaxation_benches(c: &mut Criterion) {
    let canvas = Canvas::new(800.0, 600.0);
    let config = EngineConfig::default();
    let text = CharWidthMeasure::default();
    let mut group = c.benchmark_group("cluster_sim/relax");

    for &count in &CLUSTER_COUNTS {
        let (catalog, marker) = common::split_catalog(count, 100);
        let mut colors = config.color_scale().expect("default palette");
        let seeded = ClusterResolver::new(&config, &text)
            .resolve(&catalog, &marker, &[], canvas, &mut colors)
            .expect("bench catalog sums to the total");
        group.throughput(common::elements_throughput(count));

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                let mut sim = ClusterSimulation::new(ClusterSimConfig::default(), config.cluster_padding);
                sim.set_canvas(canvas, config.margin, config.label_headroom);
                let mut clusters = seeded.clone();
                let mut rng = StdRng::seed_from_u64(0xC1u64 ^ count as u64);
                let report = sim.relax(&mut clusters, &mut rng);
                black_box(report.ticks);
            });
        });
    }

    group.finish();
}

criterion_group! {
    name = benches;
    config = common::default_criterion();
    targets = cluster_relaxation_benches
}
criterion_main!(benches);
