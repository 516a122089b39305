use chrono::NaiveDate;
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use dockgraph_analysis::StationGraph;
use dockgraph_analysis::metrics::betweenness::{
    compute_betweenness_centrality, compute_betweenness_centrality_parallel,
};
use dockgraph_analysis::metrics::degree::compute_degree_centrality;
use dockgraph_core::{TripRecord, UserType};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Clone, Copy, Debug)]
struct Tier {
    name: &'static str,
    stations: usize,
    trips: usize,
}

const TIERS: [Tier; 3] = [
    Tier {
        name: "S",
        stations: 100,
        trips: 5_000,
    },
    Tier {
        name: "M",
        stations: 500,
        trips: 50_000,
    },
    Tier {
        name: "L",
        stations: 1_500,
        trips: 200_000,
    },
];

/// Synthetic trips where low-numbered stations are busier, roughly the
/// shape of a real dock network with a dense core.
fn synthetic_trips(tier: Tier, seed: u64) -> Vec<TripRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    let ts = NaiveDate::from_ymd_opt(2022, 6, 1)
        .and_then(|d| d.and_hms_opt(8, 0, 0))
        .expect("valid timestamp");

    let pick = |rng: &mut StdRng| {
        let a = rng.gen_range(0..tier.stations);
        let b = rng.gen_range(0..tier.stations);
        format!("S{:05}", a.min(b))
    };

    (0..tier.trips)
        .map(|_| {
            let start = pick(&mut rng);
            let end = pick(&mut rng);
            TripRecord::new(start, end, ts, UserType::Member)
        })
        .collect()
}

fn bench_centrality(c: &mut Criterion) {
    let mut group = c.benchmark_group("centrality");
    group.sample_size(10);

    for (i, tier) in TIERS.into_iter().enumerate() {
        let trips = synthetic_trips(tier, 0xD0C6_u64 + i as u64);
        let graph = StationGraph::from_trips(&trips).expect("build");
        group.throughput(Throughput::Elements(tier.trips as u64));

        group.bench_with_input(BenchmarkId::new("build", tier.name), &trips, |b, trips| {
            b.iter(|| black_box(StationGraph::from_trips(trips)));
        });

        group.bench_with_input(BenchmarkId::new("degree", tier.name), &graph, |b, g| {
            b.iter(|| black_box(compute_degree_centrality(g)));
        });

        group.bench_with_input(
            BenchmarkId::new("betweenness", tier.name),
            &graph,
            |b, g| b.iter(|| black_box(compute_betweenness_centrality(g))),
        );

        group.bench_with_input(
            BenchmarkId::new("betweenness_parallel", tier.name),
            &graph,
            |b, g| b.iter(|| black_box(compute_betweenness_centrality_parallel(g))),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_centrality);
criterion_main!(benches);
