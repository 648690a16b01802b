//! Criterion benchmarks for path solves and lower bounds.
//! Focus sizes: corridor length in {2, 4, 8}, curve order in {1, 3}.
//! Results: by default under target/criterion.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use corridor::api::{
    draw_corridor, CorridorCfg, CorridorReplay, GcsCfg, GcsOpt, SolverBackend, SolverCfg, VertexId,
};

fn corridor_opt(num_regions: usize, order: usize) -> (GcsOpt, Vec<VertexId>) {
    let c = draw_corridor(
        CorridorCfg {
            num_regions,
            ..CorridorCfg::default()
        },
        CorridorReplay {
            seed: 42,
            index: num_regions as u64,
        },
    )
    .unwrap();
    let backend = SolverBackend::acquire(SolverCfg {
        sessions: 1,
        ..SolverCfg::default()
    })
    .unwrap();
    let cfg = GcsCfg {
        order,
        time_weight: 1.0,
        h_max: 2.0,
        continuity_order: order.min(2) - 1,
        ..GcsCfg::default()
    };
    let mut opt = GcsOpt::new(c.regions, &c.adjacency, cfg, backend).unwrap();
    let s = opt.add_start(&c.start).unwrap();
    let g = opt.add_goal(&c.goal).unwrap();
    let mut path = vec![s];
    path.extend((0..num_regions).map(VertexId));
    path.push(g);
    (opt, path)
}

fn bench_solve(c: &mut Criterion) {
    let mut group = c.benchmark_group("path");
    for &order in &[1usize, 3] {
        for &n in &[2usize, 4, 8] {
            let (opt, path) = corridor_opt(n, order);
            let id = format!("k{order}_n{n}");
            group.bench_with_input(BenchmarkId::new("solve", &id), &path, |b, path| {
                b.iter(|| {
                    let _sol = opt.solve(path).unwrap();
                })
            });
            group.bench_with_input(BenchmarkId::new("lower_bound", &id), &path, |b, path| {
                b.iter(|| {
                    let _lb = opt.lowerbound_solve(path, 0).unwrap();
                })
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_solve);
criterion_main!(benches);
