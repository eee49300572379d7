//! Criterion benchmarks for reconciliation ticks.
//! Polyline counts: m in {1, 10, 100}; every tick has one drifted vertex per mesh.

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use edgecurve::host::MemoryMesh;
use edgecurve::prelude::*;
use nalgebra::Vector3;
use rand::{rngs::StdRng, Rng, SeedableRng};

fn scene(m: usize, seed: u64) -> (MemoryHost, PolylineStore, Vec<MeshRef>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut host = MemoryHost::new();
    let mut store = PolylineStore::new();
    let cfg = GenerateCfg::default();
    let mut meshes = Vec::with_capacity(m);
    for _ in 0..m {
        let a = Vector3::new(rng.gen_range(-5.0..5.0), rng.gen_range(-5.0..5.0), 0.0);
        let b = a + Vector3::new(rng.gen_range(0.5..2.0), rng.gen_range(0.5..2.0), 1.0);
        let mesh = host.add_mesh(MemoryMesh::new(vec![a, b]));
        generate_polyline(&mut store, &mut host, &EdgeSelection::single(mesh, 0, 1), &cfg)
            .unwrap();
        meshes.push(mesh);
    }
    (host, store, meshes)
}

fn bench_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile");
    let sync = SyncCfg::default();
    for &m in &[1usize, 10, 100] {
        group.bench_with_input(BenchmarkId::new("quiet_tick", m), &m, |b, &m| {
            let (mut host, mut store, _) = scene(m, 7);
            b.iter(|| reconcile_all(&mut store, &mut host, &sync))
        });
        group.bench_with_input(BenchmarkId::new("drifted_tick", m), &m, |b, &m| {
            b.iter_batched(
                || {
                    let (mut host, store, meshes) = scene(m, 8);
                    for mesh in meshes {
                        let p = host.read_vertex(mesh, 1).unwrap();
                        host.move_vertex(mesh, 1, p + Vector3::new(0.0, 0.0, 0.5))
                            .unwrap();
                    }
                    (host, store)
                },
                |(mut host, mut store)| {
                    let report = reconcile_all(&mut store, &mut host, &sync);
                    assert_eq!(report.writes(), m);
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_reconcile);
criterion_main!(benches);
