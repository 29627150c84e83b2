use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use is_mesh::prelude::*;

fn block(n: usize) -> (IsMesh, NodeKey) {
    let (mesh, nodes): (IsMesh, _) = structured_block(n, n, n).expect("block");
    // A node away from the block surface.
    let centre = nodes[nodes.len() / 2];
    (mesh, centre)
}

fn bench_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("queries");

    for &n in &[4usize, 8] {
        let (mut mesh, centre) = block(n);

        group.bench_with_input(BenchmarkId::new("star_uncompressed", n), &n, |b, _| {
            b.iter(|| black_box(mesh.star(centre).expect("star")));
        });
        group.bench_with_input(BenchmarkId::new("link_uncompressed", n), &n, |b, _| {
            b.iter(|| black_box(mesh.link(centre).expect("link")));
        });

        mesh.compress(&mesh.all_simplices()).expect("compress");
        group.bench_with_input(BenchmarkId::new("star_compressed", n), &n, |b, _| {
            b.iter(|| black_box(mesh.star(centre).expect("star")));
        });
    }

    group.finish();
}

fn bench_operators(c: &mut Criterion) {
    let mut group = c.benchmark_group("operators");

    for &n in &[4usize, 8] {
        let (mut mesh, centre) = block(n);
        // The undo mark below only covers the edge's neighbourhood.
        mesh.set_config(MeshConfig {
            auto_compress: false,
            ..MeshConfig::default()
        });
        let e = mesh
            .star(centre)
            .expect("star")
            .edges()
            .next()
            .expect("centre has edges");

        group.bench_with_input(BenchmarkId::new("split_edge_then_undo", n), &n, |b, _| {
            b.iter(|| {
                let mut region = mesh.star(e).expect("star");
                region.insert(e);
                let region = mesh.closure_set(&region).expect("closure");
                mesh.set_undo_mark(&region).expect("mark");
                black_box(mesh.split_edge(e).expect("split"));
                mesh.undo().expect("undo");
            });
        });

        group.bench_with_input(BenchmarkId::new("compress_all", n), &n, |b, _| {
            b.iter_batched(
                || {
                    let (mut fresh, _) = block(n);
                    fresh.uncompress_set(&fresh.all_simplices()).expect("uncompress");
                    fresh
                },
                |mut fresh| black_box(fresh.compress_all().expect("compress")),
                criterion::BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_queries, bench_operators);
criterion_main!(benches);
