//! Registry and traversal benchmarks.
//!
//! Two shapes stress the two halves of the engine:
//!
//! 1. **Wide**: one root, N direct children. Dominated by registry work
//!    (identity map inserts, children-list appends).
//! 2. **Deep**: a chain of depth N. Dominated by traversal work (guard
//!    entries, per-node snapshots, post-order unwinding).

use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use cascade::{ActionError, DisposalTree, FnAction};

fn dispose_wide(width: usize) {
    let tree = DisposalTree::<usize>::new();
    let root = Arc::new(0_usize);
    let children: Vec<_> = (1..=width).map(Arc::new).collect();
    for child in &children {
        tree.register(&root, child);
    }

    let action = FnAction::new(|resource: &Arc<usize>| {
        black_box(**resource);
        Ok::<_, ActionError>(())
    });
    assert!(tree.execute_all(&root, true, &action, false).unwrap());
    assert!(tree.is_empty());
}

fn dispose_deep(depth: usize) {
    let tree = DisposalTree::<usize>::new();
    let handles: Vec<_> = (0..depth).map(Arc::new).collect();
    for pair in handles.windows(2) {
        tree.register(&pair[0], &pair[1]);
    }

    let action = FnAction::new(|resource: &Arc<usize>| {
        black_box(**resource);
        Ok::<_, ActionError>(())
    });
    assert!(tree.execute_all(&handles[0], true, &action, false).unwrap());
    assert!(tree.is_empty());
}

fn bench_wide_trees(c: &mut Criterion) {
    let mut group = c.benchmark_group("register_dispose_wide");
    for width in [10_usize, 100, 1_000] {
        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, &width| {
            b.iter(|| dispose_wide(width));
        });
    }
    group.finish();
}

fn bench_deep_trees(c: &mut Criterion) {
    let mut group = c.benchmark_group("register_dispose_deep");
    for depth in [10_usize, 100, 500] {
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, &depth| {
            b.iter(|| dispose_deep(depth));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_wide_trees, bench_deep_trees);
criterion_main!(benches);
