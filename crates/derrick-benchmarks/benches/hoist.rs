//! Hoisting performance benchmarks
//!
//! Measures end-to-end hoisting over synthetic graphs: wide trees where every
//! branch duplicates the same leaf set, and deep chains that collapse level
//! by level.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use derrick_benchmarks::criterion_config;
use derrick_hoist::{hoist, DependencyTree, HoistOptions};

const SHARED_LEAVES: [&str; 4] = ["left-pad", "lodash", "chalk", "semver"];

/// Every branch under the root carries its own copy of the shared leaf set;
/// hoisting collapses them all into one copy at the root
fn wide_duplicate_tree(width: usize) -> DependencyTree {
    let mut tree = DependencyTree::new(".", "workspace:.");
    for branch in 0..width {
        let parent = tree.add_package(format!("pkg-{branch}"), "1.0.0");
        tree.add_dependency(tree.root, parent);
        for leaf in SHARED_LEAVES {
            let dep = tree.add_package(leaf, "1.0.0");
            tree.add_dependency(parent, dep);
        }
    }
    tree
}

/// A single chain of distinct packages, each level dragging a duplicate
/// utility along
fn deep_chain_tree(depth: usize) -> DependencyTree {
    let mut tree = DependencyTree::new(".", "workspace:.");
    let mut parent = tree.root;
    for level in 0..depth {
        let link = tree.add_package(format!("link-{level}"), "1.0.0");
        tree.add_dependency(parent, link);
        let util = tree.add_package("util", "1.0.0");
        tree.add_dependency(link, util);
        parent = link;
    }
    tree
}

fn bench_wide_trees(c: &mut Criterion) {
    let mut group = c.benchmark_group("hoist_wide");

    for width in [10, 100, 500].iter() {
        let tree = wide_duplicate_tree(*width);
        group.throughput(Throughput::Elements(tree.package_count() as u64));

        group.bench_with_input(BenchmarkId::new("branches", width), &tree, |b, tree| {
            b.iter(|| black_box(hoist(tree, &HoistOptions::default()).unwrap()));
        });
    }

    group.finish();
}

fn bench_deep_chains(c: &mut Criterion) {
    let mut group = c.benchmark_group("hoist_deep");

    for depth in [10, 50, 200].iter() {
        let tree = deep_chain_tree(*depth);
        group.throughput(Throughput::Elements(tree.package_count() as u64));

        group.bench_with_input(BenchmarkId::new("levels", depth), &tree, |b, tree| {
            b.iter(|| black_box(hoist(tree, &HoistOptions::default()).unwrap()));
        });
    }

    group.finish();
}

fn bench_checked_hoist(c: &mut Criterion) {
    let mut group = c.benchmark_group("hoist_checked");
    let tree = wide_duplicate_tree(50);
    group.throughput(Throughput::Elements(tree.package_count() as u64));

    group.bench_function("per_promotion_check", |b| {
        let options = HoistOptions {
            check: true,
            debug_level: Some(-1),
        };
        b.iter(|| black_box(hoist(&tree, &options).unwrap()));
    });

    group.finish();
}

criterion_group! {
    name = benches;
    config = criterion_config();
    targets = bench_wide_trees, bench_deep_chains, bench_checked_hoist
}
criterion_main!(benches);
