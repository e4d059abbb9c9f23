use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use rustc_hash::FxHashSet;
use tui_sortable_tree::{
    LabelTree, NodeId, TreeNode, build, flatten, get_projection, remove_children_of, search,
};

// Balanced forest: `roots` roots with `fanout` children per node, `depth` levels deep.
fn forest(roots: u64, fanout: u64, depth: u32) -> LabelTree {
    fn grow(next_id: &mut u64, fanout: u64, depth: u32) -> TreeNode {
        *next_id += 1;
        let id = *next_id;
        let children: Vec<_> = if depth == 0 {
            Vec::new()
        } else {
            (0..fanout).map(|_| grow(next_id, fanout, depth - 1)).collect()
        };
        TreeNode::new(id, format!("label-{id}")).with_children(children)
    }

    let mut next_id = 0;
    let roots: Vec<_> = (0..roots).map(|_| grow(&mut next_id, fanout, depth)).collect();
    LabelTree::from_roots(roots).unwrap()
}

fn bench_flatten(c: &mut Criterion) {
    let tree = forest(10, 4, 4);
    c.bench_function("flatten_3410", |b| b.iter(|| flatten(black_box(&tree))));

    let items = flatten(&tree);
    c.bench_function("build_3410", |b| b.iter(|| build(black_box(&items))));

    let hidden: FxHashSet<NodeId> = tree
        .nodes()
        .filter(|node| node.id().0 % 7 == 0)
        .map(|node| node.id())
        .collect();
    c.bench_function("remove_children_of_3410", |b| {
        b.iter(|| remove_children_of(black_box(&items), black_box(&hidden)));
    });
}

fn bench_projection(c: &mut Criterion) {
    let tree = forest(10, 4, 4);
    let items = flatten(&tree);
    let active = items[items.len() / 3].id;
    let over = items[items.len() / 2].id;
    c.bench_function("projection_3410", |b| {
        b.iter(|| get_projection(black_box(&items), active, over, 48.0, 24.0));
    });
    c.bench_function("reorder_3410", |b| {
        b.iter(|| black_box(&tree).reorder(active, over, 48.0, 24.0));
    });
}

fn bench_edit(c: &mut Criterion) {
    let tree = forest(10, 4, 4);
    c.bench_function("search_3410", |b| b.iter(|| search(black_box(&tree), "label-12")));
    c.bench_function("toggle_collapsed_3410", |b| {
        b.iter(|| black_box(&tree).toggle_collapsed(NodeId(1)));
    });
}

criterion_group!(benches, bench_flatten, bench_projection, bench_edit);
criterion_main!(benches);
