use std::sync::Arc;

use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::model::{LabelTree, NodeId, TreeNode, clone_payload};

/// One row of the depth-annotated linear view of a [`LabelTree`].
///
/// Items are derived by [`flatten`]; `node` points back at the original node so
/// its payload and child count stay available without another lookup.
#[derive(Clone, Debug)]
pub struct FlattenedItem {
    pub id: NodeId,
    pub parent_id: Option<NodeId>,
    /// Distance from a root (roots are 0).
    pub depth: usize,
    /// Position among siblings.
    pub index: usize,
    pub node: Arc<TreeNode>,
}

impl FlattenedItem {
    /// Returns `true` if the underlying node has children.
    #[inline]
    pub fn has_children(&self) -> bool {
        !self.node.children.is_empty()
    }
}

/// Depth-first walk that keeps sibling order. Visits each node once.
pub fn flatten(tree: &LabelTree) -> Vec<FlattenedItem> {
    let mut items = Vec::with_capacity(tree.node_count());
    flatten_into(tree.roots(), None, 0, &mut items);
    items
}

fn flatten_into(
    nodes: &[Arc<TreeNode>],
    parent_id: Option<NodeId>,
    depth: usize,
    items: &mut Vec<FlattenedItem>,
) {
    for (index, node) in nodes.iter().enumerate() {
        items.push(FlattenedItem {
            id: node.id,
            parent_id,
            depth,
            index,
            node: Arc::clone(node),
        });
        flatten_into(&node.children, Some(node.id), depth + 1, items);
    }
}

/// Rebuilds the nested forest from flat items.
///
/// Only `parent_id` and list order matter; `depth` and `index` are ignored.
/// Items whose parent is not in the list become roots. Items that cannot be
/// reached from a root (a parent cycle) are dropped.
pub fn build(items: &[FlattenedItem]) -> LabelTree {
    let present: FxHashSet<NodeId> = items.iter().map(|item| item.id).collect();
    let mut children_of: FxHashMap<NodeId, SmallVec<[usize; 8]>> =
        FxHashMap::with_capacity_and_hasher(items.len(), FxBuildHasher);
    let mut root_slots: Vec<usize> = Vec::new();

    for (slot, item) in items.iter().enumerate() {
        match item.parent_id {
            Some(parent) if parent != item.id && present.contains(&parent) => {
                children_of.entry(parent).or_default().push(slot);
            }
            _ => root_slots.push(slot),
        }
    }

    let mut visited = FxHashSet::with_capacity_and_hasher(items.len(), FxBuildHasher);
    let roots = root_slots
        .into_iter()
        .filter_map(|slot| assemble(items, slot, &children_of, &mut visited))
        .collect();
    let tree = LabelTree::from_shared(roots);
    if visited.len() < items.len() {
        log::warn!(
            "dropped {} unreachable items while rebuilding tree",
            items.len() - visited.len()
        );
    }
    tree
}

fn assemble(
    items: &[FlattenedItem],
    slot: usize,
    children_of: &FxHashMap<NodeId, SmallVec<[usize; 8]>>,
    visited: &mut FxHashSet<NodeId>,
) -> Option<Arc<TreeNode>> {
    let item = &items[slot];
    if !visited.insert(item.id) {
        return None;
    }
    let children = children_of.get(&item.id).map_or_else(Vec::new, |slots| {
        slots
            .iter()
            .filter_map(|&child| assemble(items, child, children_of, visited))
            .collect()
    });
    Some(Arc::new(TreeNode {
        children,
        ..clone_payload(&item.node)
    }))
}

/// Drops every item that sits below an item whose id is in `hidden_ids`.
///
/// The hidden item itself stays; its followers are skipped while they are
/// strictly deeper than it.
pub fn remove_children_of(
    items: &[FlattenedItem],
    hidden_ids: &FxHashSet<NodeId>,
) -> Vec<FlattenedItem> {
    let mut kept = Vec::with_capacity(items.len());
    let mut excluded_depth: Option<usize> = None;
    for item in items {
        if let Some(depth) = excluded_depth {
            if item.depth > depth {
                continue;
            }
            excluded_depth = None;
        }
        if hidden_ids.contains(&item.id) {
            excluded_depth = Some(item.depth);
        }
        kept.push(item.clone());
    }
    kept
}

/// Ids of nodes whose descendants are hidden in the flat view.
pub fn collapsed_ids(items: &[FlattenedItem]) -> FxHashSet<NodeId> {
    items
        .iter()
        .filter(|item| item.node.hides_children())
        .map(|item| item.id)
        .collect()
}

/// Total descendant count of `id` (see [`LabelTree::child_count`]).
#[inline]
pub fn child_count(tree: &LabelTree, id: NodeId) -> usize {
    tree.child_count(id)
}

/// Moves the element at `from` to `to`, shifting the elements in between.
pub fn array_move<T>(items: &mut [T], from: usize, to: usize) {
    if from == to || from >= items.len() || to >= items.len() {
        return;
    }
    if from < to {
        items[from..=to].rotate_left(1);
    } else {
        items[to..=from].rotate_right(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LabelTree {
        LabelTree::from_roots([
            TreeNode::new(1, "A").with_children([TreeNode::new(2, "B")]),
            TreeNode::new(3, "C"),
        ])
        .unwrap()
    }

    fn summary(items: &[FlattenedItem]) -> Vec<(u64, Option<u64>, usize)> {
        items
            .iter()
            .map(|item| (item.id.0, item.parent_id.map(|p| p.0), item.depth))
            .collect()
    }

    #[test]
    fn flattens_depth_first_with_parents() {
        let items = flatten(&sample());
        assert_eq!(
            summary(&items),
            vec![(1, None, 0), (2, Some(1), 1), (3, None, 0)]
        );
        let indexes: Vec<_> = items.iter().map(|item| item.index).collect();
        assert_eq!(indexes, vec![0, 0, 1]);
    }

    #[test]
    fn build_round_trips() {
        let tree = LabelTree::from_roots([
            TreeNode::new(1, "A").with_children([
                TreeNode::new(2, "B").with_children([TreeNode::new(5, "E")]),
                TreeNode::new(4, "D"),
            ]),
            TreeNode::new(3, "C").with_collapsed(true),
        ])
        .unwrap();
        assert_eq!(build(&flatten(&tree)), tree);
    }

    #[test]
    fn build_ignores_depth_and_orphans_become_roots() {
        let mut items = flatten(&sample());
        items[1].depth = 7;
        items.remove(0);
        let rebuilt = build(&items);
        let ids: Vec<_> = rebuilt.roots().iter().map(|n| n.id().0).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn build_drops_parent_cycles() {
        let mut items = flatten(&sample());
        // A -> B -> A
        items[0].parent_id = Some(NodeId(2));
        let rebuilt = build(&items);
        let ids: Vec<_> = rebuilt.nodes().map(|n| n.id().0).collect();
        assert_eq!(ids, vec![3]);
    }

    #[test]
    fn removes_children_of_hidden_items() {
        let tree = LabelTree::from_roots([
            TreeNode::new(1, "A").with_children([
                TreeNode::new(2, "B").with_children([TreeNode::new(5, "E")]),
                TreeNode::new(4, "D"),
            ]),
            TreeNode::new(3, "C"),
        ])
        .unwrap();
        let items = flatten(&tree);

        let hidden: FxHashSet<NodeId> = [NodeId(2)].into_iter().collect();
        let ids: Vec<_> = remove_children_of(&items, &hidden)
            .iter()
            .map(|item| item.id.0)
            .collect();
        assert_eq!(ids, vec![1, 2, 4, 3]);

        let hidden: FxHashSet<NodeId> = [NodeId(1)].into_iter().collect();
        let ids: Vec<_> = remove_children_of(&items, &hidden)
            .iter()
            .map(|item| item.id.0)
            .collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn collapsed_leaf_hides_nothing() {
        let tree = LabelTree::from_roots([
            TreeNode::new(1, "A").with_collapsed(true),
            TreeNode::new(2, "B")
                .with_collapsed(true)
                .with_children([TreeNode::new(3, "C")]),
        ])
        .unwrap();
        let hidden = collapsed_ids(&flatten(&tree));
        assert!(!hidden.contains(&NodeId(1)));
        assert!(hidden.contains(&NodeId(2)));
    }

    #[test]
    fn array_move_shifts_between() {
        let mut values = [0, 1, 2, 3];
        array_move(&mut values, 0, 2);
        assert_eq!(values, [1, 2, 0, 3]);
        array_move(&mut values, 3, 0);
        assert_eq!(values, [3, 1, 2, 0]);
        array_move(&mut values, 1, 9);
        assert_eq!(values, [3, 1, 2, 0]);
    }
}
