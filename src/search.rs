use std::sync::Arc;

use rustc_hash::{FxBuildHasher, FxHashSet};

use crate::model::{LabelTree, NodeId, TreeNode, clone_payload};

/// Match predicate used by [`search_with`].
pub trait NodeFilter {
    /// Returns `true` if the node matches the filter criteria.
    fn is_match(&self, node: &TreeNode) -> bool;
}

impl<F> NodeFilter for F
where
    F: Fn(&TreeNode) -> bool,
{
    #[inline]
    fn is_match(&self, node: &TreeNode) -> bool {
        self(node)
    }
}

/// Case-sensitive substring match on the node name.
#[derive(Clone, Copy, Debug)]
pub struct Keyword<'a>(pub &'a str);

impl NodeFilter for Keyword<'_> {
    #[inline]
    fn is_match(&self, node: &TreeNode) -> bool {
        node.name.contains(self.0)
    }
}

/// Filtered copy of a tree produced by [`search`].
#[derive(Clone, Debug)]
pub struct SearchResult {
    /// Fresh clone: matches and their ancestors expanded, the rest collapsed.
    pub tree: LabelTree,
    /// `true` iff at least one node matched.
    pub matched: bool,
    /// Ids of the nodes that matched themselves.
    pub matches: FxHashSet<NodeId>,
}

impl SearchResult {
    #[inline]
    pub fn is_match(&self, id: NodeId) -> bool {
        self.matches.contains(&id)
    }
}

/// Searches node names for `keyword` (see [`search_with`]).
///
/// An empty keyword matches every node; hosts normally drop the filtered view
/// instead.
pub fn search(tree: &LabelTree, keyword: &str) -> SearchResult {
    search_with(tree, &Keyword(keyword))
}

/// Builds a collapsed deep copy of `tree` with every matching node and all of
/// its ancestors expanded. Nothing is pruned; hiding is left to the flat view.
pub fn search_with<F>(tree: &LabelTree, filter: &F) -> SearchResult
where
    F: NodeFilter + ?Sized,
{
    let mut matches = FxHashSet::with_capacity_and_hasher(0, FxBuildHasher);
    let roots = tree
        .roots()
        .iter()
        .map(|root| clone_filtered(root, filter, &mut matches).0)
        .collect();
    log::trace!("search matched {} nodes", matches.len());
    SearchResult {
        tree: LabelTree::from_shared(roots),
        matched: !matches.is_empty(),
        matches,
    }
}

fn clone_filtered<F>(
    node: &TreeNode,
    filter: &F,
    matches: &mut FxHashSet<NodeId>,
) -> (Arc<TreeNode>, bool)
where
    F: NodeFilter + ?Sized,
{
    let self_match = filter.is_match(node);
    if self_match {
        matches.insert(node.id);
    }

    let mut subtree_match = false;
    let children = node
        .children
        .iter()
        .map(|child| {
            let (child, child_match) = clone_filtered(child, filter, matches);
            subtree_match |= child_match;
            child
        })
        .collect();

    let on_match_path = self_match || subtree_match;
    let clone = TreeNode {
        collapsed: !on_match_path,
        children,
        ..clone_payload(node)
    };
    (Arc::new(clone), on_match_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::{collapsed_ids, flatten, remove_children_of};

    fn sample() -> LabelTree {
        LabelTree::from_roots([
            TreeNode::new(1, "A").with_children([TreeNode::new(2, "B")]),
            TreeNode::new(3, "C"),
        ])
        .unwrap()
    }

    #[test]
    fn expands_ancestors_of_matches() {
        let tree = sample().collapse_all();
        let result = search(&tree, "B");
        assert!(result.matched);
        assert!(result.is_match(NodeId(2)));
        assert!(!result.tree.find(NodeId(1)).unwrap().collapsed());
        assert!(result.tree.find(NodeId(3)).unwrap().collapsed());
        // Not pruned, only flagged.
        assert!(result.tree.contains(NodeId(3)));
    }

    #[test]
    fn no_match_collapses_everything() {
        let result = search(&sample(), "zzz");
        assert!(!result.matched);
        assert!(result.tree.nodes().all(|node| node.collapsed()));
    }

    #[test]
    fn match_is_case_sensitive() {
        assert!(!search(&sample(), "b").matched);
    }

    #[test]
    fn results_are_independent_clones() {
        let tree = sample();
        let first = search(&tree, "B");
        let second = search(&tree, "C");
        assert!(!Arc::ptr_eq(&tree.roots()[0], &first.tree.roots()[0]));
        assert!(!first.tree.find(NodeId(1)).unwrap().collapsed());
        assert!(second.tree.find(NodeId(1)).unwrap().collapsed());
        assert!(!tree.find(NodeId(1)).unwrap().collapsed());
    }

    #[test]
    fn filtered_view_hides_unmatched_branches() {
        let tree = LabelTree::from_roots([
            TreeNode::new(1, "fruit").with_children([TreeNode::new(2, "apple")]),
            TreeNode::new(3, "veg").with_children([TreeNode::new(4, "leek")]),
        ])
        .unwrap();
        let result = search(&tree, "apple");
        let items = flatten(&result.tree);
        let ids: Vec<_> = remove_children_of(&items, &collapsed_ids(&items))
            .iter()
            .map(|item| item.id.0)
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn closures_work_as_filters() {
        let result = search_with(&sample(), &|node: &TreeNode| node.id() == NodeId(3));
        assert_eq!(result.matches.len(), 1);
    }
}
