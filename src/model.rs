use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use rustc_hash::{FxBuildHasher, FxHashSet};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::EditError;

/// Node identifier, unique across a whole [`LabelTree`].
///
/// `NodeId::DRAFT` (zero) is reserved for the single draft node; committed
/// nodes always carry a non-zero id.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl NodeId {
    /// Id carried by the draft node until its name is committed.
    pub const DRAFT: Self = Self(0);

    /// Returns `true` for the reserved draft id.
    #[inline]
    pub const fn is_draft(self) -> bool {
        self.0 == Self::DRAFT.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_draft() {
            f.write_str("draft")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl From<u64> for NodeId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Change-tracking classification carried through for the host's save call.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "lowercase")
)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Loaded from the host, untouched by this session.
    #[default]
    Existing,
    /// Created locally in this session.
    Created,
    /// A previously persisted node whose name was edited.
    Modified,
}

/// Whether a node has been confirmed or is still waiting for a name.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "lowercase")
)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NodeStatus {
    #[default]
    Persisted,
    Draft,
}

/// One label of the hierarchy, owning its ordered children.
///
/// Nodes are shared through `Arc` and never mutated in place; edits go through
/// the [`LabelTree`] operations, which rebuild only the changed path.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeNode {
    pub(crate) id: NodeId,
    pub(crate) name: String,
    #[cfg_attr(feature = "serde", serde(default, rename = "type"))]
    pub(crate) kind: NodeKind,
    #[cfg_attr(feature = "serde", serde(default))]
    pub(crate) status: NodeStatus,
    #[cfg_attr(feature = "serde", serde(default))]
    pub(crate) collapsed: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub(crate) children: Vec<Arc<TreeNode>>,
}

impl TreeNode {
    /// Creates a persisted leaf node.
    pub fn new(id: impl Into<NodeId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: NodeKind::Existing,
            status: NodeStatus::Persisted,
            collapsed: false,
            children: Vec::new(),
        }
    }

    pub(crate) fn draft() -> Self {
        Self {
            id: NodeId::DRAFT,
            name: String::new(),
            kind: NodeKind::Created,
            status: NodeStatus::Draft,
            collapsed: false,
            children: Vec::new(),
        }
    }

    /// Replaces the children of this node.
    #[must_use]
    pub fn with_children(mut self, children: impl IntoIterator<Item = Self>) -> Self {
        self.children = children.into_iter().map(Arc::new).collect();
        self
    }

    /// Sets the initial collapsed flag.
    #[must_use]
    pub const fn with_collapsed(mut self, collapsed: bool) -> Self {
        self.collapsed = collapsed;
        self
    }

    /// Sets the change-tracking kind.
    #[must_use]
    pub const fn with_kind(mut self, kind: NodeKind) -> Self {
        self.kind = kind;
        self
    }

    #[inline]
    pub const fn id(&self) -> NodeId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub const fn kind(&self) -> NodeKind {
        self.kind
    }

    #[inline]
    pub const fn status(&self) -> NodeStatus {
        self.status
    }

    /// Returns `true` if this node is still waiting for a committed name.
    #[inline]
    pub fn is_draft(&self) -> bool {
        self.status == NodeStatus::Draft
    }

    /// The raw collapsed flag (see [`Self::hides_children`]).
    #[inline]
    pub const fn collapsed(&self) -> bool {
        self.collapsed
    }

    /// Returns `true` if the flat view should hide this node's descendants.
    #[inline]
    pub fn hides_children(&self) -> bool {
        self.collapsed && !self.children.is_empty()
    }

    #[inline]
    pub fn children(&self) -> &[Arc<Self>] {
        &self.children
    }

    /// Total number of descendants (not counting this node).
    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|child| 1 + child.descendant_count())
            .sum()
    }
}

/// Ordered forest of labels.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelTree {
    roots: Vec<Arc<TreeNode>>,
}

impl LabelTree {
    /// Creates an empty forest.
    pub const fn new() -> Self {
        Self { roots: Vec::new() }
    }

    /// Builds a forest from nested nodes, rejecting duplicate ids and persisted
    /// nodes that carry the reserved [`NodeId::DRAFT`].
    pub fn from_roots(roots: impl IntoIterator<Item = TreeNode>) -> Result<Self, EditError> {
        let tree = Self::from_shared(roots.into_iter().map(Arc::new).collect());
        let mut seen = FxHashSet::with_capacity_and_hasher(tree.node_count(), FxBuildHasher);
        for node in tree.nodes() {
            if node.id.is_draft() && node.status == NodeStatus::Persisted {
                return Err(EditError::ReservedId(node.id));
            }
            if !seen.insert(node.id) {
                return Err(EditError::DuplicateId(node.id));
            }
        }
        Ok(tree)
    }

    pub(crate) const fn from_shared(roots: Vec<Arc<TreeNode>>) -> Self {
        Self { roots }
    }

    #[inline]
    pub fn roots(&self) -> &[Arc<TreeNode>] {
        &self.roots
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Total number of nodes, drafts included.
    pub fn node_count(&self) -> usize {
        self.roots
            .iter()
            .map(|root| 1 + root.descendant_count())
            .sum()
    }

    /// Depth-first, sibling-ordered iterator over every node.
    pub fn nodes(&self) -> Nodes<'_> {
        let mut stack = Vec::with_capacity(self.roots.len());
        stack.extend(self.roots.iter().rev());
        Nodes { stack }
    }

    /// Looks up a node by id.
    pub fn find(&self, id: NodeId) -> Option<&Arc<TreeNode>> {
        Self::find_in(&self.roots, id)
    }

    fn find_in(nodes: &[Arc<TreeNode>], id: NodeId) -> Option<&Arc<TreeNode>> {
        for node in nodes {
            if node.id == id {
                return Some(node);
            }
            if let Some(found) = Self::find_in(&node.children, id) {
                return Some(found);
            }
        }
        None
    }

    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.find(id).is_some()
    }

    /// Returns the ids from the root down to (and including) `id`.
    pub fn path_to(&self, id: NodeId) -> Option<Vec<NodeId>> {
        let mut path = Vec::new();
        Self::dfs_find_path(&self.roots, id, &mut path).then_some(path)
    }

    fn dfs_find_path(nodes: &[Arc<TreeNode>], target: NodeId, path: &mut Vec<NodeId>) -> bool {
        for node in nodes {
            path.push(node.id);
            if node.id == target || Self::dfs_find_path(&node.children, target, path) {
                return true;
            }
            path.pop();
        }
        false
    }

    /// Returns the parent id of `id` (`None` for roots and missing ids).
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        let path = self.path_to(id)?;
        path.len().checked_sub(2).map(|idx| path[idx])
    }

    /// Returns the draft node, if one is pending.
    pub fn draft(&self) -> Option<&Arc<TreeNode>> {
        self.find(NodeId::DRAFT)
    }

    /// Returns `true` if any node holds the draft id.
    #[inline]
    pub fn has_draft(&self) -> bool {
        self.contains(NodeId::DRAFT)
    }

    /// Total descendant count of `id`; zero for leaves and missing ids.
    pub fn child_count(&self, id: NodeId) -> usize {
        self.find(id).map_or(0, |node| node.descendant_count())
    }

    /// Returns `true` if every node of both trees is the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.roots.len() == other.roots.len()
            && self
                .roots
                .iter()
                .zip(&other.roots)
                .all(|(a, b)| Arc::ptr_eq(a, b))
    }

    /// Mints an id derived from the current time that no node uses yet.
    pub(crate) fn mint_id(&self) -> NodeId {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(1);
        let max_in_use = self.nodes().map(|node| node.id.0).max().unwrap_or(0);
        NodeId(now.max(max_in_use.saturating_add(1)).max(1))
    }

    /// Rebuilds the path to `id`, replacing that node with `f(node)`.
    ///
    /// Returns `None` when `id` is missing; siblings off the path are shared.
    pub(crate) fn update_node<F>(&self, id: NodeId, f: F) -> Option<Self>
    where
        F: FnOnce(&TreeNode) -> TreeNode,
    {
        let mut f = Some(f);
        update_in(&self.roots, id, &mut f).map(Self::from_shared)
    }

    /// Rebuilds the forest without `id` and its subtree.
    pub(crate) fn remove_node(&self, id: NodeId) -> Option<Self> {
        remove_in(&self.roots, id).map(Self::from_shared)
    }

    pub(crate) fn with_root_inserted(&self, position: usize, node: TreeNode) -> Self {
        let mut roots = self.roots.clone();
        roots.insert(position.min(roots.len()), Arc::new(node));
        Self::from_shared(roots)
    }
}

fn update_in<F>(nodes: &[Arc<TreeNode>], id: NodeId, f: &mut Option<F>) -> Option<Vec<Arc<TreeNode>>>
where
    F: FnOnce(&TreeNode) -> TreeNode,
{
    for (idx, node) in nodes.iter().enumerate() {
        let replacement = if node.id == id {
            f.take().map(|f| f(&**node))
        } else {
            update_in(&node.children, id, f).map(|children| TreeNode {
                children,
                ..clone_payload(node)
            })
        };
        if let Some(replacement) = replacement {
            let mut out = nodes.to_vec();
            out[idx] = Arc::new(replacement);
            return Some(out);
        }
    }
    None
}

fn remove_in(nodes: &[Arc<TreeNode>], id: NodeId) -> Option<Vec<Arc<TreeNode>>> {
    if let Some(idx) = nodes.iter().position(|node| node.id == id) {
        let mut out = nodes.to_vec();
        out.remove(idx);
        return Some(out);
    }
    for (idx, node) in nodes.iter().enumerate() {
        if let Some(children) = remove_in(&node.children, id) {
            let mut out = nodes.to_vec();
            out[idx] = Arc::new(TreeNode {
                children,
                ..clone_payload(node)
            });
            return Some(out);
        }
    }
    None
}

/// Copies everything but the children (which callers replace).
pub(crate) fn clone_payload(node: &TreeNode) -> TreeNode {
    TreeNode {
        id: node.id,
        name: node.name.clone(),
        kind: node.kind,
        status: node.status,
        collapsed: node.collapsed,
        children: Vec::new(),
    }
}

/// Pre-order iterator returned by [`LabelTree::nodes`].
#[derive(Debug)]
pub struct Nodes<'a> {
    stack: Vec<&'a Arc<TreeNode>>,
}

impl<'a> Iterator for Nodes<'a> {
    type Item = &'a Arc<TreeNode>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}
