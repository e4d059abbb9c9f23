use std::sync::Arc;

use crate::error::EditError;
use crate::flatten::{array_move, build, collapsed_ids, flatten, remove_children_of};
use crate::model::{LabelTree, NodeId, NodeKind, NodeStatus, TreeNode, clone_payload};
use crate::projection::get_projection;

/// Structural edits. Every operation returns a new tree and leaves `self`
/// untouched; subtrees off the edited path stay shared with the input.
impl LabelTree {
    /// Inserts a draft root at `position` (prepends when `None`).
    pub fn insert_root(&self, position: Option<usize>) -> Result<Self, EditError> {
        if self.has_draft() {
            return Err(EditError::DraftPending);
        }
        log::debug!("inserting draft root at {position:?}");
        Ok(self.with_root_inserted(position.unwrap_or(0), TreeNode::draft()))
    }

    /// Prepends a draft into `parent_id`'s children and expands the parent.
    ///
    /// A missing parent is a no-op.
    pub fn insert_child(&self, parent_id: NodeId) -> Result<Self, EditError> {
        if self.has_draft() {
            return Err(EditError::DraftPending);
        }
        let updated = self.update_node(parent_id, |parent| {
            let mut children = Vec::with_capacity(parent.children.len() + 1);
            children.push(Arc::new(TreeNode::draft()));
            children.extend(parent.children.iter().cloned());
            TreeNode {
                collapsed: false,
                children,
                ..clone_payload(parent)
            }
        });
        Ok(updated.map_or_else(
            || {
                log::debug!("insert_child: parent {parent_id} not found");
                self.clone()
            },
            |tree| {
                log::debug!("inserting draft under {parent_id}");
                tree
            },
        ))
    }

    /// Confirms a node's name and returns the new tree with the node's id.
    ///
    /// A draft receives a fresh id and becomes persisted. Otherwise the kind
    /// becomes [`NodeKind::Modified`] when `is_existing_edit` is set.
    pub fn commit_name(
        &self,
        id: NodeId,
        name: &str,
        is_existing_edit: bool,
    ) -> Result<(Self, NodeId), EditError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EditError::EmptyName);
        }
        let node = self.find(id).ok_or(EditError::NotFound(id))?;
        let minted = node.is_draft();
        let new_id = if minted { self.mint_id() } else { id };

        let tree = self
            .update_node(id, |node| {
                let kind = if minted {
                    NodeKind::Created
                } else if is_existing_edit {
                    NodeKind::Modified
                } else {
                    node.kind
                };
                TreeNode {
                    id: new_id,
                    name: name.to_owned(),
                    kind,
                    status: NodeStatus::Persisted,
                    ..node.clone()
                }
            })
            .ok_or(EditError::NotFound(id))?;
        log::debug!("committed name {name:?} for {new_id}");
        Ok((tree, new_id))
    }

    /// Removes `id` and its whole subtree. A missing id is a no-op.
    pub fn remove(&self, id: NodeId) -> Self {
        match self.remove_node(id) {
            Some(tree) => {
                if id.is_draft() {
                    log::debug!("discarded draft node");
                } else {
                    log::debug!("removed node {id}");
                }
                tree
            }
            None => self.clone(),
        }
    }

    /// Drops the draft node, if any.
    pub fn discard_draft(&self) -> Self {
        self.remove(NodeId::DRAFT)
    }

    /// Commits a drag of `active_id` released over `over_id`.
    ///
    /// Collapsed subtrees and the dragged subtree are hidden while projecting,
    /// exactly as the host displays them. Fails with
    /// [`EditError::DegenerateDrag`] if the node would end up where it was.
    pub fn reorder(
        &self,
        active_id: NodeId,
        over_id: NodeId,
        offset: f32,
        indentation_width: f32,
    ) -> Result<Self, EditError> {
        let mut items = flatten(self);
        let mut hidden = collapsed_ids(&items);
        hidden.insert(active_id);
        let visible = remove_children_of(&items, &hidden);

        let projection = get_projection(&visible, active_id, over_id, offset, indentation_width)
            .ok_or_else(|| {
                if visible.iter().any(|item| item.id == active_id) {
                    EditError::NotFound(over_id)
                } else {
                    EditError::NotFound(active_id)
                }
            })?;

        let active_index = items
            .iter()
            .position(|item| item.id == active_id)
            .ok_or(EditError::NotFound(active_id))?;
        let over_index = items
            .iter()
            .position(|item| item.id == over_id)
            .ok_or(EditError::NotFound(over_id))?;

        let active = &mut items[active_index];
        active.depth = projection.depth;
        active.parent_id = projection.parent_id;
        array_move(&mut items, active_index, over_index);

        let tree = build(&items);
        if tree.same_structure(self) {
            return Err(EditError::DegenerateDrag);
        }
        log::debug!(
            "moved {active_id} under {:?} at depth {}",
            projection.parent_id,
            projection.depth
        );
        Ok(tree)
    }

    /// Returns `true` if both trees hold the same ids with the same parents
    /// and sibling order.
    pub fn same_structure(&self, other: &Self) -> bool {
        let ours = flatten(self);
        let theirs = flatten(other);
        ours.len() == theirs.len()
            && ours
                .iter()
                .zip(&theirs)
                .all(|(a, b)| a.id == b.id && a.parent_id == b.parent_id)
    }

    /// Flips the collapsed flag of `id`. No-op on leaves and missing ids.
    pub fn toggle_collapsed(&self, id: NodeId) -> Self {
        match self.find(id) {
            Some(node) if !node.children.is_empty() => self.set_collapsed(id, !node.collapsed),
            _ => self.clone(),
        }
    }

    /// Sets the collapsed flag of `id`, sharing the tree if nothing changes.
    pub fn set_collapsed(&self, id: NodeId, collapsed: bool) -> Self {
        if self.find(id).is_none_or(|node| node.collapsed == collapsed) {
            return self.clone();
        }
        self.update_node(id, |node| TreeNode {
            collapsed,
            ..node.clone()
        })
        .unwrap_or_else(|| self.clone())
    }

    /// Expands every node.
    pub fn expand_all(&self) -> Self {
        self.with_all_collapsed(false)
    }

    /// Collapses every node that has children.
    pub fn collapse_all(&self) -> Self {
        self.with_all_collapsed(true)
    }

    fn with_all_collapsed(&self, collapsed: bool) -> Self {
        set_all_collapsed(self.roots(), collapsed)
            .map_or_else(|| self.clone(), Self::from_shared)
    }

    /// Returns `true` if a sibling of `id` other than itself is named `name`.
    pub fn has_sibling_named(&self, id: NodeId, name: &str) -> bool {
        let name = name.trim();
        let siblings = match self.parent_of(id).and_then(|parent| self.find(parent)) {
            Some(parent) => parent.children(),
            None => self.roots(),
        };
        siblings
            .iter()
            .any(|sibling| sibling.id != id && sibling.name == name)
    }
}

fn set_all_collapsed(nodes: &[Arc<TreeNode>], collapsed: bool) -> Option<Vec<Arc<TreeNode>>> {
    let mut out: Option<Vec<Arc<TreeNode>>> = None;
    for (idx, node) in nodes.iter().enumerate() {
        let target = collapsed && !node.children.is_empty();
        let children = set_all_collapsed(&node.children, collapsed);
        if children.is_none() && node.collapsed == target {
            continue;
        }
        let replacement = Arc::new(TreeNode {
            collapsed: target,
            children: children.unwrap_or_else(|| node.children.clone()),
            ..clone_payload(node)
        });
        out.get_or_insert_with(|| nodes.to_vec())[idx] = replacement;
    }
    out
}
