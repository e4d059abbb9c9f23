use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::flatten::{FlattenedItem, flatten};
use crate::model::{LabelTree, NodeId, NodeKind};

/// Per-node change marker sent to the host's save call.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "lowercase")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Unchanged,
    Added,
    /// Renamed, moved to another parent, or reordered among its siblings.
    Modified,
    Removed,
}

/// One node of a [`ChangeSet`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeEntry {
    pub id: NodeId,
    pub name: String,
    pub parent_id: Option<NodeId>,
    /// Position among siblings (in the previous tree for removed nodes).
    pub index: usize,
    pub depth: usize,
    pub change: ChangeKind,
}

/// Node list with a change marker per node.
///
/// Current nodes come first in display order, removed nodes follow.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub entries: Vec<ChangeEntry>,
}

impl ChangeSet {
    /// Returns `true` if any entry is not [`ChangeKind::Unchanged`].
    pub fn has_changes(&self) -> bool {
        self.iter_changed().next().is_some()
    }

    /// Iterates over the entries that changed.
    pub fn iter_changed(&self) -> impl Iterator<Item = &ChangeEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.change != ChangeKind::Unchanged)
    }

    /// Looks up the entry for `id`.
    pub fn get(&self, id: NodeId) -> Option<&ChangeEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }
}

/// Compares the last persisted tree with the edited one.
///
/// Draft nodes are skipped: they have not been confirmed yet.
pub fn diff(previous: &LabelTree, current: &LabelTree) -> ChangeSet {
    let before = flatten(previous);
    let after = flatten(current);
    let before_by_id: FxHashMap<NodeId, &FlattenedItem> = before
        .iter()
        .filter(|item| !item.node.is_draft())
        .map(|item| (item.id, item))
        .collect();
    let mut seen = FxHashSet::with_capacity_and_hasher(after.len(), FxBuildHasher);

    let mut entries = Vec::with_capacity(after.len());
    for item in after.iter().filter(|item| !item.node.is_draft()) {
        seen.insert(item.id);
        let change = match before_by_id.get(&item.id) {
            None => ChangeKind::Added,
            Some(old) if is_modified(old, item) => ChangeKind::Modified,
            Some(_) => ChangeKind::Unchanged,
        };
        entries.push(entry(item, change));
    }

    entries.extend(
        before
            .iter()
            .filter(|item| !item.node.is_draft() && !seen.contains(&item.id))
            .map(|item| entry(item, ChangeKind::Removed)),
    );

    let set = ChangeSet { entries };
    log::debug!(
        "diff: {} entries, {} changed",
        set.entries.len(),
        set.iter_changed().count()
    );
    set
}

fn is_modified(old: &FlattenedItem, new: &FlattenedItem) -> bool {
    new.node.kind == NodeKind::Modified
        || old.node.name != new.node.name
        || old.parent_id != new.parent_id
        || old.index != new.index
}

fn entry(item: &FlattenedItem, change: ChangeKind) -> ChangeEntry {
    ChangeEntry {
        id: item.id,
        name: item.node.name.clone(),
        parent_id: item.parent_id,
        index: item.index,
        depth: item.depth,
        change,
    }
}
