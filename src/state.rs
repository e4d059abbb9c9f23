use std::time::Instant;

use ratatui::widgets::TableState;
use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};

use crate::action::{StructureChange, TreeAction, TreeEvent};
use crate::config::EditorConfig;
use crate::diff::{ChangeSet, diff};
use crate::drag::DragController;
use crate::error::EditError;
use crate::flatten::{FlattenedItem, collapsed_ids, flatten, remove_children_of};
use crate::model::{LabelTree, NodeId, NodeKind};
use crate::projection::Projection;
use crate::search::{SearchResult, search};
use crate::style::TreeScrollPolicy;

#[cfg(feature = "keymap")]
use crate::keymap::TreeKeyBindings;
#[cfg(feature = "keymap")]
use crossterm::event::{KeyCode, KeyEvent};

/// The node currently being renamed and its pending text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditSession {
    pub id: NodeId,
    pub buffer: String,
    /// `true` when renaming a node that was loaded from the host.
    pub existing: bool,
}

#[derive(Clone, Debug)]
struct ActiveSearch {
    keyword: String,
    result: SearchResult,
}

/// Editor state: the tree, selection, edit session, drag gesture, search, and
/// the cached visible rows.
///
/// The visible list is recomputed from `(tree, collapsed flags, dragged id)`
/// whenever one of them changes.
pub struct TreeEditorState {
    tree: LabelTree,
    config: EditorConfig,
    list_state: TableState,
    // Cached visible rows to avoid re-flattening every render.
    visible: Vec<FlattenedItem>,
    visible_index: FxHashMap<NodeId, usize>,
    dirty: bool,
    search: Option<ActiveSearch>,
    // Only one node may be in editing mode at a time.
    editing: Option<EditSession>,
    drag: DragController,
    #[cfg(feature = "keymap")]
    keymap: TreeKeyBindings,
}

impl Default for TreeEditorState {
    fn default() -> Self {
        Self::new(LabelTree::new())
    }
}

impl TreeEditorState {
    /// Creates an editor over `tree` with the default configuration.
    pub fn new(tree: LabelTree) -> Self {
        Self::with_config(tree, EditorConfig::default())
    }

    /// Creates an editor over `tree` with an explicit configuration.
    pub fn with_config(tree: LabelTree, config: EditorConfig) -> Self {
        let capacity = tree.node_count();
        Self {
            tree,
            config,
            list_state: TableState::default(),
            visible: Vec::with_capacity(capacity),
            visible_index: FxHashMap::with_capacity_and_hasher(capacity, FxBuildHasher),
            dirty: true,
            search: None,
            editing: None,
            drag: DragController::new(config.hover_expand_delay),
            #[cfg(feature = "keymap")]
            keymap: TreeKeyBindings::new(),
        }
    }

    #[cfg(feature = "keymap")]
    /// Returns a mutable reference to the key binding set.
    pub const fn keymap_mut(&mut self) -> &mut TreeKeyBindings {
        &mut self.keymap
    }

    /// The authoritative tree (never the search view).
    #[inline]
    pub const fn tree(&self) -> &LabelTree {
        &self.tree
    }

    /// Replaces the tree, dropping any gesture, edit session, and search.
    pub fn set_tree(&mut self, tree: LabelTree) {
        self.drag.cancel();
        self.editing = None;
        self.search = None;
        self.tree = tree;
        self.dirty = true;
    }

    pub fn into_tree(self) -> LabelTree {
        self.tree
    }

    #[inline]
    pub const fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub(crate) const fn list_state(&self) -> &TableState {
        &self.list_state
    }

    pub(crate) const fn list_state_mut(&mut self) -> &mut TableState {
        &mut self.list_state
    }

    /// Total nodes in the tree, for host-side guards.
    pub fn node_count(&self) -> usize {
        self.tree.node_count()
    }

    /// Marks the visible-row cache as dirty.
    pub const fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// Ensures the visible rows are up to date and returns them.
    pub fn visible_items(&mut self) -> &[FlattenedItem] {
        self.ensure_visible_items();
        &self.visible
    }

    /// Returns the cached rows without refreshing them.
    pub(crate) fn cached_items(&self) -> &[FlattenedItem] {
        &self.visible
    }

    /// Rebuilds the visible rows if marked dirty.
    pub fn ensure_visible_items(&mut self) {
        if !self.dirty {
            return;
        }
        let items = flatten(self.view_tree());
        let mut hidden = collapsed_ids(&items);
        // A node being dragged never shows its own subtree.
        if let Some(active) = self.drag.active_id() {
            hidden.insert(active);
        }
        self.visible = remove_children_of(&items, &hidden);
        self.visible_index.clear();
        self.visible_index.extend(
            self.visible
                .iter()
                .enumerate()
                .map(|(idx, item)| (item.id, idx)),
        );
        self.dirty = false;
        self.clamp_selection();
        self.drag
            .reproject(&self.visible, self.config.indentation_width);
    }

    /// Tree the visible rows are derived from: the search view while searching.
    fn view_tree(&self) -> &LabelTree {
        self.search
            .as_ref()
            .map_or(&self.tree, |search| &search.result.tree)
    }

    fn visible_index_of(&self, id: NodeId) -> Option<usize> {
        self.visible_index.get(&id).copied()
    }

    // --- selection -------------------------------------------------------

    /// Returns the id of the currently selected node, if any.
    pub fn selected_id(&self) -> Option<NodeId> {
        self.list_state
            .selected()
            .and_then(|idx| self.visible.get(idx).map(|item| item.id))
    }

    /// Moves selection to the previous visible row.
    pub fn select_prev(&mut self) {
        self.ensure_visible_items();
        if self.visible.is_empty() {
            self.list_state.select(None);
            return;
        }
        let selected = self.list_state.selected().unwrap_or(0);
        self.list_state.select(Some(selected.saturating_sub(1)));
    }

    /// Moves selection to the next visible row.
    pub fn select_next(&mut self) {
        self.ensure_visible_items();
        if self.visible.is_empty() {
            self.list_state.select(None);
            return;
        }
        let selected = self.list_state.selected().unwrap_or(0);
        let new_selected = (selected + 1).min(self.visible.len().saturating_sub(1));
        self.list_state.select(Some(new_selected));
    }

    /// Selects the first visible row.
    pub fn select_first(&mut self) {
        self.ensure_visible_items();
        self.list_state
            .select((!self.visible.is_empty()).then_some(0));
    }

    /// Selects the last visible row.
    pub fn select_last(&mut self) {
        self.ensure_visible_items();
        self.list_state.select(self.visible.len().checked_sub(1));
    }

    /// Moves selection to the parent of the selected node.
    pub fn select_parent(&mut self) {
        self.ensure_visible_items();
        let Some(parent_id) = self
            .list_state
            .selected()
            .and_then(|idx| self.visible.get(idx))
            .and_then(|item| item.parent_id)
        else {
            return;
        };
        if let Some(parent_idx) = self.visible_index_of(parent_id) {
            self.list_state.select(Some(parent_idx));
        }
    }

    /// Expands the ancestors of `id` and selects it if present.
    pub fn select_by_id(&mut self, id: NodeId) -> bool {
        self.expand_to(id);
        self.ensure_visible_items();
        if let Some(idx) = self.visible_index_of(id) {
            self.list_state.select(Some(idx));
            true
        } else {
            false
        }
    }

    /// Expands every ancestor of `id` so it becomes visible.
    pub fn expand_to(&mut self, id: NodeId) -> bool {
        let Some(path) = self.view_tree().path_to(id) else {
            return false;
        };
        let ancestors = &path[..path.len() - 1];
        self.update_view_tree(|tree| {
            ancestors
                .iter()
                .fold(tree.clone(), |tree, &ancestor| tree.set_collapsed(ancestor, false))
        });
        true
    }

    fn update_view_tree(&mut self, f: impl FnOnce(&LabelTree) -> LabelTree) {
        match self.search.as_mut() {
            Some(search) => search.result.tree = f(&search.result.tree),
            None => self.tree = f(&self.tree),
        }
        self.dirty = true;
    }

    /// Adjusts the scroll offset according to the provided scroll policy.
    pub fn ensure_selection_visible(&mut self, viewport_height: usize, policy: TreeScrollPolicy) {
        self.clamp_selection();
        let Some(selected) = self.list_state.selected() else {
            return;
        };
        let viewport_height = viewport_height.max(1);
        let offset = match policy {
            TreeScrollPolicy::KeepInView => {
                let offset = self.list_state.offset();
                if selected < offset {
                    selected
                } else if selected >= offset + viewport_height {
                    selected + 1 - viewport_height
                } else {
                    offset
                }
            }
            TreeScrollPolicy::CenterOnSelect => {
                let max_offset = self.visible.len().saturating_sub(viewport_height);
                selected.saturating_sub(viewport_height / 2).min(max_offset)
            }
        };
        *self.list_state.offset_mut() = offset;
    }

    fn clamp_selection(&mut self) {
        if self.visible.is_empty() {
            self.list_state.select(None);
            return;
        }
        if let Some(selected) = self.list_state.selected()
            && selected >= self.visible.len()
        {
            self.list_state.select(Some(self.visible.len() - 1));
        }
    }

    // --- collapse --------------------------------------------------------

    /// Flips the collapsed flag of `id` in the displayed tree.
    pub fn toggle(&mut self, id: NodeId) -> bool {
        let expandable = self
            .view_tree()
            .find(id)
            .is_some_and(|node| !node.children().is_empty());
        if expandable {
            self.update_view_tree(|tree| tree.toggle_collapsed(id));
        }
        expandable
    }

    pub fn expand_all(&mut self) {
        self.update_view_tree(LabelTree::expand_all);
    }

    pub fn collapse_all(&mut self) {
        self.update_view_tree(LabelTree::collapse_all);
    }

    // --- search ----------------------------------------------------------

    /// Filters the view by `keyword`; an empty keyword clears the search.
    ///
    /// Returns whether anything matched.
    pub fn set_search(&mut self, keyword: &str) -> bool {
        if keyword.is_empty() {
            self.clear_search();
            return false;
        }
        self.drag.cancel();
        let result = search(&self.tree, keyword);
        let matched = result.matched;
        self.search = Some(ActiveSearch {
            keyword: keyword.to_owned(),
            result,
        });
        self.dirty = true;
        matched
    }

    /// Re-runs the active keyword against the current tree.
    fn refresh_search(&mut self) {
        if let Some(active) = self.search.as_mut() {
            active.result = search(&self.tree, &active.keyword);
            self.dirty = true;
        }
    }

    /// Drops the search view and falls back to the tree's own flags.
    pub fn clear_search(&mut self) {
        if self.search.take().is_some() {
            self.dirty = true;
        }
    }

    pub fn search_keyword(&self) -> Option<&str> {
        self.search.as_ref().map(|search| search.keyword.as_str())
    }

    pub fn search_result(&self) -> Option<&SearchResult> {
        self.search.as_ref().map(|search| &search.result)
    }

    /// Returns `true` if `id` matched the active search.
    pub fn is_search_match(&self, id: NodeId) -> bool {
        self.search
            .as_ref()
            .is_some_and(|search| search.result.is_match(id))
    }

    // --- editing ---------------------------------------------------------

    pub const fn editing(&self) -> Option<&EditSession> {
        self.editing.as_ref()
    }

    pub fn editing_id(&self) -> Option<NodeId> {
        self.editing.as_ref().map(|session| session.id)
    }

    /// Inserts a draft root and starts editing it.
    pub fn add_root(&mut self, position: Option<usize>) -> TreeEvent {
        if let Err(err) = self.check_insert() {
            return self.reject(err);
        }
        match self.tree.insert_root(position) {
            Ok(tree) => self.begin_draft(tree),
            Err(err) => self.reject(err),
        }
    }

    /// Inserts a draft under `parent_id` and starts editing it.
    pub fn add_child(&mut self, parent_id: NodeId) -> TreeEvent {
        if !self.tree.contains(parent_id) {
            return TreeEvent::Unhandled;
        }
        if let Err(err) = self.check_insert() {
            return self.reject(err);
        }
        match self.tree.insert_child(parent_id) {
            Ok(tree) => self.begin_draft(tree),
            Err(err) => self.reject(err),
        }
    }

    fn check_insert(&self) -> Result<(), EditError> {
        if self.editing.is_some() {
            return Err(EditError::EditInProgress);
        }
        if let Some(limit) = self.config.max_nodes
            && self.node_count() >= limit
        {
            return Err(EditError::TooManyNodes { limit });
        }
        Ok(())
    }

    fn begin_draft(&mut self, tree: LabelTree) -> TreeEvent {
        self.drag.cancel();
        self.search = None;
        self.tree = tree;
        self.editing = Some(EditSession {
            id: NodeId::DRAFT,
            buffer: String::new(),
            existing: false,
        });
        self.dirty = true;
        self.select_by_id(NodeId::DRAFT);
        TreeEvent::StructureChanged(StructureChange::Inserted)
    }

    /// Starts renaming `id`.
    pub fn start_edit(&mut self, id: NodeId) -> TreeEvent {
        if let Some(session) = &self.editing {
            if session.id == id {
                return TreeEvent::Handled;
            }
            return self.reject(EditError::EditInProgress);
        }
        let Some(node) = self.tree.find(id) else {
            return TreeEvent::Unhandled;
        };
        self.editing = Some(EditSession {
            id,
            buffer: node.name().to_owned(),
            existing: !node.is_draft() && node.kind() != NodeKind::Created,
        });
        TreeEvent::Handled
    }

    /// Replaces the pending text of the edit session.
    pub fn set_edit_text(&mut self, text: &str) -> bool {
        let Some(session) = self.editing.as_mut() else {
            return false;
        };
        text.clone_into(&mut session.buffer);
        true
    }

    pub fn push_edit_char(&mut self, ch: char) -> bool {
        let Some(session) = self.editing.as_mut() else {
            return false;
        };
        session.buffer.push(ch);
        true
    }

    pub fn pop_edit_char(&mut self) -> bool {
        self.editing
            .as_mut()
            .is_some_and(|session| session.buffer.pop().is_some())
    }

    /// Commits the edit session. On failure the node stays in editing mode.
    pub fn commit_edit(&mut self) -> TreeEvent {
        let Some(session) = self.editing.as_ref() else {
            return TreeEvent::Unhandled;
        };
        if self.config.unique_sibling_names && self.tree.has_sibling_named(session.id, &session.buffer)
        {
            let name = session.buffer.trim().to_owned();
            return self.reject(EditError::DuplicateName(name));
        }
        match self
            .tree
            .commit_name(session.id, &session.buffer, session.existing)
        {
            Ok((tree, id)) => {
                self.tree = tree;
                self.editing = None;
                self.dirty = true;
                self.refresh_search();
                self.select_by_id(id);
                TreeEvent::StructureChanged(StructureChange::Renamed(id))
            }
            Err(err) => self.reject(err),
        }
    }

    /// Leaves editing mode; a draft is discarded.
    pub fn cancel_edit(&mut self) -> TreeEvent {
        let Some(session) = self.editing.take() else {
            return TreeEvent::Unhandled;
        };
        if session.id.is_draft() {
            self.tree = self.tree.discard_draft();
            self.dirty = true;
        }
        TreeEvent::Handled
    }

    /// Removes `id` and its subtree.
    pub fn remove(&mut self, id: NodeId) -> TreeEvent {
        if !self.tree.contains(id) {
            return TreeEvent::Unhandled;
        }
        if id.is_draft() {
            return self.cancel_edit();
        }
        if self
            .editing
            .as_ref()
            .is_some_and(|session| self.tree.path_to(session.id).is_none_or(|p| p.contains(&id)))
        {
            self.editing = None;
        }
        self.drag.cancel();
        self.search = None;
        self.tree = self.tree.remove(id);
        self.dirty = true;
        TreeEvent::StructureChanged(StructureChange::Removed(id))
    }

    // --- drag ------------------------------------------------------------

    pub const fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    /// Id of the node being dragged.
    pub fn drag_active_id(&self) -> Option<NodeId> {
        self.drag.active_id()
    }

    /// Current drop projection of the drag in progress.
    pub fn projection(&self) -> Option<Projection> {
        self.drag.projection()
    }

    /// Begins dragging `active_id`. Ignored while searching or editing.
    pub fn drag_start(&mut self, active_id: NodeId) -> TreeEvent {
        self.ensure_visible_items();
        if self.search.is_some()
            || self.editing.is_some()
            || self.visible_index_of(active_id).is_none()
        {
            return TreeEvent::Unhandled;
        }
        self.drag.start(active_id);
        self.dirty = true;
        self.ensure_visible_items();
        log::trace!("drag started on {active_id}");
        TreeEvent::Handled
    }

    /// Updates the cumulative horizontal pointer offset.
    pub fn drag_move(&mut self, delta_x: f32) -> TreeEvent {
        if !self.drag.set_offset(delta_x) {
            return TreeEvent::Unhandled;
        }
        self.ensure_visible_items();
        self.drag
            .reproject(&self.visible, self.config.indentation_width);
        TreeEvent::Handled
    }

    /// Updates the item under the pointer; `None` when over empty space.
    pub fn drag_over(&mut self, over_id: Option<NodeId>, now: Instant) -> TreeEvent {
        self.ensure_visible_items();
        let expandable = over_id
            .and_then(|id| self.tree.find(id))
            .is_some_and(|node| node.hides_children());
        if !self.drag.set_over(over_id, expandable, now) {
            return TreeEvent::Unhandled;
        }
        self.drag
            .reproject(&self.visible, self.config.indentation_width);
        TreeEvent::Handled
    }

    /// Drops the dragged node at its current projection.
    pub fn drag_end(&mut self) -> TreeEvent {
        let Some(gesture) = self.drag.finish() else {
            return TreeEvent::Unhandled;
        };
        self.dirty = true;
        let Some(over_id) = gesture.over_id else {
            return TreeEvent::Handled;
        };
        match self.tree.reorder(
            gesture.active_id,
            over_id,
            gesture.offset,
            self.config.indentation_width,
        ) {
            Ok(tree) => {
                self.tree = tree;
                self.select_by_id(gesture.active_id);
                TreeEvent::StructureChanged(StructureChange::Moved(gesture.active_id))
            }
            Err(err) => self.reject(err),
        }
    }

    /// Abandons the drag; the tree is left unchanged.
    pub fn drag_cancel(&mut self) -> TreeEvent {
        if !self.drag.is_dragging() {
            return TreeEvent::Unhandled;
        }
        self.drag.cancel();
        self.dirty = true;
        TreeEvent::Handled
    }

    /// Advances timers; expands a hovered collapsed node once its delay passed.
    pub fn tick(&mut self, now: Instant) -> TreeEvent {
        let Some(id) = self.drag.take_due_expand(now) else {
            return TreeEvent::Unhandled;
        };
        log::trace!("hover expanding {id}");
        self.tree = self.tree.set_collapsed(id, false);
        self.dirty = true;
        self.ensure_visible_items();
        TreeEvent::Handled
    }

    // --- keyboard reordering --------------------------------------------

    /// Moves `id` past the previous (`up`) or next visible row.
    fn move_vertical(&mut self, id: NodeId, up: bool) -> TreeEvent {
        self.ensure_visible_items();
        let hidden: FxHashSet<NodeId> = std::iter::once(id).collect();
        let rows = remove_children_of(&self.visible, &hidden);
        let Some(idx) = rows.iter().position(|item| item.id == id) else {
            return TreeEvent::Unhandled;
        };
        let target = if up {
            idx.checked_sub(1).and_then(|idx| rows.get(idx))
        } else {
            rows.get(idx + 1)
        };
        let Some(target) = target else {
            return self.reject(EditError::DegenerateDrag);
        };
        let depth_offset = depth_delta(rows[idx].depth, target.depth);
        let offset = depth_offset * self.config.indentation_width;
        self.commit_reorder(id, target.id, offset)
    }

    /// Moves `id` one level deeper (`levels > 0`) or shallower in place.
    fn shift_depth(&mut self, id: NodeId, levels: f32) -> TreeEvent {
        let offset = levels * self.config.indentation_width;
        self.commit_reorder(id, id, offset)
    }

    fn commit_reorder(&mut self, id: NodeId, over_id: NodeId, offset: f32) -> TreeEvent {
        if self.search.is_some() || self.editing.is_some() {
            return TreeEvent::Unhandled;
        }
        match self
            .tree
            .reorder(id, over_id, offset, self.config.indentation_width)
        {
            Ok(tree) => {
                self.tree = tree;
                self.dirty = true;
                self.select_by_id(id);
                TreeEvent::StructureChanged(StructureChange::Moved(id))
            }
            Err(err) => self.reject(err),
        }
    }

    fn reject(&self, err: EditError) -> TreeEvent {
        log::debug!("edit rejected: {err}");
        TreeEvent::ValidationFailed(err)
    }

    // --- actions ---------------------------------------------------------

    /// Compares `previous` with the current tree for the host's save call.
    pub fn diff_against(&self, previous: &LabelTree) -> ChangeSet {
        diff(previous, &self.tree)
    }

    /// Handles a tree action and returns the resulting event.
    pub fn handle_action<C>(&mut self, action: TreeAction<C>) -> TreeEvent<C> {
        self.ensure_visible_items();
        let selected = self.selected_id();
        let event = match (action, selected) {
            (TreeAction::Custom(custom), _) => return TreeEvent::Action(TreeAction::Custom(custom)),
            (TreeAction::SelectPrev, _) => {
                self.select_prev();
                TreeEvent::Handled
            }
            (TreeAction::SelectNext, _) => {
                self.select_next();
                TreeEvent::Handled
            }
            (TreeAction::SelectParent, _) => {
                self.select_parent();
                TreeEvent::Handled
            }
            (TreeAction::SelectFirst, _) => {
                self.select_first();
                TreeEvent::Handled
            }
            (TreeAction::SelectLast, _) => {
                self.select_last();
                TreeEvent::Handled
            }
            (TreeAction::ExpandAll, _) => {
                self.expand_all();
                TreeEvent::Handled
            }
            (TreeAction::CollapseAll, _) => {
                self.collapse_all();
                TreeEvent::Handled
            }
            (TreeAction::AddRoot, _) => self.add_root(None),
            (TreeAction::ToggleNode, Some(id)) => {
                if self.toggle(id) {
                    TreeEvent::Handled
                } else {
                    TreeEvent::Unhandled
                }
            }
            (TreeAction::AddChild, Some(id)) => self.add_child(id),
            (TreeAction::EditNode, Some(id)) => self.start_edit(id),
            (TreeAction::DeleteNode, Some(id)) => self.remove(id),
            (TreeAction::MoveUp, Some(id)) => self.move_vertical(id, true),
            (TreeAction::MoveDown, Some(id)) => self.move_vertical(id, false),
            (TreeAction::Indent, Some(id)) => self.shift_depth(id, 1.0),
            (TreeAction::Outdent, Some(id)) => self.shift_depth(id, -1.0),
            (
                TreeAction::ToggleNode
                | TreeAction::AddChild
                | TreeAction::EditNode
                | TreeAction::DeleteNode
                | TreeAction::MoveUp
                | TreeAction::MoveDown
                | TreeAction::Indent
                | TreeAction::Outdent,
                None,
            ) => TreeEvent::Unhandled,
        };
        event.cast()
    }

    #[cfg(feature = "keymap")]
    /// Resolves a key event into an action (or edit input) and handles it.
    pub fn handle_key(&mut self, key: KeyEvent) -> TreeEvent<()> {
        if self.editing.is_some() {
            return self.handle_edit_key(key);
        }
        let Some(action) = self.keymap.resolve(key) else {
            return TreeEvent::Unhandled;
        };
        self.handle_action(action)
    }

    #[cfg(feature = "keymap")]
    /// Resolves a key event with a custom mapping and handles it.
    pub fn handle_key_with<C, F>(&mut self, key: KeyEvent, custom: F) -> TreeEvent<C>
    where
        F: Fn(KeyEvent) -> Option<C>,
    {
        if self.editing.is_some() {
            return self.handle_edit_key(key).cast();
        }
        let Some(action) = self.keymap.resolve_with(key, custom) else {
            return TreeEvent::Unhandled;
        };
        self.handle_action(action)
    }

    #[cfg(feature = "keymap")]
    fn handle_edit_key(&mut self, key: KeyEvent) -> TreeEvent {
        match key.code {
            KeyCode::Enter => self.commit_edit(),
            KeyCode::Esc => self.cancel_edit(),
            KeyCode::Backspace => {
                self.pop_edit_char();
                TreeEvent::Handled
            }
            KeyCode::Char(ch) => {
                self.push_edit_char(ch);
                TreeEvent::Handled
            }
            _ => TreeEvent::Unhandled,
        }
    }
}

#[allow(clippy::cast_precision_loss, reason = "tree depths are small")]
fn depth_delta(from: usize, to: usize) -> f32 {
    to as f32 - from as f32
}

impl TreeEvent<()> {
    /// Re-types an event that carries no custom action.
    fn cast<C>(self) -> TreeEvent<C> {
        match self {
            Self::Handled | Self::Action(_) => TreeEvent::Handled,
            Self::Unhandled => TreeEvent::Unhandled,
            Self::StructureChanged(change) => TreeEvent::StructureChanged(change),
            Self::ValidationFailed(err) => TreeEvent::ValidationFailed(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::model::TreeNode;

    fn sample() -> LabelTree {
        LabelTree::from_roots([
            TreeNode::new(1, "A").with_children([TreeNode::new(2, "B")]),
            TreeNode::new(3, "C"),
        ])
        .unwrap()
    }

    fn visible_ids(state: &mut TreeEditorState) -> Vec<u64> {
        state.visible_items().iter().map(|item| item.id.0).collect()
    }

    #[test]
    fn visible_rows_follow_collapsed_flags() {
        let mut state = TreeEditorState::new(sample());
        assert_eq!(visible_ids(&mut state), vec![1, 2, 3]);
        assert!(state.toggle(NodeId(1)));
        assert_eq!(visible_ids(&mut state), vec![1, 3]);
        assert!(!state.toggle(NodeId(3)));
    }

    #[test]
    fn drag_gesture_commits_projection() {
        let mut state = TreeEditorState::new(sample());
        let now = Instant::now();
        assert_eq!(state.drag_start(NodeId(3)), TreeEvent::Handled);
        state.drag_over(Some(NodeId(2)), now);
        state.drag_move(24.0);
        let projection = state.projection().unwrap();
        assert_eq!(projection.depth, 1);
        assert_eq!(projection.parent_id, Some(NodeId(1)));

        let event = state.drag_end();
        assert_eq!(
            event,
            TreeEvent::StructureChanged(StructureChange::Moved(NodeId(3)))
        );
        assert_eq!(state.tree().parent_of(NodeId(3)), Some(NodeId(1)));
        assert!(!state.is_dragging());
        assert_eq!(state.selected_id(), Some(NodeId(3)));
    }

    #[test]
    fn dragged_subtree_is_hidden_during_gesture() {
        let mut state = TreeEditorState::new(sample());
        state.drag_start(NodeId(1));
        assert_eq!(visible_ids(&mut state), vec![1, 3]);
        state.drag_cancel();
        assert_eq!(visible_ids(&mut state), vec![1, 2, 3]);
    }

    #[test]
    fn drop_in_place_reports_validation_failure() {
        let tree = sample();
        let mut state = TreeEditorState::new(tree.clone());
        state.drag_start(NodeId(3));
        assert_eq!(
            state.drag_end(),
            TreeEvent::ValidationFailed(EditError::DegenerateDrag)
        );
        assert_eq!(state.tree(), &tree);
    }

    #[test]
    fn cancel_leaves_tree_untouched() {
        let tree = sample();
        let mut state = TreeEditorState::new(tree.clone());
        state.drag_start(NodeId(3));
        state.drag_over(Some(NodeId(2)), Instant::now());
        state.drag_move(24.0);
        assert_eq!(state.drag_cancel(), TreeEvent::Handled);
        assert!(state.tree().ptr_eq(&tree));
        assert!(state.projection().is_none());
        assert_eq!(state.drag_end(), TreeEvent::Unhandled);
    }

    #[test]
    fn hover_expands_collapsed_node_after_delay() {
        let tree = sample().set_collapsed(NodeId(1), true);
        let mut state = TreeEditorState::new(tree);
        let now = Instant::now();
        state.drag_start(NodeId(3));
        state.drag_over(Some(NodeId(1)), now);
        assert_eq!(state.tick(now + Duration::from_millis(100)), TreeEvent::Unhandled);
        assert_eq!(state.tick(now + Duration::from_millis(600)), TreeEvent::Handled);
        assert!(!state.tree().find(NodeId(1)).unwrap().collapsed());
        assert_eq!(visible_ids(&mut state), vec![1, 2, 3]);
    }

    #[test]
    fn edit_lifecycle_for_new_root() {
        let mut state = TreeEditorState::new(sample());
        assert_eq!(
            state.add_root(None),
            TreeEvent::StructureChanged(StructureChange::Inserted)
        );
        assert_eq!(state.editing_id(), Some(NodeId::DRAFT));
        assert_eq!(state.selected_id(), Some(NodeId::DRAFT));

        // Empty names keep the draft in editing mode.
        assert_eq!(
            state.commit_edit(),
            TreeEvent::ValidationFailed(EditError::EmptyName)
        );
        assert_eq!(state.editing_id(), Some(NodeId::DRAFT));
        assert!(state.tree().has_draft());

        // A second insert is refused while the draft is open.
        assert_eq!(
            state.add_root(None),
            TreeEvent::ValidationFailed(EditError::EditInProgress)
        );

        state.set_edit_text("Fresh");
        let TreeEvent::StructureChanged(StructureChange::Renamed(id)) = state.commit_edit() else {
            panic!("commit should rename");
        };
        assert!(state.editing().is_none());
        assert_eq!(state.tree().roots()[0].id(), id);
        assert_eq!(state.tree().roots()[0].name(), "Fresh");
    }

    #[test]
    fn cancelling_draft_discards_it() {
        let mut state = TreeEditorState::new(sample());
        state.add_child(NodeId(3));
        assert_eq!(state.cancel_edit(), TreeEvent::Handled);
        assert!(!state.tree().has_draft());
        assert_eq!(state.tree(), &sample());
    }

    #[test]
    fn cancelling_rename_keeps_node() {
        let mut state = TreeEditorState::new(sample());
        state.start_edit(NodeId(3));
        state.set_edit_text("other");
        state.cancel_edit();
        assert_eq!(state.tree().find(NodeId(3)).unwrap().name(), "C");
    }

    #[test]
    fn only_one_node_edits_at_a_time() {
        let mut state = TreeEditorState::new(sample());
        assert_eq!(state.start_edit(NodeId(1)), TreeEvent::Handled);
        assert_eq!(
            state.start_edit(NodeId(3)),
            TreeEvent::ValidationFailed(EditError::EditInProgress)
        );
        assert_eq!(state.drag_start(NodeId(3)), TreeEvent::Unhandled);
    }

    #[test]
    fn rename_existing_marks_modified() {
        let mut state = TreeEditorState::new(sample());
        state.start_edit(NodeId(2));
        state.set_edit_text("B2");
        state.commit_edit();
        let node = state.tree().find(NodeId(2)).unwrap();
        assert_eq!(node.name(), "B2");
        assert_eq!(node.kind(), NodeKind::Modified);
    }

    #[test]
    fn node_cap_is_enforced_before_insert() {
        let config = EditorConfig::default().max_nodes(3);
        let mut state = TreeEditorState::with_config(sample(), config);
        assert_eq!(
            state.add_root(None),
            TreeEvent::ValidationFailed(EditError::TooManyNodes { limit: 3 })
        );
        assert!(!state.tree().has_draft());
    }

    #[test]
    fn sibling_names_can_be_required_unique() {
        let config = EditorConfig::default().unique_sibling_names(true);
        let mut state = TreeEditorState::with_config(sample(), config);
        state.start_edit(NodeId(3));
        state.set_edit_text("A");
        assert_eq!(
            state.commit_edit(),
            TreeEvent::ValidationFailed(EditError::DuplicateName("A".to_string()))
        );
        assert_eq!(state.editing_id(), Some(NodeId(3)));
    }

    #[test]
    fn search_view_does_not_touch_tree() {
        let tree = sample().collapse_all();
        let mut state = TreeEditorState::new(tree.clone());
        assert!(state.set_search("B"));
        assert_eq!(visible_ids(&mut state), vec![1, 2, 3]);
        assert!(state.is_search_match(NodeId(2)));
        assert_eq!(state.drag_start(NodeId(3)), TreeEvent::Unhandled);
        state.set_search("");
        assert_eq!(state.search_keyword(), None);
        assert_eq!(visible_ids(&mut state), vec![1, 3]);
        assert_eq!(state.tree(), &tree);
    }

    #[test]
    fn rename_during_search_refreshes_view() {
        let tree = LabelTree::from_roots([TreeNode::new(1, "Fruit")
            .with_children([TreeNode::new(2, "Apple"), TreeNode::new(3, "Apricot")])])
        .unwrap();
        let mut state = TreeEditorState::new(tree);
        assert!(state.set_search("Ap"));
        state.start_edit(NodeId(2));
        state.set_edit_text("Banana");
        assert!(state.commit_edit().changed_structure());

        let names: Vec<_> = state
            .visible_items()
            .iter()
            .map(|item| item.node.name().to_owned())
            .collect();
        assert_eq!(names, vec!["Fruit", "Banana", "Apricot"]);
        assert!(!state.is_search_match(NodeId(2)));
        assert!(state.is_search_match(NodeId(3)));
        assert_eq!(state.search_keyword(), Some("Ap"));
        assert_eq!(state.selected_id(), Some(NodeId(2)));
    }

    #[test]
    fn drop_into_collapsed_node_reveals_and_selects() {
        let tree = sample().set_collapsed(NodeId(1), true);
        let mut state = TreeEditorState::new(tree);
        state.drag_start(NodeId(3));
        state.drag_move(24.0);
        assert_eq!(state.projection().unwrap().parent_id, Some(NodeId(1)));
        assert!(state.drag_end().changed_structure());

        assert_eq!(state.tree().parent_of(NodeId(3)), Some(NodeId(1)));
        assert!(!state.tree().find(NodeId(1)).unwrap().collapsed());
        assert_eq!(visible_ids(&mut state), vec![1, 2, 3]);
        assert_eq!(state.selected_id(), Some(NodeId(3)));
    }

    #[test]
    fn remove_drops_subtree_and_edit_session() {
        let mut state = TreeEditorState::new(sample());
        state.start_edit(NodeId(2));
        assert_eq!(
            state.remove(NodeId(1)),
            TreeEvent::StructureChanged(StructureChange::Removed(NodeId(1)))
        );
        assert!(state.editing().is_none());
        assert_eq!(visible_ids(&mut state), vec![3]);
        assert_eq!(state.remove(NodeId(1)), TreeEvent::Unhandled);
    }

    #[test]
    fn keyboard_moves_go_through_projection() {
        let mut state = TreeEditorState::new(sample());
        state.select_by_id(NodeId(3));
        let event = state.handle_action::<()>(TreeAction::Indent);
        assert!(event.changed_structure());
        assert_eq!(state.tree().parent_of(NodeId(3)), Some(NodeId(1)));

        let event = state.handle_action::<()>(TreeAction::Outdent);
        assert!(event.changed_structure());
        assert_eq!(state.tree().parent_of(NodeId(3)), None);

        state.select_by_id(NodeId(1));
        let event = state.handle_action::<()>(TreeAction::MoveDown);
        assert!(event.changed_structure());
        let roots: Vec<_> = state.tree().roots().iter().map(|n| n.id().0).collect();
        assert_eq!(roots, vec![3, 1]);

        state.select_first();
        assert_eq!(
            state.handle_action::<()>(TreeAction::MoveUp),
            TreeEvent::ValidationFailed(EditError::DegenerateDrag)
        );
    }

    #[test]
    fn custom_actions_are_forwarded() {
        let mut state = TreeEditorState::new(sample());
        assert_eq!(
            state.handle_action(TreeAction::Custom(7u8)),
            TreeEvent::Action(TreeAction::Custom(7u8))
        );
    }

    #[test]
    fn diff_reports_edits() {
        let before = sample();
        let mut state = TreeEditorState::new(before.clone());
        state.remove(NodeId(3));
        let set = state.diff_against(&before);
        assert!(set.has_changes());
    }
}
