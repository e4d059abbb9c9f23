//! Editable, drag-and-drop sortable label tree with a ratatui front end.
//!
//! The tree is an immutable value: every edit returns a new [`LabelTree`] that
//! shares untouched subtrees with the previous one. [`TreeEditorState`] drives
//! selection, editing, search, and drag gestures on top of it, and
//! [`TreeListView`] renders the result.
//!
//! Feature flags:
//! - `keymap`: crossterm-based key bindings and `TreeEditorState::handle_key*` helpers.
//! - `serde`: serde support for the tree, node kinds, config, and change sets.

mod action;
mod config;
mod context;
mod diff;
mod drag;
mod edit;
mod error;
mod flatten;
mod glyphs;
#[cfg(feature = "keymap")]
mod keymap;
mod model;
pub mod prelude;
mod projection;
mod search;
mod state;
mod style;
mod widget;

pub use action::{StructureChange, TreeAction, TreeEvent};
pub use config::EditorConfig;
pub use context::TreeRowContext;
pub use diff::{ChangeEntry, ChangeKind, ChangeSet, diff};
pub use drag::{DragController, DragGesture, HoverExpandTimer};
pub use error::EditError;
pub use flatten::{
    FlattenedItem, array_move, build, child_count, collapsed_ids, flatten, remove_children_of,
};
pub use glyphs::{TreeGlyphs, tree_label_line, tree_name_cell};
#[cfg(feature = "keymap")]
pub use keymap::{KeymapProfile, TreeKeyBindings};
pub use model::{LabelTree, NodeId, NodeKind, NodeStatus, Nodes, TreeNode};
pub use projection::{Projection, get_projection};
pub use search::{Keyword, NodeFilter, SearchResult, search, search_with};
pub use state::{EditSession, TreeEditorState};
pub use style::{TreeListViewStyle, TreeScrollPolicy};
pub use widget::TreeListView;
