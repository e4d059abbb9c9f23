pub use crate::{
    ChangeEntry, ChangeKind, ChangeSet, EditError, EditSession, EditorConfig, FlattenedItem,
    LabelTree, NodeFilter, NodeId, NodeKind, NodeStatus, Projection, StructureChange, TreeAction,
    TreeEditorState, TreeEvent, TreeGlyphs, TreeListView, TreeListViewStyle, TreeNode,
    TreeRowContext, TreeScrollPolicy,
};

#[cfg(feature = "keymap")]
pub use crate::{KeymapProfile, TreeKeyBindings};
