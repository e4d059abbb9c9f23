use crate::error::EditError;
use crate::model::NodeId;

/// Actions that a user or application can initiate on the tree editor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeAction<Custom = ()> {
    /// Move selection to the previous visible row.
    SelectPrev,
    /// Move selection to the next visible row.
    SelectNext,
    /// Move selection to the parent node.
    SelectParent,
    /// Select the first visible row.
    SelectFirst,
    /// Select the last visible row.
    SelectLast,
    /// Toggle the collapsed flag of the selected node.
    ToggleNode,
    /// Expand all nodes in the tree.
    ExpandAll,
    /// Collapse all nodes in the tree.
    CollapseAll,
    /// Add a draft root and start editing it.
    AddRoot,
    /// Add a draft child under the selected node and start editing it.
    AddChild,
    /// Start editing the selected node's name.
    EditNode,
    /// Remove the selected node and its subtree.
    DeleteNode,
    /// Move the selected node above the previous visible row.
    MoveUp,
    /// Move the selected node below the next visible row.
    MoveDown,
    /// Make the selected node a child of its previous sibling.
    Indent,
    /// Move the selected node one level up.
    Outdent,
    /// Custom action forwarded to the caller without internal handling.
    Custom(Custom),
}

/// What a committed edit did to the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StructureChange {
    /// A draft node was inserted (its id is [`NodeId::DRAFT`]).
    Inserted,
    /// A node's name was committed; drafts report their freshly minted id.
    Renamed(NodeId),
    /// A node and its subtree were removed.
    Removed(NodeId),
    /// A node was moved to a new parent or position.
    Moved(NodeId),
}

/// Result of handling an action, gesture, or key event.
#[derive(Clone, Debug, PartialEq)]
pub enum TreeEvent<Custom = ()> {
    /// The event was handled internally and state was updated.
    Handled,
    /// The event was ignored (e.g., nothing selected / nothing to do).
    Unhandled,
    /// The tree changed; the new tree is available from the editor state.
    StructureChanged(StructureChange),
    /// The edit was rejected; the tree is unchanged.
    ValidationFailed(EditError),
    /// The action is forwarded to the caller for handling.
    Action(TreeAction<Custom>),
}

impl<C> TreeEvent<C> {
    /// Returns `true` for [`TreeEvent::StructureChanged`].
    pub const fn changed_structure(&self) -> bool {
        matches!(self, Self::StructureChanged(_))
    }
}
