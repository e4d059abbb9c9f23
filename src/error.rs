use thiserror::Error;

use crate::model::NodeId;

/// Recoverable failures reported by tree edits.
///
/// None of these leave the tree in a partially-updated state: the caller keeps
/// the tree it passed in and may surface the error next to the edited row.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EditError {
    /// A node name was empty after trimming.
    #[error("node name must not be empty")]
    EmptyName,

    /// A sibling already uses this name (only with `unique_sibling_names`).
    #[error("a sibling named `{0}` already exists")]
    DuplicateName(String),

    /// Inserting another node would exceed the configured cap.
    #[error("the tree may not hold more than {limit} nodes")]
    TooManyNodes { limit: usize },

    /// The drag would drop the node exactly where it already is.
    #[error("drop target equals the current position")]
    DegenerateDrag,

    /// A draft node is already waiting for a name.
    #[error("a draft node is already pending")]
    DraftPending,

    /// Another node is being edited.
    #[error("another node is already being edited")]
    EditInProgress,

    /// The addressed node does not exist (or is not visible for a drag).
    #[error("node {0} not found")]
    NotFound(NodeId),

    /// Two input nodes share the same id.
    #[error("duplicate node id {0}")]
    DuplicateId(NodeId),

    /// A persisted input node uses the id reserved for the draft.
    #[error("node id {0} is reserved")]
    ReservedId(NodeId),
}
