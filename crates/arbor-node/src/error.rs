//! Error types for node metadata operations.

use crate::node::NodeId;

/// Errors raised when the hierarchy lifecycle invariants are violated.
///
/// All of these are programmer errors: they are propagated to the immediate
/// caller and never recovered from inside the engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NodeError {
    /// Metadata was attached to a node that already carries it.
    #[error("cannot attach node {0} twice")]
    AlreadyAttached(NodeId),

    /// The node has no metadata attached.
    #[error("cannot process uninitialized node {0}")]
    UninitializedNode(NodeId),

    /// The hierarchy initialization was requested before the root finished
    /// building its static tree.
    #[error("hierarchy of root {0} must be created before initialization")]
    HierarchyNotCreated(NodeId),
}

/// Convenience alias for node results.
pub type NodeResult<T> = Result<T, NodeError>;
