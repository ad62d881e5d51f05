use std::fmt;

use arbor_node::{NodeError, NodeId};

/// Errors raised while building, initializing, or querying a store tree.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Structural error from the node layer.
    #[error(transparent)]
    Node(#[from] NodeError),

    /// The name was registered more than once on the root; only qualified
    /// names reach those stores.
    #[error("use fully qualified name to access \"{name}\" store")]
    AmbiguousName { name: String },

    /// A duplicated name was found while the duplicate policy rejects them.
    #[error("store name \"{name}\" is duplicated at \"{qualified}\"")]
    DuplicateName { name: String, qualified: String },

    /// A declared child name is not usable as a lookup key.
    #[error("invalid store name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    /// No store lives at this id.
    #[error("unknown store {0}")]
    UnknownStore(NodeId),

    /// The store is being constructed or is running a hook.
    #[error("store {0} is busy")]
    StoreBusy(NodeId),

    /// The store is not of the requested type.
    #[error("store {id} is not a {expected}")]
    TypeMismatch { id: NodeId, expected: &'static str },

    /// A leaf store tried to declare or create a child.
    #[error("leaf store {0} cannot own children")]
    LeafCannotOwnChildren(NodeId),

    /// A leaf blueprint was used to build a root.
    #[error("leaf store must have a parent")]
    LeafWithoutParent,

    /// Children were declared from a hook instead of a constructor.
    #[error("children of store {0} can only be declared during construction")]
    ChildrenOutsideConstruction(NodeId),

    /// The tree already has a root; it has only one.
    #[error("root store already exists: {0}")]
    RootAlreadyExists(NodeId),

    /// A root-wide lookup ran before any root was created.
    #[error("store tree has no root")]
    NoRoot,

    /// A store hook reported a failure.
    #[error("store hook failed in '{store}': {message}")]
    Hook { store: String, message: String },
}

impl StoreError {
    /// Create a hook error with the failing store's name and a message.
    pub fn hook(store: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Hook {
            store: store.into(),
            message: message.to_string(),
        }
    }
}

/// Convenience alias for store results.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors raised while loading a [`TreeConfig`](crate::TreeConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The values parsed but do not form a usable configuration.
    #[error("invalid config: {0}")]
    Invalid(String),
}
