//! Node identities and the structural metadata attached to them.
//!
//! A [`NodeId`] is a plain index into a [`NodeTable`](crate::NodeTable).
//! Identities are handed out before the metadata is attached, so a node can
//! exist in an *unattached* state while its owner is still being built.

use serde::{Deserialize, Serialize};

/// Identity of a node in a hierarchy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    /// Build an identity from a raw table index.
    pub fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    /// The raw table index of this identity.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Structural metadata attached to a node.
///
/// `parent` and `root` are fixed at attach time. The hierarchy flags are
/// only meaningful on the root; every other node reads them through its
/// root (see [`NodeTable::is_hierarchy_created`](crate::NodeTable::is_hierarchy_created)).
#[derive(Clone, Debug)]
pub struct NodeMeta<M> {
    pub(crate) parent: Option<NodeId>,
    pub(crate) root: NodeId,
    pub(crate) hierarchy_created: bool,
    pub(crate) hierarchy_initialized: bool,
    pub(crate) custom: M,
}

impl<M> NodeMeta<M> {
    /// The owning node, `None` for a root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The top-most node of the tree this node belongs to.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns `true` if this node has no parent.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// The custom record owned by higher layers.
    pub fn custom(&self) -> &M {
        &self.custom
    }

    /// Mutable access to the custom record.
    pub fn custom_mut(&mut self) -> &mut M {
        &mut self.custom
    }
}
