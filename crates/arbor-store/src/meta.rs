//! Per-store structural metadata.
//!
//! This is the custom record carried by every node of a store tree. It
//! holds the name maps and the dynamic-creation bookkeeping; the stores
//! themselves live in the tree's slots.

use arbor_node::NodeId;
use indexmap::IndexMap;

/// Whether a store may own children.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StoreKind {
    /// The usual kind: may declare and create children.
    #[default]
    Container,
    /// A store that never owns children, such as an async action.
    Leaf,
}

/// Which name map a declared child goes into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    /// Registered on the root and found by root-wide lookups.
    Public,
    /// Reachable only through its parent.
    Private,
}

/// Structural record of one store: its kind, its named children and the
/// bookkeeping for dynamic creation.
#[derive(Debug, Default)]
pub struct StoreMeta {
    pub(crate) kind: StoreKind,
    pub(crate) children: IndexMap<String, NodeId>,
    pub(crate) private_children: IndexMap<String, NodeId>,
    /// Dynamic stores waiting for their parent's next sweep. `None` once
    /// the sweep that covered them has finished.
    pub(crate) nameless_uninitialized: Option<Vec<NodeId>>,
    pub(crate) dynamic_branch: bool,
    pub(crate) dynamic_hierarchy_in_progress: bool,
    pub(crate) h_name: Option<String>,
}

impl StoreMeta {
    pub fn kind(&self) -> StoreKind {
        self.kind
    }

    /// Public children in declaration order, including dynamic stores
    /// that were named after initialization.
    pub fn children(&self) -> &IndexMap<String, NodeId> {
        &self.children
    }

    pub fn private_children(&self) -> &IndexMap<String, NodeId> {
        &self.private_children
    }

    /// Dynamic stores created before the tree was live and not yet swept.
    pub fn nameless_uninitialized(&self) -> &[NodeId] {
        self.nameless_uninitialized.as_deref().unwrap_or_default()
    }

    /// Returns `true` if this store was created after its tree went live.
    pub fn is_dynamic_branch(&self) -> bool {
        self.dynamic_branch
    }

    pub fn is_dynamic_hierarchy_in_progress(&self) -> bool {
        self.dynamic_hierarchy_in_progress
    }

    /// The qualified name assigned during root registration.
    pub fn h_name(&self) -> Option<&str> {
        self.h_name.as_deref()
    }

    /// Returns `true` if either child map already uses `name`.
    pub fn owns_name(&self, name: &str) -> bool {
        self.children.contains_key(name) || self.private_children.contains_key(name)
    }

    /// Every child the lifecycle sweeps visit: public, then private, then
    /// pending dynamic stores. A pending store already named as a public
    /// child is listed once.
    pub fn all_children(&self) -> Vec<NodeId> {
        let mut out: Vec<NodeId> = self
            .children
            .values()
            .chain(self.private_children.values())
            .copied()
            .collect();
        for id in self.nameless_uninitialized() {
            if !out.contains(id) {
                out.push(*id);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_children_order() {
        let id = NodeId::from_index;
        let mut meta = StoreMeta::default();
        meta.children.insert("b".into(), id(2));
        meta.children.insert("a".into(), id(1));
        meta.private_children.insert("p".into(), id(3));
        meta.nameless_uninitialized = Some(vec![id(4)]);
        assert_eq!(meta.all_children(), vec![id(2), id(1), id(3), id(4)]);
    }

    #[test]
    fn named_pending_store_is_listed_once() {
        let id = NodeId::from_index;
        let mut meta = StoreMeta::default();
        meta.children.insert("dyn".into(), id(5));
        meta.nameless_uninitialized = Some(vec![id(5), id(6)]);
        assert_eq!(meta.all_children(), vec![id(5), id(6)]);
    }

    #[test]
    fn owns_name_checks_both_maps() {
        let mut meta = StoreMeta::default();
        meta.private_children.insert("p".into(), NodeId::from_index(1));
        assert!(meta.owns_name("p"));
        assert!(!meta.owns_name("q"));
    }

    #[test]
    fn nameless_defaults_to_empty() {
        assert!(StoreMeta::default().nameless_uninitialized().is_empty());
    }
}
