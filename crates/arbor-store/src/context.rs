//! The handle stores receive in constructors and hooks.

use std::ops::{Deref, DerefMut};

use arbor_node::NodeId;
use indexmap::IndexMap;

use crate::creator;
use crate::error::{StoreError, StoreResult};
use crate::meta::{StoreKind, Visibility};
use crate::registry;
use crate::store::{Blueprint, Store, StoreRef};
use crate::tree::StoreTree;

/// Access to the tree on behalf of one store.
///
/// A constructor's context can declare children; a hook's context cannot.
/// Both dereference to the [`StoreTree`], so any other store is reachable
/// through [`StoreTree::get`] and friends. The store the context belongs to
/// is checked out while it runs and cannot be fetched from the tree.
pub struct StoreCx<'t> {
    tree: &'t mut StoreTree,
    id: NodeId,
    constructing: bool,
}

impl<'t> StoreCx<'t> {
    pub(crate) fn building(tree: &'t mut StoreTree, id: NodeId) -> Self {
        Self {
            tree,
            id,
            constructing: true,
        }
    }

    pub(crate) fn hook(tree: &'t mut StoreTree, id: NodeId) -> Self {
        Self {
            tree,
            id,
            constructing: false,
        }
    }

    /// The store this context acts for.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// A typed handle to the store this context acts for.
    pub fn this<S: Store>(&self) -> StoreRef<S> {
        StoreRef::new(self.id)
    }

    pub fn is_constructing(&self) -> bool {
        self.constructing
    }

    pub fn parent_id(&self) -> Option<NodeId> {
        self.tree.parent(self.id)
    }

    /// Declare public children. Only valid while constructing.
    ///
    /// Entries whose name is already taken on this store are skipped with a
    /// [`NameCollisionOnCreate`](crate::Diagnostic::NameCollisionOnCreate)
    /// diagnostic. Returns the children actually created.
    pub fn children<N: Into<String>>(
        &mut self,
        decls: impl IntoIterator<Item = (N, Blueprint)>,
    ) -> StoreResult<IndexMap<String, NodeId>> {
        self.declare(Visibility::Public, decls)
    }

    /// Declare private children, reachable only through this store.
    pub fn private_children<N: Into<String>>(
        &mut self,
        decls: impl IntoIterator<Item = (N, Blueprint)>,
    ) -> StoreResult<IndexMap<String, NodeId>> {
        self.declare(Visibility::Private, decls)
    }

    /// Declare one typed public child. `None` if the name was taken.
    pub fn child<S, F>(&mut self, name: &str, ctor: F) -> StoreResult<Option<StoreRef<S>>>
    where
        S: Store,
        F: FnOnce(&mut StoreCx<'_>) -> StoreResult<S> + 'static,
    {
        let created = self.declare(Visibility::Public, [(name, Blueprint::new(ctor))])?;
        Ok(created.get(name).map(|id| StoreRef::new(*id)))
    }

    /// Declare one typed private child. `None` if the name was taken.
    pub fn private_child<S, F>(&mut self, name: &str, ctor: F) -> StoreResult<Option<StoreRef<S>>>
    where
        S: Store,
        F: FnOnce(&mut StoreCx<'_>) -> StoreResult<S> + 'static,
    {
        let created = self.declare(Visibility::Private, [(name, Blueprint::new(ctor))])?;
        Ok(created.get(name).map(|id| StoreRef::new(*id)))
    }

    /// Create a dynamic store owned by this store.
    pub fn create_store<S, F>(&mut self, ctor: F) -> StoreResult<StoreRef<S>>
    where
        S: Store,
        F: FnOnce(&mut StoreCx<'_>) -> StoreResult<S> + 'static,
    {
        let id = creator::create_store(self.tree, self.id, Blueprint::new(ctor))?;
        Ok(StoreRef::new(id))
    }

    /// Create a dynamic leaf store owned by this store.
    pub fn create_leaf_store<S, F>(&mut self, ctor: F) -> StoreResult<StoreRef<S>>
    where
        S: Store,
        F: FnOnce(&mut StoreCx<'_>) -> StoreResult<S> + 'static,
    {
        let id = creator::create_store(self.tree, self.id, Blueprint::leaf(ctor))?;
        Ok(StoreRef::new(id))
    }

    /// Root-wide lookup starting from this store's root.
    pub fn get_store_by_name(&self, name: &str) -> StoreResult<Option<NodeId>> {
        self.tree.get_store_by_name(self.id, name)
    }

    /// Lookup confined to this store's subtree.
    pub fn get_child_store_by_name(&self, name: &str) -> StoreResult<Option<NodeId>> {
        self.tree.get_child_store_by_name(self.id, name)
    }

    pub fn find<S: Store>(&self, name: &str) -> StoreResult<Option<StoreRef<S>>> {
        self.tree.find(self.id, name)
    }

    pub fn find_child<S: Store>(&self, name: &str) -> StoreResult<Option<StoreRef<S>>> {
        self.tree.find_child(self.id, name)
    }

    fn declare<N: Into<String>>(
        &mut self,
        visibility: Visibility,
        decls: impl IntoIterator<Item = (N, Blueprint)>,
    ) -> StoreResult<IndexMap<String, NodeId>> {
        if !self.constructing {
            return Err(StoreError::ChildrenOutsideConstruction(self.id));
        }
        if self.tree.meta(self.id)?.kind() == StoreKind::Leaf {
            return Err(StoreError::LeafCannotOwnChildren(self.id));
        }
        let decls = decls.into_iter().map(|(name, blueprint)| (name.into(), blueprint));
        registry::create_children(self.tree, self.id, visibility, decls)
    }
}

impl Deref for StoreCx<'_> {
    type Target = StoreTree;

    fn deref(&self) -> &StoreTree {
        &*self.tree
    }
}

impl DerefMut for StoreCx<'_> {
    fn deref_mut(&mut self) -> &mut StoreTree {
        &mut *self.tree
    }
}
