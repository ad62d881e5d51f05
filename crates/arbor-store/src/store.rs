//! The [`Store`] trait and the handles used to reach stores.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use arbor_node::NodeId;

use crate::context::StoreCx;
use crate::error::StoreResult;
use crate::meta::StoreKind;

/// Upcast to [`Any`] for typed access through [`StoreRef`].
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Outcome of [`Store::on_store_reset`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResetHook {
    /// The store reset itself.
    Handled,
    /// The store has no reset logic; [`Store::on_store_init`] runs instead.
    Undefined,
}

/// A node of the store tree.
///
/// Every hook is optional. During the initialization sweep each store's
/// [`on_store_init`](Store::on_store_init) runs before any of its
/// descendants', and [`on_store_relations_init`](Store::on_store_relations_init)
/// runs only after every store of the swept subtree finished the first two
/// phases, so it may look up and read any other store.
pub trait Store: AsAny {
    /// First phase of a sweep. Also the reset fallback when
    /// [`on_store_reset`](Store::on_store_reset) is undefined.
    fn on_store_init(&mut self, _cx: &mut StoreCx<'_>) -> StoreResult<()> {
        Ok(())
    }

    /// Return [`ResetHook::Handled`] to replace the init fallback.
    fn on_store_reset(&mut self, _cx: &mut StoreCx<'_>) -> StoreResult<ResetHook> {
        Ok(ResetHook::Undefined)
    }

    /// Activate reactive behavior. A failure here is reported and does not
    /// stop the sweep.
    fn on_store_make_reactive(&mut self, _cx: &mut StoreCx<'_>) -> StoreResult<()> {
        Ok(())
    }

    /// Third phase: wire references to other stores.
    fn on_store_relations_init(&mut self, _cx: &mut StoreCx<'_>) -> StoreResult<()> {
        Ok(())
    }

    /// Named fields holding dynamically created stores.
    ///
    /// After each sweep, pending dynamic stores that appear here are added
    /// to the public children under the field name. Fields are also
    /// consulted by direct name lookups on this store.
    fn store_fields(&self) -> Vec<(&'static str, NodeId)> {
        Vec::new()
    }

    /// Name used in diagnostics.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Typed handle to a store in a [`StoreTree`](crate::StoreTree).
///
/// The type is checked when the handle is dereferenced through the tree,
/// not when it is created.
pub struct StoreRef<S> {
    id: NodeId,
    _store: PhantomData<fn() -> S>,
}

impl<S> StoreRef<S> {
    pub(crate) fn new(id: NodeId) -> Self {
        Self {
            id,
            _store: PhantomData,
        }
    }

    pub fn id(self) -> NodeId {
        self.id
    }

    /// A `(name, id)` entry for [`Store::store_fields`].
    pub fn field(self, name: &'static str) -> (&'static str, NodeId) {
        (name, self.id)
    }
}

impl<S> Clone for StoreRef<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for StoreRef<S> {}

impl<S> PartialEq for StoreRef<S> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<S> Eq for StoreRef<S> {}

impl<S> Hash for StoreRef<S> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<S> fmt::Debug for StoreRef<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StoreRef<{}>({})", std::any::type_name::<S>(), self.id)
    }
}

impl<S> From<StoreRef<S>> for NodeId {
    fn from(handle: StoreRef<S>) -> Self {
        handle.id
    }
}

pub(crate) type BuildFn = Box<dyn FnOnce(&mut StoreCx<'_>) -> StoreResult<Box<dyn Store>>>;

/// How to build one declared child.
pub struct Blueprint {
    kind: StoreKind,
    build: BuildFn,
}

impl Blueprint {
    /// A container store built by `ctor`.
    pub fn new<S, F>(ctor: F) -> Self
    where
        S: Store,
        F: FnOnce(&mut StoreCx<'_>) -> StoreResult<S> + 'static,
    {
        Self::with_kind(StoreKind::Container, ctor)
    }

    /// A leaf store built by `ctor`.
    pub fn leaf<S, F>(ctor: F) -> Self
    where
        S: Store,
        F: FnOnce(&mut StoreCx<'_>) -> StoreResult<S> + 'static,
    {
        Self::with_kind(StoreKind::Leaf, ctor)
    }

    /// A container store built with [`Default`].
    pub fn of<S: Store + Default>() -> Self {
        Self::new(|_| Ok(S::default()))
    }

    pub fn kind(&self) -> StoreKind {
        self.kind
    }

    pub(crate) fn with_kind<S, F>(kind: StoreKind, ctor: F) -> Self
    where
        S: Store,
        F: FnOnce(&mut StoreCx<'_>) -> StoreResult<S> + 'static,
    {
        let build: BuildFn = Box::new(move |cx: &mut StoreCx<'_>| {
            ctor(cx).map(|store| Box::new(store) as Box<dyn Store>)
        });
        Self { kind, build }
    }

    pub(crate) fn into_parts(self) -> (StoreKind, BuildFn) {
        (self.kind, self.build)
    }
}

impl fmt::Debug for Blueprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blueprint").field("kind", &self.kind).finish_non_exhaustive()
    }
}
