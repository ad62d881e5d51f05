//! [`StoreTree`], the owner of every store and its metadata.
//!
//! Stores live in slots indexed by [`NodeId`]. A slot is empty while its
//! store is being constructed or is running a hook; during that window the
//! store can still be named and walked, but not borrowed.

use std::any::type_name;
use std::fmt;

use arbor_node::{attach, run_init_hierarchy_on_root, NodeError, NodeHost, NodeId, NodeTable};
use tracing::{debug, info_span};

use crate::config::TreeConfig;
use crate::context::StoreCx;
use crate::creator;
use crate::diagnostics::{Diagnostic, DiagnosticSink, TracingSink};
use crate::error::{ConfigError, StoreError, StoreResult};
use crate::lifecycle;
use crate::meta::{StoreKind, StoreMeta};
use crate::resolver::{self, NameRegistry};
use crate::store::{Blueprint, ResetHook, Store, StoreRef};

enum Slot {
    Building,
    Ready(Box<dyn Store>),
    CheckedOut,
    /// The constructor of this store or of one of its ancestors failed.
    Failed,
}

impl Slot {
    fn unavailable(&self, id: NodeId) -> StoreError {
        match self {
            Slot::Building | Slot::CheckedOut => StoreError::StoreBusy(id),
            Slot::Ready(_) | Slot::Failed => StoreError::UnknownStore(id),
        }
    }
}

/// A tree of stores with one root.
pub struct StoreTree {
    nodes: NodeTable<StoreMeta>,
    slots: Vec<Slot>,
    root: Option<NodeId>,
    names: NameRegistry,
    config: TreeConfig,
    sink: Box<dyn DiagnosticSink>,
}

impl NodeHost for StoreTree {
    type Meta = StoreMeta;

    fn nodes(&self) -> &NodeTable<StoreMeta> {
        &self.nodes
    }

    fn nodes_mut(&mut self) -> &mut NodeTable<StoreMeta> {
        &mut self.nodes
    }
}

impl Default for StoreTree {
    /// An empty tree with the default configuration.
    fn default() -> Self {
        Self::assemble(TreeConfig::default(), Box::new(TracingSink))
    }
}

impl StoreTree {
    /// Create an empty tree that logs diagnostics through `tracing`.
    ///
    /// Fails if `config` does not [`validate`](TreeConfig::validate).
    pub fn new(config: TreeConfig) -> Result<Self, ConfigError> {
        Self::with_sink(config, TracingSink)
    }

    pub fn with_sink(config: TreeConfig, sink: impl DiagnosticSink + 'static) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::assemble(config, Box::new(sink)))
    }

    fn assemble(config: TreeConfig, sink: Box<dyn DiagnosticSink>) -> Self {
        Self {
            nodes: NodeTable::new(),
            slots: Vec::new(),
            root: None,
            names: NameRegistry::default(),
            config,
            sink,
        }
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Names registered on the root.
    pub fn names(&self) -> &NameRegistry {
        &self.names
    }

    pub(crate) fn names_mut(&mut self) -> &mut NameRegistry {
        &mut self.names
    }

    /// Number of stores that were constructed successfully.
    pub fn store_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| !matches!(slot, Slot::Failed))
            .count()
    }

    pub fn meta(&self, id: NodeId) -> StoreResult<&StoreMeta> {
        self.nodes
            .custom(id)
            .ok_or(StoreError::Node(NodeError::UninitializedNode(id)))
    }

    pub(crate) fn meta_mut(&mut self, id: NodeId) -> StoreResult<&mut StoreMeta> {
        self.nodes
            .custom_mut(id)
            .ok_or(StoreError::Node(NodeError::UninitializedNode(id)))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.parent(id)
    }

    pub fn is_hierarchy_created(&self, id: NodeId) -> bool {
        self.nodes.is_hierarchy_created(id)
    }

    pub fn is_hierarchy_initialized(&self, id: NodeId) -> bool {
        self.nodes.is_hierarchy_initialized(id)
    }

    /// Returns `true` while the store's constructor is running.
    pub fn is_under_construction(&self, id: NodeId) -> bool {
        matches!(self.slots.get(id.index()), Some(Slot::Building))
    }

    pub(crate) fn report(&self, diagnostic: Diagnostic) {
        self.sink.report(&diagnostic);
    }

    // ----- construction -----

    /// Build the root store, its static tree, and run the first
    /// initialization sweep.
    pub fn create_root<S, F>(&mut self, ctor: F) -> StoreResult<StoreRef<S>>
    where
        S: Store,
        F: FnOnce(&mut StoreCx<'_>) -> StoreResult<S> + 'static,
    {
        if let Some(existing) = self.root {
            return Err(StoreError::RootAlreadyExists(existing));
        }
        let span = info_span!("create_root", store = type_name::<S>());
        let _enter = span.enter();

        let id = self.allocate();
        self.root = Some(id);
        if let Err(err) = self.construct_at(id, None, Blueprint::new(ctor)) {
            self.root = None;
            return Err(err);
        }
        run_init_hierarchy_on_root(self, id, lifecycle::init_root_hierarchy)?;
        Ok(StoreRef::new(id))
    }

    /// Create a dynamic store under `parent`.
    pub fn create_store<S, F>(&mut self, parent: NodeId, ctor: F) -> StoreResult<StoreRef<S>>
    where
        S: Store,
        F: FnOnce(&mut StoreCx<'_>) -> StoreResult<S> + 'static,
    {
        let id = creator::create_store(self, parent, Blueprint::new(ctor))?;
        Ok(StoreRef::new(id))
    }

    /// Create a dynamic leaf store under `parent`.
    pub fn create_leaf_store<S, F>(&mut self, parent: NodeId, ctor: F) -> StoreResult<StoreRef<S>>
    where
        S: Store,
        F: FnOnce(&mut StoreCx<'_>) -> StoreResult<S> + 'static,
    {
        let id = creator::create_store(self, parent, Blueprint::leaf(ctor))?;
        Ok(StoreRef::new(id))
    }

    pub(crate) fn construct(&mut self, parent: NodeId, blueprint: Blueprint) -> StoreResult<NodeId> {
        let id = self.allocate();
        self.construct_at(id, Some(parent), blueprint)?;
        Ok(id)
    }

    fn allocate(&mut self) -> NodeId {
        let id = self.nodes.allocate();
        self.slots.push(Slot::Building);
        id
    }

    fn construct_at(&mut self, id: NodeId, parent: Option<NodeId>, blueprint: Blueprint) -> StoreResult<()> {
        let (kind, build) = blueprint.into_parts();
        if kind == StoreKind::Leaf && parent.is_none() {
            self.slots[id.index()] = Slot::Failed;
            return Err(StoreError::LeafWithoutParent);
        }
        let built = attach(self, id, parent, |tree, id| {
            if let Some(meta) = tree.nodes.custom_mut(id) {
                meta.kind = kind;
            }
            build(&mut StoreCx::building(tree, id))
        })
        .map_err(StoreError::from)
        .and_then(|built| built);
        match built {
            Ok(store) => {
                debug!(store = %id, ?parent, ty = store.type_name(), "store constructed");
                self.slots[id.index()] = Slot::Ready(store);
                Ok(())
            }
            Err(err) => {
                self.discard_branch(id);
                Err(err)
            }
        }
    }

    /// Drop `top` and every store built under it, after its constructor
    /// failed. Nothing of the branch stays reachable.
    fn discard_branch(&mut self, top: NodeId) {
        let branch: Vec<NodeId> = (top.index()..self.slots.len())
            .map(NodeId::from_index)
            .filter(|&id| self.nodes.is_within(id, top))
            .collect();
        for &id in &branch {
            self.slots[id.index()] = Slot::Failed;
            self.nodes.detach(id);
        }
        debug!(store = %top, discarded = branch.len(), "failed branch discarded");
    }

    // ----- access -----

    pub fn store(&self, id: NodeId) -> StoreResult<&dyn Store> {
        match self.slots.get(id.index()) {
            Some(Slot::Ready(store)) => Ok(&**store),
            Some(other) => Err(other.unavailable(id)),
            None => Err(StoreError::UnknownStore(id)),
        }
    }

    pub fn store_mut(&mut self, id: NodeId) -> StoreResult<&mut dyn Store> {
        match self.slots.get_mut(id.index()) {
            Some(Slot::Ready(store)) => Ok(&mut **store),
            Some(other) => Err(other.unavailable(id)),
            None => Err(StoreError::UnknownStore(id)),
        }
    }

    pub fn get<S: Store>(&self, handle: StoreRef<S>) -> StoreResult<&S> {
        let id = handle.id();
        self.store(id)?
            .as_any()
            .downcast_ref::<S>()
            .ok_or(StoreError::TypeMismatch {
                id,
                expected: type_name::<S>(),
            })
    }

    pub fn get_mut<S: Store>(&mut self, handle: StoreRef<S>) -> StoreResult<&mut S> {
        let id = handle.id();
        self.store_mut(id)?
            .as_any_mut()
            .downcast_mut::<S>()
            .ok_or(StoreError::TypeMismatch {
                id,
                expected: type_name::<S>(),
            })
    }

    /// A typed handle to `id`, checked against the stored type.
    pub fn handle<S: Store>(&self, id: NodeId) -> StoreResult<StoreRef<S>> {
        self.get(StoreRef::<S>::new(id))?;
        Ok(StoreRef::new(id))
    }

    /// Run `f` with the store checked out of its slot.
    ///
    /// Hooks run this way so they can use the tree mutably. The store is
    /// put back even when `f` fails.
    pub fn with_store<R>(
        &mut self,
        id: NodeId,
        f: impl FnOnce(&mut dyn Store, &mut StoreCx<'_>) -> StoreResult<R>,
    ) -> StoreResult<R> {
        let slot = self
            .slots
            .get_mut(id.index())
            .ok_or(StoreError::UnknownStore(id))?;
        let mut store = match std::mem::replace(slot, Slot::CheckedOut) {
            Slot::Ready(store) => store,
            other => {
                let err = other.unavailable(id);
                *slot = other;
                return Err(err);
            }
        };
        let result = f(&mut *store, &mut StoreCx::hook(self, id));
        self.slots[id.index()] = Slot::Ready(store);
        result
    }

    /// Reset a store: its reset hook if it defines one, its init hook
    /// otherwise.
    pub fn reset_store(&mut self, id: NodeId) -> StoreResult<()> {
        if self.config.warn_on_early_reset && !self.nodes.is_hierarchy_initialized(id) {
            self.report(Diagnostic::ResetDuringInitialization { node: id });
        }
        self.with_store(id, |store, cx| match store.on_store_reset(cx)? {
            ResetHook::Handled => Ok(()),
            ResetHook::Undefined => store.on_store_init(cx),
        })
    }

    // ----- lookup -----

    /// Find a store anywhere in the tree `from` belongs to.
    ///
    /// Tries, in order: the names registered on the root (a guarded name
    /// fails with [`StoreError::AmbiguousName`]), the whole name as a key of
    /// the root, the name as a separator-delimited path, then a depth-first
    /// search over declared public children.
    pub fn get_store_by_name(&self, from: NodeId, name: &str) -> StoreResult<Option<NodeId>> {
        resolver::get_store_by_name(self, from, name)
    }

    /// Like [`get_store_by_name`](Self::get_store_by_name) but confined to
    /// the subtree of `from`.
    pub fn get_child_store_by_name(&self, from: NodeId, name: &str) -> StoreResult<Option<NodeId>> {
        resolver::find_child_store(self, from, name)
    }

    pub fn find<S: Store>(&self, from: NodeId, name: &str) -> StoreResult<Option<StoreRef<S>>> {
        self.get_store_by_name(from, name)?
            .map(|id| self.handle::<S>(id))
            .transpose()
    }

    pub fn find_child<S: Store>(&self, from: NodeId, name: &str) -> StoreResult<Option<StoreRef<S>>> {
        self.get_child_store_by_name(from, name)?
            .map(|id| self.handle::<S>(id))
            .transpose()
    }
}

impl fmt::Debug for StoreTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreTree")
            .field("root", &self.root)
            .field("stores", &self.store_count())
            .field("names", &self.names)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{log, recorder, Log, Recorder};
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn invalid_config_is_rejected() {
        let config = TreeConfig {
            separator: 'x',
            ..TreeConfig::default()
        };
        assert!(matches!(StoreTree::new(config), Err(ConfigError::Invalid(_))));
        assert!(StoreTree::new(TreeConfig::strict()).is_ok());
    }

    #[test]
    fn second_root_is_rejected() {
        let mut tree = StoreTree::default();
        let root = tree.create_root(|_| Ok(Recorder::new("R", log()))).unwrap();
        let err = tree.create_root(|_| Ok(Recorder::new("R2", log()))).unwrap_err();
        assert!(matches!(err, StoreError::RootAlreadyExists(id) if id == root.id()));
    }

    #[test]
    fn failed_root_can_be_retried() {
        let mut tree = StoreTree::default();
        let err = tree
            .create_root(|_| Err::<Recorder, _>(StoreError::hook("R", "bad input")))
            .unwrap_err();
        assert!(matches!(err, StoreError::Hook { .. }));
        assert!(tree.root().is_none());
        assert!(tree.create_root(|_| Ok(Recorder::new("R", log()))).is_ok());
    }

    #[test]
    fn failed_root_leaves_no_children_behind() {
        let built: Rc<Cell<Vec<NodeId>>> = Rc::default();
        let mut tree = StoreTree::default();
        let err = tree
            .create_root({
                let built = built.clone();
                move |cx| {
                    let log = log();
                    let children = cx.children([("A", recorder("A", &log)), ("B", recorder("B", &log))])?;
                    built.set(children.values().copied().collect());
                    Err::<Recorder, _>(StoreError::hook("R", "late failure"))
                }
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::Hook { .. }));
        assert_eq!(tree.store_count(), 0);

        let orphans = built.take();
        assert_eq!(orphans.len(), 2);
        for id in orphans {
            assert!(tree.meta(id).is_err());
            assert!(matches!(tree.store(id), Err(StoreError::UnknownStore(_))));
        }

        let root = tree.create_root(|_| Ok(Recorder::new("R", log()))).unwrap();
        assert_eq!(tree.store_count(), 1);
        assert!(tree.meta(root.id()).unwrap().children().is_empty());
    }

    #[test]
    fn failed_dynamic_store_discards_only_its_branch() {
        let inner: Rc<Cell<Option<NodeId>>> = Rc::default();
        let sibling: Rc<Cell<Option<NodeId>>> = Rc::default();
        let mut tree = StoreTree::default();
        let root = tree.create_root(|_| Ok(Recorder::new("R", log()))).unwrap();
        let root_id = root.id();

        let err = tree
            .create_store(root_id, {
                let (inner, sibling) = (inner.clone(), sibling.clone());
                move |cx| {
                    let child = cx.child("inner", |_| Ok(Recorder::new("inner", log())))?;
                    inner.set(child.map(|c| c.id()));
                    let other = StoreTree::create_store(&mut **cx, root_id, |_| Ok(Recorder::new("sibling", log())))?;
                    sibling.set(Some(other.id()));
                    Err::<Recorder, _>(StoreError::hook("dynamic", "bad params"))
                }
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::Hook { .. }));

        let inner = inner.get().unwrap();
        assert!(tree.meta(inner).is_err());
        let sibling = sibling.get().unwrap();
        assert_eq!(tree.parent(sibling), Some(root_id));
        assert_eq!(tree.get(StoreRef::<Recorder>::new(sibling)).unwrap().inits, 1);
        assert_eq!(tree.store_count(), 2);
    }

    #[test]
    fn root_is_initialized_after_create() {
        let mut tree = StoreTree::default();
        let root = tree.create_root(|_| Ok(Recorder::new("R", log()))).unwrap();
        assert!(tree.is_hierarchy_created(root.id()));
        assert!(tree.is_hierarchy_initialized(root.id()));
        assert_eq!(tree.get(root).unwrap().inits, 1);
    }

    #[test]
    fn typed_access_checks_type() {
        struct Other;
        impl Store for Other {}

        let mut tree = StoreTree::default();
        let root = tree.create_root(|_| Ok(Recorder::new("R", log()))).unwrap();
        let wrong: StoreRef<Other> = StoreRef::new(root.id());
        assert!(matches!(
            tree.get(wrong),
            Err(StoreError::TypeMismatch { .. })
        ));
        assert!(tree.handle::<Other>(root.id()).is_err());
        assert!(tree.handle::<Recorder>(root.id()).is_ok());
    }

    #[test]
    fn store_is_busy_inside_its_own_hook() {
        struct Selfish {
            saw_busy: bool,
        }
        impl Store for Selfish {
            fn on_store_init(&mut self, cx: &mut StoreCx<'_>) -> StoreResult<()> {
                let id = cx.id();
                self.saw_busy = matches!(cx.store(id), Err(StoreError::StoreBusy(_)));
                Ok(())
            }
        }

        let mut tree = StoreTree::default();
        let root = tree.create_root(|_| Ok(Selfish { saw_busy: false })).unwrap();
        assert!(tree.get(root).unwrap().saw_busy);
    }

    #[test]
    fn reset_prefers_reset_hook() {
        #[derive(Default)]
        struct Resettable {
            value: u32,
            resets: u32,
        }
        impl Store for Resettable {
            fn on_store_init(&mut self, _cx: &mut StoreCx<'_>) -> StoreResult<()> {
                self.value = 10;
                Ok(())
            }
            fn on_store_reset(&mut self, _cx: &mut StoreCx<'_>) -> StoreResult<ResetHook> {
                self.value = 0;
                self.resets += 1;
                Ok(ResetHook::Handled)
            }
        }

        let mut tree = StoreTree::default();
        let root = tree.create_root(|_| Ok(Resettable::default())).unwrap();
        tree.reset_store(root.id()).unwrap();
        let store = tree.get(root).unwrap();
        assert_eq!((store.value, store.resets), (0, 1));
    }

    #[test]
    fn reset_falls_back_to_init() {
        let log: Log = log();
        let mut tree = StoreTree::default();
        let root = tree
            .create_root({
                let log = log.clone();
                move |cx| {
                    cx.children([("A", recorder("A", &log))])?;
                    Ok(Recorder::new("R", log))
                }
            })
            .unwrap();
        let a = tree.find::<Recorder>(root.id(), "A").unwrap().unwrap();
        tree.get_mut(a).unwrap().counter = 7;
        tree.reset_store(a.id()).unwrap();
        tree.reset_store(a.id()).unwrap();
        let a = tree.get(a).unwrap();
        assert_eq!(a.inits, 3);
        assert_eq!(a.counter, 0);
    }

    #[test]
    fn reset_during_initialization_is_reported() {
        struct EagerReset;
        impl Store for EagerReset {
            fn on_store_relations_init(&mut self, cx: &mut StoreCx<'_>) -> StoreResult<()> {
                let child = cx
                    .find_child::<Recorder>("A")?
                    .ok_or(StoreError::UnknownStore(cx.id()))?;
                cx.reset_store(child.id())
            }
        }

        let sink = crate::CollectingSink::new();
        let mut tree = StoreTree::with_sink(TreeConfig::default(), sink.clone()).unwrap();
        tree.create_root(|cx| {
            cx.children([("A", recorder("A", &log()))])?;
            Ok(EagerReset)
        })
        .unwrap();
        assert!(sink
            .entries()
            .iter()
            .any(|d| matches!(d, Diagnostic::ResetDuringInitialization { .. })));
    }

    #[test]
    fn leaf_root_is_rejected() {
        let mut tree = StoreTree::default();
        let id = tree.allocate();
        let err = tree
            .construct_at(id, None, Blueprint::leaf(|_| Ok(Recorder::new("L", log()))))
            .unwrap_err();
        assert!(matches!(err, StoreError::LeafWithoutParent));
    }
}
