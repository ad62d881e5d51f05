//! The node metadata side-table and the lifecycle operations on it.
//!
//! [`NodeTable`] maps node identities to their [`NodeMeta`]. Operations that
//! only read or tweak metadata live on the table itself. Operations that must
//! call back into the owner of the table while metadata is being set up
//! ([`attach`], [`run_init_hierarchy_on_root`]) are free functions over a
//! [`NodeHost`], so a bigger structure (such as a store tree) can embed the
//! table and still receive `&mut self` in the callback.

use tracing::debug;

use crate::error::{NodeError, NodeResult};
use crate::node::{NodeId, NodeMeta};

/// Anything that owns a [`NodeTable`].
pub trait NodeHost {
    /// The custom metadata record stored per node.
    type Meta;

    /// Shared access to the node table.
    fn nodes(&self) -> &NodeTable<Self::Meta>;

    /// Mutable access to the node table.
    fn nodes_mut(&mut self) -> &mut NodeTable<Self::Meta>;
}

/// Side-table of node metadata, indexed by [`NodeId`].
#[derive(Clone, Debug)]
pub struct NodeTable<M> {
    entries: Vec<Option<NodeMeta<M>>>,
}

impl<M> Default for NodeTable<M> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<M> NodeHost for NodeTable<M> {
    type Meta = M;

    fn nodes(&self) -> &NodeTable<M> {
        self
    }

    fn nodes_mut(&mut self) -> &mut NodeTable<M> {
        self
    }
}

impl<M> NodeTable<M> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of identities handed out (attached or not).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no identity was handed out yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reserve a new, unattached identity.
    pub fn allocate(&mut self) -> NodeId {
        let id = NodeId::from_index(self.entries.len());
        self.entries.push(None);
        id
    }

    /// Returns `true` if metadata is attached to `node`.
    pub fn is_attached(&self, node: NodeId) -> bool {
        self.meta(node).is_some()
    }

    /// Metadata of `node`, if attached.
    pub fn meta(&self, node: NodeId) -> Option<&NodeMeta<M>> {
        self.entries.get(node.index()).and_then(Option::as_ref)
    }

    /// Mutable metadata of `node`, if attached.
    pub fn meta_mut(&mut self, node: NodeId) -> Option<&mut NodeMeta<M>> {
        self.entries.get_mut(node.index()).and_then(Option::as_mut)
    }

    /// Parent of `node`; `None` for a root or an unattached node.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.meta(node).and_then(NodeMeta::parent)
    }

    /// Root of `node`; `None` for an unattached node.
    pub fn root(&self, node: NodeId) -> Option<NodeId> {
        self.meta(node).map(NodeMeta::root)
    }

    /// Whether the static tree `node` belongs to has been fully built.
    pub fn is_hierarchy_created(&self, node: NodeId) -> bool {
        self.root_meta(node)
            .map(|root| root.hierarchy_created)
            .unwrap_or(false)
    }

    /// Whether the tree `node` belongs to has completed its first
    /// initialization sweep.
    pub fn is_hierarchy_initialized(&self, node: NodeId) -> bool {
        self.root_meta(node)
            .map(|root| root.hierarchy_initialized)
            .unwrap_or(false)
    }

    /// Custom record of `node`, if attached.
    pub fn custom(&self, node: NodeId) -> Option<&M> {
        self.meta(node).map(NodeMeta::custom)
    }

    /// Mutable custom record of `node`, if attached.
    pub fn custom_mut(&mut self, node: NodeId) -> Option<&mut M> {
        self.meta_mut(node).map(NodeMeta::custom_mut)
    }

    /// Mark the static tree of a root as created.
    ///
    /// Has no effect on non-root nodes. Fails for a node without metadata.
    pub fn mark_hierarchy_created(&mut self, node: NodeId) -> NodeResult<()> {
        let meta = self
            .meta_mut(node)
            .ok_or(NodeError::UninitializedNode(node))?;
        if meta.is_root() {
            meta.hierarchy_created = true;
        }
        Ok(())
    }

    /// Remove the metadata of `node`, leaving its identity unattached.
    ///
    /// Identities are never reused, so stale handles keep failing lookups.
    pub fn detach(&mut self, node: NodeId) -> Option<NodeMeta<M>> {
        self.entries.get_mut(node.index()).and_then(Option::take)
    }

    /// Returns `true` if `ancestor` is `node` or one of its parents.
    pub fn is_within(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Identities of all attached nodes, in allocation order.
    pub fn attached(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.is_some())
            .map(|(index, _)| NodeId::from_index(index))
    }

    fn root_meta(&self, node: NodeId) -> Option<&NodeMeta<M>> {
        self.root(node).and_then(|root| self.meta(root))
    }

    fn ensure_slot(&mut self, node: NodeId) {
        if node.index() >= self.entries.len() {
            self.entries.resize_with(node.index() + 1, || None);
        }
    }
}

impl<M: Default> NodeTable<M> {
    /// Attach default metadata to `node` without a custom-init callback.
    pub fn attach(&mut self, node: NodeId, parent: Option<NodeId>) -> NodeResult<()> {
        attach(self, node, parent, |_, _| ())
    }
}

/// Attach metadata to `node`.
///
/// The root is inherited from `parent` (or is `node` itself when there is no
/// parent). Fresh default custom metadata is installed, then
/// `on_custom_init` is invoked with the host so the caller can build
/// everything that hangs off the node. A node without parent is marked as
/// hierarchy-created once the callback returns.
pub fn attach<H, R>(
    host: &mut H,
    node: NodeId,
    parent: Option<NodeId>,
    on_custom_init: impl FnOnce(&mut H, NodeId) -> R,
) -> NodeResult<R>
where
    H: NodeHost,
    H::Meta: Default,
{
    let table = host.nodes_mut();
    if table.is_attached(node) {
        return Err(NodeError::AlreadyAttached(node));
    }
    let root = parent.and_then(|p| table.root(p)).unwrap_or(node);
    table.ensure_slot(node);
    table.entries[node.index()] = Some(NodeMeta {
        parent,
        root,
        hierarchy_created: false,
        hierarchy_initialized: false,
        custom: H::Meta::default(),
    });
    debug!(node = %node, ?parent, root = %root, "attached node");

    let out = on_custom_init(host, node);

    if parent.is_none() {
        if let Some(meta) = host.nodes_mut().meta_mut(node) {
            meta.hierarchy_created = true;
        }
    }
    Ok(out)
}

/// Run the hierarchy initialization callback if `node` is an attached root.
///
/// Returns `Ok(false)` without doing anything for non-root or unattached
/// nodes. The initialized flag is set only after `callback` succeeds.
pub fn run_init_hierarchy_on_root<H, E>(
    host: &mut H,
    node: NodeId,
    callback: impl FnOnce(&mut H, NodeId) -> Result<(), E>,
) -> Result<bool, E>
where
    H: NodeHost,
    E: From<NodeError>,
{
    let Some(meta) = host.nodes().meta(node) else {
        return Ok(false);
    };
    if !meta.is_root() {
        return Ok(false);
    }
    if !meta.hierarchy_created {
        return Err(NodeError::HierarchyNotCreated(node).into());
    }

    callback(host, node)?;

    if let Some(meta) = host.nodes_mut().meta_mut(node) {
        meta.hierarchy_initialized = true;
    }
    debug!(root = %node, "hierarchy initialized");
    Ok(true)
}
