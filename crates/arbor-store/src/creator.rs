//! Dynamic store creation.
//!
//! A store created before its tree is live waits in its parent's pending
//! list and is initialized by the first sweep. Once the tree is live, a
//! new store is initialized right away unless its parent is itself still
//! being constructed, in which case the sweep that follows the parent's
//! construction covers it.

use arbor_node::NodeId;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::lifecycle;
use crate::meta::StoreKind;
use crate::store::Blueprint;
use crate::tree::StoreTree;

pub(crate) fn create_store(tree: &mut StoreTree, parent: NodeId, blueprint: Blueprint) -> StoreResult<NodeId> {
    if tree.meta(parent)?.kind() == StoreKind::Leaf {
        return Err(StoreError::LeafCannotOwnChildren(parent));
    }

    if !tree.is_hierarchy_created(parent) {
        let id = tree.construct(parent, blueprint)?;
        defer(tree, parent, id)?;
        debug!(parent = %parent, store = %id, "dynamic store waits for first sweep");
        return Ok(id);
    }

    set_in_progress(tree, parent, true);
    let built = tree.construct(parent, blueprint);
    set_in_progress(tree, parent, false);
    let id = built?;
    tree.meta_mut(id)?.dynamic_branch = true;

    if tree.is_under_construction(parent) {
        defer(tree, parent, id)?;
        debug!(parent = %parent, store = %id, "dynamic store waits for enclosing sweep");
    } else {
        debug!(parent = %parent, store = %id, "initializing dynamic store");
        lifecycle::init_hierarchy(tree, id)?;
    }
    Ok(id)
}

fn defer(tree: &mut StoreTree, parent: NodeId, id: NodeId) -> StoreResult<()> {
    tree.meta_mut(parent)?
        .nameless_uninitialized
        .get_or_insert_with(Vec::new)
        .push(id);
    Ok(())
}

fn set_in_progress(tree: &mut StoreTree, node: NodeId, value: bool) {
    if let Ok(meta) = tree.meta_mut(node) {
        meta.dynamic_hierarchy_in_progress = value;
    }
}
