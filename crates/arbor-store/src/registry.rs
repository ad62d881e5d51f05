//! Declared children and naming of dynamic stores.

use arbor_node::NodeId;
use indexmap::IndexMap;
use tracing::debug;

use crate::diagnostics::Diagnostic;
use crate::error::StoreResult;
use crate::meta::Visibility;
use crate::names::validate_store_name;
use crate::store::Blueprint;
use crate::tree::StoreTree;

/// Construct each declared child of `parent` and record it by name.
///
/// A name the parent already uses is skipped and reported; the rest of the
/// batch continues. Constructor errors and invalid names propagate.
pub(crate) fn create_children(
    tree: &mut StoreTree,
    parent: NodeId,
    visibility: Visibility,
    decls: impl IntoIterator<Item = (String, Blueprint)>,
) -> StoreResult<IndexMap<String, NodeId>> {
    let separator = tree.config().separator;
    let mut created = IndexMap::new();
    for (name, blueprint) in decls {
        validate_store_name(&name, separator)?;
        if tree.meta(parent)?.owns_name(&name) {
            tree.report(Diagnostic::NameCollisionOnCreate { parent, name });
            continue;
        }
        let child = tree.construct(parent, blueprint)?;
        let meta = tree.meta_mut(parent)?;
        let map = match visibility {
            Visibility::Public => &mut meta.children,
            Visibility::Private => &mut meta.private_children,
        };
        map.insert(name.clone(), child);
        debug!(parent = %parent, child = %child, name = %name, ?visibility, "declared child");
        created.insert(name, child);
    }
    Ok(created)
}

/// Name the pending dynamic stores of `node` after its fields.
///
/// A pending store held by a field becomes a public child under the field
/// name unless the name is already taken.
pub(crate) fn register_nameless_stores(tree: &mut StoreTree, node: NodeId) -> StoreResult<()> {
    let pending = tree.meta(node)?.nameless_uninitialized().to_vec();
    if pending.is_empty() {
        return Ok(());
    }
    let fields = tree.store(node)?.store_fields();
    let meta = tree.meta_mut(node)?;
    for (name, id) in fields {
        if pending.contains(&id) && !meta.owns_name(name) {
            meta.children.insert(name.to_string(), id);
            debug!(parent = %node, child = %id, name, "named dynamic store");
        }
    }
    Ok(())
}
