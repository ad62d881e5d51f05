//! Name lookup and root name registration.
//!
//! Before the first sweep, every public descendant that is not a direct
//! child of the root is registered on the root under its declared name, so
//! root-wide lookups find it in one step. When a name repeats, the simple
//! name becomes a guard and each holder is registered under its qualified
//! name (the path of declared names from the root, such as `"D.S"`).

use arbor_node::{NodeError, NodeHost, NodeId};
use indexmap::IndexMap;
use tracing::debug;

use crate::config::DuplicateNamePolicy;
use crate::diagnostics::Diagnostic;
use crate::error::{StoreError, StoreResult};
use crate::names::qualify;
use crate::tree::StoreTree;

/// A name registered on the root.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RootEntry {
    Store(NodeId),
    /// The name is held by several stores; lookups must be qualified.
    Ambiguous,
}

/// Names registered on the root, in registration order.
#[derive(Clone, Debug, Default)]
pub struct NameRegistry {
    entries: IndexMap<String, RootEntry>,
}

impl NameRegistry {
    pub fn get(&self, name: &str) -> Option<RootEntry> {
        self.entries.get(name).copied()
    }

    /// The store registered under `name`. Fails for a guarded name.
    pub fn resolve(&self, name: &str) -> StoreResult<Option<NodeId>> {
        match self.get(name) {
            Some(RootEntry::Store(id)) => Ok(Some(id)),
            Some(RootEntry::Ambiguous) => Err(StoreError::AmbiguousName { name: name.to_string() }),
            None => Ok(None),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, RootEntry)> + '_ {
        self.entries.iter().map(|(name, entry)| (name.as_str(), *entry))
    }

    fn set(&mut self, name: &str, entry: RootEntry) {
        self.entries.insert(name.to_string(), entry);
    }
}

pub(crate) fn register_children_on_root(tree: &mut StoreTree, root: NodeId) -> StoreResult<()> {
    let mut path = Vec::new();
    register_level(tree, root, root, &mut path)?;
    debug!(root = %root, names = tree.names().len(), "registered names on root");
    Ok(())
}

fn register_level(tree: &mut StoreTree, root: NodeId, parent: NodeId, path: &mut Vec<String>) -> StoreResult<()> {
    let children: Vec<(String, NodeId)> = tree
        .meta(parent)?
        .children()
        .iter()
        .map(|(name, id)| (name.clone(), *id))
        .collect();
    let separator = tree.config().separator;
    for (name, child) in children {
        path.push(name);
        let qualified = qualify(path.as_slice(), separator);
        tree.meta_mut(child)?.h_name = Some(qualified.clone());
        if parent != root {
            let name = path.last().map(String::as_str).unwrap_or_default();
            register_name(tree, root, name, &qualified, child)?;
        }
        register_level(tree, root, child, path)?;
        path.pop();
    }
    Ok(())
}

fn register_name(tree: &mut StoreTree, root: NodeId, name: &str, qualified: &str, child: NodeId) -> StoreResult<()> {
    let existing = match tree.names().get(name) {
        Some(entry) => Some(entry),
        None => local_field(tree, root, name)?.map(RootEntry::Store),
    };
    let Some(existing) = existing else {
        tree.names_mut().set(name, RootEntry::Store(child));
        return Ok(());
    };

    if tree.config().duplicate_names == DuplicateNamePolicy::Reject {
        return Err(StoreError::DuplicateName {
            name: name.to_string(),
            qualified: qualified.to_string(),
        });
    }

    if let RootEntry::Store(previous) = existing {
        let previous_name = tree.meta(previous)?.h_name().map(str::to_string);
        if let Some(previous_name) = previous_name.filter(|q| q != name) {
            tree.names_mut().set(&previous_name, RootEntry::Store(previous));
            tree.names_mut().set(name, RootEntry::Ambiguous);
            tree.report(Diagnostic::DuplicateName {
                name: name.to_string(),
                qualified: previous_name,
            });
        }
    }
    tree.names_mut().set(qualified, RootEntry::Store(child));
    tree.report(Diagnostic::DuplicateName {
        name: name.to_string(),
        qualified: qualified.to_string(),
    });
    Ok(())
}

/// Root-wide lookup from any store of the tree.
pub(crate) fn get_store_by_name(tree: &StoreTree, from: NodeId, name: &str) -> StoreResult<Option<NodeId>> {
    let root = tree
        .nodes()
        .root(from)
        .ok_or(NodeError::UninitializedNode(from))?;
    find_child_store(tree, root, name)
}

/// Lookup confined to the subtree of `top`.
pub(crate) fn find_child_store(tree: &StoreTree, top: NodeId, name: &str) -> StoreResult<Option<NodeId>> {
    if let Some(found) = lookup_path(tree, top, name)? {
        return Ok(Some(found));
    }
    Ok(search_declared(tree, top, name))
}

fn lookup_path(tree: &StoreTree, top: NodeId, name: &str) -> StoreResult<Option<NodeId>> {
    if let Some(found) = field(tree, top, name)? {
        return Ok(Some(found));
    }
    let separator = tree.config().separator;
    if !name.contains(separator) {
        return Ok(None);
    }
    let mut current = top;
    for segment in name.split(separator) {
        match field(tree, current, segment)? {
            Some(next) => current = next,
            None => return Ok(None),
        }
    }
    Ok(Some(current))
}

/// A key of `node`: a registered name when `node` is the root, otherwise
/// one of its own children or fields.
fn field(tree: &StoreTree, node: NodeId, key: &str) -> StoreResult<Option<NodeId>> {
    if tree.root() == Some(node) {
        if let Some(found) = tree.names().resolve(key)? {
            return Ok(Some(found));
        }
    }
    local_field(tree, node, key)
}

/// Fields of a checked-out store are not visible.
fn local_field(tree: &StoreTree, node: NodeId, key: &str) -> StoreResult<Option<NodeId>> {
    let meta = tree.meta(node)?;
    if let Some(id) = meta.children().get(key).or_else(|| meta.private_children().get(key)) {
        return Ok(Some(*id));
    }
    Ok(tree.store(node).ok().and_then(|store| {
        store
            .store_fields()
            .into_iter()
            .find(|(field, _)| *field == key)
            .map(|(_, id)| id)
    }))
}

fn search_declared(tree: &StoreTree, parent: NodeId, name: &str) -> Option<NodeId> {
    let meta = tree.meta(parent).ok()?;
    if let Some(id) = meta.children().get(name) {
        return Some(*id);
    }
    meta.children()
        .values()
        .find_map(|child| search_declared(tree, *child, name))
}
