//! [`Arbor`], the application entry point.

use arbor_node::NodeId;
use arbor_store::{DiagnosticSink, Store, StoreCx, StoreError, StoreRef, StoreResult, StoreTree, TreeConfig};
use tracing::info;

use crate::config::ArborConfig;
use crate::error::{SdkError, SdkResult};

/// An application's store tree.
#[derive(Debug)]
pub struct Arbor {
    tree: StoreTree,
}

impl Default for Arbor {
    fn default() -> Self {
        Self::new()
    }
}

impl Arbor {
    pub fn new() -> Self {
        Self {
            tree: StoreTree::default(),
        }
    }

    pub fn with_config(config: TreeConfig) -> SdkResult<Self> {
        Ok(Self {
            tree: StoreTree::new(config)?,
        })
    }

    pub fn with_sink(config: TreeConfig, sink: impl DiagnosticSink + 'static) -> SdkResult<Self> {
        Ok(Self {
            tree: StoreTree::with_sink(config, sink)?,
        })
    }

    /// Build from the `[tree]` section. The `[log]` section is applied
    /// separately, through [`init_tracing_from`](crate::logging::init_tracing_from).
    pub fn from_config(config: &ArborConfig) -> SdkResult<Self> {
        Self::with_config(config.tree.clone())
    }

    /// Build the root store and its static tree, then initialize it.
    pub fn mount<S, F>(&mut self, ctor: F) -> SdkResult<StoreRef<S>>
    where
        S: Store,
        F: FnOnce(&mut StoreCx<'_>) -> StoreResult<S> + 'static,
    {
        let root = self.tree.create_root(ctor)?;
        info!(
            stores = self.tree.store_count(),
            names = self.tree.names().len(),
            "store tree ready"
        );
        Ok(root)
    }

    pub fn root(&self) -> SdkResult<NodeId> {
        self.tree.root().ok_or(SdkError::Store(StoreError::NoRoot))
    }

    /// Resolve `name` from the root. A missing store is an error here.
    pub fn lookup<S: Store>(&self, name: &str) -> SdkResult<StoreRef<S>> {
        let root = self.root()?;
        self.tree
            .find::<S>(root, name)?
            .ok_or_else(|| SdkError::NotFound(name.to_string()))
    }

    pub fn get<S: Store>(&self, name: &str) -> SdkResult<&S> {
        let handle = self.lookup::<S>(name)?;
        Ok(self.tree.get(handle)?)
    }

    pub fn reset(&mut self, name: &str) -> SdkResult<()> {
        let root = self.root()?;
        let id = self
            .tree
            .get_store_by_name(root, name)?
            .ok_or_else(|| SdkError::NotFound(name.to_string()))?;
        Ok(self.tree.reset_store(id)?)
    }

    pub fn tree(&self) -> &StoreTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut StoreTree {
        &mut self.tree
    }

    pub fn into_tree(self) -> StoreTree {
        self.tree
    }
}
