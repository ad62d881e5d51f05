//! Node metadata and hierarchy traversal for Arbor store trees.
//!
//! Every store participating in a tree is identified by a [`NodeId`]. The
//! structural bookkeeping for a node (its parent, its root, the hierarchy
//! lifecycle flags and an extensible custom record owned by higher layers)
//! lives in a [`NodeTable`] side-table, never on the store value itself.
//!
//! # Modules
//!
//! - [`error`] -- Error types for node operations
//! - [`node`] -- [`NodeId`] and [`NodeMeta`]
//! - [`table`] -- [`NodeTable`], the [`NodeHost`] seam and the lifecycle
//!   operations that need a host ([`attach`], [`run_init_hierarchy_on_root`])
//! - [`walker`] -- Depth-first [`Walker`] over a node subtree

pub mod error;
pub mod node;
pub mod table;
pub mod walker;

pub use error::{NodeError, NodeResult};
pub use node::{NodeId, NodeMeta};
pub use table::{attach, run_init_hierarchy_on_root, NodeHost, NodeTable};
pub use walker::{Order, Walker};
