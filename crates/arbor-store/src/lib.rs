//! Hierarchical store trees for Arbor.
//!
//! An application composes stores into a parent/child tree. The tree builds
//! its static shape from store constructors, then runs the lifecycle sweeps
//! (init, make-reactive, relations, naming) over the whole tree. Stores can
//! also be created later, at any point; they are initialized either as part
//! of the sweep that is about to run or immediately.
//!
//! # Quick Start
//!
//! ```rust
//! use arbor_store::{Blueprint, Store, StoreCx, StoreResult, StoreTree};
//!
//! #[derive(Default)]
//! struct Counter {
//!     value: u32,
//! }
//!
//! impl Store for Counter {
//!     fn on_store_init(&mut self, _cx: &mut StoreCx<'_>) -> StoreResult<()> {
//!         self.value = 1;
//!         Ok(())
//!     }
//! }
//!
//! struct App;
//!
//! impl Store for App {}
//!
//! let mut tree = StoreTree::default();
//! let app = tree
//!     .create_root(|cx| {
//!         cx.children([("counter", Blueprint::of::<Counter>())])?;
//!         Ok(App)
//!     })
//!     .unwrap();
//! let counter = tree.find::<Counter>(app.id(), "counter").unwrap().unwrap();
//! assert_eq!(tree.get(counter).unwrap().value, 1);
//! ```
//!
//! # Modules
//!
//! - [`store`] -- The [`Store`] trait, typed [`StoreRef`] handles, [`Blueprint`]s
//! - [`tree`] -- [`StoreTree`], the owner of every store and its metadata
//! - [`context`] -- [`StoreCx`], handed to constructors and hooks
//! - [`meta`] -- Per-store structural metadata ([`StoreMeta`])
//! - [`registry`] -- Declared children and naming of dynamic stores
//! - [`lifecycle`] -- The four-phase initialization sweep
//! - [`creator`] -- Dynamic store creation
//! - [`resolver`] -- Name lookup and root name registration
//! - [`names`] -- Store name validation and qualified names
//! - [`diagnostics`] -- Non-fatal condition reporting
//! - [`config`] -- [`TreeConfig`]
//! - [`error`] -- Error types

pub mod config;
pub mod context;
pub mod creator;
pub mod diagnostics;
pub mod error;
pub mod lifecycle;
pub mod meta;
pub mod names;
pub mod registry;
pub mod resolver;
pub mod store;
pub mod tree;

#[cfg(test)]
mod testing;

pub use config::{DuplicateNamePolicy, TreeConfig};
pub use context::StoreCx;
pub use diagnostics::{CollectingSink, Diagnostic, DiagnosticSink, Severity, TracingSink};
pub use error::{ConfigError, StoreError, StoreResult};
pub use lifecycle::{init_hierarchy, Phase};
pub use meta::{StoreKind, StoreMeta, Visibility};
pub use resolver::{NameRegistry, RootEntry};
pub use store::{Blueprint, ResetHook, Store, StoreRef};
pub use tree::StoreTree;

pub use arbor_node::NodeId;
