//! High-level SDK for Arbor.
//!
//! Bundles the store tree, the base store kinds and logging setup behind
//! one entry point. Applications usually start from [`Arbor`] and import
//! [`prelude`].

pub mod app;
pub mod config;
pub mod error;
pub mod logging;

pub use app::Arbor;
pub use config::{ArborConfig, LogConfig};
pub use error::{SdkError, SdkResult};
pub use logging::{init_tracing, init_tracing_from};

pub use arbor_node::NodeId;
pub use arbor_store::{
    Blueprint, CollectingSink, Diagnostic, DiagnosticSink, DuplicateNamePolicy, ResetHook, Store,
    StoreCx, StoreError, StoreKind, StoreRef, StoreResult, StoreTree, TreeConfig,
};
pub use arbor_stores::{
    create_async_action, create_data_action, ActionError, ActionOptions, ActionState, AsyncAction,
    AsyncActionStore, Callable, DataSource, DataState, DataStore, MountGuard, MountState,
    Mountable, MountableStore, Overlap,
};

/// Everything needed to declare and use stores.
pub mod prelude {
    pub use crate::{Arbor, SdkError, SdkResult};
    pub use arbor_store::{Blueprint, ResetHook, Store, StoreCx, StoreRef, StoreResult};
    pub use arbor_stores::{
        create_async_action, create_data_action, ActionOptions, AsyncAction, AsyncActionStore,
        Callable, DataSource, DataStore, Mountable, MountableStore, Overlap,
    };
}
