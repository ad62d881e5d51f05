//! Base store kinds for Arbor.
//!
//! These are ready-made [`Store`](arbor_store::Store) implementations for the
//! asynchronous parts of an application:
//!
//! - [`AsyncAction`] wraps one async operation with in-progress and failed
//!   flags, and drops the callbacks of results that went stale
//! - [`DataStore`] loads data through a [`DataSource`] and tracks loading
//!   state
//! - [`MountableStore`] follows a view's visibility through
//!   [`mount`](MountableStore::mount) and [`leave`](MountableStore::leave)
//!
//! State is published through `tokio::sync::watch` channels. The async
//! entry points work on shared state cloned out of the tree, so nothing
//! borrows the tree across an `await`.

pub mod action;
pub mod callable;
pub mod data;
pub mod error;
pub mod mountable;
pub mod version;

pub use action::{create_async_action, ActionOptions, ActionState, AsyncAction, AsyncActionStore, Overlap};
pub use callable::Callable;
pub use data::{create_data_action, DataSource, DataState, DataStore};
pub use error::ActionError;
pub use mountable::{MountGuard, MountState, Mountable, MountableStore};
pub use version::{DataVersion, VersionPin};
