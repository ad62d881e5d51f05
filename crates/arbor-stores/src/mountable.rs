//! Stores that follow the visibility of a view.
//!
//! The UI layer calls [`MountableStore::mount`] when the view appears and
//! drops the returned [`MountGuard`] (or calls
//! [`leave`](MountableStore::leave)) when it goes away.

use std::fmt;
use std::sync::Arc;

use arbor_store::Store;
use async_trait::async_trait;
use tokio::sync::watch;
use tracing::debug;

use crate::version::{DataVersion, VersionPin};

/// Mount and leave behavior of a [`MountableStore`].
#[async_trait]
pub trait Mountable: Send + Sync + 'static {
    /// What the view passes when it appears.
    type Params: Send + 'static;

    /// Prepare state for the view. The store is ready once this returns.
    async fn on_mount(&self, _params: Self::Params) {}

    /// Release what `on_mount` prepared.
    fn on_leave(&self) {}
}

/// Observable state of a [`MountableStore`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MountState {
    /// The view is mounted, possibly still preparing.
    pub is_mounted: bool,
    /// The view is mounted and `on_mount` finished.
    pub is_ready: bool,
}

struct MountInner<M> {
    behavior: M,
    state: watch::Sender<MountState>,
    generation: DataVersion,
}

pub struct MountableStore<M: Mountable> {
    inner: Arc<MountInner<M>>,
}

impl<M: Mountable> Clone for MountableStore<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M: Mountable> fmt::Debug for MountableStore<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountableStore")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl<M: Mountable> MountableStore<M> {
    pub fn new(behavior: M) -> Self {
        let (state, _) = watch::channel(MountState::default());
        Self {
            inner: Arc::new(MountInner {
                behavior,
                state,
                generation: DataVersion::new(),
            }),
        }
    }

    pub fn behavior(&self) -> &M {
        &self.inner.behavior
    }

    pub fn state(&self) -> MountState {
        *self.inner.state.borrow()
    }

    pub fn is_mounted(&self) -> bool {
        self.state().is_mounted
    }

    pub fn is_ready(&self) -> bool {
        self.state().is_ready
    }

    pub fn subscribe(&self) -> watch::Receiver<MountState> {
        self.inner.state.subscribe()
    }

    /// Mount the store and wait for [`Mountable::on_mount`].
    ///
    /// The store becomes ready only if it was not left or mounted again in
    /// the meantime. Dropping the guard leaves, unless a later mount took
    /// over. Dropping this future before `on_mount` finishes drops the
    /// guard too, so the store leaves.
    pub async fn mount(&self, params: M::Params) -> MountGuard<M> {
        let inner = &*self.inner;
        inner.generation.next();
        let guard = MountGuard {
            store: self.clone(),
            pin: inner.generation.pin(),
            armed: true,
        };
        inner.state.send_modify(|state| {
            state.is_mounted = true;
            state.is_ready = false;
        });
        inner.behavior.on_mount(params).await;
        if guard.pin.is_current() {
            inner.state.send_modify(|state| state.is_ready = true);
        } else {
            debug!("mount superseded before ready");
        }
        guard
    }

    /// Clear both flags and run [`Mountable::on_leave`]. Does nothing if the
    /// store is not mounted.
    pub fn leave(&self) {
        let inner = &*self.inner;
        let was_mounted = inner.state.send_if_modified(|state| {
            let was_mounted = state.is_mounted;
            *state = MountState::default();
            was_mounted
        });
        if was_mounted {
            inner.generation.next();
            inner.behavior.on_leave();
        }
    }
}

impl<M: Mountable> Store for MountableStore<M> {}

/// Leaves the store on drop, if its mount is still the latest one.
#[must_use = "dropping the guard leaves the store"]
pub struct MountGuard<M: Mountable> {
    store: MountableStore<M>,
    pin: VersionPin,
    armed: bool,
}

impl<M: Mountable> MountGuard<M> {
    /// Keep the store mounted past the guard's lifetime.
    pub fn forget(mut self) {
        self.armed = false;
    }
}

impl<M: Mountable> Drop for MountGuard<M> {
    fn drop(&mut self) {
        if self.armed && self.pin.is_current() {
            self.store.leave();
        }
    }
}
