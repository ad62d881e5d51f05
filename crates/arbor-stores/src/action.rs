//! Async actions: one asynchronous operation with observable progress.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use arbor_store::{NodeId, Store, StoreCx, StoreRef, StoreResult, StoreTree};
use tokio::sync::watch;
use tracing::debug;

use crate::callable::Callable;
use crate::error::ActionError;
use crate::version::{DataVersion, OnCancel, VersionPin};

pub type ActionFuture<T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send>>;

type Operation<P, T, E> = Box<dyn Fn(P) -> ActionFuture<T, E> + Send + Sync>;
type BeforeFn<P, B> = Box<dyn Fn(&P) -> B + Send + Sync>;
type SuccessFn<P, T, B> = Box<dyn Fn(T, Option<&B>, &P) + Send + Sync>;
type ErrorFn<P, E, B> = Box<dyn Fn(&E, Option<&B>, &P) + Send + Sync>;

/// Observable state of an action.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ActionState {
    /// A call is running.
    pub in_progress: bool,
    /// The last settled call failed.
    pub failed: bool,
}

/// What a call does while an earlier call is still running.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Overlap {
    /// Fail with [`ActionError::AlreadyInProgress`].
    #[default]
    Reject,
    /// Run. The earlier call's callbacks and state updates are dropped.
    Supersede,
}

/// Callbacks and policies of an [`AsyncAction`].
///
/// `B` is whatever `on_before` returns; it is handed to `on_success` and
/// `on_error`.
pub struct ActionOptions<P, T, E, B = ()> {
    on_before: Option<BeforeFn<P, B>>,
    on_success: Option<SuccessFn<P, T, B>>,
    on_error: Option<ErrorFn<P, E, B>>,
    pin: Option<DataVersion>,
    overlap: Overlap,
}

impl<P, T, E, B> Default for ActionOptions<P, T, E, B> {
    fn default() -> Self {
        Self {
            on_before: None,
            on_success: None,
            on_error: None,
            pin: None,
            overlap: Overlap::default(),
        }
    }
}

impl<P, T, E> ActionOptions<P, T, E> {
    /// Options without a before-call hook.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<P, T, E, B> ActionOptions<P, T, E, B> {
    /// Options whose `on_before` hook runs synchronously when a call
    /// starts. Its result is passed to `on_success` and `on_error`.
    pub fn with_before(f: impl Fn(&P) -> B + Send + Sync + 'static) -> Self {
        Self {
            on_before: Some(Box::new(f)),
            ..Self::default()
        }
    }

    pub fn on_success(mut self, f: impl Fn(T, Option<&B>, &P) + Send + Sync + 'static) -> Self {
        self.on_success = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl Fn(&E, Option<&B>, &P) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    /// Skip the callbacks of calls that finish after `version` moved.
    pub fn pin_version(mut self, version: DataVersion) -> Self {
        self.pin = Some(version);
        self
    }

    pub fn overlap(mut self, overlap: Overlap) -> Self {
        self.overlap = overlap;
        self
    }
}

struct ActionInner<P, T, E, B> {
    operation: Operation<P, T, E>,
    options: ActionOptions<P, T, E, B>,
    state: watch::Sender<ActionState>,
    calls: DataVersion,
}

/// A cloneable handle to one async operation.
///
/// Clones share state, so a clone taken out of the tree can be awaited
/// without holding the tree.
pub struct AsyncAction<P, T, E, B = ()> {
    inner: Arc<ActionInner<P, T, E, B>>,
}

impl<P, T, E, B> Clone for AsyncAction<P, T, E, B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P, T, E, B> fmt::Debug for AsyncAction<P, T, E, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncAction")
            .field("state", &*self.inner.state.borrow())
            .field("overlap", &self.inner.options.overlap)
            .finish_non_exhaustive()
    }
}

impl<P, T, E, B> AsyncAction<P, T, E, B>
where
    P: Clone + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
    B: Send + 'static,
{
    pub fn new<F, Fut>(operation: F, options: ActionOptions<P, T, E, B>) -> Self
    where
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let operation: Operation<P, T, E> = Box::new(move |params: P| -> ActionFuture<T, E> {
            Box::pin(operation(params))
        });
        let (state, _) = watch::channel(ActionState::default());
        Self {
            inner: Arc::new(ActionInner {
                operation,
                options,
                state,
                calls: DataVersion::new(),
            }),
        }
    }

    pub fn state(&self) -> ActionState {
        *self.inner.state.borrow()
    }

    pub fn is_in_progress(&self) -> bool {
        self.state().in_progress
    }

    pub fn is_failed(&self) -> bool {
        self.state().failed
    }

    pub fn subscribe(&self) -> watch::Receiver<ActionState> {
        self.inner.state.subscribe()
    }

    /// Run the operation once.
    ///
    /// Callbacks run only if the pinned data version (and, with
    /// [`Overlap::Supersede`], this call) is still current when the
    /// operation settles. The operation's error is returned either way.
    /// Dropping the returned future before it settles clears
    /// `in_progress` without touching `failed`.
    pub async fn call(&self, params: P) -> Result<(), ActionError<E>> {
        let inner = &*self.inner;
        let supersede = inner.options.overlap == Overlap::Supersede;
        let mut rejected = false;
        inner.state.send_if_modified(|state| {
            if state.in_progress && !supersede {
                rejected = true;
                return false;
            }
            let changed = !state.in_progress;
            state.in_progress = true;
            changed
        });
        if rejected {
            return Err(ActionError::AlreadyInProgress);
        }

        inner.calls.next();
        let call = inner.calls.pin();
        let data = inner.options.pin.as_ref().map(DataVersion::pin);
        let is_current = || call.is_current() && data.as_ref().map_or(true, VersionPin::is_current);
        let cancelled = OnCancel::new(|| {
            debug!(call = call.pinned(), "action dropped before settling");
            self.settle(supersede, &call, None);
        });

        let before = inner.options.on_before.as_ref().map(|f| f(&params));
        let outcome = (inner.operation)(params.clone()).await;
        let current = is_current();
        if !current {
            debug!(call = call.pinned(), "stale action result ignored");
        }
        let result = match outcome {
            Ok(value) => {
                if current {
                    if let Some(on_success) = &inner.options.on_success {
                        on_success(value, before.as_ref(), &params);
                    }
                }
                Ok(())
            }
            Err(error) => {
                if current {
                    if let Some(on_error) = &inner.options.on_error {
                        on_error(&error, before.as_ref(), &params);
                    }
                }
                Err(ActionError::Failed(error))
            }
        };
        cancelled.disarm();
        self.settle(supersede, &call, Some(result.is_err()));
        result
    }

    /// Clear `in_progress` and record `failed`, unless a newer call took
    /// over. `None` leaves `failed` as it was.
    fn settle(&self, supersede: bool, call: &VersionPin, failed: Option<bool>) {
        if supersede && !call.is_current() {
            return;
        }
        self.inner.state.send_modify(|state| {
            state.in_progress = false;
            if let Some(failed) = failed {
                state.failed = failed;
            }
        });
    }
}

impl<P, T, E, B> Callable<P> for AsyncAction<P, T, E, B>
where
    P: Clone + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
    B: Send + 'static,
{
    type Output = Pin<Box<dyn Future<Output = Result<(), ActionError<E>>> + Send>>;

    fn call(&self, args: P) -> Self::Output {
        let action = self.clone();
        Box::pin(async move { AsyncAction::call(&action, args).await })
    }
}

/// An [`AsyncAction`] living in a store tree as a leaf.
pub struct AsyncActionStore<P, T, E, B = ()> {
    action: AsyncAction<P, T, E, B>,
}

impl<P, T, E, B> AsyncActionStore<P, T, E, B> {
    pub fn new(action: AsyncAction<P, T, E, B>) -> Self {
        Self { action }
    }

    pub fn action(&self) -> &AsyncAction<P, T, E, B> {
        &self.action
    }

    /// A clone of the action that can be awaited away from the tree.
    pub fn handle(&self) -> AsyncAction<P, T, E, B> {
        self.action.clone()
    }
}

impl<P, T, E, B> Store for AsyncActionStore<P, T, E, B>
where
    P: 'static,
    T: 'static,
    E: 'static,
    B: 'static,
{
    /// Clears the failure flag of a settled action.
    fn on_store_reset(&mut self, _cx: &mut StoreCx<'_>) -> StoreResult<arbor_store::ResetHook> {
        self.action.inner.state.send_if_modified(|state| {
            let settled_failure = !state.in_progress && state.failed;
            if settled_failure {
                state.failed = false;
            }
            settled_failure
        });
        Ok(arbor_store::ResetHook::Handled)
    }
}

impl<P, T, E, B> Callable<P> for AsyncActionStore<P, T, E, B>
where
    P: Clone + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
    B: Send + 'static,
{
    type Output = <AsyncAction<P, T, E, B> as Callable<P>>::Output;

    fn call(&self, args: P) -> Self::Output {
        Callable::call(&self.action, args)
    }
}

/// Create an async action as a dynamic leaf store under `parent`.
pub fn create_async_action<P, T, E, B, F, Fut>(
    tree: &mut StoreTree,
    parent: NodeId,
    operation: F,
    options: ActionOptions<P, T, E, B>,
) -> StoreResult<StoreRef<AsyncActionStore<P, T, E, B>>>
where
    P: Clone + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
    B: Send + 'static,
    F: Fn(P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    tree.create_leaf_store(parent, move |_| {
        Ok(AsyncActionStore::new(AsyncAction::new(operation, options)))
    })
}
