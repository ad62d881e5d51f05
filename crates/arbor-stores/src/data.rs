//! Data stores: loading, storing and resetting one piece of data.
//!
//! A [`DataStore`] owns the loading flags and the data value; the
//! application-specific part lives in a [`DataSource`]. Two version counters
//! protect the state from late results:
//!
//! - the load version makes only the latest [`load`](DataStore::load)
//!   effective
//! - the data version moves whenever the data is replaced or reset, and
//!   pins actions made with [`create_data_action`]

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use arbor_store::{ResetHook, Store, StoreCx, StoreRef, StoreResult, StoreTree};
use async_trait::async_trait;
use tokio::sync::watch;
use tracing::debug;

use crate::action::{create_async_action, ActionOptions, AsyncActionStore};
use crate::version::{DataVersion, OnCancel};

/// Observable state of a [`DataStore`].
#[derive(Clone, Debug, PartialEq)]
pub struct DataState<T> {
    /// Loaded data, or the source's default.
    pub data: T,
    /// The store holds data, possibly stale while a reload runs.
    pub has_data: bool,
    /// A load is running.
    pub is_loading: bool,
    /// The latest load failed.
    pub is_loading_failed: bool,
}

impl<T> DataState<T> {
    fn empty(data: T) -> Self {
        Self {
            data,
            has_data: false,
            is_loading: false,
            is_loading_failed: false,
        }
    }

    /// Data is present and no load is running.
    pub fn is_loaded(&self) -> bool {
        self.has_data && !self.is_loading
    }
}

/// The application side of a [`DataStore`].
#[async_trait]
pub trait DataSource: Send + Sync + 'static {
    type Data: Send + Sync + 'static;
    type Params: Clone + Send + Sync + 'static;
    type Error: Send + 'static;

    async fn on_load(&self, params: Self::Params) -> Result<Self::Data, Self::Error>;

    /// The value the data takes on init and reset.
    fn default_data(&self) -> Self::Data;

    /// Store loaded data. Replaces the data by default.
    fn on_success(&self, data: Self::Data, _params: &Self::Params, state: &mut DataState<Self::Data>) {
        state.data = data;
    }

    fn on_error(&self, _error: &Self::Error, _params: &Self::Params, _state: &mut DataState<Self::Data>) {}

    /// Runs after the state was reset on init, and on reset unless
    /// [`on_data_reset`](Self::on_data_reset) handles it.
    fn on_data_init(&self, _state: &mut DataState<Self::Data>) {}

    fn on_data_reset(&self, _state: &mut DataState<Self::Data>) -> ResetHook {
        ResetHook::Undefined
    }
}

struct DataInner<S: DataSource> {
    source: S,
    state: watch::Sender<DataState<S::Data>>,
    data_version: DataVersion,
    load_version: DataVersion,
}

/// A store that loads its data through a [`DataSource`].
///
/// Clones share state; clone one out of the tree to await
/// [`load`](Self::load).
pub struct DataStore<S: DataSource> {
    inner: Arc<DataInner<S>>,
}

impl<S: DataSource> Clone for DataStore<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: DataSource> fmt::Debug for DataStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("DataStore")
            .field("has_data", &state.has_data)
            .field("is_loading", &state.is_loading)
            .field("is_loading_failed", &state.is_loading_failed)
            .finish_non_exhaustive()
    }
}

impl<S: DataSource> DataStore<S> {
    pub fn new(source: S) -> Self {
        let (state, _) = watch::channel(DataState::empty(source.default_data()));
        Self {
            inner: Arc::new(DataInner {
                source,
                state,
                data_version: DataVersion::new(),
                load_version: DataVersion::new(),
            }),
        }
    }

    pub fn source(&self) -> &S {
        &self.inner.source
    }

    /// Read the current state without cloning it.
    pub fn with_state<R>(&self, f: impl FnOnce(&DataState<S::Data>) -> R) -> R {
        f(&self.inner.state.borrow())
    }

    pub fn snapshot(&self) -> DataState<S::Data>
    where
        S::Data: Clone,
    {
        self.inner.state.borrow().clone()
    }

    pub fn has_data(&self) -> bool {
        self.with_state(|s| s.has_data)
    }

    pub fn is_loading(&self) -> bool {
        self.with_state(|s| s.is_loading)
    }

    pub fn is_loading_failed(&self) -> bool {
        self.with_state(|s| s.is_loading_failed)
    }

    pub fn is_loaded(&self) -> bool {
        self.with_state(DataState::is_loaded)
    }

    pub fn subscribe(&self) -> watch::Receiver<DataState<S::Data>> {
        self.inner.state.subscribe()
    }

    /// Moves whenever the data is replaced, fails to load, or is reset.
    pub fn data_version(&self) -> &DataVersion {
        &self.inner.data_version
    }

    /// Load data through [`DataSource::on_load`].
    ///
    /// Only the latest load changes the state; an earlier load that
    /// finishes later is ignored, though its error is still returned.
    /// Dropping the latest load before it settles clears `is_loading` and
    /// keeps the data.
    pub async fn load(&self, params: S::Params) -> Result<(), S::Error> {
        let inner = &*self.inner;
        inner.load_version.next();
        let load = inner.load_version.pin();
        inner.state.send_modify(|state| state.is_loading = true);
        let cancelled = OnCancel::new(|| {
            if load.is_current() {
                debug!(load = load.pinned(), "load dropped before settling");
                inner.state.send_modify(|state| state.is_loading = false);
            }
        });

        let outcome = inner.source.on_load(params.clone()).await;
        cancelled.disarm();
        if !load.is_current() {
            debug!(load = load.pinned(), "stale load ignored");
            return outcome.map(drop);
        }
        inner.data_version.next();
        match outcome {
            Ok(data) => {
                inner.state.send_modify(|state| {
                    state.has_data = true;
                    inner.source.on_success(data, &params, state);
                    state.is_loading = false;
                    state.is_loading_failed = false;
                });
                Ok(())
            }
            Err(error) => {
                inner.state.send_modify(|state| {
                    state.has_data = false;
                    inner.source.on_error(&error, &params, state);
                    state.is_loading = false;
                    state.is_loading_failed = true;
                });
                Err(error)
            }
        }
    }

    fn reset_state(&self) {
        let inner = &*self.inner;
        inner.data_version.next();
        inner.state.send_modify(|state| {
            state.has_data = false;
            state.is_loading = false;
            state.is_loading_failed = false;
            state.data = inner.source.default_data();
        });
    }
}

impl<S: DataSource> Store for DataStore<S> {
    fn on_store_init(&mut self, _cx: &mut StoreCx<'_>) -> StoreResult<()> {
        self.reset_state();
        let source = &self.inner.source;
        self.inner.state.send_modify(|state| source.on_data_init(state));
        Ok(())
    }

    fn on_store_reset(&mut self, _cx: &mut StoreCx<'_>) -> StoreResult<ResetHook> {
        self.reset_state();
        let source = &self.inner.source;
        let mut hook = ResetHook::Undefined;
        self.inner.state.send_modify(|state| hook = source.on_data_reset(state));
        if hook == ResetHook::Undefined {
            self.inner.state.send_modify(|state| source.on_data_init(state));
        }
        Ok(ResetHook::Handled)
    }
}

/// Create an async action under a data store, pinned to its data version:
/// results arriving after the data changed skip their callbacks.
pub fn create_data_action<S, P, T, E, B, F, Fut>(
    tree: &mut StoreTree,
    store: StoreRef<DataStore<S>>,
    operation: F,
    options: ActionOptions<P, T, E, B>,
) -> StoreResult<StoreRef<AsyncActionStore<P, T, E, B>>>
where
    S: DataSource,
    P: Clone + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
    B: Send + 'static,
    F: Fn(P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    let version = tree.get(store)?.data_version().clone();
    create_async_action(tree, store.id(), operation, options.pin_version(version))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use arbor_store::Blueprint;
    use tokio::sync::Notify;

    /// Answers loads from a script, in order.
    struct Scripted {
        script: Mutex<VecDeque<Result<Vec<String>, String>>>,
        errors: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(script: Vec<Result<Vec<String>, String>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                errors: Mutex::default(),
            }
        }
    }

    #[async_trait]
    impl DataSource for Scripted {
        type Data = Vec<String>;
        type Params = ();
        type Error = String;

        async fn on_load(&self, _params: ()) -> Result<Vec<String>, String> {
            let next = self.script.lock().unwrap().pop_front();
            next.unwrap_or_else(|| Err("script exhausted".into()))
        }

        fn default_data(&self) -> Vec<String> {
            Vec::new()
        }

        fn on_error(&self, error: &String, _params: &(), _state: &mut DataState<Vec<String>>) {
            self.errors.lock().unwrap().push(error.clone());
        }
    }

    fn items(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[tokio::test]
    async fn failed_then_successful_load() {
        let store = DataStore::new(Scripted::new(vec![Err("offline".into()), Ok(items(&["a", "b"]))]));

        assert_eq!(store.load(()).await.unwrap_err(), "offline");
        assert!(store.is_loading_failed());
        assert!(!store.has_data());
        assert!(!store.is_loading());

        store.load(()).await.unwrap();
        let state = store.snapshot();
        assert!(state.has_data && state.is_loaded());
        assert!(!state.is_loading_failed);
        assert_eq!(state.data, items(&["a", "b"]));
        assert_eq!(*store.source().errors.lock().unwrap(), vec!["offline".to_string()]);
    }

    /// Each load waits for the gate of its own index.
    struct Gated {
        gates: [Notify; 2],
    }

    #[async_trait]
    impl DataSource for Gated {
        type Data = &'static str;
        type Params = usize;
        type Error = String;

        async fn on_load(&self, index: usize) -> Result<&'static str, String> {
            self.gates[index].notified().await;
            Ok(["first", "second"][index])
        }

        fn default_data(&self) -> &'static str {
            ""
        }
    }

    #[tokio::test]
    async fn dropped_load_stops_loading_and_keeps_data() {
        let store = DataStore::new(Gated {
            gates: [Notify::new(), Notify::new()],
        });
        store.source().gates[1].notify_one();
        store.load(1).await.unwrap();

        let timed_out = tokio::time::timeout(Duration::from_millis(5), store.load(0)).await;
        assert!(timed_out.is_err());
        let state = store.snapshot();
        assert!(!state.is_loading);
        assert!(state.is_loaded());
        assert_eq!(state.data, "second");
    }

    #[tokio::test]
    async fn only_the_latest_load_counts() {
        let store = DataStore::new(Gated {
            gates: [Notify::new(), Notify::new()],
        });
        let driver = async {
            tokio::task::yield_now().await;
            store.source().gates[1].notify_one();
            tokio::task::yield_now().await;
            store.source().gates[0].notify_one();
        };
        let (first, second, ()) = tokio::join!(store.load(0), store.load(1), driver);
        assert!(first.is_ok() && second.is_ok());
        let state = store.snapshot();
        assert_eq!(state.data, "second");
        assert!(state.is_loaded());
    }

    /// Counts init and reset hooks; handles reset itself when `own_reset`.
    struct Counting {
        own_reset: bool,
    }

    #[async_trait]
    impl DataSource for Counting {
        type Data = (u32, u32);
        type Params = u32;
        type Error = String;

        async fn on_load(&self, n: u32) -> Result<(u32, u32), String> {
            Ok((n, n))
        }

        fn default_data(&self) -> (u32, u32) {
            (0, 0)
        }

        fn on_data_init(&self, state: &mut DataState<(u32, u32)>) {
            state.data.0 += 100;
        }

        fn on_data_reset(&self, state: &mut DataState<(u32, u32)>) -> ResetHook {
            if !self.own_reset {
                return ResetHook::Undefined;
            }
            state.data.1 += 1;
            ResetHook::Handled
        }
    }

    struct Root;
    impl Store for Root {}

    fn tree_with(source: Counting) -> (StoreTree, StoreRef<DataStore<Counting>>) {
        let mut tree = StoreTree::default();
        let root = tree
            .create_root(move |cx| {
                cx.children([("data", Blueprint::new(move |_| Ok(DataStore::new(source))))])?;
                Ok(Root)
            })
            .unwrap();
        let data = tree.find::<DataStore<Counting>>(root.id(), "data").unwrap().unwrap();
        (tree, data)
    }

    #[tokio::test]
    async fn init_runs_data_init_on_default_state() {
        let (tree, data) = tree_with(Counting { own_reset: false });
        let store = tree.get(data).unwrap().clone();
        assert_eq!(store.snapshot().data, (100, 0));
        store.load(7).await.unwrap();
        assert_eq!(store.snapshot().data, (7, 7));
    }

    #[tokio::test]
    async fn reset_without_reset_hook_reinitializes() {
        let (mut tree, data) = tree_with(Counting { own_reset: false });
        let store = tree.get(data).unwrap().clone();
        store.load(7).await.unwrap();
        tree.reset_store(data.id()).unwrap();
        let state = store.snapshot();
        assert_eq!(state.data, (100, 0));
        assert!(!state.has_data);
    }

    #[tokio::test]
    async fn reset_hook_replaces_init() {
        let (mut tree, data) = tree_with(Counting { own_reset: true });
        tree.reset_store(data.id()).unwrap();
        tree.reset_store(data.id()).unwrap();
        assert_eq!(tree.get(data).unwrap().snapshot().data, (0, 1));
    }

    #[tokio::test]
    async fn data_action_skips_callbacks_after_data_changed() {
        let (mut tree, data) = tree_with(Counting { own_reset: false });
        let store = tree.get(data).unwrap().clone();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let gate = Arc::new(Notify::new());
        let action = create_data_action(
            &mut tree,
            data,
            {
                let gate = gate.clone();
                move |n: u32| {
                    let gate = gate.clone();
                    async move {
                        gate.notified().await;
                        Ok::<u32, String>(n)
                    }
                }
            },
            ActionOptions::new().on_success({
                let seen = seen.clone();
                move |n: u32, _: Option<&()>, _: &u32| seen.lock().unwrap().push(n)
            }),
        )
        .unwrap();
        assert_eq!(tree.parent(action.id()), Some(data.id()));
        let action = tree.get(action).unwrap().handle();

        let reload = async {
            tokio::task::yield_now().await;
            store.load(1).await.unwrap();
            gate.notify_one();
        };
        let (result, ()) = tokio::join!(action.call(5), reload);
        assert!(result.is_ok());
        assert!(seen.lock().unwrap().is_empty());

        gate.notify_one();
        action.call(6).await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![6]);
    }
}
