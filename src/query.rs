//! The query lifecycle engine.
//!
//! [`QueryClient`] owns every keyed table: the value cache, the
//! per-key [`QueryState`] snapshots, the registered producers with their
//! [`QueryOptions`], the subscriber lists, and the background tasks that
//! drive interval and focus refetches. Callers address everything by
//! string key; [`QueryHandle`] layers a typed facade over the same
//! operations.
//!
//! # Lifecycle
//!
//! A key moves through `Idle -> Loading -> {Success, Error}`. Once data
//! has landed, later fetches keep the previous status and data visible
//! and only raise [`QueryState::is_fetching`] (stale-while-revalidate);
//! `Loading` is reserved for a key that has never shown anything.
//!
//! Overlapping fetches for one key are deliberately not coalesced: each
//! runs its own producer call and the last one to settle performs the
//! final state write. Removal is different: [`QueryClient::remove_query_data`]
//! and [`QueryClient::clear`] fence off in-flight fetches so a late
//! resolution cannot resurrect a removed key.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use futures::FutureExt;
use futures::future::BoxFuture;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval, sleep};
use tokio_util::sync::CancellationToken;

use crate::cache::{CacheStore, QueryData};
use crate::config::QueryOptions;
use crate::focus::FocusTracker;
use crate::subscriber::{QueryObserver, SubscriberRegistry, SubscriptionHandle, notify_guarded};

/// Error carried by queries and mutations.
///
/// The engine never manufactures these on its own; they originate in
/// producer and mutation code and travel through state, callbacks, and
/// logs unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// A query producer failed.
    #[error("Fetch failed: {0}")]
    Fetch(String),

    /// A mutation function failed.
    #[error("Mutation failed: {0}")]
    Mutation(String),
}

/// Discrete lifecycle position of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryStatus {
    /// Registered (or unknown) and never fetched.
    Idle,
    /// First fetch in flight, no data has ever been shown.
    Loading,
    /// The last settled fetch produced data.
    Success,
    /// The last settled fetch failed.
    Error,
}

/// Observable snapshot of one key.
///
/// Snapshots are plain values: data is shared behind an [`Arc`], so
/// cloning is cheap and holding one never blocks the engine.
#[derive(Clone)]
pub struct QueryState {
    /// Lifecycle position; the `is_*` methods are projections of this.
    pub status: QueryStatus,
    /// Data from the most recent successful fetch, if any.
    pub data: Option<QueryData>,
    /// Error from the most recent failed fetch, cleared on success.
    pub error: Option<QueryError>,
    /// `true` while a fetch, including its retries, is in flight.
    pub is_fetching: bool,
    /// When `data` was last written.
    pub data_updated_at: Option<Instant>,
    /// When `error` was last written.
    pub error_updated_at: Option<Instant>,
    /// Top-level fetches started for this key; retries do not count.
    pub fetch_count: u64,
}

impl QueryState {
    /// The canonical default snapshot, also reported for unknown keys.
    #[must_use]
    pub const fn idle() -> Self {
        Self {
            status: QueryStatus::Idle,
            data: None,
            error: None,
            is_fetching: false,
            data_updated_at: None,
            error_updated_at: None,
            fetch_count: 0,
        }
    }

    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self.status, QueryStatus::Idle)
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self.status, QueryStatus::Loading)
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.status, QueryStatus::Success)
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self.status, QueryStatus::Error)
    }

    /// Downcasts the data to its concrete type.
    ///
    /// Returns `None` when no data is present or when `T` is not the
    /// type the producer yielded.
    #[must_use]
    pub fn data_as<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.data.clone().and_then(|data| data.downcast::<T>().ok())
    }
}

impl Default for QueryState {
    fn default() -> Self {
        Self::idle()
    }
}

impl fmt::Debug for QueryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryState")
            .field("status", &self.status)
            .field("data", &self.data.as_ref().map(|_| ".."))
            .field("error", &self.error)
            .field("is_fetching", &self.is_fetching)
            .field("data_updated_at", &self.data_updated_at)
            .field("error_updated_at", &self.error_updated_at)
            .field("fetch_count", &self.fetch_count)
            .finish()
    }
}

/// Type-erased producer stored per key.
pub(crate) type Producer =
    Arc<dyn Fn() -> BoxFuture<'static, Result<QueryData, QueryError>> + Send + Sync>;

/// Registered producer plus its options; last registration wins.
struct QueryConfig {
    producer: Producer,
    options: QueryOptions,
}

fn erase_producer<T, F, Fut>(producer: F) -> Producer
where
    T: Send + Sync + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, QueryError>> + Send + 'static,
{
    Arc::new(move || {
        let fut = producer();
        async move { fut.await.map(|value| Arc::new(value) as QueryData) }.boxed()
    })
}

/// Owns one background task and cancels it on drop.
struct TaskHandle {
    token: CancellationToken,
    join: JoinHandle<()>,
}

impl TaskHandle {
    fn new(token: CancellationToken, join: JoinHandle<()>) -> Self {
        Self { token, join }
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.token.cancel();
        self.join.abort();
    }
}

/// Background tasks serving one key: at most one interval loop and one
/// focus listener.
#[derive(Default)]
struct KeyTasks {
    interval: Option<TaskHandle>,
    focus: Option<TaskHandle>,
}

/// The engine: one owner for every keyed table.
///
/// Clients are self-contained; two clients never share state. Share one
/// across an application as `Arc<QueryClient>` — [`register`](Self::register)
/// and the automatic refetch triggers spawn background work and must run
/// inside a Tokio runtime.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
///
/// use freshet::prelude::*;
///
/// # #[tokio::main]
/// # async fn main() {
/// let client = Arc::new(QueryClient::new());
///
/// let users = client.register(
///     "users",
///     || async { Ok::<_, QueryError>(vec!["ada".to_owned()]) },
///     QueryOptions::new(),
/// );
/// # let _ = users;
/// # }
/// ```
pub struct QueryClient {
    cache: CacheStore,
    states: DashMap<String, QueryState>,
    configs: DashMap<String, QueryConfig>,
    subscribers: Arc<SubscriberRegistry>,
    tasks: DashMap<String, KeyTasks>,
    // per-key removal generation; a fetch drops its terminal write when
    // the generation moved underneath it
    fences: DashMap<String, u64>,
    focus: FocusTracker,
}

impl QueryClient {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: CacheStore::new(),
            states: DashMap::new(),
            configs: DashMap::new(),
            subscribers: Arc::new(SubscriberRegistry::new()),
            tasks: DashMap::new(),
            fences: DashMap::new(),
            focus: FocusTracker::new(),
        }
    }

    /// Registers `producer` under `key` and schedules the initial fetch.
    ///
    /// Re-registering a key overwrites its producer and options and
    /// replaces its background tasks; existing state and cached data are
    /// left alone. The initial fetch runs on a spawned task rather than
    /// inline, so a subscription wired right after `register` returns
    /// still observes every transition.
    ///
    /// With [`QueryOptions::enabled`] off nothing fetches automatically;
    /// an explicit [`fetch`](Self::fetch) still works.
    pub fn register<T, F, Fut>(
        self: &Arc<Self>,
        key: &str,
        producer: F,
        options: QueryOptions,
    ) -> QueryHandle<T>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, QueryError>> + Send + 'static,
    {
        self.tasks.remove(key);
        self.configs.insert(
            key.to_owned(),
            QueryConfig {
                producer: erase_producer(producer),
                options: options.clone(),
            },
        );
        self.states
            .entry(key.to_owned())
            .or_insert_with(QueryState::idle);

        let mut tasks = KeyTasks::default();
        if options.refetch_on_window_focus {
            tasks.focus = Some(self.spawn_focus_listener(key));
        }
        if options.enabled {
            if let Some(period) = options.refetch_interval {
                if !period.is_zero() {
                    tasks.interval = Some(self.spawn_interval_loop(key, period));
                }
            }
        }
        self.tasks.insert(key.to_owned(), tasks);
        tracing::debug!(key, enabled = options.enabled, "query registered");

        if options.enabled {
            self.spawn_fetch(key);
        }

        QueryHandle {
            client: Arc::clone(self),
            key: key.to_owned(),
            _value: PhantomData,
        }
    }

    /// Registers `producer` under `key` and runs one fetch right away.
    ///
    /// Unlike [`register`](Self::register) there is no deferral, no
    /// handle, and no background task: prefetching only warms the cache
    /// so a later registration starts out with data.
    pub async fn prefetch<T, F, Fut>(
        &self,
        key: &str,
        producer: F,
        options: QueryOptions,
    ) -> Option<QueryData>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, QueryError>> + Send + 'static,
    {
        self.configs.insert(
            key.to_owned(),
            QueryConfig {
                producer: erase_producer(producer),
                options,
            },
        );
        self.states
            .entry(key.to_owned())
            .or_insert_with(QueryState::idle);
        tracing::debug!(key, "prefetch");
        self.fetch(key).await
    }

    /// Runs the registered producer for `key`, retrying per its options.
    ///
    /// Returns the fetched data on success and `None` on terminal
    /// failure or when no producer is registered. Fetch errors surface
    /// through state, subscribers, and the `on_error` callback, never
    /// through the return value; mutations make the opposite choice
    /// (see [`Mutation::mutate`](crate::mutation::Mutation::mutate)).
    pub async fn fetch(&self, key: &str) -> Option<QueryData> {
        let (producer, options) = match self.configs.get(key) {
            Some(config) => (Arc::clone(&config.producer), config.options.clone()),
            None => return None,
        };
        let fence = self.fence_value(key);

        let mut entering = self.get_query_state(key);
        entering.fetch_count += 1;
        entering.is_fetching = true;
        let cached = self.cache.get(key, options.cache_time);
        if options.keep_previous_data && (entering.data.is_some() || cached.is_some()) {
            if entering.data.is_none() {
                entering.data = cached;
            }
        } else {
            entering.status = QueryStatus::Loading;
            entering.data = None;
        }
        self.states.insert(key.to_owned(), entering.clone());
        self.subscribers.deliver(key, &entering);
        tracing::debug!(key, fetch_count = entering.fetch_count, "fetch started");

        let mut attempt: u32 = 0;
        let outcome = loop {
            match producer().await {
                Ok(value) => break Ok(value),
                Err(error) if options.retry.should_retry(attempt) => {
                    attempt += 1;
                    let delay = options.retry_delay.delay_for(attempt);
                    tracing::warn!(
                        key,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "fetch attempt failed, retrying"
                    );
                    sleep(delay).await;
                }
                Err(error) => break Err(error),
            }
        };

        if self.fence_value(key) != fence {
            tracing::debug!(key, "fetch settled after removal, outcome dropped");
            return None;
        }

        match outcome {
            Ok(value) => {
                self.cache.insert(key, Arc::clone(&value));
                let mut state = self.get_query_state(key);
                state.status = QueryStatus::Success;
                state.data = Some(Arc::clone(&value));
                state.error = None;
                state.is_fetching = false;
                state.data_updated_at = Some(Instant::now());
                self.states.insert(key.to_owned(), state.clone());
                self.subscribers.deliver(key, &state);
                tracing::debug!(key, attempts = attempt + 1, "fetch succeeded");
                if let Some(on_success) = &options.on_success {
                    on_success(&value);
                }
                if let Some(on_settled) = &options.on_settled {
                    on_settled(Some(&value), None);
                }
                Some(value)
            }
            Err(error) => {
                let mut state = self.get_query_state(key);
                state.status = QueryStatus::Error;
                state.error = Some(error.clone());
                state.is_fetching = false;
                state.error_updated_at = Some(Instant::now());
                self.states.insert(key.to_owned(), state.clone());
                self.subscribers.deliver(key, &state);
                tracing::warn!(key, attempts = attempt + 1, error = %error, "fetch failed");
                if let Some(on_error) = &options.on_error {
                    on_error(&error);
                }
                if let Some(on_settled) = &options.on_settled {
                    on_settled(None, Some(&error));
                }
                None
            }
        }
    }

    /// Alias of [`fetch`](Self::fetch), kept for symmetry with the other
    /// key-addressed operations.
    pub async fn refetch(&self, key: &str) -> Option<QueryData> {
        self.fetch(key).await
    }

    /// Drops the cached value for `key` and fetches it again.
    pub async fn invalidate(&self, key: &str) -> Option<QueryData> {
        self.cache.remove(key);
        tracing::debug!(key, "cache invalidated");
        self.fetch(key).await
    }

    /// Attaches `observer` to `key`.
    ///
    /// The observer synchronously receives the current snapshot before
    /// this returns, then every later transition of the key until
    /// [`SubscriptionHandle::unsubscribe`] is called. Subscribing to a
    /// key that was never registered is allowed; the first delivery is
    /// the idle default.
    pub fn subscribe(
        &self,
        key: &str,
        observer: impl QueryObserver + 'static,
    ) -> SubscriptionHandle {
        let observer: Arc<dyn QueryObserver> = Arc::new(observer);
        let handle = self.subscribers.subscribe(key, Arc::clone(&observer));
        let snapshot = self.get_query_state(key);
        notify_guarded(key, observer.as_ref(), &snapshot);
        handle
    }

    /// Marks an in-flight fetch as no longer fetching, best-effort.
    ///
    /// Only the [`QueryState::is_fetching`] flag flips; the producer
    /// call and any pending retries keep running and their terminal
    /// state write still lands. Keys with no fetch in flight are left
    /// untouched.
    pub fn cancel(&self, key: &str) {
        let snapshot = match self.states.get_mut(key) {
            Some(mut state) if state.is_fetching => {
                state.is_fetching = false;
                state.value().clone()
            }
            _ => return,
        };
        self.subscribers.deliver(key, &snapshot);
        tracing::debug!(key, "fetch flagged as canceled");
    }

    /// Current snapshot for `key`; unknown keys report the idle default
    /// without creating an entry.
    #[must_use]
    pub fn get_query_state(&self, key: &str) -> QueryState {
        self.states
            .get(key)
            .map_or_else(QueryState::idle, |state| state.value().clone())
    }

    /// Cached value for `key`, if present and not expired.
    #[must_use]
    pub fn get_query_data(&self, key: &str) -> Option<QueryData> {
        let cache_time = self
            .configs
            .get(key)
            .and_then(|config| config.options.cache_time);
        self.cache.get(key, cache_time)
    }

    /// Writes `value` for `key` directly, as if a fetch had succeeded.
    ///
    /// Cache and state are updated and subscribers notified
    /// synchronously; no producer runs. This is the hook for optimistic
    /// updates and externally sourced data.
    pub fn set_query_data<T: Send + Sync + 'static>(&self, key: &str, value: T) -> QueryData {
        let value: QueryData = Arc::new(value);
        self.apply_local_success(key, Arc::clone(&value));
        value
    }

    fn apply_local_success(&self, key: &str, value: QueryData) {
        self.cache.insert(key, Arc::clone(&value));
        let mut state = self.get_query_state(key);
        state.status = QueryStatus::Success;
        state.data = Some(value);
        state.error = None;
        state.data_updated_at = Some(Instant::now());
        self.states.insert(key.to_owned(), state.clone());
        self.subscribers.deliver(key, &state);
        tracing::debug!(key, "data set locally");
    }

    /// Removes every trace of `key`: cached value, state, producer,
    /// subscribers, and background tasks.
    ///
    /// A fetch in flight for the key keeps running, but its outcome is
    /// discarded instead of re-populating the removed entry.
    pub fn remove_query_data(&self, key: &str) {
        self.bump_fence(key);
        self.tasks.remove(key);
        self.cache.remove(key);
        self.states.remove(key);
        self.configs.remove(key);
        self.subscribers.remove_key(key);
        tracing::debug!(key, "query removed");
    }

    /// Resets the client to its initial empty state.
    ///
    /// Background tasks are canceled and every table emptied. Each
    /// subscriber receives exactly one final notification carrying the
    /// idle default before its registration is dropped.
    pub fn clear(&self) {
        let keys: Vec<String> = self
            .states
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        for key in &keys {
            self.bump_fence(key);
        }
        self.tasks.clear();
        self.cache.clear();
        self.states.clear();
        self.configs.clear();

        let idle = QueryState::idle();
        for (key, observers) in self.subscribers.drain() {
            for (_, observer) in observers {
                notify_guarded(&key, observer.as_ref(), &idle);
            }
        }
        tracing::debug!(keys = keys.len(), "client cleared");
    }

    /// Signals that the application window regained focus.
    ///
    /// Every enabled key registered with
    /// [`QueryOptions::refetch_on_window_focus`] refetches, unless its
    /// data is still fresh under its [`QueryOptions::stale_time`].
    pub fn notify_focus(&self) {
        self.focus.notify();
    }

    /// Records whether the application window is currently visible.
    ///
    /// Interval refetches skip their tick while hidden unless the key
    /// sets [`QueryOptions::refetch_interval_in_background`]. New
    /// clients start out visible.
    pub fn set_window_visible(&self, visible: bool) {
        self.focus.set_visible(visible);
    }

    fn bump_fence(&self, key: &str) {
        *self.fences.entry(key.to_owned()).or_insert(0) += 1;
    }

    fn fence_value(&self, key: &str) -> u64 {
        self.fences.get(key).map_or(0, |fence| *fence)
    }

    fn spawn_fetch(self: &Arc<Self>, key: &str) {
        let client = Arc::clone(self);
        let key = key.to_owned();
        tokio::spawn(async move {
            client.fetch(&key).await;
        });
    }

    fn spawn_focus_listener(self: &Arc<Self>, key: &str) -> TaskHandle {
        let token = CancellationToken::new();
        let task_token = token.clone();
        let client = Arc::downgrade(self);
        let key = key.to_owned();
        let mut focus_rx = self.focus.subscribe();
        let join = tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = task_token.cancelled() => break,
                    received = focus_rx.recv() => match received {
                        Ok(()) => match client.upgrade() {
                            Some(client) => client.fetch_on_focus(&key),
                            None => break,
                        },
                        // missed pulses collapse into the next one
                        Err(broadcast::error::RecvError::Lagged(_)) => {}
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
        });
        TaskHandle::new(token, join)
    }

    fn fetch_on_focus(self: &Arc<Self>, key: &str) {
        let options = match self.configs.get(key) {
            Some(config) => config.options.clone(),
            None => return,
        };
        if !options.enabled {
            return;
        }
        if !self.cache.is_stale(key, options.stale_time) {
            tracing::debug!(key, "focus refetch skipped, data still fresh");
            return;
        }
        tracing::debug!(key, "focus refetch");
        self.spawn_fetch(key);
    }

    fn spawn_interval_loop(self: &Arc<Self>, key: &str, period: Duration) -> TaskHandle {
        let token = CancellationToken::new();
        let task_token = token.clone();
        let client = Arc::downgrade(self);
        let key = key.to_owned();
        let join = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // the interval's first tick completes immediately; the first
            // refetch should wait a full period
            ticker.tick().await;
            loop {
                tokio::select! {
                    () = task_token.cancelled() => break,
                    _ = ticker.tick() => match client.upgrade() {
                        Some(client) => client.fetch_on_interval(&key),
                        None => break,
                    },
                }
            }
        });
        TaskHandle::new(token, join)
    }

    fn fetch_on_interval(self: &Arc<Self>, key: &str) {
        let in_background = match self.configs.get(key) {
            Some(config) => config.options.refetch_interval_in_background,
            None => return,
        };
        if !in_background && !self.focus.is_visible() {
            tracing::debug!(key, "interval refetch skipped, window hidden");
            return;
        }
        tracing::debug!(key, "interval refetch");
        self.spawn_fetch(key);
    }
}

impl Default for QueryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryClient")
            .field("keys", &self.configs.len())
            .field("states", &self.states.len())
            .field("cached", &self.cache.len())
            .finish_non_exhaustive()
    }
}

/// Typed view over one registered key.
///
/// A handle pairs a key with the value type its producer yields, so the
/// downcast out of the type-erased cache happens in one place. Handles
/// are cheap to clone and all clones address the same key on the same
/// client.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
///
/// use freshet::prelude::*;
///
/// # #[tokio::main]
/// # async fn main() {
/// let client = Arc::new(QueryClient::new());
/// let counter = client.register(
///     "counter",
///     || async { Ok::<_, QueryError>(41u64) },
///     QueryOptions::new(),
/// );
///
/// if let Some(value) = counter.fetch().await {
///     assert_eq!(*value, 41);
/// }
/// # }
/// ```
pub struct QueryHandle<T> {
    client: Arc<QueryClient>,
    key: String,
    _value: PhantomData<fn() -> T>,
}

impl<T> Clone for QueryHandle<T> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            key: self.key.clone(),
            _value: PhantomData,
        }
    }
}

impl<T> fmt::Debug for QueryHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryHandle")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl<T: Send + Sync + 'static> QueryHandle<T> {
    /// The key this handle addresses.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current snapshot of the key.
    #[must_use]
    pub fn state(&self) -> QueryState {
        self.client.get_query_state(&self.key)
    }

    /// Cached value, downcast to the producer's type.
    #[must_use]
    pub fn data(&self) -> Option<Arc<T>> {
        self.client
            .get_query_data(&self.key)
            .and_then(|data| data.downcast::<T>().ok())
    }

    /// Typed [`QueryClient::fetch`].
    pub async fn fetch(&self) -> Option<Arc<T>> {
        self.client
            .fetch(&self.key)
            .await
            .and_then(|data| data.downcast::<T>().ok())
    }

    /// Typed [`QueryClient::refetch`].
    pub async fn refetch(&self) -> Option<Arc<T>> {
        self.fetch().await
    }

    /// Typed [`QueryClient::invalidate`].
    pub async fn invalidate(&self) -> Option<Arc<T>> {
        self.client
            .invalidate(&self.key)
            .await
            .and_then(|data| data.downcast::<T>().ok())
    }

    /// See [`QueryClient::cancel`].
    pub fn cancel(&self) {
        self.client.cancel(&self.key);
    }

    /// Typed [`QueryClient::set_query_data`].
    pub fn set_data(&self, value: T) -> Arc<T> {
        let value = Arc::new(value);
        self.client
            .apply_local_success(&self.key, Arc::clone(&value) as QueryData);
        value
    }

    /// See [`QueryClient::remove_query_data`].
    pub fn remove(&self) {
        self.client.remove_query_data(&self.key);
    }

    /// See [`QueryClient::subscribe`].
    pub fn subscribe(&self, observer: impl QueryObserver + 'static) -> SubscriptionHandle {
        self.client.subscribe(&self.key, observer)
    }
}
