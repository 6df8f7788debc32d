//! Per-key and per-mutation configuration.
//!
//! [`QueryOptions`] travels with a key at registration time and controls
//! freshness, retries, and automatic refetching for that key alone.
//! [`MutationOptions`] carries the lifecycle callbacks of a one-shot write.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::cache::QueryData;
use crate::query::QueryError;
use crate::retry::{RetryDelay, RetryPolicy};

/// Synchronous callback invoked after a fetch succeeds.
pub type QuerySuccessCallback = Arc<dyn Fn(&QueryData) + Send + Sync>;

/// Synchronous callback invoked after a fetch fails terminally.
pub type QueryErrorCallback = Arc<dyn Fn(&QueryError) + Send + Sync>;

/// Synchronous callback invoked after either fetch outcome.
pub type QuerySettledCallback =
    Arc<dyn Fn(Option<&QueryData>, Option<&QueryError>) + Send + Sync>;

/// Settings applied to a single registered key.
///
/// Every field has a default, so `QueryOptions::new()` is a complete
/// configuration and callers chain only what they want to change:
///
/// ```
/// use std::time::Duration;
/// use freshet::config::QueryOptions;
///
/// let options = QueryOptions::new()
///     .stale_time(Duration::from_secs(30))
///     .retry(1)
///     .refetch_interval(Duration::from_secs(60));
/// ```
#[derive(Clone)]
pub struct QueryOptions {
    /// Whether the key fetches at all (default: `true`).
    ///
    /// A disabled key never fetches automatically, not even on focus or
    /// interval; an explicit [`refetch`](crate::query::QueryClient::refetch)
    /// still works.
    pub enabled: bool,
    /// How long fetched data counts as fresh (default: zero).
    ///
    /// Fresh data suppresses focus refetches. Zero means data is stale the
    /// moment it lands.
    pub stale_time: Duration,
    /// How long cached data is retained (default: `None`, kept forever).
    ///
    /// Expiry is enforced lazily when the cache is read.
    pub cache_time: Option<Duration>,
    /// Retry budget for failed fetches (default: 3 retries).
    pub retry: RetryPolicy,
    /// Pause between retry attempts (default: exponential backoff).
    pub retry_delay: RetryDelay,
    /// Refetch when the window regains focus (default: `true`).
    ///
    /// Only stale data refetches; see [`QueryOptions::stale_time`].
    pub refetch_on_window_focus: bool,
    /// Refetch on a fixed period (default: `None`, no interval).
    pub refetch_interval: Option<Duration>,
    /// Keep the interval ticking while the window is hidden
    /// (default: `false`).
    pub refetch_interval_in_background: bool,
    /// During a refetch, keep showing the previous data instead of
    /// reverting to `Loading` with no data (default: `true`).
    pub keep_previous_data: bool,
    /// Invoked after a successful fetch with the fetched data
    /// (default: none).
    ///
    /// Query callbacks run synchronously inside the fetch path and,
    /// unlike subscribers, are not panic-isolated.
    pub on_success: Option<QuerySuccessCallback>,
    /// Invoked after a terminally failed fetch (default: none).
    pub on_error: Option<QueryErrorCallback>,
    /// Invoked after every settled fetch, with whichever side applies
    /// populated (default: none).
    pub on_settled: Option<QuerySettledCallback>,
}

impl QueryOptions {
    #[must_use]
    pub fn new() -> Self {
        Self {
            enabled: true,
            stale_time: Duration::ZERO,
            cache_time: None,
            retry: RetryPolicy::default(),
            retry_delay: RetryDelay::default(),
            refetch_on_window_focus: true,
            refetch_interval: None,
            refetch_interval_in_background: false,
            keep_previous_data: true,
            on_success: None,
            on_error: None,
            on_settled: None,
        }
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    #[must_use]
    pub fn stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    #[must_use]
    pub fn cache_time(mut self, cache_time: Duration) -> Self {
        self.cache_time = Some(cache_time);
        self
    }

    /// Accepts a budget (`u32`), `true` for the default budget, or `false`
    /// for no retries.
    #[must_use]
    pub fn retry(mut self, retry: impl Into<RetryPolicy>) -> Self {
        self.retry = retry.into();
        self
    }

    #[must_use]
    pub fn retry_delay(mut self, retry_delay: RetryDelay) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    #[must_use]
    pub fn refetch_on_window_focus(mut self, refetch: bool) -> Self {
        self.refetch_on_window_focus = refetch;
        self
    }

    #[must_use]
    pub fn refetch_interval(mut self, interval: Duration) -> Self {
        self.refetch_interval = Some(interval);
        self
    }

    #[must_use]
    pub fn refetch_interval_in_background(mut self, in_background: bool) -> Self {
        self.refetch_interval_in_background = in_background;
        self
    }

    #[must_use]
    pub fn keep_previous_data(mut self, keep: bool) -> Self {
        self.keep_previous_data = keep;
        self
    }

    /// Installs the success callback; `data` arrives type-erased and can
    /// be inspected with `downcast_ref`.
    #[must_use]
    pub fn on_success(mut self, f: impl Fn(&QueryData) + Send + Sync + 'static) -> Self {
        self.on_success = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn on_error(mut self, f: impl Fn(&QueryError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn on_settled(
        mut self,
        f: impl Fn(Option<&QueryData>, Option<&QueryError>) + Send + Sync + 'static,
    ) -> Self {
        self.on_settled = Some(Arc::new(f));
        self
    }
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for QueryOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryOptions")
            .field("enabled", &self.enabled)
            .field("stale_time", &self.stale_time)
            .field("cache_time", &self.cache_time)
            .field("retry", &self.retry)
            .field("retry_delay", &self.retry_delay)
            .field("refetch_on_window_focus", &self.refetch_on_window_focus)
            .field("refetch_interval", &self.refetch_interval)
            .field(
                "refetch_interval_in_background",
                &self.refetch_interval_in_background,
            )
            .field("keep_previous_data", &self.keep_previous_data)
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_settled", &self.on_settled.is_some())
            .finish()
    }
}

/// Runs before the mutation producer; its `Ok` value becomes the context
/// handed to the later callbacks.
pub type MutateCallback<I, Ctx> =
    Arc<dyn Fn(I) -> BoxFuture<'static, Result<Ctx, QueryError>> + Send + Sync>;

/// Runs after the producer succeeds.
pub type SuccessCallback<I, O, Ctx> =
    Arc<dyn Fn(O, I, Option<Ctx>) -> BoxFuture<'static, ()> + Send + Sync>;

/// Runs after the producer fails terminally.
pub type ErrorCallback<I, Ctx> =
    Arc<dyn Fn(QueryError, I, Option<Ctx>) -> BoxFuture<'static, ()> + Send + Sync>;

/// Runs after either outcome, with whichever side is populated.
pub type SettledCallback<I, O, Ctx> = Arc<
    dyn Fn(Option<O>, Option<QueryError>, I, Option<Ctx>) -> BoxFuture<'static, ()> + Send + Sync,
>;

/// Settings and lifecycle callbacks for a [`Mutation`](crate::mutation::Mutation).
///
/// Callbacks receive owned clones of the input, output, and context, so
/// the parameter types must be `Clone`. Each callback is awaited before the
/// next lifecycle step runs:
///
/// `on_mutate` -> producer -> `on_success` or `on_error` -> `on_settled`.
pub struct MutationOptions<I, O, Ctx = ()> {
    /// Retry budget for the producer (default: no retries).
    pub retry: RetryPolicy,
    /// Pause between retry attempts (default: exponential backoff).
    pub retry_delay: RetryDelay,
    pub on_mutate: Option<MutateCallback<I, Ctx>>,
    pub on_success: Option<SuccessCallback<I, O, Ctx>>,
    pub on_error: Option<ErrorCallback<I, Ctx>>,
    pub on_settled: Option<SettledCallback<I, O, Ctx>>,
}

impl<I, O> MutationOptions<I, O> {
    /// Context-free options.
    ///
    /// Pins `Ctx` to `()` so type inference goes through when no
    /// `on_mutate` callback is installed; use
    /// [`with_context`](MutationOptions::with_context) otherwise.
    #[must_use]
    pub fn new() -> Self {
        Self::with_context()
    }
}

impl<I, O, Ctx> MutationOptions<I, O, Ctx> {
    /// Options whose `on_mutate` callback produces a `Ctx` that is
    /// threaded into the later callbacks.
    #[must_use]
    pub fn with_context() -> Self {
        Self {
            retry: RetryPolicy::never(),
            retry_delay: RetryDelay::default(),
            on_mutate: None,
            on_success: None,
            on_error: None,
            on_settled: None,
        }
    }

    #[must_use]
    pub fn retry(mut self, retry: impl Into<RetryPolicy>) -> Self {
        self.retry = retry.into();
        self
    }

    #[must_use]
    pub fn retry_delay(mut self, retry_delay: RetryDelay) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Installs the pre-flight callback.
    ///
    /// Returning `Err` is logged and the mutation continues with no
    /// context; it does not abort the mutation.
    #[must_use]
    pub fn on_mutate<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Ctx, QueryError>> + Send + 'static,
    {
        self.on_mutate = Some(Arc::new(move |input| f(input).boxed()));
        self
    }

    #[must_use]
    pub fn on_success<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(O, I, Option<Ctx>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_success = Some(Arc::new(move |output, input, ctx| {
            f(output, input, ctx).boxed()
        }));
        self
    }

    #[must_use]
    pub fn on_error<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(QueryError, I, Option<Ctx>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_error = Some(Arc::new(move |error, input, ctx| {
            f(error, input, ctx).boxed()
        }));
        self
    }

    #[must_use]
    pub fn on_settled<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Option<O>, Option<QueryError>, I, Option<Ctx>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_settled = Some(Arc::new(move |output, error, input, ctx| {
            f(output, error, input, ctx).boxed()
        }));
        self
    }
}

impl<I, O, Ctx> Default for MutationOptions<I, O, Ctx> {
    fn default() -> Self {
        Self::with_context()
    }
}

// derived Clone would demand Clone on the type parameters
impl<I, O, Ctx> Clone for MutationOptions<I, O, Ctx> {
    fn clone(&self) -> Self {
        Self {
            retry: self.retry,
            retry_delay: self.retry_delay.clone(),
            on_mutate: self.on_mutate.clone(),
            on_success: self.on_success.clone(),
            on_error: self.on_error.clone(),
            on_settled: self.on_settled.clone(),
        }
    }
}

impl<I, O, Ctx> fmt::Debug for MutationOptions<I, O, Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationOptions")
            .field("retry", &self.retry)
            .field("retry_delay", &self.retry_delay)
            .field("on_mutate", &self.on_mutate.is_some())
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_settled", &self.on_settled.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_defaults() {
        let options = QueryOptions::new();
        assert!(options.enabled);
        assert_eq!(options.stale_time, Duration::ZERO);
        assert_eq!(options.cache_time, None);
        assert_eq!(options.retry.max_retries(), 3);
        assert!(options.refetch_on_window_focus);
        assert_eq!(options.refetch_interval, None);
        assert!(!options.refetch_interval_in_background);
        assert!(options.keep_previous_data);
        assert!(options.on_success.is_none());
        assert!(options.on_error.is_none());
        assert!(options.on_settled.is_none());
    }

    #[test]
    fn test_query_builder_overrides() {
        let options = QueryOptions::new()
            .enabled(false)
            .stale_time(Duration::from_secs(30))
            .cache_time(Duration::from_secs(300))
            .retry(false)
            .refetch_on_window_focus(false)
            .refetch_interval(Duration::from_secs(5))
            .refetch_interval_in_background(true)
            .keep_previous_data(false);

        assert!(!options.enabled);
        assert_eq!(options.stale_time, Duration::from_secs(30));
        assert_eq!(options.cache_time, Some(Duration::from_secs(300)));
        assert_eq!(options.retry.max_retries(), 0);
        assert!(!options.refetch_on_window_focus);
        assert_eq!(options.refetch_interval, Some(Duration::from_secs(5)));
        assert!(options.refetch_interval_in_background);
        assert!(!options.keep_previous_data);
    }

    #[test]
    fn test_query_retry_accepts_budget_and_bool() {
        assert_eq!(QueryOptions::new().retry(5u32).retry.max_retries(), 5);
        assert_eq!(QueryOptions::new().retry(true).retry.max_retries(), 3);
        assert_eq!(QueryOptions::new().retry(false).retry.max_retries(), 0);
    }

    #[test]
    fn test_query_builder_installs_callbacks() {
        let options = QueryOptions::new()
            .on_success(|_data| {})
            .on_error(|_error| {})
            .on_settled(|_data, _error| {});

        assert!(options.on_success.is_some());
        assert!(options.on_error.is_some());
        assert!(options.on_settled.is_some());
    }

    #[test]
    fn test_mutation_defaults_to_no_retries_and_no_callbacks() {
        let options: MutationOptions<u32, u32> = MutationOptions::new();
        assert_eq!(options.retry.max_retries(), 0);
        assert!(options.on_mutate.is_none());
        assert!(options.on_success.is_none());
        assert!(options.on_error.is_none());
        assert!(options.on_settled.is_none());
    }

    #[test]
    fn test_mutation_builder_installs_callbacks() {
        let options: MutationOptions<u32, u32, ()> = MutationOptions::new()
            .retry(2u32)
            .on_mutate(|_input| async { Ok(()) })
            .on_success(|_output, _input, _ctx| async {})
            .on_error(|_error, _input, _ctx| async {})
            .on_settled(|_output, _error, _input, _ctx| async {});

        assert_eq!(options.retry.max_retries(), 2);
        assert!(options.on_mutate.is_some());
        assert!(options.on_success.is_some());
        assert!(options.on_error.is_some());
        assert!(options.on_settled.is_some());
    }

    #[test]
    fn test_mutation_with_context_pins_the_context_type() {
        let options: MutationOptions<u32, u32, String> = MutationOptions::with_context()
            .on_mutate(|input: u32| async move { Ok(format!("snapshot-{input}")) });

        assert!(options.on_mutate.is_some());
        assert_eq!(options.retry.max_retries(), 0);
    }
}
