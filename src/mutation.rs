//! One-shot writes with an observable lifecycle.
//!
//! Queries describe data the application reads; a [`Mutation`] describes a
//! write it performs. Mutations are standalone values rather than entries
//! in the [`QueryClient`](crate::query::QueryClient) tables: each carries
//! its own producer, [`MutationState`], and observer list, and is driven
//! explicitly through [`Mutation::mutate`].
//!
//! A mutation run walks `on_mutate -> producer -> on_success | on_error ->
//! on_settled`, awaiting each installed callback before the next step.
//! `on_mutate` may capture a context value (a rollback snapshot, a request
//! id) that is handed to every later callback. Invalidation of related
//! queries is the typical `on_success` body.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::time::sleep;

use crate::config::MutationOptions;
use crate::query::QueryError;
use crate::subscriber::panic_message;

/// Discrete lifecycle position of a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationStatus {
    /// Never run, or reset since the last run.
    Idle,
    /// A run is in flight.
    Loading,
    /// The last run produced output.
    Success,
    /// The last run failed.
    Error,
}

/// Observable snapshot of a mutation.
///
/// Unlike queries, mutations are not type-erased: the output type is a
/// parameter, so `data` needs no downcast.
#[derive(Debug, Clone)]
pub struct MutationState<O> {
    pub status: MutationStatus,
    /// Output of the most recent successful run.
    pub data: Option<O>,
    /// Error of the most recent failed run.
    pub error: Option<QueryError>,
}

impl<O> MutationState<O> {
    #[must_use]
    pub const fn idle() -> Self {
        Self {
            status: MutationStatus::Idle,
            data: None,
            error: None,
        }
    }

    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self.status, MutationStatus::Idle)
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self.status, MutationStatus::Loading)
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.status, MutationStatus::Success)
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self.status, MutationStatus::Error)
    }
}

impl<O> Default for MutationState<O> {
    fn default() -> Self {
        Self::idle()
    }
}

/// Type-erased mutation producer.
pub(crate) type MutationFn<I, O> =
    Arc<dyn Fn(I) -> BoxFuture<'static, Result<O, QueryError>> + Send + Sync>;

/// Receives every state transition of one mutation.
///
/// Blanket-implemented for closures, so
/// `mutation.subscribe(|state: &MutationState<_>| ...)` works directly.
pub trait MutationObserver<O>: Send + Sync {
    fn notify(&self, state: &MutationState<O>);
}

impl<O, F> MutationObserver<O> for F
where
    F: Fn(&MutationState<O>) + Send + Sync,
{
    fn notify(&self, state: &MutationState<O>) {
        self(state);
    }
}

fn notify_observer<O>(observer: &dyn MutationObserver<O>, state: &MutationState<O>) {
    if let Err(panic) = catch_unwind(AssertUnwindSafe(|| observer.notify(state))) {
        let message = panic_message(panic.as_ref());
        tracing::error!(panic = %message, "mutation observer panicked during notification");
    }
}

type ObserverList<O> = Vec<(u64, Arc<dyn MutationObserver<O>>)>;

/// Observer list shared by a mutation and its clones.
struct Observers<O> {
    list: Mutex<ObserverList<O>>,
    next_id: AtomicU64,
}

impl<O> Observers<O> {
    fn new() -> Self {
        Self {
            list: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ObserverList<O>> {
        self.list.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn attach(self: &Arc<Self>, observer: Arc<dyn MutationObserver<O>>) -> MutationSubscription<O> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().push((id, observer));
        MutationSubscription {
            observers: Arc::downgrade(self),
            id,
        }
    }

    fn deliver(&self, state: &MutationState<O>) {
        // clone the list out so observers run without the lock held
        let observers: Vec<Arc<dyn MutationObserver<O>>> = self
            .lock()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();
        for observer in observers {
            notify_observer(observer.as_ref(), state);
        }
    }

    fn detach(&self, id: u64) {
        self.lock().retain(|(observer_id, _)| *observer_id != id);
    }
}

/// Detaches a [`MutationObserver`] when asked.
///
/// Holds no strong reference to the mutation, so keeping a subscription
/// around never keeps the mutation alive.
pub struct MutationSubscription<O> {
    observers: Weak<Observers<O>>,
    id: u64,
}

impl<O> MutationSubscription<O> {
    /// Detaches the observer. Idempotent; a no-op once the mutation is gone.
    pub fn unsubscribe(&self) {
        if let Some(observers) = self.observers.upgrade() {
            observers.detach(self.id);
        }
    }
}

impl<O> Clone for MutationSubscription<O> {
    fn clone(&self) -> Self {
        Self {
            observers: self.observers.clone(),
            id: self.id,
        }
    }
}

impl<O> fmt::Debug for MutationSubscription<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationSubscription")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// A reusable one-shot write.
///
/// `I` is the input handed to [`mutate`](Self::mutate), `O` the producer's
/// output, and `Ctx` the optional context produced by the `on_mutate`
/// callback (defaulted to `()` when unused). Clones share state and
/// observers, so a mutation can be handed to several tasks and every one
/// of them observes the same lifecycle.
///
/// # Example
///
/// ```no_run
/// use freshet::prelude::*;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), QueryError> {
/// let double = Mutation::new(
///     |input: u32| async move { Ok(input * 2) },
///     MutationOptions::new(),
/// );
///
/// let output = double.mutate(21).await?;
/// assert_eq!(output, 42);
/// assert!(double.state().is_success());
/// # Ok(())
/// # }
/// ```
pub struct Mutation<I, O, Ctx = ()> {
    mutation_fn: MutationFn<I, O>,
    options: MutationOptions<I, O, Ctx>,
    state: Arc<Mutex<MutationState<O>>>,
    observers: Arc<Observers<O>>,
}

impl<I, O, Ctx> Mutation<I, O, Ctx> {
    fn lock_state(&self) -> MutexGuard<'_, MutationState<O>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<I, O, Ctx> Mutation<I, O, Ctx>
where
    I: Clone + Send + 'static,
    O: Clone + Send + 'static,
    Ctx: Clone + Send + 'static,
{
    pub fn new<F, Fut>(mutation_fn: F, options: MutationOptions<I, O, Ctx>) -> Self
    where
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, QueryError>> + Send + 'static,
    {
        Self {
            mutation_fn: Arc::new(move |input| mutation_fn(input).boxed()),
            options,
            state: Arc::new(Mutex::new(MutationState::idle())),
            observers: Arc::new(Observers::new()),
        }
    }

    /// Current snapshot.
    #[must_use]
    pub fn state(&self) -> MutationState<O> {
        self.lock_state().clone()
    }

    /// Attaches `observer`, synchronously handing it the current snapshot
    /// before this returns.
    pub fn subscribe(
        &self,
        observer: impl MutationObserver<O> + 'static,
    ) -> MutationSubscription<O> {
        let observer: Arc<dyn MutationObserver<O>> = Arc::new(observer);
        let subscription = self.observers.attach(Arc::clone(&observer));
        notify_observer(observer.as_ref(), &self.state());
        subscription
    }

    /// Returns the mutation to the idle snapshot and notifies observers.
    ///
    /// Reset does not interrupt a run in flight; a later terminal write
    /// simply overwrites the idle snapshot.
    pub fn reset(&self) {
        self.set_state(MutationState::idle());
        tracing::debug!("mutation reset");
    }

    fn set_state(&self, state: MutationState<O>) {
        *self.lock_state() = state.clone();
        self.observers.deliver(&state);
    }

    /// Runs the mutation with `variables`.
    ///
    /// The outcome is returned directly as well as recorded in state, so
    /// call sites can `?` on a mutation while observers track it. Fetches
    /// make the opposite choice and only surface errors through state
    /// (see [`QueryClient::fetch`](crate::query::QueryClient::fetch)).
    ///
    /// Overlapping runs on one mutation are not serialized; the last
    /// terminal write wins, exactly as with overlapping fetches.
    pub async fn mutate(&self, variables: I) -> Result<O, QueryError> {
        let ctx = match &self.options.on_mutate {
            Some(on_mutate) => match on_mutate(variables.clone()).await {
                Ok(ctx) => Some(ctx),
                Err(error) => {
                    tracing::warn!(error = %error, "on_mutate failed, continuing without context");
                    None
                }
            },
            None => None,
        };

        self.set_state(MutationState {
            status: MutationStatus::Loading,
            data: None,
            error: None,
        });
        tracing::debug!("mutation started");

        let mut attempt: u32 = 0;
        let outcome = loop {
            match (self.mutation_fn)(variables.clone()).await {
                Ok(output) => break Ok(output),
                Err(error) if self.options.retry.should_retry(attempt) => {
                    attempt += 1;
                    let delay = self.options.retry_delay.delay_for(attempt);
                    tracing::warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "mutation attempt failed, retrying"
                    );
                    sleep(delay).await;
                }
                Err(error) => break Err(error),
            }
        };

        match outcome {
            Ok(output) => {
                self.set_state(MutationState {
                    status: MutationStatus::Success,
                    data: Some(output.clone()),
                    error: None,
                });
                tracing::debug!(attempts = attempt + 1, "mutation succeeded");
                if let Some(on_success) = &self.options.on_success {
                    on_success(output.clone(), variables.clone(), ctx.clone()).await;
                }
                if let Some(on_settled) = &self.options.on_settled {
                    on_settled(Some(output.clone()), None, variables, ctx).await;
                }
                Ok(output)
            }
            Err(error) => {
                self.set_state(MutationState {
                    status: MutationStatus::Error,
                    data: None,
                    error: Some(error.clone()),
                });
                tracing::warn!(attempts = attempt + 1, error = %error, "mutation failed");
                if let Some(on_error) = &self.options.on_error {
                    on_error(error.clone(), variables.clone(), ctx.clone()).await;
                }
                if let Some(on_settled) = &self.options.on_settled {
                    on_settled(None, Some(error.clone()), variables, ctx).await;
                }
                Err(error)
            }
        }
    }
}

// derived Clone would demand Clone on the type parameters
impl<I, O, Ctx> Clone for Mutation<I, O, Ctx> {
    fn clone(&self) -> Self {
        Self {
            mutation_fn: Arc::clone(&self.mutation_fn),
            options: self.options.clone(),
            state: Arc::clone(&self.state),
            observers: Arc::clone(&self.observers),
        }
    }
}

impl<I, O, Ctx> fmt::Debug for Mutation<I, O, Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mutation")
            .field("status", &self.lock_state().status)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
