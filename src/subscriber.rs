//! State change notification.
//!
//! Subscribers attach to a key and receive a [`QueryState`] snapshot on
//! every transition of that key. Delivery is synchronous on the thread that
//! performed the transition; a subscriber that panics is logged and skipped
//! without disturbing the rest of the list.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;

use crate::query::QueryState;

/// Receives state snapshots for one key.
///
/// Implemented for free by any `Fn(&QueryState) + Send + Sync` closure, so
/// most callers never name this trait:
///
/// ```no_run
/// # use freshet::query::{QueryClient, QueryState};
/// # let client = QueryClient::new();
/// let subscription = client.subscribe("todos", |state: &QueryState| {
///     println!("todos is now {:?}", state.status);
/// });
/// ```
pub trait QueryObserver: Send + Sync {
    fn notify(&self, state: &QueryState);
}

impl<F> QueryObserver for F
where
    F: Fn(&QueryState) + Send + Sync,
{
    fn notify(&self, state: &QueryState) {
        self(state);
    }
}

pub(crate) type ObserverList = Vec<(u64, Arc<dyn QueryObserver>)>;

/// Per-key observer lists shared by one [`QueryClient`](crate::query::QueryClient).
pub(crate) struct SubscriberRegistry {
    observers: DashMap<String, ObserverList>,
    next_id: AtomicU64,
}

impl SubscriberRegistry {
    pub(crate) fn new() -> Self {
        Self {
            observers: DashMap::new(),
            next_id: AtomicU64::new(0),
        }
    }

    /// Registers `observer` under `key` and returns its handle.
    ///
    /// The immediate snapshot required on subscription is the caller's job;
    /// the registry only manages membership.
    pub(crate) fn subscribe(
        self: &Arc<Self>,
        key: &str,
        observer: Arc<dyn QueryObserver>,
    ) -> SubscriptionHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.observers
            .entry(key.to_owned())
            .or_default()
            .push((id, observer));
        SubscriptionHandle {
            registry: Arc::downgrade(self),
            key: key.to_owned(),
            id,
        }
    }

    fn unsubscribe(&self, key: &str, id: u64) {
        if let Some(mut list) = self.observers.get_mut(key) {
            list.retain(|(observer_id, _)| *observer_id != id);
        }
        self.observers.remove_if(key, |_, list| list.is_empty());
    }

    /// Delivers `state` to every observer of `key`.
    ///
    /// The list is cloned out first so no map guard is held while observer
    /// code runs; observers may subscribe or unsubscribe reentrantly.
    pub(crate) fn deliver(&self, key: &str, state: &QueryState) {
        let observers: Vec<Arc<dyn QueryObserver>> = match self.observers.get(key) {
            Some(list) => list.iter().map(|(_, obs)| Arc::clone(obs)).collect(),
            None => return,
        };
        for observer in observers {
            notify_guarded(key, observer.as_ref(), state);
        }
    }

    /// Drops every observer of `key` without notifying anyone.
    pub(crate) fn remove_key(&self, key: &str) {
        self.observers.remove(key);
    }

    /// Empties the registry, returning the removed lists so the caller can
    /// send a final notification after membership is already gone.
    pub(crate) fn drain(&self) -> Vec<(String, ObserverList)> {
        let keys: Vec<String> = self
            .observers
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        keys.into_iter()
            .filter_map(|key| self.observers.remove(&key))
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn len(&self, key: &str) -> usize {
        self.observers.get(key).map_or(0, |list| list.len())
    }
}

/// Calls one observer, containing any panic it raises.
pub(crate) fn notify_guarded(key: &str, observer: &dyn QueryObserver, state: &QueryState) {
    if let Err(panic) = catch_unwind(AssertUnwindSafe(|| observer.notify(state))) {
        let message = panic_message(panic.as_ref());
        tracing::error!(key, panic = %message, "subscriber panicked during notification");
    }
}

/// Best-effort readable rendering of a panic payload.
pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_owned())
}

/// Membership token returned by [`QueryClient::subscribe`](crate::query::QueryClient::subscribe).
///
/// Dropping the handle does not unsubscribe; call
/// [`unsubscribe`](SubscriptionHandle::unsubscribe) explicitly. The call is
/// idempotent and safe after the client itself is gone.
#[derive(Debug, Clone)]
pub struct SubscriptionHandle {
    registry: Weak<SubscriberRegistry>,
    key: String,
    id: u64,
}

impl SubscriptionHandle {
    /// The key this subscription observes.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Removes the observer from its key. Calling twice is a no-op.
    pub fn unsubscribe(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.unsubscribe(&self.key, self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::query::QueryStatus;

    fn collector() -> (Arc<Mutex<Vec<QueryStatus>>>, Arc<dyn QueryObserver>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let observer: Arc<dyn QueryObserver> = Arc::new(move |state: &QueryState| {
            sink.lock().unwrap().push(state.status);
        });
        (seen, observer)
    }

    #[test]
    fn test_deliver_reaches_every_observer_of_the_key() {
        let registry = Arc::new(SubscriberRegistry::new());
        let (seen_a, observer_a) = collector();
        let (seen_b, observer_b) = collector();
        registry.subscribe("todos", observer_a);
        registry.subscribe("todos", observer_b);

        registry.deliver("todos", &QueryState::idle());

        assert_eq!(seen_a.lock().unwrap().as_slice(), &[QueryStatus::Idle]);
        assert_eq!(seen_b.lock().unwrap().as_slice(), &[QueryStatus::Idle]);
    }

    #[test]
    fn test_deliver_skips_other_keys() {
        let registry = Arc::new(SubscriberRegistry::new());
        let (seen, observer) = collector();
        registry.subscribe("todos", observer);

        registry.deliver("users", &QueryState::idle());

        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let registry = Arc::new(SubscriberRegistry::new());
        let (seen, observer) = collector();
        let handle = registry.subscribe("todos", observer);
        assert_eq!(registry.len("todos"), 1);

        handle.unsubscribe();
        handle.unsubscribe();
        assert_eq!(registry.len("todos"), 0);

        registry.deliver("todos", &QueryState::idle());
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_unsubscribe_after_registry_drop_is_harmless() {
        let registry = Arc::new(SubscriberRegistry::new());
        let (_, observer) = collector();
        let handle = registry.subscribe("todos", observer);

        drop(registry);
        handle.unsubscribe();
    }

    #[test]
    fn test_panicking_observer_does_not_stop_delivery() {
        let registry = Arc::new(SubscriberRegistry::new());
        let panicking: Arc<dyn QueryObserver> =
            Arc::new(|_: &QueryState| panic!("observer bug"));
        let (seen, observer) = collector();
        registry.subscribe("todos", panicking);
        registry.subscribe("todos", observer);

        registry.deliver("todos", &QueryState::idle());

        assert_eq!(seen.lock().unwrap().as_slice(), &[QueryStatus::Idle]);
    }

    #[test]
    fn test_unsubscribing_one_leaves_the_other() {
        let registry = Arc::new(SubscriberRegistry::new());
        let (seen_a, observer_a) = collector();
        let (seen_b, observer_b) = collector();
        let handle_a = registry.subscribe("todos", observer_a);
        registry.subscribe("todos", observer_b);

        handle_a.unsubscribe();
        registry.deliver("todos", &QueryState::idle());

        assert!(seen_a.lock().unwrap().is_empty());
        assert_eq!(seen_b.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_remove_key_drops_every_observer_silently() {
        let registry = Arc::new(SubscriberRegistry::new());
        let (seen_a, observer_a) = collector();
        let (seen_b, observer_b) = collector();
        registry.subscribe("todos", observer_a);
        registry.subscribe("todos", observer_b);

        registry.remove_key("todos");
        registry.deliver("todos", &QueryState::idle());

        assert!(seen_a.lock().unwrap().is_empty());
        assert!(seen_b.lock().unwrap().is_empty());
        assert_eq!(registry.len("todos"), 0);
    }

    #[test]
    fn test_drain_returns_every_list_and_empties_the_registry() {
        let registry = Arc::new(SubscriberRegistry::new());
        let (seen, observer) = collector();
        registry.subscribe("todos", observer);
        let (_, other) = collector();
        registry.subscribe("users", other);

        let drained = registry.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(registry.len("todos"), 0);
        assert_eq!(registry.len("users"), 0);

        registry.deliver("todos", &QueryState::idle());
        assert!(seen.lock().unwrap().is_empty());

        for (key, observers) in drained {
            for (_, observer) in observers {
                notify_guarded(&key, observer.as_ref(), &QueryState::idle());
            }
        }
        assert_eq!(seen.lock().unwrap().as_slice(), &[QueryStatus::Idle]);
    }
}
