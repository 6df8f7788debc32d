//! Window focus and visibility signals.
//!
//! The engine has no window of its own, so the embedding application feeds
//! focus events in through [`QueryClient`](crate::query::QueryClient). Each
//! key with focus refetch enabled holds a broadcast receiver and reacts to
//! the pulses pushed here.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::broadcast;

const FOCUS_CHANNEL_CAPACITY: usize = 16;

pub(crate) struct FocusTracker {
    focus_tx: broadcast::Sender<()>,
    visible: AtomicBool,
}

impl FocusTracker {
    /// Starts out visible, matching an application launched in the
    /// foreground.
    pub(crate) fn new() -> Self {
        let (focus_tx, _) = broadcast::channel(FOCUS_CHANNEL_CAPACITY);
        Self {
            focus_tx,
            visible: AtomicBool::new(true),
        }
    }

    /// Broadcasts a focus pulse to every listening key.
    pub(crate) fn notify(&self) {
        // send only fails when no key is listening
        let _ = self.focus_tx.send(());
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<()> {
        self.focus_tx.subscribe()
    }

    pub(crate) fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::Release);
    }

    pub(crate) fn is_visible(&self) -> bool {
        self.visible.load(Ordering::Acquire)
    }
}

impl Default for FocusTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_notify_reaches_subscribers() {
        let tracker = FocusTracker::new();
        let mut rx = tracker.subscribe();

        tracker.notify();

        assert!(rx.recv().await.is_ok());
    }

    #[test]
    fn test_notify_without_subscribers_is_harmless() {
        let tracker = FocusTracker::new();
        tracker.notify();
    }

    #[test]
    fn test_visibility_defaults_to_visible() {
        let tracker = FocusTracker::new();
        assert!(tracker.is_visible());
    }

    #[test]
    fn test_visibility_round_trip() {
        let tracker = FocusTracker::new();
        tracker.set_visible(false);
        assert!(!tracker.is_visible());
        tracker.set_visible(true);
        assert!(tracker.is_visible());
    }
}
