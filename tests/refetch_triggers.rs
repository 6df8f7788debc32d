// Integration tests for the automatic refetch triggers
// These tests cover interval refetching, window visibility, and focus
// pulses, using short real intervals and generous settle windows.
// Unit tests for individual methods are in src/query.rs

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use freshet::prelude::*;
use tokio::time::sleep;

// Helper: register `key` with a producer that counts its calls
fn counting_query(
    client: &Arc<QueryClient>,
    key: &str,
    options: QueryOptions,
) -> (Arc<AtomicU32>, QueryHandle<u32>) {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    let handle = client.register(
        key,
        move || {
            let counter = Arc::clone(&counter);
            async move { Ok(counter.fetch_add(1, Ordering::SeqCst)) }
        },
        options,
    );
    (calls, handle)
}

#[tokio::test]
async fn test_interval_refetches_until_removed() {
    let client = Arc::new(QueryClient::new());
    let (calls, handle) = counting_query(
        &client,
        "ticking",
        QueryOptions::new().refetch_interval(Duration::from_millis(25)),
    );

    sleep(Duration::from_millis(140)).await;
    let ticked = calls.load(Ordering::SeqCst);
    assert!(ticked >= 3, "expected at least 3 fetches, saw {ticked}");

    handle.remove();
    sleep(Duration::from_millis(80)).await;
    assert_eq!(calls.load(Ordering::SeqCst), ticked);
}

#[tokio::test]
async fn test_interval_waits_one_period_before_the_first_refetch() {
    let client = Arc::new(QueryClient::new());
    let (calls, _handle) = counting_query(
        &client,
        "paced",
        QueryOptions::new().refetch_interval(Duration::from_millis(100)),
    );

    sleep(Duration::from_millis(40)).await;
    // only the registration fetch has run; the interval has not fired yet
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    sleep(Duration::from_millis(110)).await;
    assert!(calls.load(Ordering::SeqCst) >= 2);
}

#[tokio::test]
async fn test_interval_skips_ticks_while_hidden() {
    let client = Arc::new(QueryClient::new());
    let (calls, _handle) = counting_query(
        &client,
        "visible-only",
        QueryOptions::new()
            .refetch_on_window_focus(false)
            .refetch_interval(Duration::from_millis(25)),
    );
    client.set_window_visible(false);
    sleep(Duration::from_millis(10)).await;
    let before = calls.load(Ordering::SeqCst);
    assert_eq!(before, 1);

    sleep(Duration::from_millis(100)).await;
    assert_eq!(calls.load(Ordering::SeqCst), before);

    client.set_window_visible(true);
    sleep(Duration::from_millis(60)).await;
    assert!(calls.load(Ordering::SeqCst) > before);
}

#[tokio::test]
async fn test_interval_in_background_keeps_ticking_while_hidden() {
    let client = Arc::new(QueryClient::new());
    let (calls, _handle) = counting_query(
        &client,
        "always-ticking",
        QueryOptions::new()
            .refetch_on_window_focus(false)
            .refetch_interval(Duration::from_millis(25))
            .refetch_interval_in_background(true),
    );
    client.set_window_visible(false);

    sleep(Duration::from_millis(120)).await;
    assert!(calls.load(Ordering::SeqCst) >= 2);
}

#[tokio::test]
async fn test_reregistering_replaces_the_interval_task() {
    let client = Arc::new(QueryClient::new());
    let (first_calls, _handle) = counting_query(
        &client,
        "swapped",
        QueryOptions::new().refetch_interval(Duration::from_millis(40)),
    );
    sleep(Duration::from_millis(100)).await;
    assert!(first_calls.load(Ordering::SeqCst) >= 2);

    // the replacement has no interval, so the old loop must die with it
    let (second_calls, _handle) = counting_query(&client, "swapped", QueryOptions::new());
    sleep(Duration::from_millis(30)).await;
    let first_settled = first_calls.load(Ordering::SeqCst);
    let second_settled = second_calls.load(Ordering::SeqCst);
    assert!(second_settled >= 1);

    sleep(Duration::from_millis(120)).await;
    assert_eq!(first_calls.load(Ordering::SeqCst), first_settled);
    assert_eq!(second_calls.load(Ordering::SeqCst), second_settled);
}

#[tokio::test]
async fn test_focus_triggers_a_refetch_when_stale() {
    let client = Arc::new(QueryClient::new());
    // stale_time defaults to zero, so data is always stale
    let (calls, _handle) = counting_query(&client, "dashboard", QueryOptions::new());
    sleep(Duration::from_millis(20)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    client.notify_focus();
    sleep(Duration::from_millis(20)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // pulses are not coalesced
    client.notify_focus();
    client.notify_focus();
    sleep(Duration::from_millis(20)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_focus_refetch_skipped_while_fresh() {
    let client = Arc::new(QueryClient::new());
    let (calls, _handle) = counting_query(
        &client,
        "steady",
        QueryOptions::new().stale_time(Duration::from_secs(60)),
    );
    sleep(Duration::from_millis(20)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    client.notify_focus();
    sleep(Duration::from_millis(20)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_focus_refetch_disabled_by_option() {
    let client = Arc::new(QueryClient::new());
    let (calls, _handle) = counting_query(
        &client,
        "indifferent",
        QueryOptions::new().refetch_on_window_focus(false),
    );
    sleep(Duration::from_millis(20)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    client.notify_focus();
    sleep(Duration::from_millis(20)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_focus_refetch_respects_disabled_queries() {
    let client = Arc::new(QueryClient::new());
    let (calls, _handle) =
        counting_query(&client, "dormant", QueryOptions::new().enabled(false));
    sleep(Duration::from_millis(20)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    client.notify_focus();
    sleep(Duration::from_millis(20)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_clear_cancels_interval_tasks() {
    let client = Arc::new(QueryClient::new());
    let (calls, _handle) = counting_query(
        &client,
        "cleared",
        QueryOptions::new().refetch_interval(Duration::from_millis(20)),
    );
    sleep(Duration::from_millis(70)).await;
    assert!(calls.load(Ordering::SeqCst) >= 2);

    client.clear();
    let after = calls.load(Ordering::SeqCst);
    sleep(Duration::from_millis(80)).await;
    assert_eq!(calls.load(Ordering::SeqCst), after);
    assert!(client.get_query_state("cleared").is_idle());
}
