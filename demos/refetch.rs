//! Interval and focus refetching example.
//!
//! This example shows:
//! - A query refetching on a fixed interval
//! - Interval ticks pausing while the window is hidden
//! - A focus pulse refetching data that went stale meanwhile
//! - Removing a query and stopping its background work
//!
//! Run with: `cargo run --example refetch`

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use color_eyre::eyre::Result;
use freshet::prelude::*;
use tokio::time::sleep;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let client = Arc::new(QueryClient::new());

    // Each fetch reports a new build number.
    let version = Arc::new(AtomicU32::new(0));
    let source = Arc::clone(&version);
    let status = client.register(
        "build-status",
        move || {
            let source = Arc::clone(&source);
            async move { Ok(format!("build #{}", source.fetch_add(1, Ordering::SeqCst))) }
        },
        QueryOptions::new()
            .refetch_interval(Duration::from_millis(300))
            .stale_time(Duration::from_millis(200)),
    );
    let subscription = status.subscribe(|state: &QueryState| {
        if let Some(build) = state.data_as::<String>() {
            println!("[build-status] {build}");
        }
    });

    println!("-- interval refetching for one second --");
    sleep(Duration::from_secs(1)).await;

    println!("-- window hidden, ticks pause --");
    client.set_window_visible(false);
    sleep(Duration::from_millis(700)).await;

    println!("-- focus returns, the pulse refetches the now-stale data --");
    client.set_window_visible(true);
    client.notify_focus();
    sleep(Duration::from_millis(100)).await;

    println!("-- interval keeps going while visible --");
    sleep(Duration::from_millis(400)).await;

    println!("-- removing the query stops the background work --");
    status.remove();
    sleep(Duration::from_millis(700)).await;

    subscription.unsubscribe();
    Ok(())
}
