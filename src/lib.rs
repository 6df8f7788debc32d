//! # Freshet - Async Query and Mutation Caching
//!
//! Freshet is an in-process caching layer for async data, built around the
//! stale-while-revalidate discipline: show what you have, refetch in the
//! background, and tell everyone who is watching when something changed.
//! Data is addressed by string key, fetched by an async producer you
//! register once, and observed through cheap cloneable snapshots.
//!
//! ## Core Components
//!
//! - [`QueryClient`](query::QueryClient): Owns the cache, per-key state, and
//!   automatic refetch triggers
//! - [`QueryHandle`](query::QueryHandle): Typed view over one registered key
//! - [`Mutation`](mutation::Mutation): A one-shot write with lifecycle
//!   callbacks
//! - [`QueryOptions`](config::QueryOptions) and
//!   [`MutationOptions`](config::MutationOptions): Per-key and per-mutation
//!   configuration
//! - [`RetryPolicy`](retry::RetryPolicy) and [`RetryDelay`](retry::RetryDelay):
//!   Retry budget and backoff shared by both
//!
//! ## Lifecycle
//!
//! 1. **Register**: Bind an async producer and its options to a key
//! 2. **Fetch**: The producer runs, retrying on failure per its policy
//! 3. **Subscribe**: Observers receive the current snapshot, then every
//!    transition
//! 4. **Refetch**: Intervals, window focus, and explicit invalidation keep
//!    data current
//! 5. **Mutate**: Writes run through [`Mutation`](mutation::Mutation) and
//!    typically invalidate the queries they touched
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use freshet::prelude::*;
//!
//! #[derive(Debug)]
//! struct User {
//!     name: String,
//! }
//!
//! async fn load_users() -> Result<Vec<User>, QueryError> {
//!     // talk to your backend here
//!     Ok(vec![User { name: "ada".to_owned() }])
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = Arc::new(QueryClient::new());
//!
//!     let users = client.register(
//!         "users",
//!         load_users,
//!         QueryOptions::new()
//!             .stale_time(Duration::from_secs(30))
//!             .refetch_interval(Duration::from_secs(60)),
//!     );
//!
//!     let subscription = users.subscribe(|state: &QueryState| {
//!         if let Some(users) = state.data_as::<Vec<User>>() {
//!             println!("{} users loaded", users.len());
//!         }
//!     });
//!
//!     // drive your application; the client refetches in the background
//!
//!     subscription.unsubscribe();
//! }
//! ```
//!
//! ## Stale-While-Revalidate
//!
//! A key is `Loading` only while it has never produced anything. Once data
//! exists, refetches keep the previous data and status visible and raise
//! [`QueryState::is_fetching`](query::QueryState::is_fetching) instead, so
//! consumers render stale data rather than a spinner. Opt out per key with
//! [`QueryOptions::keep_previous_data`](config::QueryOptions::keep_previous_data).
//!
//! ## Design Inspiration
//!
//! The API follows [TanStack Query](https://tanstack.com/query), adapted
//! for Rust applications running on [tokio](https://tokio.rs/).

pub mod cache;
pub mod config;
mod focus;
pub mod mutation;
pub mod prelude;
pub mod query;
pub mod retry;
pub mod subscriber;
