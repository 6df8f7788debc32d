//! Prelude module for convenient imports.
//!
//! ```
//! use freshet::prelude::*;
//! ```
//!
//! # What's included
//!
//! - [`QueryClient`] and [`QueryHandle`] - Registering and driving queries
//! - [`QueryState`], [`QueryStatus`], and [`QueryError`] - What observers see
//! - [`QueryData`] - The type-erased cached value
//! - [`QueryOptions`] and [`MutationOptions`] - Configuration builders
//! - [`Mutation`], [`MutationState`], and [`MutationStatus`] - One-shot writes
//! - [`RetryPolicy`] and [`RetryDelay`] - Retry budget and backoff
//! - [`QueryObserver`] and [`SubscriptionHandle`] - Subscription plumbing

pub use crate::cache::QueryData;
pub use crate::config::{MutationOptions, QueryOptions};
pub use crate::mutation::{
    Mutation, MutationObserver, MutationState, MutationStatus, MutationSubscription,
};
pub use crate::query::{QueryClient, QueryError, QueryHandle, QueryState, QueryStatus};
pub use crate::retry::{RetryDelay, RetryPolicy};
pub use crate::subscriber::{QueryObserver, SubscriptionHandle};
