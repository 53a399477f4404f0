//! Port for probing the account store's reachability.

use async_trait::async_trait;

/// Reachability check used by the health endpoint.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StoreHealth: Send + Sync {
    /// Return `true` when the store accepts a trivial round trip.
    async fn is_reachable(&self) -> bool;
}
