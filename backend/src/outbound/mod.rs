//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL account repository using Diesel
//! - **object_store**: profile pictures on a capability-scoped directory
//! - **notify**: verification publishers (webhook and log-only)
//! - **hashing**: Argon2id credential hashing
//! - **metrics**: Prometheus-backed metrics exporters (feature-gated)
//!
//! Adapters are thin translators between domain types and infrastructure
//! representations. They contain no business logic.

pub mod hashing;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod notify;
pub mod object_store;
pub mod persistence;
