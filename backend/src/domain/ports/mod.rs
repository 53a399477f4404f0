//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (repositories, stores, publishers, hashers, metrics) are
//! implemented by outbound adapters. Driving ports (commands, queries, login)
//! are implemented by the lifecycle service and called by inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod account_command;
mod account_metrics;
mod account_query;
mod account_repository;
mod credential_hasher;
mod login_service;
mod profile_image_store;
mod store_health;
mod verification_publisher;

#[cfg(test)]
pub use account_command::MockAccountCommand;
pub use account_command::AccountCommand;
#[cfg(test)]
pub use account_metrics::MockAccountMetrics;
pub use account_metrics::{
    AccountMetrics, AccountMetricsError, AccountOperation, NoOpAccountMetrics,
};
#[cfg(test)]
pub use account_query::MockAccountQuery;
pub use account_query::AccountQuery;
#[cfg(test)]
pub use account_repository::MockAccountRepository;
pub use account_repository::{
    AccountRepository, AccountRepositoryError, FixtureAccountRepository,
};
#[cfg(test)]
pub use credential_hasher::MockCredentialHasher;
pub use credential_hasher::{CredentialHasher, CredentialHasherError};
#[cfg(test)]
pub use login_service::MockLoginService;
pub use login_service::LoginService;
#[cfg(test)]
pub use profile_image_store::MockProfileImageStore;
pub use profile_image_store::{ProfileImageStore, ProfileImageStoreError};
#[cfg(test)]
pub use store_health::MockStoreHealth;
pub use store_health::StoreHealth;
#[cfg(test)]
pub use verification_publisher::MockVerificationPublisher;
pub use verification_publisher::{VerificationPublisher, VerificationPublisherError};
