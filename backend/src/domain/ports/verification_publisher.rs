//! Port for announcing newly issued verification tokens.
//!
//! The service publishes a small JSON document to a named topic; a downstream
//! consumer turns it into an email. Delivery is outside this service.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised by notification adapters.
    pub enum VerificationPublisherError {
        /// The notification channel could not be reached.
        Transport { message: String } =>
            "verification publish transport failed: {message}",
        /// The channel answered but refused the message.
        Rejected { status: u16, message: String } =>
            "verification publish rejected with status {status}: {message}",
    }
}

/// Fire-and-forget publisher for verification events.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VerificationPublisher: Send + Sync {
    /// Publish `payload` to `topic`.
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), VerificationPublisherError>;
}
