//! Verification publisher adapters.
//!
//! [`WebhookVerificationPublisher`] posts each event to an HTTP endpoint;
//! [`LoggingVerificationPublisher`] only records it in the trace log and is
//! used when no webhook is configured. [`ConfiguredPublisher`] holds
//! whichever of the two the deployment selected.

mod logging_publisher;
mod webhook_publisher;

use async_trait::async_trait;

pub use logging_publisher::LoggingVerificationPublisher;
pub use webhook_publisher::WebhookVerificationPublisher;

use crate::domain::ports::{VerificationPublisher, VerificationPublisherError};

/// Publisher chosen at startup from configuration.
pub enum ConfiguredPublisher {
    Webhook(WebhookVerificationPublisher),
    Logging(LoggingVerificationPublisher),
}

#[async_trait]
impl VerificationPublisher for ConfiguredPublisher {
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), VerificationPublisherError> {
        match self {
            Self::Webhook(publisher) => publisher.publish(topic, payload).await,
            Self::Logging(publisher) => publisher.publish(topic, payload).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use reqwest::Url;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn logging_variant_delegates() {
        let publisher = ConfiguredPublisher::Logging(LoggingVerificationPublisher::new(false));
        publisher
            .publish("user-verification", "{}")
            .await
            .expect("logging publisher succeeds");
    }

    #[rstest]
    #[tokio::test]
    async fn webhook_variant_surfaces_transport_failures() {
        let endpoint = Url::parse("http://127.0.0.1:9/hooks/verify").expect("url");
        let webhook = WebhookVerificationPublisher::new(endpoint, Duration::from_millis(200))
            .expect("client");
        let err = ConfiguredPublisher::Webhook(webhook)
            .publish("user-verification", "{}")
            .await
            .expect_err("nothing listens on the discard port");
        assert_eq!(err.kind(), "transport");
    }
}
