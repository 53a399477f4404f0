//! Publisher that writes verification events to the log only.

use async_trait::async_trait;
use tracing::info;

use crate::domain::ports::{VerificationPublisher, VerificationPublisherError};

/// Log-only verification publisher for local development.
///
/// The payload carries a live token, so it is logged at `info` only when
/// `log_payload` is set.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingVerificationPublisher {
    log_payload: bool,
}

impl LoggingVerificationPublisher {
    pub fn new(log_payload: bool) -> Self {
        Self { log_payload }
    }
}

#[async_trait]
impl VerificationPublisher for LoggingVerificationPublisher {
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), VerificationPublisherError> {
        if self.log_payload {
            info!(topic, payload, "verification event published");
        } else {
            info!(topic, bytes = payload.len(), "verification event published");
        }
        Ok(())
    }
}
