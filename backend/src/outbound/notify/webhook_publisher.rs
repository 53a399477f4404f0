//! Reqwest-backed verification publisher.
//!
//! Sends `POST <endpoint>` with a JSON body `{"topic": ..., "message": ...}`
//! where `message` is the event payload as a string. Any 2xx answer counts
//! as delivered.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use tracing::debug;

use crate::domain::ports::{VerificationPublisher, VerificationPublisherError};

const USER_AGENT: &str = concat!("account-backend/", env!("CARGO_PKG_VERSION"));
const BODY_PREVIEW_LIMIT: usize = 160;

#[derive(Debug, Serialize)]
struct PublishEnvelope<'a> {
    topic: &'a str,
    message: &'a str,
}

/// Publisher that forwards verification events to a webhook.
pub struct WebhookVerificationPublisher {
    client: Client,
    endpoint: Url,
}

impl WebhookVerificationPublisher {
    /// Build a publisher with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl VerificationPublisher for WebhookVerificationPublisher {
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), VerificationPublisherError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&PublishEnvelope {
                topic,
                message: payload,
            })
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if status.is_success() {
            debug!(topic, status = status.as_u16(), "verification event delivered");
            return Ok(());
        }
        let body = response.bytes().await.unwrap_or_default();
        Err(map_status_error(status, body.as_ref()))
    }
}

fn map_transport_error(error: reqwest::Error) -> VerificationPublisherError {
    VerificationPublisherError::transport(error.to_string())
}

fn map_status_error(status: StatusCode, body: &[u8]) -> VerificationPublisherError {
    VerificationPublisherError::rejected(status.as_u16(), body_preview(body))
}

fn body_preview(body: &[u8]) -> String {
    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if compact.chars().count() > BODY_PREVIEW_LIMIT {
        let preview: String = compact.chars().take(BODY_PREVIEW_LIMIT).collect();
        format!("{preview}...")
    } else {
        compact
    }
}

#[cfg(test)]
mod tests {
    //! Coverage for the non-network helpers.

    use super::*;
    use rstest::rstest;
    use serde_json::{Value, json};

    #[rstest]
    fn envelope_nests_payload_as_string() {
        let envelope = PublishEnvelope {
            topic: "user-verification",
            message: r#"{"receiverEmail":"jane@example.com","token":"abc"}"#,
        };
        let value: Value = serde_json::to_value(&envelope).expect("serialise");
        assert_eq!(
            value,
            json!({
                "topic": "user-verification",
                "message": "{\"receiverEmail\":\"jane@example.com\",\"token\":\"abc\"}"
            })
        );
    }

    #[rstest]
    #[case(StatusCode::BAD_REQUEST, b"bad   topic\n".as_slice(), 400, "bad topic")]
    #[case(StatusCode::SERVICE_UNAVAILABLE, b"".as_slice(), 503, "")]
    fn rejected_status_keeps_code_and_preview(
        #[case] status: StatusCode,
        #[case] body: &[u8],
        #[case] code: u16,
        #[case] message: &str,
    ) {
        let err = map_status_error(status, body);
        assert_eq!(err, VerificationPublisherError::rejected(code, message));
        assert_eq!(err.kind(), "rejected");
    }

    #[rstest]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(BODY_PREVIEW_LIMIT + 10);
        let preview = body_preview(body.as_bytes());
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), BODY_PREVIEW_LIMIT + 3);
    }

    #[rstest]
    fn builds_with_endpoint() {
        let endpoint = Url::parse("http://127.0.0.1:9/hooks/verify").expect("url");
        let publisher =
            WebhookVerificationPublisher::new(endpoint.clone(), Duration::from_secs(1))
                .expect("client");
        assert_eq!(publisher.endpoint(), &endpoint);
    }
}
