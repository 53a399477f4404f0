//! Domain port surface for per-operation API metrics.
//!
//! The service counts calls and measures latency for each public operation,
//! plus the time each operation spends waiting on the account store. Metric
//! failures never affect the operation being measured.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors exposed when recording account metrics.
    pub enum AccountMetricsError {
        /// Metric exporter rejected the write.
        Export { message: String } => "account metrics exporter failed: {message}",
    }
}

/// Operations measured by [`AccountMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountOperation {
    Register,
    Verify,
    FetchProfile,
    UpdateProfile,
    UploadPicture,
    FetchPicture,
    DeletePicture,
    Login,
}

impl AccountOperation {
    /// Stable label used by exporters.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Register => "registerUser",
            Self::Verify => "verifyUser",
            Self::FetchProfile => "fetchUserDetails",
            Self::UpdateProfile => "updateUserDetails",
            Self::UploadPicture => "uploadProfilePic",
            Self::FetchPicture => "getProfilePic",
            Self::DeletePicture => "deleteProfilePic",
            Self::Login => "login",
        }
    }
}

impl fmt::Display for AccountOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metrics recording port for account operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountMetrics: Send + Sync {
    /// Count one invocation of `operation`.
    async fn record_call(&self, operation: AccountOperation) -> Result<(), AccountMetricsError>;

    /// Record how long `operation` took, whatever its outcome.
    async fn record_latency(
        &self,
        operation: AccountOperation,
        elapsed: Duration,
    ) -> Result<(), AccountMetricsError>;

    /// Record the duration of one account store call made on behalf of
    /// `operation`.
    async fn record_store_latency(
        &self,
        operation: AccountOperation,
        elapsed: Duration,
    ) -> Result<(), AccountMetricsError>;
}

/// No-op implementation for when metrics are disabled or in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpAccountMetrics;

#[async_trait]
impl AccountMetrics for NoOpAccountMetrics {
    async fn record_call(&self, _operation: AccountOperation) -> Result<(), AccountMetricsError> {
        Ok(())
    }

    async fn record_latency(
        &self,
        _operation: AccountOperation,
        _elapsed: Duration,
    ) -> Result<(), AccountMetricsError> {
        Ok(())
    }

    async fn record_store_latency(
        &self,
        _operation: AccountOperation,
        _elapsed: Duration,
    ) -> Result<(), AccountMetricsError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[tokio::test]
    async fn noop_accepts_every_event() {
        let metrics = NoOpAccountMetrics;
        metrics
            .record_call(AccountOperation::Register)
            .await
            .expect("call recorded");
        metrics
            .record_latency(AccountOperation::Register, Duration::from_millis(3))
            .await
            .expect("latency recorded");
        metrics
            .record_store_latency(AccountOperation::Register, Duration::from_millis(1))
            .await
            .expect("store latency recorded");
    }

    #[rstest]
    #[case(AccountOperation::Register, "registerUser")]
    #[case(AccountOperation::FetchProfile, "fetchUserDetails")]
    #[case(AccountOperation::DeletePicture, "deleteProfilePic")]
    fn labels_are_stable(#[case] operation: AccountOperation, #[case] label: &str) {
        assert_eq!(operation.to_string(), label);
    }
}
