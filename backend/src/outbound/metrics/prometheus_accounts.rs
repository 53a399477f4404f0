//! Prometheus adapter for per-operation account API metrics.
//!
//! # Metric Specification
//!
//! - `accounts_api_calls_total{operation}`: counter of invocations.
//! - `accounts_api_latency_seconds{operation}`: histogram of wall-clock
//!   latency, recorded whether the operation succeeded or not.
//! - `accounts_db_query_seconds{operation}`: histogram of the time spent in
//!   each account store call made by the operation.
//!
//! `operation` is the stable label from [`AccountOperation::as_str`].

use std::time::Duration;

use async_trait::async_trait;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};

use crate::domain::ports::{AccountMetrics, AccountMetricsError, AccountOperation};

/// Prometheus-backed account metrics recorder.
pub struct PrometheusAccountMetrics {
    calls_total: IntCounterVec,
    latency_seconds: HistogramVec,
    db_query_seconds: HistogramVec,
}

impl PrometheusAccountMetrics {
    /// Create the collectors and register them with `registry`.
    ///
    /// # Errors
    ///
    /// Fails when a collector with the same name is already registered.
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let calls_total = IntCounterVec::new(
            Opts::new(
                "accounts_api_calls_total",
                "Total account API calls by operation",
            ),
            &["operation"],
        )?;
        let latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "accounts_api_latency_seconds",
                "Account API latency by operation",
            ),
            &["operation"],
        )?;
        let db_query_seconds = HistogramVec::new(
            HistogramOpts::new(
                "accounts_db_query_seconds",
                "Account store call latency by operation",
            ),
            &["operation"],
        )?;
        registry.register(Box::new(calls_total.clone()))?;
        registry.register(Box::new(latency_seconds.clone()))?;
        registry.register(Box::new(db_query_seconds.clone()))?;
        Ok(Self {
            calls_total,
            latency_seconds,
            db_query_seconds,
        })
    }
}

#[async_trait]
impl AccountMetrics for PrometheusAccountMetrics {
    async fn record_call(&self, operation: AccountOperation) -> Result<(), AccountMetricsError> {
        self.calls_total
            .get_metric_with_label_values(&[operation.as_str()])
            .map_err(|err| AccountMetricsError::export(err.to_string()))?
            .inc();
        Ok(())
    }

    async fn record_latency(
        &self,
        operation: AccountOperation,
        elapsed: Duration,
    ) -> Result<(), AccountMetricsError> {
        self.latency_seconds
            .get_metric_with_label_values(&[operation.as_str()])
            .map_err(|err| AccountMetricsError::export(err.to_string()))?
            .observe(elapsed.as_secs_f64());
        Ok(())
    }

    async fn record_store_latency(
        &self,
        operation: AccountOperation,
        elapsed: Duration,
    ) -> Result<(), AccountMetricsError> {
        self.db_query_seconds
            .get_metric_with_label_values(&[operation.as_str()])
            .map_err(|err| AccountMetricsError::export(err.to_string()))?
            .observe(elapsed.as_secs_f64());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn registry() -> Registry {
        Registry::new()
    }

    #[rstest]
    fn registers_every_collector(registry: Registry) {
        let metrics = PrometheusAccountMetrics::new(&registry).expect("registration");
        metrics
            .calls_total
            .with_label_values(&["registerUser"])
            .inc();
        metrics
            .latency_seconds
            .with_label_values(&["registerUser"])
            .observe(0.01);
        metrics
            .db_query_seconds
            .with_label_values(&["registerUser"])
            .observe(0.002);

        let names: Vec<_> = registry
            .gather()
            .iter()
            .map(|family| family.name().to_owned())
            .collect();
        assert!(names.iter().any(|name| name == "accounts_api_calls_total"));
        assert!(names.iter().any(|name| name == "accounts_api_latency_seconds"));
        assert!(names.iter().any(|name| name == "accounts_db_query_seconds"));
    }

    #[rstest]
    fn double_registration_fails(registry: Registry) {
        PrometheusAccountMetrics::new(&registry).expect("first registration");
        assert!(PrometheusAccountMetrics::new(&registry).is_err());
    }

    #[rstest]
    #[tokio::test]
    async fn calls_are_counted_per_operation(registry: Registry) {
        let metrics = PrometheusAccountMetrics::new(&registry).expect("registration");
        for _ in 0..2 {
            metrics
                .record_call(AccountOperation::FetchProfile)
                .await
                .expect("recorded");
        }
        metrics
            .record_call(AccountOperation::Login)
            .await
            .expect("recorded");

        let fetch = metrics.calls_total.with_label_values(&["fetchUserDetails"]);
        let login = metrics.calls_total.with_label_values(&["login"]);
        assert_eq!(fetch.get(), 2);
        assert_eq!(login.get(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn latency_is_observed_in_seconds(registry: Registry) {
        let metrics = PrometheusAccountMetrics::new(&registry).expect("registration");
        metrics
            .record_latency(AccountOperation::UploadPicture, Duration::from_millis(250))
            .await
            .expect("recorded");

        let histogram = metrics
            .latency_seconds
            .with_label_values(&["uploadProfilePic"]);
        assert_eq!(histogram.get_sample_count(), 1);
        assert!((histogram.get_sample_sum() - 0.25).abs() < f64::EPSILON);
    }

    #[rstest]
    #[tokio::test]
    async fn store_latency_is_kept_apart_from_api_latency(registry: Registry) {
        let metrics = PrometheusAccountMetrics::new(&registry).expect("registration");
        metrics
            .record_store_latency(AccountOperation::Verify, Duration::from_millis(500))
            .await
            .expect("recorded");

        let store = metrics.db_query_seconds.with_label_values(&["verifyUser"]);
        let api = metrics.latency_seconds.with_label_values(&["verifyUser"]);
        assert_eq!(store.get_sample_count(), 1);
        assert!((store.get_sample_sum() - 0.5).abs() < f64::EPSILON);
        assert_eq!(api.get_sample_count(), 0);
    }
}
