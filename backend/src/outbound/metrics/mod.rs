//! Outbound adapters for metrics exporting.
//!
//! Feature-gated behind `metrics`.

mod prometheus_accounts;

pub use prometheus_accounts::PrometheusAccountMetrics;
