//! # limits-core
//!
//! Core logic for service-limits: list a service's quotas, resolve the
//! current usage of each one and produce an ordered report.
//!
//! This crate provides:
//! - Pipeline configuration (`config` module)
//! - Data models (`models` module)
//! - The aggregation pipeline and AWS clients (`services` module)
//! - Unified error handling (`error` module)

pub mod config;
pub mod error;
pub mod models;
pub mod services;

// Re-exports for convenience
pub use config::PipelineConfig;
pub use error::{Error, Result};

// Re-export commonly used types from models
pub use models::{
    QuotaLocation, QuotaPage, QuotaRecord, ResultRecord, ServiceInfo, ServicePage, Statistic,
    TimeWindow, UsageMetric, UsageQuery, NOT_AVAILABLE,
};

// Re-export commonly used types from services
pub use services::{
    finalize_records, list_services, ApiError, AwsClients, CloudWatchClient, MetricReader,
    ProgressCounters, ProgressReporter, ProgressSnapshot, QuotaPipeline, QuotaSource,
    RetryPolicy, ServiceCatalog, ServiceQuotasClient, UsageResolver,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the library version
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!version().is_empty());
    }

    #[test]
    fn test_version_format() {
        let v = version();
        // Should be semver format: x.y.z
        let parts: Vec<&str> = v.split('.').collect();
        assert_eq!(parts.len(), 3, "Version should be in x.y.z format");
    }
}
