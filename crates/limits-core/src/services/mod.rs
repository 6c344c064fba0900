//! Services module

pub mod aws;
pub mod quota;

pub use aws::{AwsClients, CloudWatchClient, ServiceQuotasClient};
pub use quota::{
    finalize_records, list_services, ApiError, MetricReader, ProgressCounters, ProgressReporter,
    ProgressSnapshot, QuotaPipeline, QuotaSource, RetryPolicy, ServiceCatalog, UsageResolver,
};
