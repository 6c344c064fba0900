//! Quota usage aggregation
//!
//! Lists a service's quotas, resolves each quota's current usage and builds
//! one consolidated, ordered report.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ QuotaPipeline                                           │
//! │   - run() -> Vec<ResultRecord>                          │
//! │   - progress() -> Arc<ProgressCounters>                 │
//! └─────────────────────────────────────────────────────────┘
//!          │                 │                  │
//!          ▼                 ▼                  ▼
//! ┌──────────────┐  ┌────────────────┐  ┌──────────────┐
//! │ QuotaSource  │  │ UsageResolver  │  │ MetricReader │
//! │ (paginated)  │  │ (RetryPolicy)  │  │              │
//! └──────────────┘  └────────────────┘  └──────────────┘
//!          │                 │                  │
//!          └────────┬────────┴──────────────────┘
//!                   ▼
//!         ┌───────────────────┐
//!         │ ServiceQuotas /   │
//!         │ CloudWatch (AWS)  │
//!         └───────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use limits_core::services::aws::AwsClients;
//! use limits_core::services::quota::QuotaPipeline;
//! use limits_core::PipelineConfig;
//!
//! let clients = AwsClients::from_env(None).await?;
//! let pipeline = QuotaPipeline::new(
//!     clients.service_quotas.clone(),
//!     clients.service_quotas.clone(),
//!     clients.cloudwatch.clone(),
//!     PipelineConfig::for_service("ec2"),
//! );
//! let report = pipeline.run().await?;
//! ```

pub mod catalog;
pub mod pipeline;
pub mod progress;
pub mod provider;
pub mod results;
pub mod retry;

// Re-export provider traits and error
pub use provider::{ApiError, MetricReader, QuotaSource, ServiceCatalog, UsageResolver};

// Re-export pipeline
pub use pipeline::QuotaPipeline;

// Re-export progress types
pub use progress::{
    ProgressCallback, ProgressCounters, ProgressReporter, ProgressSnapshot,
    DEFAULT_REPORT_INTERVAL,
};

// Re-export results and retry
pub use results::{finalize_records, ResultSet};
pub use retry::RetryPolicy;

pub use catalog::list_services;
