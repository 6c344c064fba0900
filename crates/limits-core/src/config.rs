//! Pipeline configuration
//!
//! Everything a run needs is carried in a [`PipelineConfig`] value handed to
//! the pipeline constructor. There is no process-wide mutable state.

// ============================================================================
// Constants
// ============================================================================

/// Default CloudWatch lookback window in hours
pub const DEFAULT_TIMEFRAME_HOURS: u32 = 1;

/// Default service code to query
pub const DEFAULT_SERVICE_CODE: &str = "ec2";

/// Minimum lookback window in hours
pub const MIN_TIMEFRAME_HOURS: u32 = 1;

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for one quota aggregation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Service code whose quotas are listed (e.g. "ec2", "s3")
    pub service_code: String,
    /// Metric lookback window in hours (minimum 1)
    pub timeframe_hours: u32,
    /// Drop rows whose usage could not be resolved
    pub exclude_not_available: bool,
    /// Cap on concurrently running quota tasks. `None` means unbounded.
    pub max_concurrency: Option<usize>,
    /// Apply the throttling retry policy to metric reads as well
    pub retry_metric_reads: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            service_code: DEFAULT_SERVICE_CODE.to_string(),
            timeframe_hours: DEFAULT_TIMEFRAME_HOURS,
            exclude_not_available: false,
            max_concurrency: None,
            retry_metric_reads: false,
        }
    }
}

impl PipelineConfig {
    /// Create a configuration for the given service code
    pub fn for_service(service_code: impl Into<String>) -> Self {
        Self {
            service_code: service_code.into(),
            ..Default::default()
        }
    }

    /// Set the metric lookback window
    pub fn with_timeframe_hours(mut self, hours: u32) -> Self {
        self.timeframe_hours = hours;
        self
    }

    /// Set whether "Not Available" rows are dropped from the report
    pub fn with_exclude_not_available(mut self, exclude: bool) -> Self {
        self.exclude_not_available = exclude;
        self
    }

    /// Cap the number of quota tasks allowed to call upstream at once
    pub fn with_max_concurrency(mut self, limit: Option<usize>) -> Self {
        self.max_concurrency = limit;
        self
    }

    /// Retry throttled metric reads with the same policy as usage resolution
    pub fn with_retry_metric_reads(mut self, retry: bool) -> Self {
        self.retry_metric_reads = retry;
        self
    }

    /// Validate and normalize the configuration
    pub fn validate(&self) -> Self {
        let service_code = self.service_code.trim();
        Self {
            service_code: if service_code.is_empty() {
                DEFAULT_SERVICE_CODE.to_string()
            } else {
                service_code.to_string()
            },
            timeframe_hours: self.timeframe_hours.max(MIN_TIMEFRAME_HOURS),
            exclude_not_available: self.exclude_not_available,
            max_concurrency: self.max_concurrency.map(|n| n.max(1)),
            retry_metric_reads: self.retry_metric_reads,
        }
    }
}
