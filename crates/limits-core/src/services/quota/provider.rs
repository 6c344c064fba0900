//! Collaborator traits and error types
//!
//! Defines the interfaces the aggregation pipeline consumes. The pipeline
//! treats every implementation as a black-box request/response service.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{QuotaPage, ServicePage, UsageMetric, UsageQuery};

/// Error type names that upstream services use to signal rate limiting
const THROTTLING_MARKERS: [&str; 3] = [
    "TooManyRequestsException",
    "ThrottlingException",
    "Throttling",
];

// ============================================================================
// Error Types
// ============================================================================

/// Errors returned by quota, usage and metric collaborators
#[derive(Error, Debug, Clone)]
pub enum ApiError {
    /// Request was rejected by upstream rate limiting
    #[error("Throttled: {0}")]
    Throttled(String),

    /// Credentials missing, invalid or not permitted
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// API returned an error
    #[error("API error ({code}): {message}")]
    Api { code: String, message: String },

    /// Failed to parse API response
    #[error("Parse error: {0}")]
    Parse(String),

    /// Network request failed
    #[error("Network error: {0}")]
    Network(String),

    /// General/unknown error
    #[error("{0}")]
    Other(String),
}

impl ApiError {
    /// Whether this error is a rate-limit rejection worth retrying
    pub fn is_throttling(&self) -> bool {
        match self {
            ApiError::Throttled(_) => true,
            ApiError::Api { code, message } => {
                THROTTLING_MARKERS.iter().any(|m| code.contains(m))
                    || message.contains(THROTTLING_MARKERS[0])
            }
            ApiError::Other(message) => message.contains(THROTTLING_MARKERS[0]),
            _ => false,
        }
    }

    /// Classify an upstream error by its `__type` code and HTTP status
    pub fn from_service(status: u16, code: &str, message: &str) -> Self {
        // "com.amazonaws.servicequotas#TooManyRequestsException" -> short name
        let short = code.rsplit('#').next().unwrap_or(code);
        if THROTTLING_MARKERS.iter().any(|m| short.starts_with(m)) || status == 429 {
            ApiError::Throttled(format!("{}: {}", short, message))
        } else if status == 401 || status == 403 || short.contains("AccessDenied") {
            ApiError::Unauthorized(format!("{}: {}", short, message))
        } else {
            ApiError::Api {
                code: short.to_string(),
                message: message.to_string(),
            }
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Network("Request timed out".to_string())
        } else if err.is_connect() {
            ApiError::Network("Connection failed".to_string())
        } else if err.is_decode() {
            ApiError::Parse(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Parse(err.to_string())
    }
}

// ============================================================================
// Collaborator Traits
// ============================================================================

/// Paginated listing of the quotas defined for a service
#[async_trait]
pub trait QuotaSource: Send + Sync {
    /// Fetch one page of quotas.
    ///
    /// Pass `None` for the first page and the previous page's `next_token`
    /// afterwards. Errors here are fatal for the run.
    async fn list_quotas(
        &self,
        service_code: &str,
        next_token: Option<String>,
    ) -> Result<QuotaPage, ApiError>;
}

/// Looks up which metric, if any, tracks a quota's usage
#[async_trait]
pub trait UsageResolver: Send + Sync {
    /// Returns `Ok(None)` when the quota has no usage metric.
    ///
    /// Throttling is reported as an error for which
    /// [`ApiError::is_throttling`] holds.
    async fn resolve_usage_metric(
        &self,
        service_code: &str,
        quota_code: &str,
    ) -> Result<Option<UsageMetric>, ApiError>;
}

/// Reads a single statistic value for a metric query
#[async_trait]
pub trait MetricReader: Send + Sync {
    /// Returns `Ok(None)` when the metric has no data points in the window.
    async fn read_metric(&self, query: &UsageQuery) -> Result<Option<f64>, ApiError>;
}

/// Paginated listing of the services the quota API supports
#[async_trait]
pub trait ServiceCatalog: Send + Sync {
    async fn list_services(&self, next_token: Option<String>) -> Result<ServicePage, ApiError>;
}

// ============================================================================
// Tests
// ============================================================================
