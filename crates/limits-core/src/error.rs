//! Unified error handling for limits-core

use thiserror::Error;

use crate::services::quota::ApiError;

/// Core error type for limits-core
///
/// Every variant here aborts a run. Per-quota usage failures never surface as
/// an `Error`; they are folded into the report as "Not Available".
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to list service quotas: {0}")]
    ListQuotas(#[source] ApiError),

    #[error("Failed to list services: {0}")]
    ListServices(#[source] ApiError),

    #[error("Malformed quota ARN '{arn}': expected at least 5 ':'-delimited segments")]
    MalformedArn { arn: String },

    #[error("AWS credentials error: {0}")]
    Credentials(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for limits-core
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a malformed ARN error
    pub fn malformed_arn(arn: impl Into<String>) -> Self {
        Error::MalformedArn { arn: arn.into() }
    }

    /// Create a credentials error
    pub fn credentials(msg: impl Into<String>) -> Self {
        Error::Credentials(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Internal(format!("quota task failed: {}", err))
    }
}
