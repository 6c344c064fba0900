//! AWS collaborators
//!
//! SigV4-signed JSON clients for Service Quotas and CloudWatch. Credentials
//! and region come from the standard AWS provider chain (environment, shared
//! profile, SSO, instance metadata).

mod cloudwatch;
mod json_rpc;
mod service_quotas;
mod signer;

pub use cloudwatch::CloudWatchClient;
pub use json_rpc::JsonRpcClient;
pub use service_quotas::ServiceQuotasClient;
pub use signer::RequestSigner;

use std::sync::Arc;
use std::time::Duration;

use aws_config::{BehaviorVersion, Region};

use crate::error::{Error, Result};

/// Per-request HTTP timeout
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Clients sharing one credential chain and region
#[derive(Debug, Clone)]
pub struct AwsClients {
    pub region: String,
    pub service_quotas: Arc<ServiceQuotasClient>,
    pub cloudwatch: Arc<CloudWatchClient>,
}

impl AwsClients {
    /// Load credentials and region from the environment.
    ///
    /// `region` overrides whatever the provider chain resolves.
    pub async fn from_env(region: Option<String>) -> Result<Self> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region.filter(|r| !r.trim().is_empty()) {
            loader = loader.region(Region::new(region));
        }
        let sdk_config = loader.load().await;

        let region = sdk_config
            .region()
            .map(|r| r.to_string())
            .ok_or_else(|| {
                Error::config("no AWS region configured (set AWS_REGION or pass --region)")
            })?;
        let credentials = sdk_config
            .credentials_provider()
            .ok_or_else(|| Error::credentials("no AWS credentials provider available"))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        log::debug!("[aws] Using region {}", region);
        Ok(Self::with_signer(http, RequestSigner::new(credentials, region)))
    }

    /// Build both clients from an existing HTTP client and signer
    pub fn with_signer(http: reqwest::Client, signer: RequestSigner) -> Self {
        Self {
            region: signer.region().to_string(),
            service_quotas: Arc::new(ServiceQuotasClient::new(http.clone(), signer.clone())),
            cloudwatch: Arc::new(CloudWatchClient::new(http, signer)),
        }
    }
}
