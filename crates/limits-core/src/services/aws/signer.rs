//! SigV4 request signing

use std::time::SystemTime;

use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use aws_sigv4::http_request::{sign, SignableBody, SignableRequest, SigningSettings};
use aws_sigv4::sign::v4::SigningParams;
use aws_smithy_runtime_api::client::identity::Identity;

use crate::services::quota::ApiError;

/// Signs JSON API requests for one region
#[derive(Debug, Clone)]
pub struct RequestSigner {
    credentials: SharedCredentialsProvider,
    region: String,
}

impl RequestSigner {
    pub fn new(credentials: SharedCredentialsProvider, region: impl Into<String>) -> Self {
        Self {
            credentials,
            region: region.into(),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Compute the authorization headers for a request.
    ///
    /// `headers` must contain every header sent besides `host`, since they are
    /// part of the signature.
    pub async fn sign(
        &self,
        service: &str,
        method: &str,
        url: &str,
        headers: &[(&str, &str)],
        body: &[u8],
    ) -> Result<Vec<(String, String)>, ApiError> {
        let creds = self
            .credentials
            .provide_credentials()
            .await
            .map_err(|e| ApiError::Unauthorized(format!("failed to load credentials: {}", e)))?;

        let expiry = creds.expiry();
        let identity = Identity::new(creds, expiry);

        let signing_params = SigningParams::builder()
            .identity(&identity)
            .region(&self.region)
            .name(service)
            .time(SystemTime::now())
            .settings(SigningSettings::default())
            .build()
            .map_err(|e| ApiError::Other(format!("invalid signing parameters: {}", e)))?;

        let signable_request = SignableRequest::new(
            method,
            url,
            headers.iter().copied(),
            SignableBody::Bytes(body),
        )
        .map_err(|e| ApiError::Other(format!("request cannot be signed: {}", e)))?;

        let (instructions, _) = sign(signable_request, &signing_params.into())
            .map_err(|e| ApiError::Other(format!("signing failed: {}", e)))?
            .into_parts();

        Ok(instructions
            .headers()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect())
    }
}
