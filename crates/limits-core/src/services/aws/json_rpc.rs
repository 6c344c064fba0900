//! AWS JSON protocol transport
//!
//! Both Service Quotas (JSON 1.1) and CloudWatch (JSON 1.0) accept a signed
//! `POST /` with the operation named in the `X-Amz-Target` header.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::signer::RequestSigner;
use crate::services::quota::ApiError;

/// Header naming the operation
const TARGET_HEADER: &str = "x-amz-target";

/// Header carrying the error type on failed responses
const ERROR_TYPE_HEADER: &str = "x-amzn-errortype";

/// Error body shared by the AWS JSON protocols
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(rename = "__type")]
    kind: Option<String>,
    #[serde(alias = "Message")]
    message: Option<String>,
}

/// Transport for one AWS JSON API
#[derive(Debug, Clone)]
pub struct JsonRpcClient {
    http: reqwest::Client,
    endpoint: String,
    signing_name: &'static str,
    target_prefix: &'static str,
    content_type: &'static str,
    signer: RequestSigner,
}

impl JsonRpcClient {
    pub fn new(
        http: reqwest::Client,
        endpoint: impl Into<String>,
        signing_name: &'static str,
        target_prefix: &'static str,
        content_type: &'static str,
        signer: RequestSigner,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            signing_name,
            target_prefix,
            content_type,
            signer,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn set_endpoint(&mut self, endpoint: impl Into<String>) {
        self.endpoint = endpoint.into();
    }

    /// Invoke `operation` with a JSON request body
    pub async fn call<Req, Resp>(&self, operation: &str, request: &Req) -> Result<Resp, ApiError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let body = serde_json::to_vec(request)?;
        let target = format!("{}.{}", self.target_prefix, operation);
        let url = format!("{}/", self.endpoint.trim_end_matches('/'));

        let auth_headers = self
            .signer
            .sign(
                self.signing_name,
                "POST",
                &url,
                &[("content-type", self.content_type), (TARGET_HEADER, target.as_str())],
                &body,
            )
            .await?;

        let mut builder = self
            .http
            .post(&url)
            .header("content-type", self.content_type)
            .header(TARGET_HEADER, &target);
        for (name, value) in auth_headers {
            builder = builder.header(name, value);
        }

        let response = builder.body(body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let header_type = response
                .headers()
                .get(ERROR_TYPE_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.split(':').next().unwrap_or(v).to_string());
            let bytes = response.bytes().await?;
            return Err(parse_error(status.as_u16(), header_type, &bytes));
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Map an error response onto [`ApiError`]
fn parse_error(status: u16, header_type: Option<String>, body: &[u8]) -> ApiError {
    let parsed: ErrorBody = serde_json::from_slice(body).unwrap_or_default();
    let code = parsed.kind.or(header_type).unwrap_or_default();
    let message = parsed
        .message
        .unwrap_or_else(|| format!("HTTP {}", status));

    ApiError::from_service(status, &code, &message)
}
