//! Service Quotas client
//!
//! Implements [`QuotaSource`], [`UsageResolver`] and [`ServiceCatalog`] on top
//! of the Service Quotas JSON 1.1 API.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::json_rpc::JsonRpcClient;
use super::signer::RequestSigner;
use crate::models::{QuotaPage, QuotaRecord, ServiceInfo, ServicePage, UsageMetric, UNIT_NONE};
use crate::services::quota::{ApiError, QuotaSource, ServiceCatalog, UsageResolver};

/// SigV4 signing name
const SIGNING_NAME: &str = "servicequotas";

/// `X-Amz-Target` prefix
const TARGET_PREFIX: &str = "ServiceQuotasV20190624";

const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// Page size for `ListServiceQuotas` and `ListServices`
const PAGE_SIZE: i32 = 100;

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ListServiceQuotasRequest<'a> {
    service_code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_token: Option<String>,
    max_results: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListServiceQuotasResponse {
    #[serde(default)]
    quotas: Vec<WireServiceQuota>,
    next_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct GetDefaultQuotaRequest<'a> {
    service_code: &'a str,
    quota_code: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetDefaultQuotaResponse {
    quota: Option<WireServiceQuota>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ListServicesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    next_token: Option<String>,
    max_results: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListServicesResponse {
    #[serde(default)]
    services: Vec<WireServiceInfo>,
    next_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireServiceInfo {
    service_code: Option<String>,
    service_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireServiceQuota {
    service_code: Option<String>,
    quota_code: Option<String>,
    quota_name: Option<String>,
    quota_arn: Option<String>,
    value: Option<f64>,
    unit: Option<String>,
    #[serde(default)]
    global_quota: bool,
    usage_metric: Option<WireUsageMetric>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireUsageMetric {
    metric_namespace: Option<String>,
    metric_name: Option<String>,
    #[serde(default)]
    metric_dimensions: HashMap<String, String>,
    metric_statistic_recommendation: Option<String>,
}

impl From<WireServiceQuota> for QuotaRecord {
    fn from(wire: WireServiceQuota) -> Self {
        QuotaRecord {
            service_code: wire.service_code.unwrap_or_default(),
            quota_code: wire.quota_code.unwrap_or_default(),
            quota_name: wire.quota_name.unwrap_or_default(),
            value: wire.value.unwrap_or_default(),
            unit: wire.unit.unwrap_or_else(|| UNIT_NONE.to_string()),
            global_quota: wire.global_quota,
            arn: wire.quota_arn.unwrap_or_default(),
        }
    }
}

impl WireUsageMetric {
    /// A descriptor needs a namespace, a metric name and a statistic
    fn into_usage_metric(self) -> Option<UsageMetric> {
        Some(UsageMetric {
            namespace: self.metric_namespace.filter(|s| !s.is_empty())?,
            metric_name: self.metric_name.filter(|s| !s.is_empty())?,
            dimensions: self.metric_dimensions,
            statistic: self.metric_statistic_recommendation.filter(|s| !s.is_empty())?,
        })
    }
}

// ============================================================================
// Client
// ============================================================================

/// Client for the Service Quotas API
#[derive(Debug, Clone)]
pub struct ServiceQuotasClient {
    rpc: JsonRpcClient,
}

impl ServiceQuotasClient {
    pub fn new(http: reqwest::Client, signer: RequestSigner) -> Self {
        let endpoint = format!("https://servicequotas.{}.amazonaws.com", signer.region());
        Self {
            rpc: JsonRpcClient::new(http, endpoint, SIGNING_NAME, TARGET_PREFIX, CONTENT_TYPE, signer),
        }
    }

    /// Point the client at a different endpoint (testing, VPC endpoints)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.rpc.set_endpoint(endpoint);
        self
    }

    pub fn endpoint(&self) -> &str {
        self.rpc.endpoint()
    }
}

#[async_trait]
impl QuotaSource for ServiceQuotasClient {
    async fn list_quotas(
        &self,
        service_code: &str,
        next_token: Option<String>,
    ) -> Result<QuotaPage, ApiError> {
        let response: ListServiceQuotasResponse = self
            .rpc
            .call(
                "ListServiceQuotas",
                &ListServiceQuotasRequest {
                    service_code,
                    next_token,
                    max_results: PAGE_SIZE,
                },
            )
            .await?;

        Ok(QuotaPage {
            quotas: response.quotas.into_iter().map(QuotaRecord::from).collect(),
            next_token: response.next_token,
        })
    }
}

#[async_trait]
impl UsageResolver for ServiceQuotasClient {
    async fn resolve_usage_metric(
        &self,
        service_code: &str,
        quota_code: &str,
    ) -> Result<Option<UsageMetric>, ApiError> {
        let response: GetDefaultQuotaResponse = self
            .rpc
            .call(
                "GetAWSDefaultServiceQuota",
                &GetDefaultQuotaRequest {
                    service_code,
                    quota_code,
                },
            )
            .await?;

        let metric = response
            .quota
            .and_then(|q| q.usage_metric)
            .and_then(WireUsageMetric::into_usage_metric);

        if metric.is_none() {
            log::debug!(
                "[aws:service-quotas] No usage metric for {}/{}",
                service_code,
                quota_code
            );
        }
        Ok(metric)
    }
}

#[async_trait]
impl ServiceCatalog for ServiceQuotasClient {
    async fn list_services(&self, next_token: Option<String>) -> Result<ServicePage, ApiError> {
        let response: ListServicesResponse = self
            .rpc
            .call(
                "ListServices",
                &ListServicesRequest {
                    next_token,
                    max_results: PAGE_SIZE,
                },
            )
            .await?;

        Ok(ServicePage {
            services: response
                .services
                .into_iter()
                .map(|s| ServiceInfo {
                    service_code: s.service_code.unwrap_or_default(),
                    service_name: s.service_name.unwrap_or_default(),
                })
                .collect(),
            next_token: response.next_token,
        })
    }
}
