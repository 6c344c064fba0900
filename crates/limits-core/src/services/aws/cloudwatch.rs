//! CloudWatch metric reader

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::json_rpc::JsonRpcClient;
use super::signer::RequestSigner;
use crate::models::{MetricDimension, Statistic, UsageQuery};
use crate::services::quota::{ApiError, MetricReader};

const SIGNING_NAME: &str = "monitoring";
const TARGET_PREFIX: &str = "GraniteServiceVersion20100801";
const CONTENT_TYPE: &str = "application/x-amz-json-1.0";

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct GetMetricStatisticsRequest<'a> {
    namespace: &'a str,
    metric_name: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    dimensions: Vec<WireDimension<'a>>,
    /// Epoch seconds
    start_time: i64,
    end_time: i64,
    period: i32,
    statistics: [&'a str; 1],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct WireDimension<'a> {
    name: &'a str,
    value: &'a str,
}

impl<'a> From<&'a MetricDimension> for WireDimension<'a> {
    fn from(d: &'a MetricDimension) -> Self {
        Self {
            name: &d.name,
            value: &d.value,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetMetricStatisticsResponse {
    #[serde(default)]
    datapoints: Vec<Datapoint>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Datapoint {
    timestamp: Option<f64>,
    average: Option<f64>,
    maximum: Option<f64>,
    sum: Option<f64>,
}

impl Datapoint {
    fn value(&self, statistic: Statistic) -> Option<f64> {
        match statistic {
            Statistic::Average => self.average,
            Statistic::Maximum => self.maximum,
            Statistic::Sum => self.sum,
        }
    }
}

/// Pick the requested statistic from the most recent datapoint
fn latest_value(datapoints: &[Datapoint], statistic: Statistic) -> Option<f64> {
    datapoints
        .iter()
        .max_by(|a, b| {
            a.timestamp
                .unwrap_or(f64::MIN)
                .total_cmp(&b.timestamp.unwrap_or(f64::MIN))
        })
        .and_then(|d| d.value(statistic))
}

/// Client for CloudWatch `GetMetricStatistics`
#[derive(Debug, Clone)]
pub struct CloudWatchClient {
    rpc: JsonRpcClient,
}

impl CloudWatchClient {
    pub fn new(http: reqwest::Client, signer: RequestSigner) -> Self {
        let endpoint = format!("https://monitoring.{}.amazonaws.com", signer.region());
        Self {
            rpc: JsonRpcClient::new(http, endpoint, SIGNING_NAME, TARGET_PREFIX, CONTENT_TYPE, signer),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.rpc.set_endpoint(endpoint);
        self
    }

    pub fn endpoint(&self) -> &str {
        self.rpc.endpoint()
    }
}

#[async_trait]
impl MetricReader for CloudWatchClient {
    async fn read_metric(&self, query: &UsageQuery) -> Result<Option<f64>, ApiError> {
        let request = GetMetricStatisticsRequest {
            namespace: &query.namespace,
            metric_name: &query.metric_name,
            dimensions: query.dimensions.iter().map(WireDimension::from).collect(),
            start_time: query.window.start.timestamp(),
            end_time: query.window.end.timestamp(),
            period: query.period_secs,
            statistics: [query.statistic.as_str()],
        };

        let response: GetMetricStatisticsResponse =
            self.rpc.call("GetMetricStatistics", &request).await?;

        log::debug!(
            "[aws:cloudwatch] {}/{} returned {} datapoints",
            query.namespace,
            query.metric_name,
            response.datapoints.len()
        );
        Ok(latest_value(&response.datapoints, query.statistic))
    }
}
