//! Integration tests for the quota aggregation pipeline

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use limits_core::services::aws::{AwsClients, RequestSigner};
use limits_core::{
    ApiError, Error, MetricReader, PipelineConfig, ProgressSnapshot, QuotaPage, QuotaPipeline,
    QuotaRecord, QuotaSource, UsageMetric, UsageQuery, UsageResolver, NOT_AVAILABLE,
};
use serde_json::json;
use tokio::time::Instant;
use wiremock::matchers::{body_partial_json, header, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Fakes
// ============================================================================

/// Serves pre-built pages keyed by their index as the continuation token
struct PagedSource {
    pages: Vec<Result<QuotaPage, ApiError>>,
    calls: AtomicUsize,
    /// Delay before answering any page after the first
    later_page_delay: Duration,
}

impl PagedSource {
    fn new(pages: Vec<Result<QuotaPage, ApiError>>) -> Self {
        Self {
            pages,
            calls: AtomicUsize::new(0),
            later_page_delay: Duration::ZERO,
        }
    }
}

#[async_trait]
impl QuotaSource for PagedSource {
    async fn list_quotas(
        &self,
        service_code: &str,
        next_token: Option<String>,
    ) -> Result<QuotaPage, ApiError> {
        assert_eq!(service_code, "ec2");
        self.calls.fetch_add(1, Ordering::SeqCst);
        let index = next_token
            .as_deref()
            .map(|t| t.parse::<usize>().unwrap())
            .unwrap_or(0);
        if index > 0 && !self.later_page_delay.is_zero() {
            tokio::time::sleep(self.later_page_delay).await;
        }
        self.pages[index].clone()
    }
}

fn page(quotas: Vec<QuotaRecord>, next: Option<&str>) -> Result<QuotaPage, ApiError> {
    Ok(QuotaPage {
        quotas,
        next_token: next.map(str::to_string),
    })
}

/// Returns a metric for every quota code in `known`, `None` otherwise
struct MapResolver {
    known: HashMap<String, UsageMetric>,
    calls: AtomicUsize,
}

impl MapResolver {
    fn new(codes: &[&str]) -> Self {
        Self {
            known: codes
                .iter()
                .map(|code| (code.to_string(), usage_metric()))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl UsageResolver for MapResolver {
    async fn resolve_usage_metric(
        &self,
        _service_code: &str,
        quota_code: &str,
    ) -> Result<Option<UsageMetric>, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.known.get(quota_code).cloned())
    }
}

/// Throttles the first `failures` calls, then resolves
struct ThrottlingResolver {
    failures: usize,
    calls: AtomicUsize,
}

#[async_trait]
impl UsageResolver for ThrottlingResolver {
    async fn resolve_usage_metric(
        &self,
        _service_code: &str,
        _quota_code: &str,
    ) -> Result<Option<UsageMetric>, ApiError> {
        let attempt = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.failures {
            Err(ApiError::Throttled(format!("TooManyRequestsException: attempt {}", attempt)))
        } else {
            Ok(Some(usage_metric()))
        }
    }
}

/// Counts reads and tracks the peak number of reads in flight
#[derive(Default)]
struct GaugeReader {
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    delay: Duration,
}

#[async_trait]
impl MetricReader for GaugeReader {
    async fn read_metric(&self, _query: &UsageQuery) -> Result<Option<f64>, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(Some(7.0))
    }
}

fn usage_metric() -> UsageMetric {
    UsageMetric {
        namespace: "AWS/Usage".to_string(),
        metric_name: "ResourceCount".to_string(),
        dimensions: HashMap::from([
            ("Resource".to_string(), "vCPU".to_string()),
            ("Service".to_string(), "EC2".to_string()),
        ]),
        statistic: "Maximum".to_string(),
    }
}

fn quota(code: &str, name: &str) -> QuotaRecord {
    QuotaRecord {
        service_code: "ec2".to_string(),
        quota_code: code.to_string(),
        quota_name: name.to_string(),
        value: 5.0,
        unit: "None".to_string(),
        global_quota: false,
        arn: format!("arn:aws:servicequotas:eu-west-1:123456789012:ec2/{}", code),
    }
}

// ============================================================================
// Pipeline behaviour
// ============================================================================

#[tokio::test]
async fn test_two_pages_with_missing_descriptor() {
    let source = PagedSource::new(vec![
        page(vec![quota("L-B", "b quota"), quota("L-C", "c quota")], Some("1")),
        page(vec![quota("L-A", "a quota")], None),
    ]);
    let resolver = Arc::new(MapResolver::new(&["L-A", "L-B"]));
    let reader = Arc::new(GaugeReader::default());

    let pipeline = QuotaPipeline::new(
        Arc::new(source),
        resolver.clone(),
        reader.clone(),
        PipelineConfig::for_service("ec2"),
    );
    let rows = pipeline.run().await.unwrap();

    let names: Vec<&str> = rows.iter().map(|r| r.quota_name.as_str()).collect();
    assert_eq!(names, vec!["a quota", "b quota", "c quota"]);
    assert_eq!(rows[0].usage, "7");
    assert_eq!(rows[1].usage, "7");
    assert_eq!(rows[2].usage, NOT_AVAILABLE);
    assert!(rows.iter().all(|r| r.account_id == "123456789012"));
    assert!(rows.iter().all(|r| r.region == "eu-west-1"));

    assert_eq!(resolver.calls.load(Ordering::SeqCst), 3);
    // No metric read for the quota without a descriptor
    assert_eq!(reader.calls.load(Ordering::SeqCst), 2);

    // Totals accumulate across both pages
    assert_eq!(
        pipeline.progress().snapshot(),
        ProgressSnapshot {
            completed: 3,
            total: 3
        }
    );
}

#[tokio::test]
async fn test_exclude_not_available_rows() {
    let source = PagedSource::new(vec![
        page(vec![quota("L-B", "b quota"), quota("L-C", "c quota")], Some("1")),
        page(vec![quota("L-A", "a quota")], None),
    ]);
    let pipeline = QuotaPipeline::new(
        Arc::new(source),
        Arc::new(MapResolver::new(&["L-A", "L-B"])),
        Arc::new(GaugeReader::default()),
        PipelineConfig::for_service("ec2").with_exclude_not_available(true),
    );

    let rows = pipeline.run().await.unwrap();
    let names: Vec<&str> = rows.iter().map(|r| r.quota_name.as_str()).collect();
    assert_eq!(names, vec!["a quota", "b quota"]);
}

#[tokio::test(start_paused = true)]
async fn test_throttled_lookup_backs_off_quadratically() {
    let resolver = Arc::new(ThrottlingResolver {
        failures: 2,
        calls: AtomicUsize::new(0),
    });
    let pipeline = QuotaPipeline::new(
        Arc::new(PagedSource::new(vec![page(vec![quota("L-1", "only")], None)])),
        resolver.clone(),
        Arc::new(GaugeReader::default()),
        PipelineConfig::for_service("ec2"),
    );

    let started = Instant::now();
    let rows = pipeline.run().await.unwrap();

    // 1s after the first failure, 4s after the second
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(5) && elapsed < Duration::from_secs(6));
    assert_eq!(resolver.calls.load(Ordering::SeqCst), 3);
    assert_eq!(rows[0].usage, "7");
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_retries_mark_row_not_available() {
    let resolver = Arc::new(ThrottlingResolver {
        failures: usize::MAX,
        calls: AtomicUsize::new(0),
    });
    let pipeline = QuotaPipeline::new(
        Arc::new(PagedSource::new(vec![page(
            vec![quota("L-1", "throttled"), quota("L-2", "also throttled")],
            None,
        )])),
        resolver.clone(),
        Arc::new(GaugeReader::default()),
        PipelineConfig::for_service("ec2"),
    );

    let started = Instant::now();
    let rows = pipeline.run().await.unwrap();

    // Both tasks back off concurrently: 1 + 4 + 9 + 16
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(30) && elapsed < Duration::from_secs(31));
    assert_eq!(resolver.calls.load(Ordering::SeqCst), 10);
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.usage == NOT_AVAILABLE));
}

#[tokio::test]
async fn test_page_error_aborts_run() {
    let source = PagedSource::new(vec![
        page(vec![quota("L-1", "first")], Some("1")),
        Err(ApiError::Unauthorized("expired token".to_string())),
    ]);
    let pipeline = QuotaPipeline::new(
        Arc::new(source),
        Arc::new(MapResolver::new(&[])),
        Arc::new(GaugeReader::default()),
        PipelineConfig::for_service("ec2"),
    );

    let err = pipeline.run().await.unwrap_err();
    assert!(matches!(err, Error::ListQuotas(ApiError::Unauthorized(_))));
}

/// Records how many lookups had run by the time page 2 was requested
struct ObservingSource {
    inner: PagedSource,
    resolver: Arc<MapResolver>,
    seen_before_page_two: Mutex<Option<usize>>,
}

#[async_trait]
impl QuotaSource for ObservingSource {
    async fn list_quotas(
        &self,
        service_code: &str,
        next_token: Option<String>,
    ) -> Result<QuotaPage, ApiError> {
        let result = self.inner.list_quotas(service_code, next_token.clone()).await;
        if next_token.is_some() {
            *self.seen_before_page_two.lock().unwrap() =
                Some(self.resolver.calls.load(Ordering::SeqCst));
        }
        result
    }
}

#[tokio::test(start_paused = true)]
async fn test_tasks_start_before_pagination_finishes() {
    let resolver = Arc::new(MapResolver::new(&["L-1", "L-2", "L-3"]));
    let mut inner = PagedSource::new(vec![
        page(vec![quota("L-1", "one"), quota("L-2", "two")], Some("1")),
        page(vec![quota("L-3", "three")], None),
    ]);
    inner.later_page_delay = Duration::from_millis(200);

    let source = Arc::new(ObservingSource {
        inner,
        resolver: resolver.clone(),
        seen_before_page_two: Mutex::new(None),
    });
    let pipeline = QuotaPipeline::new(
        source.clone(),
        resolver.clone(),
        Arc::new(GaugeReader::default()),
        PipelineConfig::for_service("ec2"),
    );

    let rows = pipeline.run().await.unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(*source.seen_before_page_two.lock().unwrap(), Some(2));
}

#[tokio::test(start_paused = true)]
async fn test_max_concurrency_caps_in_flight_lookups() {
    let quotas = (0..10)
        .map(|i| quota(&format!("L-{}", i), &format!("quota {}", i)))
        .collect();
    let codes: Vec<String> = (0..10).map(|i| format!("L-{}", i)).collect();
    let code_refs: Vec<&str> = codes.iter().map(String::as_str).collect();
    let reader = Arc::new(GaugeReader {
        delay: Duration::from_millis(100),
        ..Default::default()
    });

    let pipeline = QuotaPipeline::new(
        Arc::new(PagedSource::new(vec![page(quotas, None)])),
        Arc::new(MapResolver::new(&code_refs)),
        reader.clone(),
        PipelineConfig::for_service("ec2").with_max_concurrency(Some(2)),
    );

    let rows = pipeline.run().await.unwrap();
    assert_eq!(rows.len(), 10);
    assert_eq!(reader.calls.load(Ordering::SeqCst), 10);
    assert!(reader.peak.load(Ordering::SeqCst) <= 2);
}

// ============================================================================
// Against mocked AWS endpoints
// ============================================================================

fn clients(quotas: &MockServer, cloudwatch: &MockServer) -> AwsClients {
    use aws_credential_types::provider::SharedCredentialsProvider;
    use aws_credential_types::Credentials;

    let creds = Credentials::new("AKIDEXAMPLE", "secret", None, None, "test");
    let signer = RequestSigner::new(SharedCredentialsProvider::new(creds), "eu-west-1");
    let mut clients = AwsClients::with_signer(reqwest::Client::new(), signer);
    clients.service_quotas = Arc::new(
        (*clients.service_quotas)
            .clone()
            .with_endpoint(quotas.uri()),
    );
    clients.cloudwatch = Arc::new((*clients.cloudwatch).clone().with_endpoint(cloudwatch.uri()));
    clients
}

#[tokio::test]
async fn test_report_against_mocked_services() {
    let quotas = MockServer::start().await;
    let cloudwatch = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("x-amz-target", "ServiceQuotasV20190624.ListServiceQuotas"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Quotas": [
                {
                    "ServiceCode": "ec2",
                    "QuotaCode": "L-1216C47A",
                    "QuotaName": "Running On-Demand Standard instances",
                    "QuotaArn": "arn:aws:servicequotas:eu-west-1:123456789012:ec2/L-1216C47A",
                    "Value": 1152.0,
                    "Unit": "None"
                },
                {
                    "ServiceCode": "ec2",
                    "QuotaCode": "L-0263D0A3",
                    "QuotaName": "EC2-VPC Elastic IPs",
                    "QuotaArn": "arn:aws:servicequotas:eu-west-1:123456789012:ec2/L-0263D0A3",
                    "Value": 5.0,
                    "Unit": "None"
                }
            ]
        })))
        .mount(&quotas)
        .await;

    Mock::given(method("POST"))
        .and(header("x-amz-target", "ServiceQuotasV20190624.GetAWSDefaultServiceQuota"))
        .and(body_partial_json(json!({"QuotaCode": "L-1216C47A"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Quota": {
                "QuotaCode": "L-1216C47A",
                "UsageMetric": {
                    "MetricNamespace": "AWS/Usage",
                    "MetricName": "ResourceCount",
                    "MetricDimensions": {"Resource": "vCPU", "Service": "EC2", "Type": "Resource", "Class": "Standard/OnDemand"},
                    "MetricStatisticRecommendation": "Maximum"
                }
            }
        })))
        .mount(&quotas)
        .await;

    Mock::given(method("POST"))
        .and(header("x-amz-target", "ServiceQuotasV20190624.GetAWSDefaultServiceQuota"))
        .and(body_partial_json(json!({"QuotaCode": "L-0263D0A3"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"Quota": {"QuotaCode": "L-0263D0A3"}})),
        )
        .mount(&quotas)
        .await;

    Mock::given(method("POST"))
        .and(header("x-amz-target", "GraniteServiceVersion20100801.GetMetricStatistics"))
        .and(body_partial_json(json!({"Statistics": ["Maximum"], "Period": 60})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Datapoints": [{"Timestamp": 1714564740.0, "Maximum": 96.0}]
        })))
        .expect(1)
        .mount(&cloudwatch)
        .await;

    let clients = clients(&quotas, &cloudwatch);
    let pipeline = QuotaPipeline::new(
        clients.service_quotas.clone(),
        clients.service_quotas.clone(),
        clients.cloudwatch.clone(),
        PipelineConfig::for_service("ec2"),
    );

    let rows = pipeline.run().await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].quota_name, "EC2-VPC Elastic IPs");
    assert_eq!(rows[0].usage, NOT_AVAILABLE);
    assert_eq!(rows[1].quota_name, "Running On-Demand Standard instances");
    assert_eq!(rows[1].value, "1152");
    assert_eq!(rows[1].usage, "96");

    let json = serde_json::to_value(&rows[1]).unwrap();
    assert_eq!(json["AccountID"], "123456789012");
    assert_eq!(json["Region"], "eu-west-1");
    assert_eq!(json["GlobalQuota"], false);
}
