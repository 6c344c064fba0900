//! Data models for limits-core
//!
//! Only the fields the pipeline consumes or produces are modelled here; the
//! collaborators' wire types live next to their clients.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Usage sentinel for quotas whose usage could not be resolved
pub const NOT_AVAILABLE: &str = "Not Available";

/// Unit sentinel meaning "dimensionless"; never appended to formatted values
pub const UNIT_NONE: &str = "None";

/// Metric dimensions forwarded to the metric query, in query order
pub const USAGE_DIMENSIONS: [&str; 4] = ["Class", "Resource", "Service", "Type"];

/// Aggregation period for metric statistics, in seconds
pub const METRIC_PERIOD_SECS: i32 = 60;

/// Position of the region segment in a quota ARN
const ARN_REGION_INDEX: usize = 3;

/// Position of the account segment in a quota ARN
const ARN_ACCOUNT_INDEX: usize = 4;

// ============================================================================
// Quota Records
// ============================================================================

/// A quota as listed by the quota source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotaRecord {
    pub service_code: String,
    pub quota_code: String,
    pub quota_name: String,
    /// Raw limit value
    pub value: f64,
    /// Unit of the limit, or "None"
    pub unit: String,
    /// Whether the quota applies account-wide rather than per region
    pub global_quota: bool,
    /// Quota ARN, `arn:<partition>:servicequotas:<region>:<account>:<resource>`
    pub arn: String,
}

impl QuotaRecord {
    /// Derive the region and account from the quota ARN
    pub fn location(&self) -> Result<QuotaLocation> {
        QuotaLocation::from_arn(&self.arn)
    }

    /// Format the limit as a truncated integer with an optional unit suffix
    pub fn formatted_value(&self) -> String {
        format_limit(self.value, &self.unit)
    }
}

/// Region and account derived from a quota ARN
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaLocation {
    pub region: String,
    pub account_id: String,
}

impl QuotaLocation {
    /// Split an ARN on ':' and take the region and account segments.
    ///
    /// Fails when the ARN has fewer than 5 segments.
    pub fn from_arn(arn: &str) -> Result<Self> {
        let parts: Vec<&str> = arn.split(':').collect();
        if parts.len() <= ARN_ACCOUNT_INDEX {
            return Err(Error::malformed_arn(arn));
        }

        Ok(Self {
            region: parts[ARN_REGION_INDEX].to_string(),
            account_id: parts[ARN_ACCOUNT_INDEX].to_string(),
        })
    }
}

/// One page of a quota listing
#[derive(Debug, Clone, Default)]
pub struct QuotaPage {
    pub quotas: Vec<QuotaRecord>,
    /// Continuation token; `None` on the last page
    pub next_token: Option<String>,
}

/// Format a limit value: `trunc(value)`, plus `" <unit>"` unless the unit is "None"
pub fn format_limit(value: f64, unit: &str) -> String {
    let whole = value.trunc() as i64;
    if unit == UNIT_NONE {
        whole.to_string()
    } else {
        format!("{} {}", whole, unit)
    }
}

/// Format a usage value as a rounded integer string
pub fn format_usage(value: f64) -> String {
    format!("{:.0}", value)
}

// ============================================================================
// Usage Metrics
// ============================================================================

/// Describes the time series that tracks a quota's consumption
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageMetric {
    pub namespace: String,
    pub metric_name: String,
    pub dimensions: HashMap<String, String>,
    /// Recommended statistic, e.g. "Maximum"
    pub statistic: String,
}

/// Statistic requested from the metrics source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Statistic {
    Average,
    Maximum,
    Sum,
}

impl Statistic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Statistic::Average => "Average",
            Statistic::Maximum => "Maximum",
            Statistic::Sum => "Sum",
        }
    }
}

impl std::fmt::Display for Statistic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Statistic {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Average" => Ok(Statistic::Average),
            "Maximum" => Ok(Statistic::Maximum),
            "Sum" => Ok(Statistic::Sum),
            _ => Err(format!("unsupported statistic: {}", s)),
        }
    }
}

/// Time window shared by every metric query of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Window covering the last `hours` hours up to now
    pub fn last_hours(hours: u32) -> Self {
        Self::ending_at(Utc::now(), hours)
    }

    /// Window covering `hours` hours up to `end`
    pub fn ending_at(end: DateTime<Utc>, hours: u32) -> Self {
        Self {
            start: end - Duration::hours(i64::from(hours)),
            end,
        }
    }
}

/// A single metric dimension filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricDimension {
    pub name: String,
    pub value: String,
}

/// Fully specified metric query
#[derive(Debug, Clone, PartialEq)]
pub struct UsageQuery {
    pub namespace: String,
    pub metric_name: String,
    /// Non-empty dimensions only, ordered as in [`USAGE_DIMENSIONS`]
    pub dimensions: Vec<MetricDimension>,
    pub statistic: Statistic,
    pub window: TimeWindow,
    pub period_secs: i32,
}

impl UsageQuery {
    /// Build a query from a usage metric descriptor.
    ///
    /// Dimensions outside [`USAGE_DIMENSIONS`] and empty values are dropped.
    pub fn from_metric(
        metric: &UsageMetric,
        window: TimeWindow,
    ) -> std::result::Result<Self, String> {
        let statistic = metric.statistic.parse::<Statistic>()?;

        let dimensions = USAGE_DIMENSIONS
            .iter()
            .filter_map(|name| {
                metric
                    .dimensions
                    .get(*name)
                    .filter(|value| !value.is_empty())
                    .map(|value| MetricDimension {
                        name: (*name).to_string(),
                        value: value.clone(),
                    })
            })
            .collect();

        Ok(Self {
            namespace: metric.namespace.clone(),
            metric_name: metric.metric_name.clone(),
            dimensions,
            statistic,
            window,
            period_secs: METRIC_PERIOD_SECS,
        })
    }
}

// ============================================================================
// Results
// ============================================================================

/// One report row, produced exactly once per quota
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResultRecord {
    #[serde(rename = "AccountID")]
    pub account_id: String,
    pub region: String,
    pub service_code: String,
    pub quota_name: String,
    pub value: String,
    pub usage: String,
    pub global_quota: bool,
}

impl ResultRecord {
    /// Whether usage was resolved for this quota
    pub fn has_usage(&self) -> bool {
        self.usage != NOT_AVAILABLE
    }
}

// ============================================================================
// Services
// ============================================================================

/// A service supported by the quota API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub service_code: String,
    pub service_name: String,
}

/// One page of a service listing
#[derive(Debug, Clone, Default)]
pub struct ServicePage {
    pub services: Vec<ServiceInfo>,
    pub next_token: Option<String>,
}
