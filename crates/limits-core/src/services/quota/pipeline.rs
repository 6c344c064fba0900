//! Quota usage aggregation pipeline
//!
//! Pages through the quota source and spawns one task per quota as soon as
//! its page arrives, so pagination and usage resolution overlap.
//!
//! # Architecture
//!
//! ```text
//!  QuotaSource ──page──▶ driver ──spawn──▶ task ─┬─▶ UsageResolver (retried)
//!       ▲                  │                     └─▶ MetricReader
//!       └──next_token──────┘                           │
//!                          │                           ▼
//!                    join all tasks ◀──────────── ResultSet (Mutex)
//!                          │
//!                          ▼
//!                 finalize (filter + sort) ──▶ report
//! ```
//!
//! # Failure policy
//!
//! - Quota source errors and malformed ARNs abort the run.
//! - Throttled usage lookups are retried with quadratic backoff.
//! - Any other usage failure only marks that row "Not Available".

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::progress::ProgressCounters;
use super::provider::{MetricReader, QuotaSource, UsageResolver};
use super::results::ResultSet;
use super::retry::RetryPolicy;
use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::models::{
    format_usage, QuotaRecord, ResultRecord, TimeWindow, UsageQuery, NOT_AVAILABLE,
};

/// Drives one quota aggregation run
pub struct QuotaPipeline {
    source: Arc<dyn QuotaSource>,
    resolver: Arc<dyn UsageResolver>,
    reader: Arc<dyn MetricReader>,
    config: PipelineConfig,
    retry: RetryPolicy,
    progress: Arc<ProgressCounters>,
}

impl QuotaPipeline {
    /// Create a pipeline; the configuration is validated here
    pub fn new(
        source: Arc<dyn QuotaSource>,
        resolver: Arc<dyn UsageResolver>,
        reader: Arc<dyn MetricReader>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            source,
            resolver,
            reader,
            config: config.validate(),
            retry: RetryPolicy::default(),
            progress: Arc::new(ProgressCounters::new()),
        }
    }

    /// Override the throttling retry policy
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Counters to hand to a progress reporter.
    ///
    /// The same counters are reused and zeroed at the start of every run.
    pub fn progress(&self) -> Arc<ProgressCounters> {
        self.progress.clone()
    }

    /// Run the pipeline to completion and return the finalized report
    pub async fn run(&self) -> Result<Vec<ResultRecord>> {
        let service_code = self.config.service_code.as_str();
        self.progress.reset();
        let results = Arc::new(ResultSet::new());
        let worker = Arc::new(QuotaWorker {
            resolver: self.resolver.clone(),
            reader: self.reader.clone(),
            resolve_retry: self.retry,
            read_retry: if self.config.retry_metric_reads {
                self.retry
            } else {
                RetryPolicy::none()
            },
            window: TimeWindow::last_hours(self.config.timeframe_hours),
            limiter: self
                .config
                .max_concurrency
                .map(|n| Arc::new(Semaphore::new(n))),
            results: results.clone(),
            progress: self.progress.clone(),
        });

        log::info!(
            "[quota:pipeline] Listing quotas for '{}' (timeframe {}h)",
            service_code,
            self.config.timeframe_hours
        );

        let mut tasks = JoinSet::new();
        let mut next_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self
                .source
                .list_quotas(service_code, next_token.take())
                .await
                .map_err(Error::ListQuotas)?;
            pages += 1;

            log::debug!(
                "[quota:pipeline] Page {} returned {} quotas",
                pages,
                page.quotas.len()
            );
            self.progress.add_total(page.quotas.len());

            for quota in page.quotas {
                let worker = worker.clone();
                tasks.spawn(async move { worker.process(quota).await });
            }

            // Surface fatal task errors without waiting for the last page
            while let Some(joined) = tasks.try_join_next() {
                joined??;
            }

            match page.next_token {
                Some(token) if !token.is_empty() => next_token = Some(token),
                _ => break,
            }
        }

        while let Some(joined) = tasks.join_next().await {
            joined??;
        }

        let report = results.finalize(self.config.exclude_not_available);
        log::info!(
            "[quota:pipeline] Completed {} quotas across {} pages ({} rows reported)",
            self.progress.snapshot().completed,
            pages,
            report.len()
        );
        Ok(report)
    }
}

/// Shared state for the per-quota tasks of one run
struct QuotaWorker {
    resolver: Arc<dyn UsageResolver>,
    reader: Arc<dyn MetricReader>,
    resolve_retry: RetryPolicy,
    read_retry: RetryPolicy,
    window: TimeWindow,
    limiter: Option<Arc<Semaphore>>,
    results: Arc<ResultSet>,
    progress: Arc<ProgressCounters>,
}

impl QuotaWorker {
    /// Resolve one quota and commit exactly one row for it
    async fn process(&self, quota: QuotaRecord) -> Result<()> {
        let location = quota.location()?;
        let value = quota.formatted_value();

        let _permit = match &self.limiter {
            Some(limiter) => Some(
                limiter
                    .acquire()
                    .await
                    .map_err(|e| Error::internal(e.to_string()))?,
            ),
            None => None,
        };

        let usage = self.resolve_usage(&quota).await;

        self.results.push(ResultRecord {
            account_id: location.account_id,
            region: location.region,
            service_code: quota.service_code,
            quota_name: quota.quota_name,
            value,
            usage,
            global_quota: quota.global_quota,
        });
        self.progress.complete_one();
        Ok(())
    }

    /// Formatted usage, or "Not Available" on any failure
    async fn resolve_usage(&self, quota: &QuotaRecord) -> String {
        let label = format!("{}/{}", quota.service_code, quota.quota_code);

        let metric = match self
            .resolve_retry
            .run(&label, || {
                self.resolver
                    .resolve_usage_metric(&quota.service_code, &quota.quota_code)
            })
            .await
        {
            Ok(Some(metric)) => metric,
            Ok(None) => return NOT_AVAILABLE.to_string(),
            Err(e) => {
                log::warn!("[quota:pipeline] Usage metric lookup failed for {}: {}", label, e);
                return NOT_AVAILABLE.to_string();
            }
        };

        let query = match UsageQuery::from_metric(&metric, self.window) {
            Ok(query) => query,
            Err(e) => {
                log::warn!("[quota:pipeline] Cannot query usage for {}: {}", label, e);
                return NOT_AVAILABLE.to_string();
            }
        };

        match self
            .read_retry
            .run(&label, || self.reader.read_metric(&query))
            .await
        {
            Ok(Some(value)) => format_usage(value),
            // No datapoints in the window counts as zero usage
            Ok(None) => format_usage(0.0),
            Err(e) => {
                log::warn!(
                    "[quota:pipeline] Error retrieving metric statistics for {}: {}",
                    label,
                    e
                );
                NOT_AVAILABLE.to_string()
            }
        }
    }
}
