//! Quota report command
//!
//! Lists every quota of one service with its current usage.

use std::io::{IsTerminal, Write};
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use limits_core::services::quota::{ProgressCallback, DEFAULT_REPORT_INTERVAL};
use limits_core::{PipelineConfig, ProgressReporter, ProgressSnapshot, QuotaPipeline};

use super::Context;
use crate::output::{print_success, render_quotas};

#[derive(Args, Debug)]
pub struct QuotasArgs {
    /// Service code to query (see `services`)
    #[arg(long, short = 's', env = "SERVICE_LIMITS_SERVICE_CODE", default_value = limits_core::config::DEFAULT_SERVICE_CODE)]
    pub servicecode: String,

    /// Usage lookback window in hours (1, 24, 48, 72, ...)
    #[arg(long, short = 't', env = "SERVICE_LIMITS_TIMEFRAME", default_value_t = limits_core::config::DEFAULT_TIMEFRAME_HOURS)]
    pub timeframe: u32,

    /// Drop quotas whose usage is "Not Available"
    #[arg(long)]
    pub exclude_na: bool,

    /// Cap the number of concurrent usage lookups
    #[arg(long, env = "SERVICE_LIMITS_MAX_CONCURRENCY")]
    pub max_concurrency: Option<usize>,

    /// Also retry throttled metric reads
    #[arg(long)]
    pub retry_metric_reads: bool,
}

impl QuotasArgs {
    fn to_config(&self) -> PipelineConfig {
        PipelineConfig::for_service(self.servicecode.as_str())
            .with_timeframe_hours(self.timeframe)
            .with_exclude_not_available(self.exclude_na)
            .with_max_concurrency(self.max_concurrency)
            .with_retry_metric_reads(self.retry_metric_reads)
    }
}

pub async fn execute(ctx: &Context, args: QuotasArgs) -> Result<()> {
    let clients = ctx.aws_clients().await?;
    let pipeline = QuotaPipeline::new(
        clients.service_quotas.clone(),
        clients.service_quotas.clone(),
        clients.cloudwatch.clone(),
        args.to_config(),
    );

    let interactive = std::io::stdout().is_terminal();
    let show_progress = interactive && !ctx.quiet;
    let reporter = show_progress.then(|| {
        ProgressReporter::spawn(pipeline.progress(), DEFAULT_REPORT_INTERVAL, progress_line())
    });

    let report = pipeline.run().await;
    if let Some(reporter) = reporter {
        reporter.stop();
    }
    let report = report?;

    if show_progress {
        println!();
        print_success("All tasks completed!", ctx.quiet);
    }

    println!("{}", render_quotas(&report, ctx.format, interactive)?);
    Ok(())
}

/// Overwrite a single terminal line with the latest counts
fn progress_line() -> ProgressCallback {
    Box::new(|snapshot: ProgressSnapshot| {
        let mut stdout = std::io::stdout().lock();
        // Advisory output; a failed write must not fail the run
        let _ = write!(
            stdout,
            "\rCompleted {}/{} tasks",
            snapshot.completed, snapshot.total
        );
        let _ = stdout.flush();
    })
}
