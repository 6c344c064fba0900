//! service-limits CLI - Cloud service quota and usage reporting
//!
//! Lists the quotas of a service together with their current usage, or the
//! services the quota API supports.

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "service-limits")]
#[command(author, version, about = "Query service quotas and their current usage", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format: table (default), csv, markdown or json
    #[arg(long, short, global = true, default_value = "table", env = "SERVICE_LIMITS_FORMAT")]
    format: output::OutputFormat,

    /// Suppress progress messages
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Enable debug logging (overrides RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    /// AWS region (defaults to the AWS provider chain)
    #[arg(long, short, global = true)]
    region: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Report quotas and usage for one service
    Quotas(commands::quotas::QuotasArgs),

    /// List the services supported by the quota API
    Services,
}

fn init_logging(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.format_timestamp_millis().init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        output::print_error(&format!("Error: {:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Create context for commands
    let ctx = commands::Context {
        format: cli.format,
        quiet: cli.quiet,
        region: cli.region,
    };

    // Execute command
    match cli.command {
        Commands::Quotas(args) => commands::quotas::execute(&ctx, args).await,
        Commands::Services => commands::services::execute(&ctx).await,
    }
}
