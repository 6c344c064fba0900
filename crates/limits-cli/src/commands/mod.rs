//! CLI commands module
//!
//! Contains all CLI command implementations.

pub mod quotas;
pub mod services;

use anyhow::Result;
use limits_core::AwsClients;

use crate::output::OutputFormat;

/// Shared context for all commands
pub struct Context {
    pub format: OutputFormat,
    pub quiet: bool,
    /// Region override; `None` defers to the AWS provider chain
    pub region: Option<String>,
}

impl Context {
    /// Load AWS clients for the configured region
    pub async fn aws_clients(&self) -> Result<AwsClients> {
        Ok(AwsClients::from_env(self.region.clone()).await?)
    }
}
