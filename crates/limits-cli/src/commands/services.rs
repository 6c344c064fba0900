//! Supported services command

use anyhow::Result;

use super::Context;
use crate::output::render_services;

pub async fn execute(ctx: &Context) -> Result<()> {
    let clients = ctx.aws_clients().await?;
    let services = limits_core::list_services(clients.service_quotas.as_ref()).await?;
    log::debug!("Fetched {} services", services.len());
    println!("{}", render_services(&services, ctx.format)?);
    Ok(())
}
