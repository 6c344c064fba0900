//! Supported service listing

use super::provider::ServiceCatalog;
use crate::error::{Error, Result};
use crate::models::ServiceInfo;

/// Collect every page of the service catalog, sorted by service name
pub async fn list_services(catalog: &dyn ServiceCatalog) -> Result<Vec<ServiceInfo>> {
    let mut services = Vec::new();
    let mut next_token: Option<String> = None;

    loop {
        let page = catalog
            .list_services(next_token.take())
            .await
            .map_err(Error::ListServices)?;
        services.extend(page.services);

        match page.next_token {
            Some(token) if !token.is_empty() => next_token = Some(token),
            _ => break,
        }
    }

    services.sort_by(|a, b| a.service_name.cmp(&b.service_name));
    log::debug!("[quota:catalog] Listed {} services", services.len());
    Ok(services)
}
