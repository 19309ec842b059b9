//! IPAM prefix data source
//!
//! Read-only lookup of the prefix registered for a site and region.

use crate::error::{require, ProviderError};
use netbox_ipam::{CancellationToken, NetBoxClientTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Attributes exposed by the prefix data source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixData {
    pub id: String,
    pub cidr: String,
    pub site: String,
    pub region: String,
}

#[derive(Clone)]
pub struct PrefixDataSource {
    client: Arc<dyn NetBoxClientTrait>,
}

impl std::fmt::Debug for PrefixDataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrefixDataSource")
            .field("netbox", &self.client.base_url())
            .finish()
    }
}

impl PrefixDataSource {
    pub fn new(client: Arc<dyn NetBoxClientTrait>) -> Self {
        Self { client }
    }

    pub async fn read(
        &self,
        site: &str,
        region: &str,
        cancel: &CancellationToken,
    ) -> Result<PrefixData, ProviderError> {
        let site = require("site", site)?;
        let region = require("region", region)?;

        let prefix = self.client.lookup_prefix(site, region, cancel).await?;
        debug!("Prefix for {}/{} is {} ({})", region, site, prefix.cidr, prefix.id);

        Ok(PrefixData {
            id: prefix.id,
            cidr: prefix.cidr,
            site: site.to_string(),
            region: region.to_string(),
        })
    }
}
