//! Available IP resource
//!
//! Maps create/read/update/delete/import lifecycle hooks onto NetBox
//! reservations. The returned [`AvailableIpState`] is what the calling tool
//! persists between runs.

use crate::error::{require, ProviderError};
use netbox_ipam::{CancellationToken, IpAddress, NetBoxClientTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Persisted attributes of a reserved address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableIpState {
    /// NetBox ip-address id
    pub id: String,
    /// Prefix the address was drawn from
    pub prefix_id: String,
    pub dns_name: String,
    /// Address in CIDR form, e.g. "10.34.0.5/21"
    pub ip_address: String,
}

impl AvailableIpState {
    fn from_address(prefix_id: &str, ip: &IpAddress) -> Self {
        Self {
            id: ip.id.to_string(),
            prefix_id: prefix_id.to_string(),
            dns_name: ip.dns_name.clone(),
            ip_address: ip.address.clone(),
        }
    }
}

/// Lifecycle hooks for a single NetBox address reservation
#[derive(Clone)]
pub struct AvailableIpResource {
    client: Arc<dyn NetBoxClientTrait>,
}

impl std::fmt::Debug for AvailableIpResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvailableIpResource")
            .field("netbox", &self.client.base_url())
            .finish()
    }
}

impl AvailableIpResource {
    pub fn new(client: Arc<dyn NetBoxClientTrait>) -> Self {
        Self { client }
    }

    /// Reserve the next free address of `prefix_id` for `dns_name`
    pub async fn create(
        &self,
        prefix_id: &str,
        dns_name: &str,
        cancel: &CancellationToken,
    ) -> Result<AvailableIpState, ProviderError> {
        let prefix_id = require("prefix_id", prefix_id)?;
        let dns_name = require("dns_name", dns_name)?;

        let ip = self.client.reserve_address(prefix_id, dns_name, cancel).await?;
        info!("Reserved {} for {} from prefix {} (id {})", ip.address, dns_name, prefix_id, ip.id);
        Ok(AvailableIpState::from_address(prefix_id, &ip))
    }

    /// Refresh state from NetBox
    ///
    /// Returns `Ok(None)` when the address no longer exists, so the caller can
    /// drop it from state instead of failing.
    pub async fn read(
        &self,
        state: &AvailableIpState,
        cancel: &CancellationToken,
    ) -> Result<Option<AvailableIpState>, ProviderError> {
        let id = require("id", &state.id)?;

        match self.client.read_address(id, cancel).await {
            Ok(ip) => Ok(Some(AvailableIpState::from_address(&state.prefix_id, &ip))),
            Err(e) if e.is_not_found() => {
                warn!("IP address {} no longer exists in NetBox", id);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Change the dns_name bound to a reservation, keeping its address
    pub async fn update(
        &self,
        state: &AvailableIpState,
        dns_name: &str,
        cancel: &CancellationToken,
    ) -> Result<AvailableIpState, ProviderError> {
        let id = require("id", &state.id)?;
        let address = require("ip_address", &state.ip_address)?;
        let dns_name = require("dns_name", dns_name)?;

        let ip = self.client.update_address(id, address, dns_name, cancel).await?;
        info!("Updated IP address {}: dns_name {}", id, dns_name);
        Ok(AvailableIpState::from_address(&state.prefix_id, &ip))
    }

    /// Release the reservation
    pub async fn delete(
        &self,
        state: &AvailableIpState,
        cancel: &CancellationToken,
    ) -> Result<(), ProviderError> {
        let id = require("id", &state.id)?;
        self.client.delete_address(id, cancel).await?;
        info!("Released IP address {} ({})", id, state.ip_address);
        Ok(())
    }

    /// Adopt an existing NetBox address into state
    pub async fn import(
        &self,
        id: &str,
        prefix_id: &str,
        cancel: &CancellationToken,
    ) -> Result<AvailableIpState, ProviderError> {
        let id = require("id", id)?;
        let prefix_id = require("prefix_id", prefix_id)?;

        let ip = self.client.read_address(id, cancel).await?;
        info!("Imported IP address {} ({})", id, ip.address);
        Ok(AvailableIpState::from_address(prefix_id, &ip))
    }
}
