//! Mock NetBoxClient for unit testing
//!
//! This module provides a mock implementation of NetBoxClientTrait that can be used
//! in unit tests without requiring a running NetBox instance.
//!
//! The mock is organized into:
//! - `ipam.rs` - IPAM operations (prefix lookup, address reservation and lifecycle)
//! - `helpers.rs` - Pool arithmetic and error helpers

mod helpers;
mod ipam;

use crate::error::NetBoxError;
use crate::models::*;
use crate::netbox_trait::NetBoxClientTrait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// Mock NetBoxClient for testing
///
/// This mock stores prefixes and addresses in memory. Reservations hand out
/// the lowest free host address of the prefix, so results are deterministic.
/// A one-shot error can be queued with [`MockNetBoxClient::fail_next`].
#[derive(Debug, Clone)]
pub struct MockNetBoxClient {
    pub(crate) base_url: String,
    // Prefixes keyed by (site, region)
    pub(crate) prefixes: Arc<Mutex<HashMap<(String, String), Vec<IpamPrefix>>>>,
    // Lock order: ip_addresses before next_id
    pub(crate) ip_addresses: Arc<Mutex<HashMap<u64, IpAddress>>>,
    pub(crate) next_error: Arc<Mutex<Option<NetBoxError>>>,
    // Counter for generating IDs
    pub(crate) next_id: Arc<Mutex<u64>>,
}

impl MockNetBoxClient {
    /// Create a new mock client
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            prefixes: Arc::new(Mutex::new(HashMap::new())),
            ip_addresses: Arc::new(Mutex::new(HashMap::new())),
            next_error: Arc::new(Mutex::new(None)),
            next_id: Arc::new(Mutex::new(1)),
        }
    }

    /// Register a prefix for a site/region pair (for test setup)
    ///
    /// Registering twice for the same pair makes lookups ambiguous.
    pub fn add_prefix(&self, site: &str, region: &str, prefix: IpamPrefix) {
        self.prefixes
            .lock()
            .unwrap()
            .entry((site.to_string(), region.to_string()))
            .or_default()
            .push(prefix);
    }

    /// Add an IP address to the mock store (for test setup)
    pub fn add_ip_address(&self, ip: IpAddress) {
        let mut ips = self.ip_addresses.lock().unwrap();
        let mut next_id = self.next_id.lock().unwrap();
        if ip.id >= *next_id {
            *next_id = ip.id + 1;
        }
        ips.insert(ip.id, ip);
    }

    /// Overwrite the status of a stored address (for test setup)
    pub fn set_status(&self, id: u64, value: &str) {
        if let Some(ip) = self.ip_addresses.lock().unwrap().get_mut(&id) {
            ip.status = StatusChoice {
                value: value.to_string(),
                label: value.to_string(),
            };
        }
    }

    /// Make the next operation fail with `error`
    pub fn fail_next(&self, error: NetBoxError) {
        *self.next_error.lock().unwrap() = Some(error);
    }

    /// Snapshot of an address as currently stored
    pub fn stored_address(&self, id: u64) -> Option<IpAddress> {
        self.ip_addresses.lock().unwrap().get(&id).cloned()
    }

    /// Number of addresses currently stored
    pub fn address_count(&self) -> usize {
        self.ip_addresses.lock().unwrap().len()
    }

    /// Generate next ID
    pub(crate) fn next_id(&self) -> u64 {
        let mut id = self.next_id.lock().unwrap();
        let current = *id;
        *id += 1;
        current
    }

    pub(crate) fn take_error(&self) -> Option<NetBoxError> {
        self.next_error.lock().unwrap().take()
    }
}

#[async_trait::async_trait]
impl NetBoxClientTrait for MockNetBoxClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn lookup_prefix(&self, site: &str, region: &str, cancel: &CancellationToken) -> Result<IpamPrefix, NetBoxError> {
        ipam::lookup_prefix(self, site, region, cancel).await
    }

    async fn reserve_address(&self, prefix_id: &str, dns_name: &str, cancel: &CancellationToken) -> Result<IpAddress, NetBoxError> {
        ipam::reserve_address(self, prefix_id, dns_name, cancel).await
    }

    async fn read_address(&self, id: &str, cancel: &CancellationToken) -> Result<IpAddress, NetBoxError> {
        ipam::read_address(self, id, cancel).await
    }

    async fn update_address(&self, id: &str, address: &str, dns_name: &str, cancel: &CancellationToken) -> Result<IpAddress, NetBoxError> {
        ipam::update_address(self, id, address, dns_name, cancel).await
    }

    async fn delete_address(&self, id: &str, cancel: &CancellationToken) -> Result<(), NetBoxError> {
        ipam::delete_address(self, id, cancel).await
    }
}
