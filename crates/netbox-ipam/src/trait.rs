//! NetBoxClient trait for mocking
//!
//! This trait abstracts the NetBoxClient so lifecycle code can be tested
//! against an in-memory implementation. The concrete NetBoxClient implements
//! this trait, and tests can use `MockNetBoxClient`.

use crate::error::NetBoxError;
use crate::models::*;
use tokio_util::sync::CancellationToken;

/// Trait for NetBox IPAM operations
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
/// Every operation takes a cancellation token; a cancelled call returns
/// [`NetBoxError::Cancelled`] and is not retried.
#[async_trait::async_trait]
pub trait NetBoxClientTrait: Send + Sync {
    /// Get the base URL
    fn base_url(&self) -> &str;

    /// Resolve the one prefix registered for a site and region
    async fn lookup_prefix(&self, site: &str, region: &str, cancel: &CancellationToken) -> Result<IpamPrefix, NetBoxError>;

    /// Claim the next free address of a prefix for `dns_name`
    async fn reserve_address(&self, prefix_id: &str, dns_name: &str, cancel: &CancellationToken) -> Result<IpAddress, NetBoxError>;

    /// Fetch a reserved address by id
    async fn read_address(&self, id: &str, cancel: &CancellationToken) -> Result<IpAddress, NetBoxError>;
    /// Re-submit address and dns_name for an existing reservation
    async fn update_address(&self, id: &str, address: &str, dns_name: &str, cancel: &CancellationToken) -> Result<IpAddress, NetBoxError>;
    /// Release a reserved address
    async fn delete_address(&self, id: &str, cancel: &CancellationToken) -> Result<(), NetBoxError>;
}
