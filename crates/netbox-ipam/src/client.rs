//! NetBox API client
//!
//! Implements the IPAM operations used to manage a single reserved address:
//! prefix lookup, reservation from a prefix's pool, read, update and delete.
//! Based on NetBox API structure: /api/ipam/prefixes/ and /api/ipam/ip-addresses/
//!
//! NetBox is not trusted to echo back what was asked for. Every response is
//! checked against the request (id, dns_name, status, CIDR form) before it is
//! returned to the caller.

use crate::common::query::{path_segment, with_query};
use crate::common::{ApiRequest, HttpClient};
use crate::error::NetBoxError;
use crate::models::*;
use crate::netbox_trait::NetBoxClientTrait;
use ipnetwork::IpNetwork;
use reqwest::{Client, StatusCode};
use std::fmt;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Default overall timeout applied to every call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings fixed for the lifetime of a [`NetBoxClient`]
#[derive(Clone)]
pub struct ClientConfig {
    /// NetBox base URL (e.g., "https://netbox.example.com")
    pub base_url: String,
    /// API token sent as `Authorization: Token <token>`
    pub token: String,
    /// Verify the server certificate
    pub tls_verify: bool,
    /// Overall per-call timeout
    pub timeout: Duration,
}

impl ClientConfig {
    /// Config with certificate verification on and the default timeout
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            tls_verify: true,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Enable or disable server certificate verification
    #[must_use]
    pub fn with_tls_verify(mut self, tls_verify: bool) -> Self {
        self.tls_verify = tls_verify;
        self
    }

    /// Set the overall per-call timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("tls_verify", &self.tls_verify)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// NetBox API client
#[derive(Debug)]
pub struct NetBoxClient {
    http: HttpClient,
    // Held for the whole available-ips POST. Picking the next free address is
    // a read-then-claim on shared remote state.
    reservation_lock: Mutex<()>,
}

impl NetBoxClient {
    /// Create a new NetBox client
    ///
    /// # Arguments
    /// * `config` - Base URL, token, TLS and timeout settings
    ///
    /// # Returns
    /// * `Err(NetBoxError::InvalidConfig)` - Empty base URL or token, or the
    ///   HTTP client could not be built
    pub fn new(config: ClientConfig) -> Result<Self, NetBoxError> {
        let base_url = config.base_url.trim();
        if base_url.is_empty() {
            return Err(NetBoxError::InvalidConfig("NetBox host is required".to_string()));
        }
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(NetBoxError::InvalidConfig(format!(
                "NetBox host must be an http(s) URL, got {}",
                base_url
            )));
        }
        if config.token.trim().is_empty() {
            return Err(NetBoxError::InvalidConfig("NetBox token is required".to_string()));
        }

        if !config.tls_verify {
            warn!("TLS certificate verification disabled for {}", base_url);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(!config.tls_verify)
            .build()
            .map_err(|e| NetBoxError::InvalidConfig(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http: HttpClient::new(client, base_url.to_string(), config.token),
            reservation_lock: Mutex::new(()),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        self.http.base_url()
    }

    /// Look up the single prefix registered for a site and region
    ///
    /// # Returns
    /// * `Ok(IpamPrefix)` - Exactly one prefix matched
    /// * `Err(NetBoxError::PrefixNotFound)` - No prefix matched
    /// * `Err(NetBoxError::AmbiguousPrefix)` - More than one prefix matched
    pub async fn lookup_prefix(
        &self,
        site: &str,
        region: &str,
        cancel: &CancellationToken,
    ) -> Result<IpamPrefix, NetBoxError> {
        let path = with_query(
            "/api/ipam/prefixes/",
            &[("region", region), ("site", site), ("format", "json")],
        );
        debug!("Looking up prefix for site {} in region {}", site, region);

        let response: PaginatedResponse<PrefixRecord> =
            self.http.execute(ApiRequest::get(path), cancel).await?;

        if response.count > 1 || response.results.len() > 1 {
            return Err(NetBoxError::AmbiguousPrefix {
                site: site.to_string(),
                region: region.to_string(),
                count: response.count.max(response.results.len() as u64),
            });
        }

        match response.results.into_iter().next() {
            Some(record) if response.count == 1 => Ok(IpamPrefix::from(record)),
            _ => Err(NetBoxError::PrefixNotFound {
                site: site.to_string(),
                region: region.to_string(),
            }),
        }
    }

    /// Reserve the next available address in a prefix and bind it to `dns_name`
    ///
    /// Reservations made through the same client never overlap: the call waits
    /// for any earlier reservation to finish before it is sent. Waiting is
    /// cancellable.
    ///
    /// Validation failures after NetBox answered 201 carry the id of the
    /// address NetBox created, so the caller can decide whether to delete it.
    pub async fn reserve_address(
        &self,
        prefix_id: &str,
        dns_name: &str,
        cancel: &CancellationToken,
    ) -> Result<IpAddress, NetBoxError> {
        let path = format!(
            "/api/ipam/prefixes/{}/available-ips/",
            path_segment(prefix_id)
        );
        let body = serde_json::json!([{ "dns_name": dns_name }]);

        let _guard = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                return Err(NetBoxError::Cancelled {
                    method: reqwest::Method::POST,
                    path,
                });
            }
            guard = self.reservation_lock.lock() => guard,
        };

        debug!("Reserving ip address for {} from prefix {}", dns_name, prefix_id);
        let created: Vec<IpAddress> = self.http.execute(ApiRequest::post(path, body), cancel).await?;

        let ip = created
            .into_iter()
            .next()
            .ok_or_else(|| NetBoxError::EmptyReservation {
                prefix_id: prefix_id.to_string(),
            })?;

        validate_cidr(&ip)?;
        validate_dns_name(&ip, dns_name)?;
        validate_active(&ip)?;

        debug!("Reserved {} (id {}) from prefix {}", ip.address, ip.id, prefix_id);
        Ok(ip)
    }

    /// Read a reserved address by id
    ///
    /// A 404 from NetBox is reported as [`NetBoxError::AddressNotFound`].
    pub async fn read_address(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<IpAddress, NetBoxError> {
        let path = ip_address_path(id);
        debug!("Fetching IP address {} from NetBox", id);

        let ip: IpAddress = self
            .http
            .execute(ApiRequest::get(path), cancel)
            .await
            .map_err(|e| match e {
                NetBoxError::StatusMismatch {
                    actual: StatusCode::NOT_FOUND,
                    ..
                } => NetBoxError::AddressNotFound { id: id.to_string() },
                other => other,
            })?;

        validate_cidr(&ip)?;
        validate_id(&ip, id)?;
        validate_active(&ip)?;
        Ok(ip)
    }

    /// Re-submit address and dns_name for an existing reservation
    pub async fn update_address(
        &self,
        id: &str,
        address: &str,
        dns_name: &str,
        cancel: &CancellationToken,
    ) -> Result<IpAddress, NetBoxError> {
        let path = ip_address_path(id);
        let body = serde_json::json!({
            "address": address,
            "dns_name": dns_name,
        });
        debug!("Updating IP address {}: {} {}", id, address, dns_name);

        let ip: IpAddress = self.http.execute(ApiRequest::put(path, body), cancel).await?;

        validate_dns_name(&ip, dns_name)?;
        validate_id(&ip, id)?;
        validate_active(&ip)?;
        Ok(ip)
    }

    /// Release a reserved address
    ///
    /// Succeeds only on 204; any other status is a
    /// [`NetBoxError::StatusMismatch`].
    pub async fn delete_address(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<(), NetBoxError> {
        debug!("Deleting IP address: {}", id);
        self.http
            .execute_no_content(ApiRequest::delete(ip_address_path(id)), cancel)
            .await
    }
}

fn ip_address_path(id: &str) -> String {
    format!("/api/ipam/ip-addresses/{}/", path_segment(id))
}

/// Address must carry a prefix length and parse as a network
pub(crate) fn validate_cidr(ip: &IpAddress) -> Result<IpNetwork, NetBoxError> {
    let invalid = |reason: String| {
        warn!("NetBox returned invalid address {} for id {}", ip.address, ip.id);
        NetBoxError::InvalidAddress {
            id: ip.id,
            address: ip.address.clone(),
            reason,
        }
    };
    if !ip.address.contains('/') {
        return Err(invalid("missing prefix length".to_string()));
    }
    ip.address
        .parse::<IpNetwork>()
        .map_err(|e| invalid(e.to_string()))
}

pub(crate) fn validate_dns_name(ip: &IpAddress, expected: &str) -> Result<(), NetBoxError> {
    if ip.dns_name == expected {
        return Ok(());
    }
    warn!(
        "NetBox echoed dns_name {} for ip address {}, expected {}",
        ip.dns_name, ip.id, expected
    );
    Err(NetBoxError::DnsNameMismatch {
        id: ip.id,
        expected: expected.to_string(),
        actual: ip.dns_name.clone(),
    })
}

pub(crate) fn validate_id(ip: &IpAddress, expected: &str) -> Result<(), NetBoxError> {
    if ip.id.to_string() == expected {
        return Ok(());
    }
    warn!("NetBox returned ip address {} when {} was requested", ip.id, expected);
    Err(NetBoxError::IdMismatch {
        expected: expected.to_string(),
        actual: ip.id,
    })
}

pub(crate) fn validate_active(ip: &IpAddress) -> Result<(), NetBoxError> {
    if ip.status.is_active() {
        return Ok(());
    }
    warn!("ip address {} has status {}", ip.id, ip.status.value);
    Err(NetBoxError::StatusNotActive {
        id: ip.id,
        status: ip.status.value.clone(),
    })
}

// Implement NetBoxClientTrait for NetBoxClient
#[async_trait::async_trait]
impl NetBoxClientTrait for NetBoxClient {
    fn base_url(&self) -> &str {
        self.base_url()
    }

    async fn lookup_prefix(
        &self,
        site: &str,
        region: &str,
        cancel: &CancellationToken,
    ) -> Result<IpamPrefix, NetBoxError> {
        self.lookup_prefix(site, region, cancel).await
    }

    async fn reserve_address(
        &self,
        prefix_id: &str,
        dns_name: &str,
        cancel: &CancellationToken,
    ) -> Result<IpAddress, NetBoxError> {
        self.reserve_address(prefix_id, dns_name, cancel).await
    }

    async fn read_address(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<IpAddress, NetBoxError> {
        self.read_address(id, cancel).await
    }

    async fn update_address(
        &self,
        id: &str,
        address: &str,
        dns_name: &str,
        cancel: &CancellationToken,
    ) -> Result<IpAddress, NetBoxError> {
        self.update_address(id, address, dns_name, cancel).await
    }

    async fn delete_address(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<(), NetBoxError> {
        self.delete_address(id, cancel).await
    }
}
