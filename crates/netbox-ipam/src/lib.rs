//! NetBox IPAM Client
//!
//! A Rust client library for reserving and managing single IP addresses in
//! NetBox. Every response is validated against the request before it is
//! trusted as a fact about allocated state.
//!
//! # Example
//!
//! ```no_run
//! use netbox_ipam::{CancellationToken, ClientConfig, NetBoxClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = NetBoxClient::new(ClientConfig::new(
//!     "https://netbox.example.com",
//!     "your-api-token",
//! ))?;
//! let cancel = CancellationToken::new();
//!
//! // Find the prefix for a site and region
//! let prefix = client.lookup_prefix("dev-hz1", "helsinki", &cancel).await?;
//!
//! // Reserve the next free address and bind it to a DNS name
//! let ip = client
//!     .reserve_address(&prefix.id, "bastion-0.example.com", &cancel)
//!     .await?;
//!
//! // Release it again
//! client.delete_address(&ip.id.to_string(), &cancel).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Validated responses**: id, dns_name, status and CIDR form are checked
//! - **Serialized reservations**: one available-ips POST at a time per client
//! - **Cancellation**: every operation takes a `CancellationToken`
//! - **No retries**: failures are returned as typed errors for the caller to handle

pub mod client;
pub mod common;
pub mod error;
pub mod models;
#[path = "trait.rs"]
pub mod netbox_trait;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use client::{ClientConfig, NetBoxClient, DEFAULT_TIMEOUT};
pub use common::{ApiRequest, HttpClient};
pub use error::{NetBoxError, TransportErrorKind};
pub use models::*;
pub use netbox_trait::NetBoxClientTrait;
#[cfg(any(test, feature = "test-util"))]
pub use mock::MockNetBoxClient;
pub use tokio_util::sync::CancellationToken;
