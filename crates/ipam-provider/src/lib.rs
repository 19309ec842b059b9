//! NetBox IPAM provider
//!
//! Lifecycle glue between an infrastructure-as-code tool and the NetBox
//! client: a provider configuration, the `available_ip` resource and the
//! `ipam_prefix` data source.
//!
//! # Example
//!
//! ```no_run
//! use ipam_provider::{Provider, ProviderConfig};
//! use netbox_ipam::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = Provider::new(ProviderConfig::from_env()?.connect()?);
//! let cancel = CancellationToken::new();
//!
//! let prefix = provider.ipam_prefix().read("dev-hz1", "helsinki", &cancel).await?;
//! let state = provider
//!     .available_ip()
//!     .create(&prefix.id, "bastion-0.example.com", &cancel)
//!     .await?;
//! println!("{} -> {}", state.dns_name, state.ip_address);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data_source;
pub mod error;
pub mod resource;

pub use config::ProviderConfig;
pub use data_source::{PrefixData, PrefixDataSource};
pub use error::ProviderError;
pub use resource::{AvailableIpResource, AvailableIpState};

use netbox_ipam::NetBoxClientTrait;
use std::sync::Arc;

/// Entry point handing out resources and data sources that share one client
#[derive(Clone)]
pub struct Provider {
    client: Arc<dyn NetBoxClientTrait>,
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("netbox", &self.client.base_url())
            .finish()
    }
}

impl Provider {
    pub fn new(client: impl NetBoxClientTrait + 'static) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// The `available_ip` resource
    pub fn available_ip(&self) -> AvailableIpResource {
        AvailableIpResource::new(Arc::clone(&self.client))
    }

    /// The `ipam_prefix` data source
    pub fn ipam_prefix(&self) -> PrefixDataSource {
        PrefixDataSource::new(Arc::clone(&self.client))
    }
}
