//! Provider configuration
//!
//! Mirrors the provider block of the infrastructure-as-code tool: `host` and
//! `token` are required, `tls_verify` defaults to true. Each setting can come
//! from the environment.

use crate::error::ProviderError;
use netbox_ipam::{ClientConfig, NetBoxClient, DEFAULT_TIMEOUT};
use std::env;
use std::fmt;
use std::time::Duration;
use tracing::info;

pub const ENV_HOST: &str = "NETBOX_HOST";
pub const ENV_TOKEN: &str = "NETBOX_TOKEN";
pub const ENV_TLS_VERIFY: &str = "NETBOX_TLS_VERIFY";
pub const ENV_TIMEOUT_SECS: &str = "NETBOX_TIMEOUT_SECS";

/// Connection settings for the NetBox provider
#[derive(Clone)]
pub struct ProviderConfig {
    pub host: String,
    pub token: String,
    pub tls_verify: bool,
    pub timeout: Duration,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("host", &self.host)
            .field("token", &"<redacted>")
            .field("tls_verify", &self.tls_verify)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ProviderConfig {
    /// Config with TLS verification on and the default timeout
    pub fn new(host: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            token: token.into(),
            tls_verify: true,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ProviderError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ProviderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup(ENV_HOST)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                ProviderError::InvalidConfig(format!("{} environment variable is required", ENV_HOST))
            })?;
        let token = lookup(ENV_TOKEN)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                ProviderError::InvalidConfig(format!("{} environment variable is required", ENV_TOKEN))
            })?;

        let tls_verify = match lookup(ENV_TLS_VERIFY) {
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                ProviderError::InvalidConfig(format!("{} must be true or false, got {}", ENV_TLS_VERIFY, raw))
            })?,
            None => true,
        };

        let timeout = match lookup(ENV_TIMEOUT_SECS) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or_else(|| {
                    ProviderError::InvalidConfig(format!(
                        "{} must be a positive number of seconds, got {}",
                        ENV_TIMEOUT_SECS, raw
                    ))
                })?,
            None => DEFAULT_TIMEOUT,
        };

        Ok(Self {
            host,
            token,
            tls_verify,
            timeout,
        })
    }

    /// Build the NetBox client described by this configuration
    pub fn connect(&self) -> Result<NetBoxClient, ProviderError> {
        info!("Configuration:");
        info!("  NetBox host: {}", self.host);
        info!("  TLS verify: {}", self.tls_verify);
        info!("  Timeout: {:?}", self.timeout);

        let config = ClientConfig::new(self.host.clone(), self.token.clone())
            .with_tls_verify(self.tls_verify)
            .with_timeout(self.timeout);
        Ok(NetBoxClient::new(config)?)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
