//! Provider-specific error types.
//!
//! Errors raised by the lifecycle layer on top of the NetBox client errors
//! it passes through.

use netbox_ipam::NetBoxError;
use thiserror::Error;

/// Errors that can occur in the provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// NetBox API error
    #[error("NetBox error: {0}")]
    NetBox(#[from] NetBoxError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A required resource argument is missing or empty
    #[error("required parameter {0} not provided")]
    MissingArgument(&'static str),
}

impl ProviderError {
    /// True when the underlying NetBox object does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NetBox(e) if e.is_not_found())
    }
}

/// Reject empty or whitespace-only arguments
pub(crate) fn require<'a>(name: &'static str, value: &'a str) -> Result<&'a str, ProviderError> {
    if value.trim().is_empty() {
        Err(ProviderError::MissingArgument(name))
    } else {
        Ok(value)
    }
}
