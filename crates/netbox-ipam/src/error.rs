//! NetBox client errors

use reqwest::{Method, StatusCode};
use std::fmt;
use thiserror::Error;

/// Connection-level failure classes reported by [`NetBoxError::Transport`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// DNS resolution, TCP connect or TLS handshake failed
    Connect,
    /// The per-call timeout elapsed
    Timeout,
    /// The request could not be built or sent (bad URL, redirect loop, ...)
    Request,
    /// The connection broke while reading the response body
    Body,
    /// Anything reqwest does not classify further
    Other,
}

impl TransportErrorKind {
    /// Classify a reqwest error
    pub fn classify(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connect
        } else if err.is_builder() || err.is_request() || err.is_redirect() {
            Self::Request
        } else if err.is_body() || err.is_decode() {
            Self::Body
        } else {
            Self::Other
        }
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connect => "connect",
            Self::Timeout => "timeout",
            Self::Request => "request",
            Self::Body => "body",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

/// Errors that can occur when interacting with the NetBox API
#[derive(Debug, Error)]
pub enum NetBoxError {
    /// Network, TLS or timeout failure. Never retried by the client.
    #[error("{method} {path} failed ({kind}): {source}")]
    Transport {
        method: Method,
        path: String,
        kind: TransportErrorKind,
        #[source]
        source: reqwest::Error,
    },

    /// The caller cancelled the operation before it completed
    #[error("{method} {path} cancelled")]
    Cancelled { method: Method, path: String },

    /// NetBox answered with a status other than the one the endpoint promises
    #[error("{method} {path}: expected status {expected}, got {actual}, body: {body}")]
    StatusMismatch {
        method: Method,
        path: String,
        expected: StatusCode,
        actual: StatusCode,
        body: String,
    },

    /// The response body did not match the expected JSON shape
    #[error("{method} {path}: failed to decode response: {source}, body: {body}")]
    Decode {
        method: Method,
        path: String,
        body: String,
        #[source]
        source: serde_json::Error,
    },

    /// No prefix matched the site/region filter
    #[error("prefix not found in region: {region} and site: {site}")]
    PrefixNotFound { site: String, region: String },

    /// More than one prefix matched the site/region filter
    #[error("{count} prefixes found, but expected just one in region: {region} and site: {site}")]
    AmbiguousPrefix {
        site: String,
        region: String,
        count: u64,
    },

    /// The available-ips endpoint returned 201 with an empty list
    #[error("no ip address returned when reserving from prefix {prefix_id}")]
    EmptyReservation { prefix_id: String },

    /// NetBox returned an address that is not in CIDR form
    #[error("ip address {id} returned by netbox is not a valid cidr address: {address}: {reason}")]
    InvalidAddress {
        id: u64,
        address: String,
        reason: String,
    },

    /// The requested IP address does not exist
    #[error("ip address {id} not found")]
    AddressNotFound { id: String },

    /// The dns_name echoed by NetBox differs from the one requested
    #[error("ip address {id}: expected dns_name {expected}, got {actual}")]
    DnsNameMismatch {
        id: u64,
        expected: String,
        actual: String,
    },

    /// The id echoed by NetBox differs from the one requested
    #[error("expected ip address id {expected}, got {actual}")]
    IdMismatch { expected: String, actual: u64 },

    /// The address is not in the active state
    #[error("ip address {id}: expected status active, got {status}")]
    StatusNotActive { id: u64, status: String },

    /// Client construction was given unusable settings
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl NetBoxError {
    /// True for outcomes a caller may treat as "the object is gone"
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::PrefixNotFound { .. } | Self::AddressNotFound { .. }
        )
    }

    /// True when the operation was aborted through its cancellation token
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// True for per-call timeouts
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Transport {
                kind: TransportErrorKind::Timeout,
                ..
            }
        )
    }
}
