//! Helper functions for the mock IPAM store

use crate::error::NetBoxError;
use ipnetwork::IpNetwork;
use reqwest::Method;
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;

/// Lowest host address of `cidr` not present in `taken`, in CIDR form
pub fn next_free_address(cidr: &str, taken: &HashSet<String>) -> Option<String> {
    let network: IpNetwork = cidr.parse().ok()?;
    let broadcast = match network {
        IpNetwork::V4(v4) if v4.prefix() < 31 => Some(std::net::IpAddr::V4(v4.broadcast())),
        _ => None,
    };

    network
        .iter()
        .filter(|ip| *ip != network.network() || network.prefix() >= 31)
        .filter(|ip| Some(*ip) != broadcast)
        .map(|ip| format!("{}/{}", ip, network.prefix()))
        .find(|candidate| !taken.contains(candidate))
}

/// Return `Cancelled` if the token has already fired
pub fn check_cancelled(cancel: &CancellationToken, method: Method, path: String) -> Result<(), NetBoxError> {
    if cancel.is_cancelled() {
        Err(NetBoxError::Cancelled { method, path })
    } else {
        Ok(())
    }
}
