//! IPAM operations for MockNetBoxClient
//!
//! Stored records go through the same response checks as the HTTP client, so
//! a record whose status was changed with `set_status` fails a read exactly
//! like a real NetBox answer would.

use super::helpers::{check_cancelled, next_free_address};
use super::MockNetBoxClient;
use crate::client::{validate_active, validate_cidr, validate_dns_name, validate_id};
use crate::error::NetBoxError;
use crate::models::*;
use reqwest::{Method, StatusCode};
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;

fn ip_path(id: &str) -> String {
    format!("/api/ipam/ip-addresses/{}/", id)
}

pub async fn lookup_prefix(client: &MockNetBoxClient, site: &str, region: &str, cancel: &CancellationToken) -> Result<IpamPrefix, NetBoxError> {
        check_cancelled(cancel, Method::GET, "/api/ipam/prefixes/".to_string())?;
        if let Some(err) = client.take_error() {
            return Err(err);
        }

        let prefixes = client.prefixes.lock().unwrap();
        let matches = prefixes
            .get(&(site.to_string(), region.to_string()))
            .cloned()
            .unwrap_or_default();

        match matches.as_slice() {
            [] => Err(NetBoxError::PrefixNotFound {
                site: site.to_string(),
                region: region.to_string(),
            }),
            [prefix] => Ok(prefix.clone()),
            many => Err(NetBoxError::AmbiguousPrefix {
                site: site.to_string(),
                region: region.to_string(),
                count: many.len() as u64,
            }),
        }
}

pub async fn reserve_address(client: &MockNetBoxClient, prefix_id: &str, dns_name: &str, cancel: &CancellationToken) -> Result<IpAddress, NetBoxError> {
        let path = format!("/api/ipam/prefixes/{}/available-ips/", prefix_id);
        check_cancelled(cancel, Method::POST, path.clone())?;
        if let Some(err) = client.take_error() {
            return Err(err);
        }

        let cidr = client
            .prefixes
            .lock()
            .unwrap()
            .values()
            .flatten()
            .find(|p| p.id == prefix_id)
            .map(|p| p.cidr.clone())
            .ok_or_else(|| NetBoxError::StatusMismatch {
                method: Method::POST,
                path: path.clone(),
                expected: StatusCode::CREATED,
                actual: StatusCode::NOT_FOUND,
                body: r#"{"detail":"Not found."}"#.to_string(),
            })?;

        // Hold the address map while picking and inserting so two callers
        // cannot claim the same address.
        let mut ips = client.ip_addresses.lock().unwrap();
        let taken: HashSet<String> = ips.values().map(|ip| ip.address.clone()).collect();
        let address = next_free_address(&cidr, &taken).ok_or_else(|| NetBoxError::StatusMismatch {
            method: Method::POST,
            path: path.clone(),
            expected: StatusCode::CREATED,
            actual: StatusCode::CONFLICT,
            body: r#"{"detail":"An insufficient number of IP addresses are available within the prefix"}"#
                .to_string(),
        })?;

        let id = client.next_id();
        let ip = IpAddress {
            id,
            address,
            status: StatusChoice::active(),
            dns_name: dns_name.to_string(),
        };
        ips.insert(id, ip.clone());
        Ok(ip)
}

pub async fn read_address(client: &MockNetBoxClient, id: &str, cancel: &CancellationToken) -> Result<IpAddress, NetBoxError> {
        check_cancelled(cancel, Method::GET, ip_path(id))?;
        if let Some(err) = client.take_error() {
            return Err(err);
        }

        let ip = id
            .parse::<u64>()
            .ok()
            .and_then(|key| client.ip_addresses.lock().unwrap().get(&key).cloned())
            .ok_or_else(|| NetBoxError::AddressNotFound { id: id.to_string() })?;

        validate_cidr(&ip)?;
        validate_id(&ip, id)?;
        validate_active(&ip)?;
        Ok(ip)
}

pub async fn update_address(client: &MockNetBoxClient, id: &str, address: &str, dns_name: &str, cancel: &CancellationToken) -> Result<IpAddress, NetBoxError> {
        check_cancelled(cancel, Method::PUT, ip_path(id))?;
        if let Some(err) = client.take_error() {
            return Err(err);
        }

        let not_found = || NetBoxError::StatusMismatch {
            method: Method::PUT,
            path: ip_path(id),
            expected: StatusCode::OK,
            actual: StatusCode::NOT_FOUND,
            body: r#"{"detail":"Not found."}"#.to_string(),
        };
        let key = id.parse::<u64>().map_err(|_| not_found())?;

        let ip = {
            let mut ips = client.ip_addresses.lock().unwrap();
            let ip = ips.get_mut(&key).ok_or_else(not_found)?;
            ip.address = address.to_string();
            ip.dns_name = dns_name.to_string();
            ip.clone()
        };

        validate_dns_name(&ip, dns_name)?;
        validate_id(&ip, id)?;
        validate_active(&ip)?;
        Ok(ip)
}

pub async fn delete_address(client: &MockNetBoxClient, id: &str, cancel: &CancellationToken) -> Result<(), NetBoxError> {
        check_cancelled(cancel, Method::DELETE, ip_path(id))?;
        if let Some(err) = client.take_error() {
            return Err(err);
        }

        let removed = id
            .parse::<u64>()
            .ok()
            .and_then(|key| client.ip_addresses.lock().unwrap().remove(&key));

        match removed {
            Some(_) => Ok(()),
            None => Err(NetBoxError::StatusMismatch {
                method: Method::DELETE,
                path: ip_path(id),
                expected: StatusCode::NO_CONTENT,
                actual: StatusCode::NOT_FOUND,
                body: r#"{"detail":"Not found."}"#.to_string(),
            }),
        }
}
