//! NetBox API models
//!
//! Only the fields this client relies on are modelled. Everything else the
//! NetBox serializers return is ignored during deserialization.
//! See: netbox/netbox/ipam/api/serializers_/ip.py

use serde::{Deserialize, Serialize};

/// Status value NetBox uses for an address in service
pub const STATUS_ACTIVE: &str = "active";

/// NetBox API response wrapper (for paginated responses)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// Prefix record as returned by `/api/ipam/prefixes/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrefixRecord {
    pub id: u64,
    pub prefix: String, // e.g., "10.34.0.0/21"
}

/// A prefix resolved from a site/region pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpamPrefix {
    /// NetBox prefix id, kept opaque
    pub id: String,
    /// Network block in CIDR notation
    pub cidr: String,
}

impl From<PrefixRecord> for IpamPrefix {
    fn from(record: PrefixRecord) -> Self {
        Self {
            id: record.id.to_string(),
            cidr: record.prefix,
        }
    }
}

/// Choice field as serialized by NetBox (`{"value": ..., "label": ...}`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChoice {
    pub value: String,
    #[serde(default)]
    pub label: String,
}

impl StatusChoice {
    /// Build an active status choice
    pub fn active() -> Self {
        Self {
            value: STATUS_ACTIVE.to_string(),
            label: "Active".to_string(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.value == STATUS_ACTIVE
    }
}

/// IP address as returned by the available-ips and ip-addresses endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpAddress {
    pub id: u64,
    pub address: String, // e.g., "10.34.0.5/21"
    pub status: StatusChoice,
    #[serde(default)]
    pub dns_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ip_address_ignores_unknown_fields() {
        let body = r#"{
            "id": 123,
            "url": "https://netbox.example.com/api/ipam/ip-addresses/123/",
            "family": {"value": 4, "label": "IPv4"},
            "address": "10.34.0.5/21",
            "vrf": null,
            "status": {"value": "active", "label": "Active"},
            "dns_name": "bastion-0.example.com",
            "tags": []
        }"#;

        let ip: IpAddress = serde_json::from_str(body).unwrap();
        assert_eq!(ip.id, 123);
        assert_eq!(ip.address, "10.34.0.5/21");
        assert!(ip.status.is_active());
        assert_eq!(ip.dns_name, "bastion-0.example.com");
    }

    #[test]
    fn status_label_is_optional() {
        let status: StatusChoice = serde_json::from_str(r#"{"value": "reserved"}"#).unwrap();
        assert_eq!(status.value, "reserved");
        assert!(status.label.is_empty());
        assert!(!status.is_active());
    }

    #[test]
    fn prefix_record_converts_id_to_string() {
        let record = PrefixRecord {
            id: 59,
            prefix: "10.34.0.0/21".to_string(),
        };
        let prefix = IpamPrefix::from(record);
        assert_eq!(prefix.id, "59");
        assert_eq!(prefix.cidr, "10.34.0.0/21");
    }
}
