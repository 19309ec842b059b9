//! Query utilities for NetBox API
//!
//! Helpers for building request paths with encoded segments and filters.

use std::borrow::Cow;

/// Percent-encode a value used as a single path segment
pub fn path_segment(value: &str) -> Cow<'_, str> {
    urlencoding::encode(value)
}

/// Build query string from filters
pub fn build_query_string(filters: &[(&str, &str)]) -> String {
    filters
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Append filters to a path, leaving the path untouched when there are none
pub fn with_query(path: &str, filters: &[(&str, &str)]) -> String {
    if filters.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, build_query_string(filters))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_are_encoded_in_order() {
        let path = with_query(
            "/api/ipam/prefixes/",
            &[("region", "helsinki"), ("site", "dev hz1"), ("format", "json")],
        );
        assert_eq!(path, "/api/ipam/prefixes/?region=helsinki&site=dev%20hz1&format=json");
    }

    #[test]
    fn empty_filters_leave_path_alone() {
        assert_eq!(with_query("/api/ipam/prefixes/", &[]), "/api/ipam/prefixes/");
    }

    #[test]
    fn path_segment_escapes_slashes() {
        assert_eq!(path_segment("12/../34"), "12%2F..%2F34");
        assert_eq!(path_segment("59"), "59");
    }
}
