//! Data models for address enrichment

use serde::{Deserialize, Serialize};

/// Geolocation metadata for a client address
///
/// The "unknown" variant has every descriptive field absent. It is a valid
/// cached value: it stands for "looked up, nothing usable" until its TTL runs out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressInfo {
    pub address: String,
    pub country: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub organization: Option<String>,
}

impl AddressInfo {
    /// Sentinel meaning no data is available for `address`
    pub fn unknown(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            country: None,
            region: None,
            city: None,
            organization: None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.country.is_none()
            && self.region.is_none()
            && self.city.is_none()
            && self.organization.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_sentinel() {
        let info = AddressInfo::unknown("9.9.9.9");
        assert_eq!(info.address, "9.9.9.9");
        assert!(info.is_unknown());
    }

    #[test]
    fn test_partially_known_is_not_unknown() {
        let info = AddressInfo {
            organization: Some("AS13335 Cloudflare, Inc.".to_string()),
            ..AddressInfo::unknown("1.1.1.1")
        };
        assert!(!info.is_unknown());
    }
}
