//! Offline address lookup using MaxMind GeoLite2/GeoIP2 MMDB files
//!
//! Memory-mapped readers are shared behind `Arc`, so cloning is cheap.

use anyhow::{Context, Result};
use async_trait::async_trait;
use maxminddb::{geoip2, Mmap, Reader};
use std::net::IpAddr;
use std::sync::Arc;

use crate::enrichment::client::{AddressLookup, LookupError};
use crate::enrichment::models::AddressInfo;

#[derive(Clone)]
pub struct MaxMindLookup {
    city_reader: Option<Arc<Reader<Mmap>>>,
    asn_reader: Option<Arc<Reader<Mmap>>>,
}

impl MaxMindLookup {
    /// Open the City and/or ASN databases; either may be omitted
    pub fn new(city_path: Option<&str>, asn_path: Option<&str>) -> Result<Self> {
        let city_reader = match city_path {
            Some(path) => Some(Arc::new(open(path, "City")?)),
            None => None,
        };
        let asn_reader = match asn_path {
            Some(path) => Some(Arc::new(open(path, "ASN")?)),
            None => None,
        };

        Ok(Self {
            city_reader,
            asn_reader,
        })
    }

    fn lookup(&self, ip: IpAddr) -> AddressInfo {
        let mut info = AddressInfo::unknown(ip.to_string());

        if let Some(ref reader) = self.city_reader {
            if let Ok(result) = reader.lookup(ip) {
                if let Ok(Some(city)) = result.decode::<geoip2::City>() {
                    info.country = city.country.iso_code.map(|s| s.to_string());
                    info.region = city
                        .subdivisions
                        .first()
                        .and_then(|subdivision| subdivision.names.english)
                        .map(|s| s.to_string());
                    info.city = city.city.names.english.map(|s| s.to_string());
                } else if let Ok(Some(country)) = result.decode::<geoip2::Country>() {
                    info.country = country.country.iso_code.map(|s| s.to_string());
                }
            }
        }

        if let Some(ref reader) = self.asn_reader {
            if let Ok(result) = reader.lookup(ip) {
                if let Ok(Some(asn)) = result.decode::<geoip2::Asn>() {
                    info.organization = match (
                        asn.autonomous_system_number,
                        asn.autonomous_system_organization,
                    ) {
                        (Some(number), Some(org)) => Some(format!("AS{} {}", number, org)),
                        (Some(number), None) => Some(format!("AS{}", number)),
                        (None, Some(org)) => Some(org.to_string()),
                        (None, None) => None,
                    };
                }
            }
        }

        info
    }
}

fn open(path: &str, kind: &str) -> Result<Reader<Mmap>> {
    // SAFETY: the database file is opened read-only and is not modified while mapped.
    unsafe { Reader::open_mmap(path) }
        .with_context(|| format!("Failed to open GeoIP {} database at {}", kind, path))
}

#[async_trait]
impl AddressLookup for MaxMindLookup {
    async fn resolve(&self, address: &str) -> Result<AddressInfo, LookupError> {
        let ip: IpAddr = address.parse().map_err(|_| LookupError::NotFound)?;
        let info = self.lookup(ip);
        if info.is_unknown() {
            return Err(LookupError::NotFound);
        }
        Ok(AddressInfo {
            address: address.to_string(),
            ..info
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creation_invalid_path() {
        let result = MaxMindLookup::new(Some("/nonexistent/path.mmdb"), None);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_without_databases_every_address_is_not_found() {
        let lookup = MaxMindLookup::new(None, None).unwrap();

        let err = lookup.resolve("8.8.8.8").await.unwrap_err();
        assert!(matches!(err, LookupError::NotFound));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_unparseable_address_is_not_found() {
        let lookup = MaxMindLookup::new(None, None).unwrap();
        assert!(matches!(
            lookup.resolve("not-an-ip").await,
            Err(LookupError::NotFound)
        ));
    }
}
