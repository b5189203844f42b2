//! Address lookup clients
//!
//! [`AddressLookup`] is the raw, fallible network seam. Errors are classified
//! here so the retry decorator can decide whether another attempt is worth it.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use std::net::IpAddr;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::LookupConfig;
use crate::enrichment::models::AddressInfo;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("lookup timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("lookup service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid lookup response: {0}")]
    Decode(String),

    #[error("no data for address")]
    NotFound,
}

impl LookupError {
    /// Timeouts, connection and transport failures, 5xx and 429 are retryable.
    /// Every other 4xx, undecodable bodies and missing data are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout | Self::Connect(_) | Self::Transport(_) => true,
            Self::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS.as_u16()
                    || (500..=599).contains(status)
            }
            Self::Decode(_) | Self::NotFound => false,
        }
    }
}

impl From<reqwest::Error> for LookupError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else if e.is_decode() {
            Self::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            Self::Status {
                status: status.as_u16(),
                body: e.to_string(),
            }
        } else {
            Self::Transport(e.to_string())
        }
    }
}

/// Resolve a client address to its metadata
#[async_trait]
pub trait AddressLookup: Send + Sync {
    async fn resolve(&self, address: &str) -> Result<AddressInfo, LookupError>;
}

/// Response body of the ipinfo-style lookup service
#[derive(Debug, Deserialize)]
struct IpInfoPayload {
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    org: Option<String>,
}

impl IpInfoPayload {
    /// Keyed by the requested address, whatever the body echoes back
    fn into_address_info(self, requested: &str) -> AddressInfo {
        AddressInfo {
            address: requested.to_string(),
            country: non_empty(self.country),
            region: non_empty(self.region),
            city: non_empty(self.city),
            organization: non_empty(self.org),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// HTTP client for an ipinfo-compatible service (`GET {base_url}/{address}`)
///
/// Only syntactically valid IP addresses are sent; the address always lands
/// in a single percent-encoded path segment.
#[derive(Clone)]
pub struct IpInfoClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl IpInfoClient {
    pub fn new(
        base_url: &str,
        token: Option<String>,
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("logscope/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(connect_timeout)
            .read_timeout(read_timeout)
            .build()
            .context("failed to build HTTP client for address lookups")?;

        let base_url = Url::parse(base_url)
            .with_context(|| format!("invalid lookup base URL '{}'", base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("lookup base URL '{}' cannot carry a path", base_url);
        }

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    pub fn from_config(config: &LookupConfig) -> anyhow::Result<Self> {
        Self::new(
            &config.base_url,
            config.token.clone(),
            Duration::from_millis(config.connect_timeout_ms),
            Duration::from_millis(config.read_timeout_ms),
        )
    }

    fn lookup_url(&self, address: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(address);
        }
        url
    }
}

#[async_trait]
impl AddressLookup for IpInfoClient {
    async fn resolve(&self, address: &str) -> Result<AddressInfo, LookupError> {
        if address.parse::<IpAddr>().is_err() {
            debug!(address, "Not an IP address, skipping lookup");
            return Err(LookupError::NotFound);
        }

        let mut request = self.client.get(self.lookup_url(address));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(address, status = status.as_u16(), "Lookup service returned error status");
            return Err(LookupError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: IpInfoPayload = response.json().await?;
        Ok(payload.into_address_info(address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> LookupError {
        LookupError::Status {
            status: code,
            body: String::new(),
        }
    }

    #[test]
    fn test_retryable_classification() {
        assert!(LookupError::Timeout.is_retryable());
        assert!(LookupError::Connect("refused".into()).is_retryable());
        assert!(LookupError::Transport("reset".into()).is_retryable());
        assert!(status(500).is_retryable());
        assert!(status(503).is_retryable());
        assert!(status(429).is_retryable());
    }

    #[test]
    fn test_non_retryable_classification() {
        assert!(!status(400).is_retryable());
        assert!(!status(401).is_retryable());
        assert!(!status(404).is_retryable());
        assert!(!LookupError::Decode("eof".into()).is_retryable());
        assert!(!LookupError::NotFound.is_retryable());
    }

    fn client(base_url: &str) -> IpInfoClient {
        IpInfoClient::new(
            base_url,
            None,
            Duration::from_millis(100),
            Duration::from_millis(100),
        )
        .unwrap()
    }

    #[test]
    fn test_lookup_url_appends_one_segment() {
        assert_eq!(
            client("https://ipinfo.io").lookup_url("8.8.8.8").as_str(),
            "https://ipinfo.io/8.8.8.8"
        );
        assert_eq!(
            client("http://127.0.0.1:9000/v1/").lookup_url("2001:db8::1").as_str(),
            "http://127.0.0.1:9000/v1/2001:db8::1"
        );
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let result = IpInfoClient::new(
            "not a url",
            None,
            Duration::from_millis(100),
            Duration::from_millis(100),
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_non_address_input_is_never_requested() {
        // Nothing listens on the discard port; a request would fail with Connect
        let client = client("http://127.0.0.1:9");
        for input in ["1.2.3.4/../8.8.8.8", "6.6.6.6?x=/8.8.8.8", "8.8.8.8#frag", ""] {
            let err = client.resolve(input).await.unwrap_err();
            assert!(matches!(err, LookupError::NotFound), "{input}");
        }
    }

    #[test]
    fn test_payload_mapping() {
        let payload: IpInfoPayload = serde_json::from_str(
            r#"{"ip":"8.8.8.8","city":"Mountain View","region":"California","country":"US","org":"AS15169 Google LLC","loc":"37.4,-122.0"}"#,
        )
        .unwrap();
        let info = payload.into_address_info("8.8.8.8");

        assert_eq!(info.address, "8.8.8.8");
        assert_eq!(info.country.as_deref(), Some("US"));
        assert_eq!(info.organization.as_deref(), Some("AS15169 Google LLC"));
        assert!(!info.is_unknown());
    }

    #[test]
    fn test_echoed_ip_does_not_rekey_info() {
        let payload: IpInfoPayload =
            serde_json::from_str(r#"{"ip":"8.8.8.8","country":"US"}"#).unwrap();
        let info = payload.into_address_info("1.2.3.4");
        assert_eq!(info.address, "1.2.3.4");
    }

    #[test]
    fn test_bogon_payload_is_unknown() {
        let payload: IpInfoPayload =
            serde_json::from_str(r#"{"ip":"10.0.0.1","bogon":true}"#).unwrap();
        let info = payload.into_address_info("10.0.0.1");
        assert!(info.is_unknown());
        assert_eq!(info.address, "10.0.0.1");
    }
}
