use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use crate::enrichment::RetryPolicy;

/// Upper bound for the enrichment cache TTL (one year)
pub const MAX_CACHE_TTL_MINUTES: u64 = 365 * 24 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub lookup: LookupConfig,
    pub cache: CacheConfig,
    pub retry: RetryConfig,
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    pub backend: LookupBackend,
    pub base_url: String,
    /// Bearer token for the lookup service
    #[serde(skip_serializing)]
    pub token: Option<String>,
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
    /// GeoLite2 City database path (maxmind backend)
    pub city_db: Option<String>,
    /// GeoLite2 ASN database path (maxmind backend)
    pub asn_db: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupBackend {
    IpInfo,
    MaxMind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub ttl_minutes: u64,
    pub max_size: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_minutes.min(MAX_CACHE_TTL_MINUTES).saturating_mul(60))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub wait_ms: u64,
    pub multiplier: f64,
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.wait_ms),
            self.multiplier,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Addresses queued for enrichment right after ingestion
    pub eager_top_n: usize,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Ok(Self::from_source(|key| std::env::var(key).ok()))
    }

    /// Build a config from any key lookup; missing or invalid values use defaults
    pub fn from_source<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_backend = match var("DATABASE_BACKEND")
            .unwrap_or_else(|| "memory".to_string())
            .to_lowercase()
            .as_str()
        {
            "memory" => DatabaseBackend::Memory,
            "sqlite" => DatabaseBackend::Sqlite,
            other => {
                tracing::warn!(
                    "Unknown DATABASE_BACKEND '{other}', falling back to 'memory'. Supported values: memory, sqlite"
                );
                DatabaseBackend::Memory
            }
        };

        let lookup_backend = match var("LOOKUP_BACKEND")
            .unwrap_or_else(|| "ipinfo".to_string())
            .to_lowercase()
            .as_str()
        {
            "ipinfo" => LookupBackend::IpInfo,
            "maxmind" => LookupBackend::MaxMind,
            other => {
                tracing::warn!(
                    "Unknown LOOKUP_BACKEND '{other}', falling back to 'ipinfo'. Supported values: ipinfo, maxmind"
                );
                LookupBackend::IpInfo
            }
        };

        let multiplier = match positive::<f64, _>(&var, "ENRICHMENT_RETRY_MULTIPLIER", 2.0) {
            m if m > 1.0 && m.is_finite() => m,
            m => {
                tracing::warn!(
                    "ENRICHMENT_RETRY_MULTIPLIER must be greater than 1.0, got {m}; using 2.0"
                );
                2.0
            }
        };

        let ttl_minutes = match positive(&var, "ENRICHMENT_CACHE_TTL_MINUTES", 60) {
            m if m > MAX_CACHE_TTL_MINUTES => {
                tracing::warn!(
                    "ENRICHMENT_CACHE_TTL_MINUTES {m} exceeds the maximum; using {MAX_CACHE_TTL_MINUTES}"
                );
                MAX_CACHE_TTL_MINUTES
            }
            m => m,
        };

        Config {
            server: ServerConfig {
                host: var("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
                port: positive(&var, "SERVER_PORT", 8080),
            },
            database: DatabaseConfig {
                backend: database_backend,
                url: var("DATABASE_URL").unwrap_or_else(|| "sqlite://./logscope.db".to_string()),
                max_connections: positive(&var, "DATABASE_MAX_CONNECTIONS", 5),
            },
            lookup: LookupConfig {
                backend: lookup_backend,
                base_url: var("IPINFO_BASE_URL").unwrap_or_else(|| "https://ipinfo.io".to_string()),
                token: var("IPINFO_TOKEN").filter(|t| !t.trim().is_empty()),
                connect_timeout_ms: positive(&var, "IPINFO_CONNECT_TIMEOUT_MS", 2000),
                read_timeout_ms: positive(&var, "IPINFO_READ_TIMEOUT_MS", 3000),
                city_db: var("GEOIP_CITY_DB"),
                asn_db: var("GEOIP_ASN_DB"),
            },
            cache: CacheConfig {
                ttl_minutes,
                max_size: positive(&var, "ENRICHMENT_CACHE_MAX_SIZE", 1000),
            },
            retry: RetryConfig {
                max_attempts: positive(&var, "ENRICHMENT_RETRY_MAX_ATTEMPTS", 3),
                wait_ms: positive(&var, "ENRICHMENT_RETRY_WAIT_MS", 500),
                multiplier,
            },
            analysis: AnalysisConfig {
                eager_top_n: positive(&var, "ANALYSIS_EAGER_TOP_N", 10),
                max_upload_bytes: positive(&var, "ANALYSIS_MAX_UPLOAD_BYTES", 50 * 1024 * 1024),
            },
        }
    }
}

/// Parse `key` as a strictly positive number, falling back to `default`
fn positive<T, F>(var: &F, key: &str, default: T) -> T
where
    T: FromStr + PartialOrd + Default + std::fmt::Display + Copy,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = var(key) else {
        return default;
    };

    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => value,
        _ => {
            tracing::warn!("Invalid {key} '{raw}', using default {default}");
            default
        }
    }
}
