//! Data models for log analysis

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::analysis::counter::RankedCounter;
use crate::analysis::errors::ErrorSampleCollector;
use crate::analysis::status::StatusClassCounter;

/// Identity assigned to an analysis by the store
pub type AnalysisId = u64;

/// HTTP methods accepted in access log rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
    Trace,
}

impl HttpMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Trace => "TRACE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    /// Tokens are matched exactly; `get` is not a valid method.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            "PATCH" => Ok(Self::Patch),
            "HEAD" => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            "TRACE" => Ok(Self::Trace),
            other => Err(format!("unrecognized HTTP method '{}'", other)),
        }
    }
}

/// A single validated access log record
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    /// Time the request was logged
    pub timestamp: NaiveDateTime,

    /// Client address as it appears in the log
    pub client_address: String,

    pub method: HttpMethod,

    /// Request path without query arguments
    pub path: String,

    pub user_agent: String,

    /// HTTP status code (100-999)
    pub status: u16,

    /// Protocol version, e.g. "HTTP/1.1"
    pub protocol: String,

    /// Signed; negative values are kept as logged
    pub received_bytes: i64,
    pub sent_bytes: i64,

    /// Client response time as logged
    pub response_time: i64,

    pub tls_protocol: String,

    /// Original request path including query arguments
    pub original_path_with_args: String,
}

/// A row that could not be turned into a [`LogEvent`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseFailure {
    pub line_number: usize,
    pub raw_line: String,
    pub message: String,
}

/// A key from a frequency counter with its share of the total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedItem {
    pub value: String,
    pub count: u64,
    /// Percentage of all increments seen by the source counter (0-100)
    pub percentage: f64,
}

/// Share of requests per status class, in percent
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusDistribution {
    pub success_rate: f64,
    pub redirect_rate: f64,
    pub client_error_rate: f64,
    pub server_error_rate: f64,
}

/// Immutable statistics for one ingested log batch
///
/// Counters are owned snapshots; nothing here is shared with the
/// aggregator that produced it. The identity is absent until the
/// analysis has been saved and is never serialized with the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    #[serde(skip)]
    id: Option<AnalysisId>,
    created_at: i64,
    paths: RankedCounter<String>,
    addresses: RankedCounter<String>,
    statuses: StatusClassCounter,
    errors: ErrorSampleCollector,
}

impl Analysis {
    pub(crate) fn new(
        created_at: i64,
        paths: RankedCounter<String>,
        addresses: RankedCounter<String>,
        statuses: StatusClassCounter,
        errors: ErrorSampleCollector,
    ) -> Self {
        Self {
            id: None,
            created_at,
            paths,
            addresses,
            statuses,
            errors,
        }
    }

    /// Return a copy of this analysis carrying the given identity
    pub fn with_id(self, id: AnalysisId) -> Self {
        Self {
            id: Some(id),
            ..self
        }
    }

    pub fn id(&self) -> Option<AnalysisId> {
        self.id
    }

    /// Creation time (Unix timestamp, seconds)
    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    /// Number of successfully parsed events
    pub fn total_requests(&self) -> u64 {
        self.statuses.total()
    }

    pub fn top_paths(&self, limit: usize) -> Vec<RankedItem> {
        self.paths.top(limit)
    }

    pub fn top_addresses(&self, limit: usize) -> Vec<RankedItem> {
        self.addresses.top(limit)
    }

    pub fn top_status_codes(&self, limit: usize) -> Vec<RankedItem> {
        self.statuses.top(limit)
    }

    pub fn status_distribution(&self) -> StatusDistribution {
        self.statuses.distribution()
    }

    pub fn parse_error_count(&self) -> u64 {
        self.errors.total_count()
    }

    pub fn parse_error_samples(&self) -> &[ParseFailure] {
        self.errors.samples()
    }

    pub fn path_counter(&self) -> &RankedCounter<String> {
        &self.paths
    }

    pub fn address_counter(&self) -> &RankedCounter<String> {
        &self.addresses
    }

    pub fn status_counter(&self) -> &StatusClassCounter {
        &self.statuses
    }
}
