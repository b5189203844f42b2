//! Streaming aggregation of access log events
//!
//! Turns a sequence of parsed events and row failures into ranked,
//! percentage-weighted statistics plus a bounded sample of failures.

pub mod aggregator;
pub mod counter;
pub mod errors;
pub mod models;
pub mod status;

pub use aggregator::StreamAggregator;
pub use counter::RankedCounter;
pub use errors::ErrorSampleCollector;
pub use models::{
    Analysis, AnalysisId, HttpMethod, LogEvent, ParseFailure, RankedItem, StatusDistribution,
};
pub use status::StatusClassCounter;
