//! Single-pass streaming aggregation of log events
//!
//! The aggregator is owned by exactly one writer for the duration of a batch
//! and needs no synchronization. [`StreamAggregator::finish`] hands out deep
//! copies of the counters, so accumulation may continue afterwards without
//! affecting the returned [`Analysis`].

use crate::analysis::counter::RankedCounter;
use crate::analysis::errors::ErrorSampleCollector;
use crate::analysis::models::{Analysis, LogEvent};
use crate::analysis::status::StatusClassCounter;

#[derive(Debug, Default)]
pub struct StreamAggregator {
    paths: RankedCounter<String>,
    addresses: RankedCounter<String>,
    statuses: StatusClassCounter,
    errors: ErrorSampleCollector,
}

impl StreamAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one event by path, client address and status code
    pub fn accumulate(&mut self, event: &LogEvent) {
        self.paths.increment(event.path.as_str());
        self.addresses.increment(event.client_address.as_str());
        self.statuses.increment(event.status);
    }

    /// Record a row that failed to parse; never stops the batch
    pub fn record_error(&mut self, line_number: usize, raw_line: &str, message: &str) {
        self.errors.add(line_number, raw_line, message);
    }

    /// Snapshot the current counters into an analysis without identity
    pub fn finish(&self) -> Analysis {
        Analysis::new(
            chrono::Utc::now().timestamp(),
            self.paths.clone(),
            self.addresses.clone(),
            self.statuses.clone(),
            self.errors.clone(),
        )
    }
}
