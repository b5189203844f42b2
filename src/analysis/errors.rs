//! Bounded sample of row parse failures

use serde::{Deserialize, Serialize};

use crate::analysis::models::ParseFailure;

/// Keeps a running failure count and the first few failures in arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorSampleCollector {
    samples: Vec<ParseFailure>,
    total_count: u64,
    max_samples: usize,
}

impl ErrorSampleCollector {
    pub const DEFAULT_MAX_SAMPLES: usize = 10;

    pub fn new() -> Self {
        Self::with_max_samples(Self::DEFAULT_MAX_SAMPLES)
    }

    pub fn with_max_samples(max_samples: usize) -> Self {
        Self {
            samples: Vec::with_capacity(max_samples),
            total_count: 0,
            max_samples,
        }
    }

    pub fn add(&mut self, line_number: usize, raw_line: &str, message: &str) {
        self.total_count += 1;
        if self.samples.len() < self.max_samples {
            self.samples.push(ParseFailure {
                line_number,
                raw_line: raw_line.to_string(),
                message: message.to_string(),
            });
        }
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn samples(&self) -> &[ParseFailure] {
        &self.samples
    }
}

impl Default for ErrorSampleCollector {
    fn default() -> Self {
        Self::new()
    }
}
