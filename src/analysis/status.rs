//! Status code counter with rolled-up class totals

use serde::{Deserialize, Serialize};

use crate::analysis::counter::{percentage, RankedCounter};
use crate::analysis::models::{RankedItem, StatusDistribution};

/// Counts individual status codes and keeps 2xx/3xx/4xx/5xx totals up to date
/// on every increment, so the distribution never rescans the codes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusClassCounter {
    codes: RankedCounter<u16>,
    success: u64,
    redirect: u64,
    client_error: u64,
    server_error: u64,
}

impl StatusClassCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, status: u16) {
        self.codes.increment(&status);

        // Codes outside 2xx-5xx only count toward the total
        match status {
            200..=299 => self.success += 1,
            300..=399 => self.redirect += 1,
            400..=499 => self.client_error += 1,
            500..=599 => self.server_error += 1,
            _ => {}
        }
    }

    pub fn total(&self) -> u64 {
        self.codes.total()
    }

    pub fn count(&self, status: u16) -> u64 {
        self.codes.count(&status)
    }

    pub fn top(&self, limit: usize) -> Vec<RankedItem> {
        self.codes.top(limit)
    }

    pub fn distribution(&self) -> StatusDistribution {
        let total = self.total();
        StatusDistribution {
            success_rate: percentage(self.success, total),
            redirect_rate: percentage(self.redirect, total),
            client_error_rate: percentage(self.client_error, total),
            server_error_rate: percentage(self.server_error, total),
        }
    }
}
