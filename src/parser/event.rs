//! Validation of raw rows into typed log events

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::analysis::models::{HttpMethod, LogEvent};
use crate::parser::csv::Row;

/// Number of columns in an access log row
pub const EXPECTED_COLUMN_COUNT: usize = 12;

/// Timestamp layout, e.g. `1/15/2024, 10:30:45.123 AM`
const TIMESTAMP_FORMAT: &str = "%m/%d/%Y, %I:%M:%S%.3f %p";

/// Why a single row was rejected. Never fatal for the batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowParseError {
    #[error("expected {expected} columns but found {actual}")]
    ColumnCount { expected: usize, actual: usize },

    #[error("invalid timestamp '{0}'")]
    Timestamp(String),

    #[error("unrecognized HTTP method '{0}'")]
    Method(String),

    #[error("invalid status code '{0}'")]
    Status(String),

    #[error("invalid {field} '{value}'")]
    Number { field: &'static str, value: String },
}

/// Build a [`LogEvent`] from a row with exactly [`EXPECTED_COLUMN_COUNT`] fields
pub fn parse_event(row: &Row) -> Result<LogEvent, RowParseError> {
    let fields = &row.fields;
    if fields.len() != EXPECTED_COLUMN_COUNT {
        return Err(RowParseError::ColumnCount {
            expected: EXPECTED_COLUMN_COUNT,
            actual: fields.len(),
        });
    }

    Ok(LogEvent {
        timestamp: parse_timestamp(&fields[0])?,
        client_address: fields[1].clone(),
        method: fields[2]
            .parse::<HttpMethod>()
            .map_err(|_| RowParseError::Method(fields[2].clone()))?,
        path: fields[3].clone(),
        user_agent: fields[4].clone(),
        status: parse_status(&fields[5])?,
        protocol: fields[6].clone(),
        received_bytes: parse_number("received bytes", &fields[7])?,
        sent_bytes: parse_number("sent bytes", &fields[8])?,
        response_time: parse_number("response time", &fields[9])?,
        tls_protocol: fields[10].clone(),
        original_path_with_args: fields[11].clone(),
    })
}

fn parse_timestamp(value: &str) -> Result<NaiveDateTime, RowParseError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .map_err(|_| RowParseError::Timestamp(value.to_string()))
}

fn parse_status(value: &str) -> Result<u16, RowParseError> {
    match value.parse::<u16>() {
        Ok(status) if (100..=999).contains(&status) => Ok(status),
        _ => Err(RowParseError::Status(value.to_string())),
    }
}

fn parse_number(field: &'static str, value: &str) -> Result<i64, RowParseError> {
    value.parse::<i64>().map_err(|_| RowParseError::Number {
        field,
        value: value.to_string(),
    })
}
