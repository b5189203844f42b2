//! Row tokenizer and event validator for uploaded access logs

pub mod csv;
pub mod event;

pub use csv::{Row, RowSource};
pub use event::{parse_event, RowParseError, EXPECTED_COLUMN_COUNT};
