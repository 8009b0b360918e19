//! Whitespace-delimited log record parsing.
//!
//! User log files start with a header line of column names; every
//! subsequent line is one record with the same field count. These
//! helpers split and parse those lines. Failures are soft by design:
//! callers treat them as "no more complete data this poll".

use crate::error::{ParseError, ParseResult};

/// Split a header line into column names.
pub fn parse_header(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}

/// Parse a record line against its header, yielding one float per column.
///
/// Returns [`ParseError::FieldCount`] when the field count differs
/// from the header's, and [`ParseError::InvalidFloat`] when a field is
/// not a number.
pub fn parse_record(header: &[String], line: &str) -> ParseResult<Vec<f64>> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != header.len() {
        return Err(ParseError::FieldCount {
            expected: header.len(),
            actual: fields.len(),
        });
    }
    header
        .iter()
        .zip(fields)
        .map(|(column, field)| {
            field.parse::<f64>().map_err(|_| ParseError::InvalidFloat {
                column: column.clone(),
                value: field.to_string(),
            })
        })
        .collect()
}
