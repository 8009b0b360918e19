//! Error types for record parsing in backpack-types.

use thiserror::Error;

/// Errors that can occur when parsing a log record line.
///
/// These errors are deliberately mild: the reader and the replay
/// source treat every variant as "no more complete data right now"
/// rather than a fault, because a line that fails to parse is either
/// still being written or was truncated by rotation.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// Record has a different number of fields than the header.
    #[error("field count mismatch: header has {expected} columns, record has {actual}")]
    FieldCount {
        /// Number of columns in the header.
        expected: usize,
        /// Number of fields in the record.
        actual: usize,
    },

    /// A field could not be parsed as a float.
    #[error("invalid float '{value}' in column {column}")]
    InvalidFloat {
        /// Header name of the offending column.
        column: String,
        /// The raw field text.
        value: String,
    },
}

/// Result type alias using backpack-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
