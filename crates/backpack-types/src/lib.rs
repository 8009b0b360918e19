//! Platform-agnostic types for the backpack analyzer data server.
//!
//! This crate provides the shared data types spoken between the
//! polling core (backpack-core) and any front end: the per-poll
//! [`DataBatch`], the tracked [`Channel`] set, and the record parsing
//! helpers for the whitespace-delimited user log format.
//!
//! # Example
//!
//! ```
//! use backpack_types::{Channel, DataBatch};
//!
//! let batch = DataBatch::empty(1, 0);
//! assert!(batch.is_empty());
//! assert_eq!(Channel::from_column("CH4"), Some(Channel::Ch4));
//! ```

pub mod error;
pub mod record;
pub mod types;

pub use error::{ParseError, ParseResult};
pub use record::{parse_header, parse_record};
pub use types::{Channel, DataBatch, VOLTAGE_COLUMN};
