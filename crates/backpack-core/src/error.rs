//! Error types for backpack-core.
//!
//! The error taxonomy follows the server's design:
//!
//! - **Absence conditions** (no log file yet, file not growing, empty
//!   simulation source) are not errors at all — they come back as a
//!   normal empty or partial [`backpack_types::DataBatch`].
//! - **Configuration errors** (unknown alarm name, missing replay
//!   file, malformed formula) are fatal and surface at startup,
//!   before serving begins.
//! - **Transient parse anomalies** (short line, wrong field count)
//!   never reach this type; the reader recovers locally by ending the
//!   poll early.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in the polling core.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// An alarm name that was never registered was set or cleared.
    #[error("unknown alarm '{0}'")]
    UnknownAlarm(String),

    /// A control command name outside the known set.
    #[error("unknown control command '{0}'")]
    UnknownCommand(String),

    /// A replay file listed in the configuration does not exist.
    #[error("replay data file not found: {0}")]
    ReplayFileNotFound(PathBuf),

    /// A simulation formula failed to compile or evaluate.
    #[error("bad simulation expression for {channel}: {message}")]
    BadExpression {
        /// The configured channel the formula belongs to.
        channel: String,
        /// What evalexpr had to say about it.
        message: String,
    },

    /// Invalid configuration provided.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Create a bad-expression error for a simulation channel.
    pub fn bad_expression(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadExpression {
            channel: channel.into(),
            message: message.into(),
        }
    }
}

/// Result type alias using backpack-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;
