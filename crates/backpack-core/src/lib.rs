//! Polling core for the backpack analyzer data server.
//!
//! A field analyzer logs methane/CO2/H2O readings and its battery
//! voltage to daily-rotated, whitespace-delimited text files. This
//! crate is the server-side core that a dashboard polls: given nothing
//! but an integer row cursor, it locates the active log file, resumes
//! reading at the right byte position, runs the battery voltage
//! through a debounced low-voltage alarm, and returns the new rows as
//! a [`DataBatch`]. When no instrument is attached, a simulation
//! source (file replay or formula-driven) feeds the same protocol.
//!
//! The HTTP resource layer, CLI parsing, instrument-driver RPC and
//! configuration-file shims live outside this crate; they construct a
//! [`DataPoller`] from a [`Config`] and call [`DataPoller::poll`] and
//! [`DataPoller::handle_control`].
//!
//! # Quick Start
//!
//! ```
//! use backpack_core::{Config, DataPoller, SimulationConfig};
//!
//! # fn main() -> backpack_core::Result<()> {
//! let mut config = Config::default();
//! config.simulation = Some(SimulationConfig::Expressions {
//!     ch4: "10 * sin(x / 10) + 16".to_string(),
//!     co2: String::new(),
//!     h2o: String::new(),
//!     battery: "24.0".to_string(),
//!     max_index: 100,
//! });
//!
//! let mut poller = DataPoller::new(&config)?;
//! let batch = poller.poll(1)?;
//! println!("{} rows from {}", batch.row_count(), batch.file_name);
//! # Ok(())
//! # }
//! ```

pub mod alarm;
pub mod commands;
pub mod config;
pub mod error;
pub mod expr;
pub mod hysteresis;
pub mod locator;
pub mod poller;
pub mod reader;
pub mod simulate;

// Core exports
pub use alarm::{AlarmRegister, BATTERY_VOLTAGE_ALARM};
pub use commands::{ControlCommand, InstrumentControl, SimulatedControl, VersionInfo};
pub use config::{
    BatteryMonitorConfig, Config, ConfigError, SimulationConfig, UserLogConfig, ValidationError,
};
pub use error::{Error, Result};
pub use expr::CompiledExpression;
pub use hysteresis::BatteryVoltageMonitor;
pub use locator::latest_log_file;
pub use poller::{DataPoller, SharedPoller};
pub use reader::{SourceRead, read_since};
pub use simulate::{ExpressionSource, ReplaySource, STREAM_CURSOR, SimulationSource};

// Re-export the shared wire types for convenience
pub use backpack_types::{Channel, DataBatch, VOLTAGE_COLUMN};
