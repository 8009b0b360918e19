//! Control commands relayed to the instrument collaborators.
//!
//! The core validates command names against the known set and passes
//! the action through an [`InstrumentControl`] implementation: the
//! real driver/logger RPC clients in live deployments, or
//! [`SimulatedControl`] when no instrument is attached.

use std::collections::BTreeMap;

use tracing::info;

use crate::error::{Error, Result};

/// A validated control command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Turn off the analyzer in its current state.
    Shutdown,
    /// Restart the minimal user data log.
    RestartUserLog,
    /// Report host/app/instrument version information.
    About,
}

impl ControlCommand {
    /// Parse a wire command name; unknown names are rejected.
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "shutdown" => Ok(Self::Shutdown),
            "restartUserlog" => Ok(Self::RestartUserLog),
            "about" => Ok(Self::About),
            other => Err(Error::UnknownCommand(other.to_string())),
        }
    }

    /// The wire name of this command.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shutdown => "shutdown",
            Self::RestartUserLog => "restartUserlog",
            Self::About => "about",
        }
    }
}

/// Version information returned by the `about` command.
pub type VersionInfo = BTreeMap<String, String>;

/// The instrument-side collaborators a control command acts on.
///
/// Live deployments implement this over the driver and logger RPC
/// clients; the core never talks to them directly.
pub trait InstrumentControl: Send {
    /// Turn off the analyzer.
    fn shutdown(&mut self) -> Result<()>;

    /// Restart the user data log.
    fn restart_user_log(&mut self) -> Result<()>;

    /// Collect version information.
    fn version_info(&mut self) -> Result<VersionInfo>;
}

/// Control backend for simulation mode: actions are logged, `about`
/// answers with a canned version map.
#[derive(Debug, Default)]
pub struct SimulatedControl;

impl InstrumentControl for SimulatedControl {
    fn shutdown(&mut self) -> Result<()> {
        info!("shut down analyzer per request of the user");
        Ok(())
    }

    fn restart_user_log(&mut self) -> Result<()> {
        info!("restart userlog per request of the user");
        Ok(())
    }

    fn version_info(&mut self) -> Result<VersionInfo> {
        info!("version information requested");
        Ok(VersionInfo::from([
            (
                "host release".to_string(),
                "mobile-2.4.2.24 (3102146b)".to_string(),
            ),
            ("config - app version no".to_string(), "1.0.5".to_string()),
            (
                "config - instr version no".to_string(),
                "9fa0b2b".to_string(),
            ),
        ]))
    }
}
