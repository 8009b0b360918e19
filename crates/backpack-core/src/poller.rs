//! The polling service object.
//!
//! One [`DataPoller`] is built at startup from a validated [`Config`]
//! and owns every piece of state that outlives a request: the alarm
//! register, the hysteresis monitor, and (in simulation) the open
//! replay position. The HTTP layer calls [`DataPoller::poll`] with
//! the client's cursor and relays the returned batch.
//!
//! Polls mutate shared state, so requests must be processed one at a
//! time; wrap the poller in [`SharedPoller`] and hold the lock for the
//! whole poll rather than relying on caller discipline.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use backpack_types::DataBatch;

use crate::alarm::{AlarmRegister, BATTERY_VOLTAGE_ALARM};
use crate::commands::{ControlCommand, InstrumentControl, SimulatedControl, VersionInfo};
use crate::config::{Config, SimulationConfig};
use crate::error::{Error, Result};
use crate::hysteresis::BatteryVoltageMonitor;
use crate::locator::latest_log_file;
use crate::reader::{SourceRead, read_since};
use crate::simulate::{ExpressionSource, ReplaySource, SimulationSource};

/// Shared handle serializing access to a poller.
///
/// Overlapping polls would corrupt the debounce count and the replay
/// read position; one lock around the whole poll is the concurrency
/// model.
pub type SharedPoller = Arc<Mutex<DataPoller>>;

enum PollMode {
    /// Serve the newest file under the user log tree.
    Live { root: PathBuf },
    /// Serve a simulated stream.
    Simulated(Box<dyn SimulationSource>),
}

/// The polling core: locates data, routes voltage through the alarm
/// path, and assembles per-request batches.
pub struct DataPoller {
    alarms: AlarmRegister,
    monitor: BatteryVoltageMonitor,
    mode: PollMode,
    control: Box<dyn InstrumentControl>,
}

impl DataPoller {
    /// Build a poller from configuration, with [`SimulatedControl`]
    /// answering control commands.
    ///
    /// Configuration problems — including a replay file that does not
    /// exist or a formula that does not compile — are fatal here,
    /// before serving begins.
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_control(config, Box::new(SimulatedControl))
    }

    /// Build a poller with an explicit control backend (the live
    /// driver/logger RPC clients in real deployments).
    pub fn with_control(config: &Config, control: Box<dyn InstrumentControl>) -> Result<Self> {
        config
            .validate()
            .map_err(|e| Error::invalid_config(e.to_string()))?;

        let mode = match &config.simulation {
            None => {
                info!(root = %config.logging.root.display(), "serving live user log");
                PollMode::Live {
                    root: config.logging.root.clone(),
                }
            }
            Some(SimulationConfig::Replay { files }) => {
                info!(files = files.len(), "serving replay simulation");
                PollMode::Simulated(Box::new(ReplaySource::new(files.clone())?))
            }
            Some(SimulationConfig::Expressions {
                ch4,
                co2,
                h2o,
                battery,
                max_index,
            }) => {
                info!(max_index, "serving expression simulation");
                PollMode::Simulated(Box::new(ExpressionSource::new(
                    ch4, co2, h2o, battery, *max_index,
                )?))
            }
        };

        let battery = &config.battery;
        Ok(Self {
            alarms: AlarmRegister::with_default_alarms(),
            monitor: BatteryVoltageMonitor::new(
                battery.voltage_threshold,
                battery.points_trigger_alarm,
                battery.points_cancel_alarm,
            ),
            mode,
            control,
        })
    }

    /// Answer one poll: everything appended since `cursor`, the alarm
    /// bitmask, the resolved file name, and the cursor to present
    /// next time.
    ///
    /// Absence of data — no log file yet, a file that stopped growing,
    /// an exhausted simulation — is a normal empty batch, not an
    /// error.
    pub fn poll(&mut self, cursor: i64) -> Result<DataBatch> {
        let read = match &mut self.mode {
            PollMode::Simulated(source) => source.next(cursor)?,
            PollMode::Live { root } => match latest_log_file(root) {
                Some(path) => read_since(&path, cursor),
                None => SourceRead::empty(cursor),
            },
        };

        for &voltage in &read.voltage {
            let active = self.monitor.check_value(voltage);
            self.alarms.set(BATTERY_VOLTAGE_ALARM, active)?;
        }

        debug!(
            cursor,
            next_cursor = read.next_cursor,
            rows = read.rows.values().map(Vec::len).max().unwrap_or(0),
            "poll served"
        );
        Ok(DataBatch {
            next_cursor: read.next_cursor,
            file_name: read.file_name,
            alarm: self.alarms.value(),
            data: read.rows,
        })
    }

    /// Validate and dispatch a control command by its wire name.
    ///
    /// `about` answers with a version map; the other commands answer
    /// with nothing.
    pub fn handle_control(&mut self, name: &str) -> Result<Option<VersionInfo>> {
        match ControlCommand::parse(name)? {
            ControlCommand::Shutdown => {
                self.control.shutdown()?;
                Ok(None)
            }
            ControlCommand::RestartUserLog => {
                self.control.restart_user_log()?;
                Ok(None)
            }
            ControlCommand::About => Ok(Some(self.control.version_info()?)),
        }
    }

    /// The current alarm bitmask.
    pub fn alarm_value(&self) -> u32 {
        self.alarms.value()
    }
}

impl std::fmt::Debug for DataPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = match &self.mode {
            PollMode::Live { root } => format!("live({})", root.display()),
            PollMode::Simulated(_) => "simulated".to_string(),
        };
        f.debug_struct("DataPoller")
            .field("mode", &mode)
            .field("alarm", &self.alarms.value())
            .finish()
    }
}
