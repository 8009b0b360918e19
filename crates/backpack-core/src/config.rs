//! Poller configuration.
//!
//! The legacy INI shim stays outside the core; whatever loads the
//! deployment configuration hands the poller a [`Config`] value.
//! Defaults match the shipped instrument configuration: threshold
//! 18.9 V, 10 points to trigger, 3 to cancel, sweep index up to 100.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Poller configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// User log tree settings.
    pub logging: UserLogConfig,
    /// Battery alarm settings.
    pub battery: BatteryMonitorConfig,
    /// Simulation mode; `None` serves the live log.
    pub simulation: Option<SimulationConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Read {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Save configuration to a TOML file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        std::fs::write(path.as_ref(), content).map_err(|e| ConfigError::Write {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Validate the configuration and return any errors.
    ///
    /// This checks:
    /// - a log root is configured when serving the live log
    /// - battery threshold and debounce point counts are sane
    /// - replay mode lists at least one file
    /// - the expression sweep has room to move
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.simulation.is_none() && self.logging.root.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "logging.root".to_string(),
                message: "log root path cannot be empty outside simulation mode".to_string(),
            });
        }
        errors.extend(self.battery.validate());
        if let Some(simulation) = &self.simulation {
            errors.extend(simulation.validate());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Load and validate configuration from a file.
    pub fn load_validated<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }
}

/// Location of the date-partitioned user log tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserLogConfig {
    /// Root directory containing `YYYY/MM/DD/*.dat`.
    pub root: PathBuf,
}

/// Battery alarm settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatteryMonitorConfig {
    /// Voltage threshold below which the battery counts as low.
    pub voltage_threshold: f64,
    /// Consecutive low samples required before the alarm raises.
    pub points_trigger_alarm: u32,
    /// Consecutive high samples (after the crossing) that clear it.
    pub points_cancel_alarm: u32,
}

impl Default for BatteryMonitorConfig {
    fn default() -> Self {
        Self {
            voltage_threshold: 18.9,
            points_trigger_alarm: 10,
            points_cancel_alarm: 3,
        }
    }
}

impl BatteryMonitorConfig {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if !self.voltage_threshold.is_finite() {
            errors.push(ValidationError {
                field: "battery.voltage_threshold".to_string(),
                message: format!("threshold must be finite, got {}", self.voltage_threshold),
            });
        }
        if self.points_trigger_alarm == 0 {
            errors.push(ValidationError {
                field: "battery.points_trigger_alarm".to_string(),
                message: "trigger point count must be at least 1".to_string(),
            });
        }
        if self.points_cancel_alarm == 0 {
            errors.push(ValidationError {
                field: "battery.points_cancel_alarm".to_string(),
                message: "cancel point count must be at least 1".to_string(),
            });
        }
        errors
    }
}

fn default_max_index() -> i64 {
    100
}

/// Simulation mode selection. The two variants are mutually exclusive
/// and chosen once, at configuration time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SimulationConfig {
    /// Cycle through pre-recorded log files.
    Replay {
        /// Ordered list of recorded `.dat` files.
        files: Vec<PathBuf>,
    },
    /// Synthesize channels from formulas over a sweeping index `x`.
    Expressions {
        /// Formula for the CH4 series; empty means constant zero.
        #[serde(default)]
        ch4: String,
        /// Formula for the CO2 series.
        #[serde(default)]
        co2: String,
        /// Formula for the H2O series.
        #[serde(default)]
        h2o: String,
        /// Formula for the battery voltage fed to the alarm monitor.
        #[serde(default)]
        battery: String,
        /// Upper bound of the triangular index sweep.
        #[serde(default = "default_max_index")]
        max_index: i64,
    },
}

impl SimulationConfig {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        match self {
            Self::Replay { files } => {
                if files.is_empty() {
                    errors.push(ValidationError {
                        field: "simulation.files".to_string(),
                        message: "replay mode requires at least one data file".to_string(),
                    });
                }
            }
            Self::Expressions { max_index, .. } => {
                if *max_index < 2 {
                    errors.push(ValidationError {
                        field: "simulation.max_index".to_string(),
                        message: format!("max_index must be at least 2, got {max_index}"),
                    });
                }
            }
        }
        errors
    }
}

/// A single configuration validation failure.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Errors that can occur loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the config file.
    #[error("failed to read config from {path}: {source}")]
    Read {
        /// The path that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the config file.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        /// The path that failed to parse.
        path: PathBuf,
        /// The underlying TOML error.
        source: toml::de::Error,
    },

    /// Failed to serialize the configuration.
    #[error("failed to serialize config: {0}")]
    Serialize(toml::ser::Error),

    /// Failed to write the config file.
    #[error("failed to write config to {path}: {source}")]
    Write {
        /// The path that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration is invalid.
    #[error("invalid configuration: {}", format_validation_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_shipped_instrument_config() {
        let config = Config::default();
        let battery = &config.battery;
        assert_eq!(battery.voltage_threshold, 18.9);
        assert_eq!(battery.points_trigger_alarm, 10);
        assert_eq!(battery.points_cancel_alarm, 3);
        assert!(config.simulation.is_none());
    }

    #[test]
    fn test_live_mode_requires_log_root() {
        let config = Config::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));

        let mut config = Config::default();
        config.logging.root = PathBuf::from("/data/userlogs");
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_replay_mode() {
        let config: Config = toml::from_str(
            r#"
            [logging]
            root = "/data/userlogs"

            [simulation]
            mode = "replay"
            files = ["/data/replays/run1.dat", "/data/replays/run2.dat"]
            "#,
        )
        .unwrap();
        match config.simulation.unwrap() {
            SimulationConfig::Replay { files } => assert_eq!(files.len(), 2),
            other => panic!("expected replay mode, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_expression_mode_with_defaults() {
        let config: Config = toml::from_str(
            r#"
            [battery]
            voltage_threshold = 19.5

            [simulation]
            mode = "expressions"
            ch4 = "10 * sin(x / 10) + 16"
            battery = "20 - x / 50"
            "#,
        )
        .unwrap();
        assert_eq!(config.battery.voltage_threshold, 19.5);
        match config.simulation.unwrap() {
            SimulationConfig::Expressions {
                ch4,
                co2,
                max_index,
                ..
            } => {
                assert!(ch4.contains("sin"));
                assert_eq!(co2, "");
                assert_eq!(max_index, 100);
            }
            other => panic!("expected expression mode, got {other:?}"),
        }
    }

    #[test]
    fn test_validation_rejects_zero_points() {
        let mut config = Config::default();
        config.logging.root = PathBuf::from("/data");
        config.battery.points_trigger_alarm = 0;
        let Err(ConfigError::Validation(errors)) = config.validate() else {
            panic!("expected validation failure");
        };
        assert!(errors.iter().any(|e| e.field.contains("trigger")));
    }

    #[test]
    fn test_validation_rejects_empty_replay_list() {
        let mut config = Config::default();
        config.simulation = Some(SimulationConfig::Replay { files: Vec::new() });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf/backpack.toml");

        let mut config = Config::default();
        config.logging.root = PathBuf::from("/data/userlogs");
        config.simulation = Some(SimulationConfig::Expressions {
            ch4: "x".to_string(),
            co2: String::new(),
            h2o: String::new(),
            battery: String::new(),
            max_index: 50,
        });
        config.save(&path).unwrap();

        let reloaded = Config::load_validated(&path).unwrap();
        assert_eq!(reloaded.logging.root, PathBuf::from("/data/userlogs"));
        match reloaded.simulation.unwrap() {
            SimulationConfig::Expressions { max_index, .. } => assert_eq!(max_index, 50),
            other => panic!("expected expression mode, got {other:?}"),
        }
    }
}
