//! Core data types for the backpack analyzer polling protocol.

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Header name of the battery voltage column.
///
/// Voltage is consumed by the alarm path and is never surfaced as a
/// series in a [`DataBatch`].
pub const VOLTAGE_COLUMN: &str = "Battery_Voltage";

/// A tracked series column in the analyzer's user log.
///
/// Unknown columns in a log header are reported and skipped; only
/// these four are collected into typed series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Channel {
    /// Measurement timestamp in seconds since the Unix epoch.
    #[cfg_attr(feature = "serde", serde(rename = "EPOCH_TIME"))]
    EpochTime,
    /// Methane concentration.
    #[cfg_attr(feature = "serde", serde(rename = "CH4"))]
    Ch4,
    /// Carbon dioxide concentration.
    #[cfg_attr(feature = "serde", serde(rename = "CO2"))]
    Co2,
    /// Water vapor concentration.
    #[cfg_attr(feature = "serde", serde(rename = "H2O"))]
    H2o,
}

impl Channel {
    /// All tracked channels, in batch order.
    pub const ALL: [Channel; 4] = [
        Channel::EpochTime,
        Channel::Ch4,
        Channel::Co2,
        Channel::H2o,
    ];

    /// The on-disk header name of this channel.
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::EpochTime => "EPOCH_TIME",
            Channel::Ch4 => "CH4",
            Channel::Co2 => "CO2",
            Channel::H2o => "H2O",
        }
    }

    /// Map a log header column name to a tracked channel, if any.
    pub fn from_column(name: &str) -> Option<Channel> {
        match name {
            "EPOCH_TIME" => Some(Channel::EpochTime),
            "CH4" => Some(Channel::Ch4),
            "CO2" => Some(Channel::Co2),
            "H2O" => Some(Channel::H2o),
            _ => None,
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One poll response: the rows appended since the client's cursor,
/// plus the alarm bitmask and the resolved file name.
///
/// Serializes to the wire shape the dashboard consumes: `next_row`,
/// `file_name`, `alarm`, `data`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DataBatch {
    /// The cursor the client should present on its next poll.
    ///
    /// `-1` is the simulation-stream sentinel: the source tracks its
    /// own position and the client should keep polling unconditionally.
    #[cfg_attr(feature = "serde", serde(rename = "next_row"))]
    pub next_cursor: i64,
    /// The log file the rows came from; empty when no file exists yet.
    pub file_name: String,
    /// Current alarm register bitmask.
    pub alarm: u32,
    /// Per-channel series, one value per accepted row.
    pub data: BTreeMap<Channel, Vec<f64>>,
}

impl DataBatch {
    /// The designed "no instrument data yet" batch: empty file name,
    /// every tracked channel present with an empty series, the
    /// client's cursor echoed back.
    pub fn empty(cursor: i64, alarm: u32) -> Self {
        Self {
            next_cursor: cursor,
            file_name: String::new(),
            alarm,
            data: Channel::ALL.iter().map(|c| (*c, Vec::new())).collect(),
        }
    }

    /// Total number of rows across the timestamp series.
    ///
    /// Series are parallel, so the timestamp channel's length is the
    /// row count for the whole batch.
    pub fn row_count(&self) -> usize {
        self.data
            .get(&Channel::EpochTime)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// True if no rows were delivered.
    pub fn is_empty(&self) -> bool {
        self.data.values().all(Vec::is_empty)
    }
}
