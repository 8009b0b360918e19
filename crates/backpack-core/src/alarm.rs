//! Alarm register: a bitmask of named boolean alarm conditions.

use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// Name of the low-battery alarm.
pub const BATTERY_VOLTAGE_ALARM: &str = "battery_voltage";

/// A bitmask of named alarm conditions.
///
/// The name-to-bit assignment is fixed at construction; no two alarms
/// share a bit. Only [`AlarmRegister::set`] mutates the register —
/// everything else reads [`AlarmRegister::value`].
///
/// # Example
///
/// ```
/// use backpack_core::alarm::{AlarmRegister, BATTERY_VOLTAGE_ALARM};
///
/// let mut alarms = AlarmRegister::with_default_alarms();
/// alarms.set(BATTERY_VOLTAGE_ALARM, true).unwrap();
/// assert_eq!(alarms.value(), 0x1);
/// ```
#[derive(Debug, Clone)]
pub struct AlarmRegister {
    register: u32,
    masks: BTreeMap<String, u32>,
}

impl AlarmRegister {
    /// Create a register with the given alarm names, assigning bit 0
    /// to the first name, bit 1 to the second, and so on.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let masks = names
            .into_iter()
            .enumerate()
            .map(|(bit, name)| (name.into(), 1u32 << bit))
            .collect();
        Self { register: 0, masks }
    }

    /// Create a register with the fixed alarm set the server knows at
    /// startup (currently just `battery_voltage` at bit 0).
    pub fn with_default_alarms() -> Self {
        Self::new([BATTERY_VOLTAGE_ALARM])
    }

    /// Set or clear the bit for a named alarm.
    ///
    /// An unknown name is a configuration error, not something that
    /// can be recovered at call time.
    pub fn set(&mut self, name: &str, active: bool) -> Result<()> {
        let mask = self
            .masks
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownAlarm(name.to_string()))?;
        if active {
            self.register |= mask;
        } else {
            self.register &= !mask;
        }
        Ok(())
    }

    /// The current bitmask.
    pub fn value(&self) -> u32 {
        self.register
    }
}
