//! Debounced low-voltage detection for the analyzer battery.
//!
//! The battery voltage trace is noisy; a single dip below the alarm
//! threshold must not flap the alarm. The monitor requires at least
//! `trigger_points` consecutive below-threshold samples before the
//! alarm turns on, and a clean run of above-threshold samples (one
//! transition sample plus `cancel_points` more) before it turns off.
//! A bounce back below the threshold mid-cancellation keeps the alarm
//! latched.

/// Debounced threshold detector for one monitored scalar channel.
///
/// Owns its hysteresis state exclusively; feed it every new battery
/// voltage sample, in order, via [`BatteryVoltageMonitor::check_value`].
///
/// # Example
///
/// ```
/// use backpack_core::hysteresis::BatteryVoltageMonitor;
///
/// let mut monitor = BatteryVoltageMonitor::new(18.9, 3, 2);
/// for _ in 0..3 {
///     assert!(!monitor.check_value(17.0));
/// }
/// assert!(monitor.check_value(17.0)); // fourth consecutive low sample
/// ```
#[derive(Debug, Clone)]
pub struct BatteryVoltageMonitor {
    threshold: f64,
    trigger_points: u32,
    cancel_points: u32,
    previous_value: f64,
    consecutive_count: u32,
}

impl BatteryVoltageMonitor {
    /// Create a monitor.
    ///
    /// `trigger_points` is the minimum run of low samples before the
    /// alarm raises; `cancel_points` is the exact run of high samples
    /// (after the crossing sample) that clears it.
    pub fn new(threshold: f64, trigger_points: u32, cancel_points: u32) -> Self {
        Self {
            threshold,
            trigger_points,
            cancel_points,
            previous_value: 0.0,
            consecutive_count: 0,
        }
    }

    /// The configured voltage threshold.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Feed one voltage sample and get the alarm decision for it.
    ///
    /// Samples must arrive in acquisition order; the debounce count is
    /// meaningless otherwise.
    ///
    /// A sample exactly equal to the threshold is classified as below
    /// threshold: supply sitting on the alarm line is not healthy, so
    /// the low branch runs. (The behavior was undefined upstream; this
    /// is the deliberate policy here.)
    pub fn check_value(&mut self, voltage: f64) -> bool {
        let crossed = (self.previous_value - self.threshold) * (voltage - self.threshold) < 0.0;
        let result = if crossed {
            // The transition sample inherits the side the previous
            // sample was on, whichever direction the crossing went.
            self.consecutive_count = 1;
            self.previous_value < self.threshold
        } else if voltage <= self.threshold {
            let result = self.consecutive_count >= self.trigger_points;
            self.consecutive_count += 1;
            result
        } else if self.consecutive_count == 0 {
            false
        } else if self.consecutive_count == self.cancel_points {
            self.consecutive_count = 0;
            false
        } else {
            self.consecutive_count += 1;
            true
        };
        self.previous_value = voltage;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const THRESHOLD: f64 = 18.9;

    /// Drive the monitor below threshold until the alarm is active.
    fn raise_alarm(monitor: &mut BatteryVoltageMonitor, trigger: u32) {
        for _ in 0..=trigger {
            monitor.check_value(17.0);
        }
    }

    #[test]
    fn test_trigger_requires_consecutive_lows() {
        let mut monitor = BatteryVoltageMonitor::new(THRESHOLD, 3, 2);
        assert!(!monitor.check_value(17.0)); // count 0
        assert!(!monitor.check_value(17.2)); // count 1
        assert!(!monitor.check_value(16.8)); // count 2
        assert!(monitor.check_value(17.0)); // count 3 >= trigger
        assert!(monitor.check_value(17.0)); // stays on
    }

    #[test]
    fn test_crossing_sample_inherits_previous_side() {
        // spec'd pair: previous=17.0, current=19.5 -> true.
        let mut monitor = BatteryVoltageMonitor::new(THRESHOLD, 10, 3);
        monitor.check_value(17.0);
        assert!(monitor.check_value(19.5));

        // And the other direction: previous=19.5, current=17.0 -> false.
        let mut monitor = BatteryVoltageMonitor::new(THRESHOLD, 10, 3);
        monitor.check_value(20.0); // establish a high previous sample
        monitor.check_value(19.5);
        assert!(!monitor.check_value(17.0));
    }

    #[test]
    fn test_exact_cancel_count_clears() {
        let cancel = 3;
        let mut monitor = BatteryVoltageMonitor::new(THRESHOLD, 2, cancel);
        raise_alarm(&mut monitor, 2);

        // Transition sample inherits the alarm.
        assert!(monitor.check_value(19.5));
        // cancel - 1 further highs keep it on.
        assert!(monitor.check_value(19.6));
        assert!(monitor.check_value(19.4));
        // The cancel-th high sample after the transition clears it.
        assert!(!monitor.check_value(19.5));
        // And it stays off.
        assert!(!monitor.check_value(19.5));
    }

    #[test]
    fn test_interrupted_cancel_keeps_alarm_latched() {
        let mut monitor = BatteryVoltageMonitor::new(THRESHOLD, 2, 3);
        raise_alarm(&mut monitor, 2);

        // Start a cancellation run but drop back below before it
        // completes.
        assert!(monitor.check_value(19.5)); // transition, count = 1
        assert!(monitor.check_value(19.5)); // count = 2 (< cancel)
        monitor.check_value(17.0); // bounce low: crossing, count resets to 1

        // A bounce back above reports the alarm still latched; after a
        // completed cancellation the same sample would report false.
        assert!(monitor.check_value(19.5));
    }

    #[test]
    fn test_high_after_completed_cancel_stays_clear() {
        let mut monitor = BatteryVoltageMonitor::new(THRESHOLD, 2, 1);
        raise_alarm(&mut monitor, 2);
        assert!(monitor.check_value(19.5)); // transition
        assert!(!monitor.check_value(19.5)); // count == cancel, clears
        assert!(!monitor.check_value(19.5)); // count 0: stays clear
        assert!(!monitor.check_value(19.5));
    }

    #[test]
    fn test_exact_threshold_counts_as_low() {
        let mut monitor = BatteryVoltageMonitor::new(THRESHOLD, 2, 2);
        assert!(!monitor.check_value(THRESHOLD)); // count 0
        assert!(!monitor.check_value(THRESHOLD)); // count 1
        assert!(monitor.check_value(THRESHOLD)); // count 2 >= trigger
    }

    proptest! {
        #[test]
        fn prop_alarm_raises_at_trigger_count(
            trigger in 1u32..20,
            len in 0usize..64,
            voltage in 10.0f64..18.0,
        ) {
            let mut monitor = BatteryVoltageMonitor::new(THRESHOLD, trigger, 3);
            for i in 0..len {
                let result = monitor.check_value(voltage);
                prop_assert_eq!(result, i as u32 >= trigger);
            }
        }

        #[test]
        fn prop_cancel_clears_exactly_once(
            cancel in 1u32..12,
            highs in 1usize..40,
        ) {
            let mut monitor = BatteryVoltageMonitor::new(THRESHOLD, 2, cancel);
            raise_alarm(&mut monitor, 2);

            prop_assert!(monitor.check_value(19.5)); // transition
            for i in 1..highs {
                let result = monitor.check_value(19.5);
                // On after the transition until the cancel count is
                // reached, off from then on.
                prop_assert_eq!(result, (i as u32) < cancel);
            }
        }
    }
}
