//! Reduction of a telemetry batch into grid-wide scalar metrics.

use std::fmt;

use serde::Serialize;

use super::types::DeviceReading;

/// Aggregate metrics derived from one batch of device readings.
///
/// Recomputed from scratch every tick. Inputs are summed as reported, so a
/// malformed reading (NaN, negative) propagates into the totals unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateSnapshot {
    /// Sum of device currents (A).
    pub total_current: f64,
    /// Sum of device powers (W).
    pub total_power: f64,
    /// Unweighted mean of device voltages (V); 0 for an empty batch.
    pub avg_voltage: f64,
    /// Number of readings folded into this snapshot.
    pub device_count: usize,
    /// Whether any reading reported a fault.
    pub has_fault: bool,
}

impl AggregateSnapshot {
    /// Folds a batch of readings into a snapshot.
    ///
    /// # Examples
    ///
    /// ```
    /// use grid_sense::pipeline::AggregateSnapshot;
    ///
    /// let snapshot = AggregateSnapshot::from_readings(std::iter::empty());
    /// assert_eq!(snapshot.device_count, 0);
    /// assert_eq!(snapshot.avg_voltage, 0.0);
    /// ```
    pub fn from_readings<'a, I>(readings: I) -> Self
    where
        I: IntoIterator<Item = &'a DeviceReading>,
    {
        let mut total_current = 0.0_f64;
        let mut total_power = 0.0_f64;
        let mut total_voltage = 0.0_f64;
        let mut count = 0_usize;
        let mut has_fault = false;

        for r in readings {
            total_current += r.current;
            total_power += r.power;
            total_voltage += r.voltage;
            has_fault |= r.status.is_fault();
            count += 1;
        }

        let avg_voltage = if count > 0 {
            total_voltage / count as f64
        } else {
            0.0
        };

        Self {
            total_current,
            total_power,
            avg_voltage,
            device_count: count,
            has_fault,
        }
    }

    /// Hourly cost at the given price, using measured power.
    pub fn estimated_cost_per_hour(&self, price_per_kwh: f64) -> f64 {
        self.total_power / 1000.0 * price_per_kwh
    }
}

/// Shorthand for [`AggregateSnapshot::from_readings`].
pub fn aggregate<'a, I>(readings: I) -> AggregateSnapshot
where
    I: IntoIterator<Item = &'a DeviceReading>,
{
    AggregateSnapshot::from_readings(readings)
}

impl fmt::Display for AggregateSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "devices={} | current={:.2} A  power={:.0} W  voltage={:.1} V | fault={}",
            self.device_count, self.total_current, self.total_power, self.avg_voltage, self.has_fault
        )
    }
}
