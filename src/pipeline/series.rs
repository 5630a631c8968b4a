//! Fixed-capacity rolling window of aggregate-current samples.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default number of samples kept for the chart.
pub const DEFAULT_CAPACITY: usize = 30;

/// One charted sample: total current at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub timestamp: DateTime<Utc>,
    /// Total current (A).
    pub current: f64,
}

impl SeriesPoint {
    pub fn new(timestamp: DateTime<Utc>, current: f64) -> Self {
        Self { timestamp, current }
    }
}

/// Strict FIFO window: appends at the back, evicts from the front once full.
///
/// Points are kept in insertion order. Out-of-order timestamps are accepted
/// as-is; callers supply non-decreasing input.
#[derive(Debug, Clone, PartialEq)]
pub struct RollingSeries {
    points: VecDeque<SeriesPoint>,
    capacity: usize,
}

impl RollingSeries {
    /// Creates an empty series holding at most `capacity` points.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::new("series.capacity", "must be > 0"));
        }
        Ok(Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    /// Appends a point, evicting the oldest ones beyond capacity.
    pub fn append(&mut self, point: SeriesPoint) -> &Self {
        self.points.push_back(point);
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }
        self
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recent point, if any.
    pub fn latest(&self) -> Option<&SeriesPoint> {
        self.points.back()
    }

    /// Iterates points oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &SeriesPoint> {
        self.points.iter()
    }

    /// Copies the window into a vector, oldest first.
    pub fn points(&self) -> Vec<SeriesPoint> {
        self.points.iter().copied().collect()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}

impl Default for RollingSeries {
    fn default() -> Self {
        Self {
            points: VecDeque::with_capacity(DEFAULT_CAPACITY),
            capacity: DEFAULT_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn point(i: i64) -> SeriesPoint {
        let t0 = Utc.timestamp_opt(1_700_000_000, 0).single().expect("valid epoch");
        SeriesPoint::new(t0 + Duration::seconds(i), i as f64)
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = RollingSeries::with_capacity(0).unwrap_err();
        assert_eq!(err.field, "series.capacity");
    }

    #[test]
    fn keeps_last_thirty_of_thirty_five() {
        let mut series = RollingSeries::with_capacity(30).expect("capacity > 0");
        for i in 0..35 {
            series.append(point(i));
        }
        assert_eq!(series.len(), 30);
        let currents: Vec<f64> = series.iter().map(|p| p.current).collect();
        let expected: Vec<f64> = (5..35).map(|i| i as f64).collect();
        assert_eq!(currents, expected);
    }

    #[test]
    fn below_capacity_keeps_everything() {
        let mut series = RollingSeries::default();
        series.append(point(0));
        series.append(point(1));
        assert_eq!(series.len(), 2);
        assert_eq!(series.latest().map(|p| p.current), Some(1.0));
    }

    #[test]
    fn out_of_order_timestamps_are_not_reordered() {
        let mut series = RollingSeries::with_capacity(3).expect("capacity > 0");
        series.append(point(5));
        series.append(point(2));
        let currents: Vec<f64> = series.iter().map(|p| p.current).collect();
        assert_eq!(currents, vec![5.0, 2.0]);
    }

    #[test]
    fn capacity_one_holds_latest_only() {
        let mut series = RollingSeries::with_capacity(1).expect("capacity > 0");
        series.append(point(1));
        series.append(point(2));
        assert_eq!(series.points(), vec![point(2)]);
    }

    #[test]
    fn clear_empties_window() {
        let mut series = RollingSeries::default();
        series.append(point(1));
        series.clear();
        assert!(series.is_empty());
        assert_eq!(series.capacity(), DEFAULT_CAPACITY);
    }
}
