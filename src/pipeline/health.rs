//! Threshold-based system health classification.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::aggregate::AggregateSnapshot;
use crate::error::ConfigError;

/// Default total current above which the system is critical (A).
pub const CRITICAL_CURRENT_A: f64 = 100.0;
/// Default total current above which the system is in warning (A).
pub const WARNING_CURRENT_A: f64 = 80.0;

/// Discrete system health state, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Normal,
    Warning,
    Critical,
}

impl HealthState {
    /// Returns a short symbol for display.
    pub fn symbol(&self) -> &'static str {
        match self {
            HealthState::Normal => "OK",
            HealthState::Warning => "WARN",
            HealthState::Critical => "CRIT",
        }
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            HealthState::Normal => "normal",
            HealthState::Warning => "warning",
            HealthState::Critical => "critical",
        };
        f.write_str(label)
    }
}

/// Current thresholds used to classify an [`AggregateSnapshot`].
///
/// Comparisons are strict: a total exactly at a threshold stays in the lower
/// state. No hysteresis is applied, so a total oscillating around a threshold
/// flips state tick to tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Thresholds {
    warning_current_a: f64,
    critical_current_a: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            warning_current_a: WARNING_CURRENT_A,
            critical_current_a: CRITICAL_CURRENT_A,
        }
    }
}

impl Thresholds {
    /// Creates a threshold pair.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if either value is negative or not finite, or
    /// if the warning threshold exceeds the critical one.
    pub fn new(warning_current_a: f64, critical_current_a: f64) -> Result<Self, ConfigError> {
        if !warning_current_a.is_finite() || warning_current_a < 0.0 {
            return Err(ConfigError::new(
                "thresholds.warning_current_a",
                format!("must be finite and >= 0, got {warning_current_a}"),
            ));
        }
        if !critical_current_a.is_finite() || critical_current_a < 0.0 {
            return Err(ConfigError::new(
                "thresholds.critical_current_a",
                format!("must be finite and >= 0, got {critical_current_a}"),
            ));
        }
        if warning_current_a > critical_current_a {
            return Err(ConfigError::new(
                "thresholds.warning_current_a",
                format!(
                    "must be <= critical_current_a ({warning_current_a} > {critical_current_a})"
                ),
            ));
        }
        Ok(Self {
            warning_current_a,
            critical_current_a,
        })
    }

    /// Returns `true` when total current alone exceeds the critical threshold.
    pub fn is_critical_current(&self, snapshot: &AggregateSnapshot) -> bool {
        snapshot.total_current > self.critical_current_a
    }

    /// Classifies a snapshot. First match wins:
    ///
    /// 1. current above critical, or any fault -> `Critical`
    /// 2. current above warning -> `Warning`
    /// 3. otherwise -> `Normal`
    pub fn classify(&self, snapshot: &AggregateSnapshot) -> HealthState {
        if self.is_critical_current(snapshot) || snapshot.has_fault {
            HealthState::Critical
        } else if snapshot.total_current > self.warning_current_a {
            HealthState::Warning
        } else {
            HealthState::Normal
        }
    }
}

/// Classifies a snapshot against the default thresholds.
pub fn classify(snapshot: &AggregateSnapshot) -> HealthState {
    Thresholds::default().classify(snapshot)
}
