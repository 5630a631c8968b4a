//! Read-only values published to the presentation layer after each tick.

use serde::Serialize;

use super::advisory::Advisory;
use super::aggregate::AggregateSnapshot;
use super::health::HealthState;
use super::series::SeriesPoint;
use super::types::{DeviceReading, GridContext};

/// Everything a dashboard needs to render one frame.
///
/// Rebuilt from the pipeline after every applied completion; consumers never
/// mutate it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    /// Per-device readings from the last applied batch, in batch order.
    pub devices: Vec<DeviceReading>,
    pub snapshot: AggregateSnapshot,
    pub health: HealthState,
    /// Rolling current series, oldest first.
    pub series: Vec<SeriesPoint>,
    pub advisories: Vec<Advisory>,
    pub grid_context: Option<GridContext>,
    /// Measured-power cost estimate ($/hr); 0 until a grid context arrives.
    pub estimated_cost_per_hour: f64,
    /// Total current alone is above the critical threshold.
    pub critical_current: bool,
    /// Sequence number of the last applied telemetry completion (0 = none yet).
    pub telemetry_seq: u64,
    /// Sequence number of the last applied grid-context completion (0 = none yet).
    pub grid_seq: u64,
}

impl DashboardView {
    /// Returns `true` until the first telemetry batch has been applied.
    pub fn is_empty(&self) -> bool {
        self.telemetry_seq == 0
    }

    /// Looks up one device in the last applied batch.
    pub fn device(&self, device_id: &str) -> Option<&DeviceReading> {
        self.devices.iter().find(|d| d.device_id == device_id)
    }
}
