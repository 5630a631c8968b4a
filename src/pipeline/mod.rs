//! Per-tick telemetry pipeline: aggregate, classify, window, advise.
//!
//! ```text
//! TelemetryBatch ──▶ AggregateSnapshot ──▶ HealthState ──┐
//!                          │                             ▼
//!                          └──▶ RollingSeries     AdvisoryComposer ◀── GridContext
//! ```
//!
//! [`Pipeline`] owns the only mutable state (the latest device readings, the
//! rolling series and the latest grid context) and applies completed fetches
//! in sequence order.

pub mod advisory;
pub mod aggregate;
pub mod health;
pub mod series;
pub mod types;
pub mod view;

pub use advisory::{Advisory, AdvisoryComposer, AdvisoryKind};
pub use aggregate::{AggregateSnapshot, aggregate};
pub use health::{HealthState, Thresholds, classify};
pub use series::{RollingSeries, SeriesPoint};
pub use types::{
    Band, ControlAck, ControlAction, DeviceList, DeviceReading, DeviceStatus, DeviceSummary,
    DeviceType, GridContext, TelemetryBatch,
};
pub use view::DashboardView;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::config::DashboardConfig;
use crate::error::ConfigError;

/// Stateful composition of the four pipeline stages.
///
/// Completions are tagged with a per-cycle sequence number; a completion
/// whose number is not newer than the last applied one is discarded so that
/// a slow fetch can never roll the view back.
#[derive(Debug, Clone)]
pub struct Pipeline {
    thresholds: Thresholds,
    composer: AdvisoryComposer,
    series: RollingSeries,
    devices: Vec<DeviceReading>,
    snapshot: AggregateSnapshot,
    health: HealthState,
    advisories: Vec<Advisory>,
    grid_context: Option<GridContext>,
    telemetry_seq: u64,
    grid_seq: u64,
}

impl Pipeline {
    /// Creates an empty pipeline.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if `series_capacity` is zero.
    pub fn new(
        thresholds: Thresholds,
        composer: AdvisoryComposer,
        series_capacity: usize,
    ) -> Result<Self, ConfigError> {
        let series = RollingSeries::with_capacity(series_capacity)?;
        let advisories = composer.compose(HealthState::Normal, 0.0, None);
        Ok(Self {
            thresholds,
            composer,
            series,
            devices: Vec::new(),
            snapshot: AggregateSnapshot::default(),
            health: HealthState::Normal,
            advisories,
            grid_context: None,
            telemetry_seq: 0,
            grid_seq: 0,
        })
    }

    /// Builds a pipeline from the `[thresholds]`, `[series]` and `[advisory]` sections.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError` hit while constructing the stages.
    pub fn from_config(cfg: &DashboardConfig) -> Result<Self, ConfigError> {
        let thresholds = Thresholds::new(
            cfg.thresholds.warning_current_a,
            cfg.thresholds.critical_current_a,
        )?;
        let a = &cfg.advisory;
        let composer =
            AdvisoryComposer::new(a.nominal_voltage_v, a.renewable_favorable_pct, a.max_messages)?;
        Self::new(thresholds, composer, cfg.series.capacity)
    }

    /// Applies a completed telemetry fetch.
    ///
    /// Returns `false` (and changes nothing) when `seq` is not newer than the
    /// last applied telemetry completion.
    pub fn apply_telemetry<'a, I>(&mut self, seq: u64, readings: I, now: DateTime<Utc>) -> bool
    where
        I: IntoIterator<Item = &'a DeviceReading>,
    {
        if seq <= self.telemetry_seq {
            debug!(seq, last = self.telemetry_seq, "discarding stale telemetry");
            return false;
        }

        let devices: Vec<DeviceReading> = readings.into_iter().cloned().collect();
        let snapshot = AggregateSnapshot::from_readings(&devices);
        let health = self.thresholds.classify(&snapshot);
        if health != self.health {
            info!(
                from = %self.health,
                to = %health,
                total_current_a = snapshot.total_current,
                has_fault = snapshot.has_fault,
                "health changed"
            );
        }

        self.series.append(SeriesPoint::new(now, snapshot.total_current));
        self.devices = devices;
        self.snapshot = snapshot;
        self.health = health;
        self.telemetry_seq = seq;
        self.recompose();

        debug!(
            seq,
            device_count = self.snapshot.device_count,
            total_current_a = self.snapshot.total_current,
            health = %self.health,
            "telemetry applied"
        );
        true
    }

    /// Applies a completed grid-context fetch, replacing the previous context.
    ///
    /// Returns `false` when `seq` is not newer than the last applied one.
    pub fn apply_grid_context(&mut self, seq: u64, context: GridContext) -> bool {
        if seq <= self.grid_seq {
            debug!(seq, last = self.grid_seq, "discarding stale grid context");
            return false;
        }
        debug!(
            seq,
            carbon_level = %context.carbon_level,
            pricing_tier = %context.pricing_tier,
            "grid context applied"
        );
        self.grid_context = Some(context);
        self.grid_seq = seq;
        self.recompose();
        true
    }

    fn recompose(&mut self) {
        self.advisories = self.composer.compose(
            self.health,
            self.snapshot.total_current,
            self.grid_context.as_ref(),
        );
    }

    /// Readings from the last applied batch, in the order they arrived.
    pub fn devices(&self) -> &[DeviceReading] {
        &self.devices
    }

    pub fn snapshot(&self) -> &AggregateSnapshot {
        &self.snapshot
    }

    pub fn health(&self) -> HealthState {
        self.health
    }

    pub fn series(&self) -> &RollingSeries {
        &self.series
    }

    pub fn advisories(&self) -> &[Advisory] {
        &self.advisories
    }

    pub fn grid_context(&self) -> Option<&GridContext> {
        self.grid_context.as_ref()
    }

    /// Renders the current state as an immutable view.
    pub fn view(&self) -> DashboardView {
        let estimated_cost_per_hour = self
            .grid_context
            .as_ref()
            .map_or(0.0, |ctx| self.snapshot.estimated_cost_per_hour(ctx.electricity_price));
        DashboardView {
            devices: self.devices.clone(),
            snapshot: self.snapshot.clone(),
            health: self.health,
            series: self.series.points(),
            advisories: self.advisories.clone(),
            grid_context: self.grid_context.clone(),
            estimated_cost_per_hour,
            critical_current: self.thresholds.is_critical_current(&self.snapshot),
            telemetry_seq: self.telemetry_seq,
            grid_seq: self.grid_seq,
        }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        let composer = AdvisoryComposer::default();
        let advisories = composer.compose(HealthState::Normal, 0.0, None);
        Self {
            thresholds: Thresholds::default(),
            composer,
            series: RollingSeries::default(),
            devices: Vec::new(),
            snapshot: AggregateSnapshot::default(),
            health: HealthState::Normal,
            advisories,
            grid_context: None,
            telemetry_seq: 0,
            grid_seq: 0,
        }
    }
}
