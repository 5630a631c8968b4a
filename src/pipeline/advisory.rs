//! Short operational advisories derived from health and grid context.

use serde::Serialize;

use super::health::HealthState;
use crate::error::ConfigError;
use super::types::{Band, GridContext};

/// Nominal line voltage used to turn amps into an approximate kW figure.
pub const NOMINAL_VOLTAGE_V: f64 = 230.0;
/// Renewable share above which a clean-energy advisory is emitted (%).
pub const RENEWABLE_FAVORABLE_PCT: f64 = 60.0;
/// Default number of advisories returned for display. Also the smallest
/// accepted cap, so the critical and default sets are never cut short.
pub const MAX_ADVISORIES: usize = 3;

/// Identifies which rule produced an advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvisoryKind {
    CarbonHigh,
    CarbonLow,
    PriceHigh,
    PriceLow,
    RenewableHigh,
    CriticalCurrent,
    FaultAttention,
    LoadReduction,
    NominalOperation,
    OptimalConsumption,
    NoAnomalies,
}

impl AdvisoryKind {
    /// Whether the advisory calls for operator attention.
    pub fn is_alert(self) -> bool {
        matches!(
            self,
            AdvisoryKind::CarbonHigh
                | AdvisoryKind::PriceHigh
                | AdvisoryKind::CriticalCurrent
                | AdvisoryKind::FaultAttention
                | AdvisoryKind::LoadReduction
        )
    }
}

/// A single human-readable advisory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Advisory {
    pub kind: AdvisoryKind,
    pub message: String,
}

impl Advisory {
    fn new(kind: AdvisoryKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Builds the advisory list shown next to the live metrics.
///
/// `Critical` health overrides everything with a fixed alert set. Otherwise
/// context-derived advisories come first, padded with the generic normalcy
/// set, and the result is capped at `max_messages`.
#[derive(Debug, Clone, PartialEq)]
pub struct AdvisoryComposer {
    nominal_voltage_v: f64,
    renewable_favorable_pct: f64,
    max_messages: usize,
}

impl Default for AdvisoryComposer {
    fn default() -> Self {
        Self {
            nominal_voltage_v: NOMINAL_VOLTAGE_V,
            renewable_favorable_pct: RENEWABLE_FAVORABLE_PCT,
            max_messages: MAX_ADVISORIES,
        }
    }
}

impl AdvisoryComposer {
    /// Creates a composer with explicit tuning.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the voltage is not a positive finite number,
    /// if the renewable share lies outside `[0, 100]`, or if `max_messages`
    /// is below [`MAX_ADVISORIES`].
    pub fn new(
        nominal_voltage_v: f64,
        renewable_favorable_pct: f64,
        max_messages: usize,
    ) -> Result<Self, ConfigError> {
        if !nominal_voltage_v.is_finite() || nominal_voltage_v <= 0.0 {
            return Err(ConfigError::new(
                "advisory.nominal_voltage_v",
                format!("must be finite and > 0, got {nominal_voltage_v}"),
            ));
        }
        if !(0.0..=100.0).contains(&renewable_favorable_pct) {
            return Err(ConfigError::new(
                "advisory.renewable_favorable_pct",
                format!("must be in [0, 100], got {renewable_favorable_pct}"),
            ));
        }
        if max_messages < MAX_ADVISORIES {
            return Err(ConfigError::new(
                "advisory.max_messages",
                format!("must be >= {MAX_ADVISORIES}, got {max_messages}"),
            ));
        }
        Ok(Self {
            nominal_voltage_v,
            renewable_favorable_pct,
            max_messages,
        })
    }

    /// Composes advisories for the current tick.
    ///
    /// # Arguments
    ///
    /// * `health` - Health state of the latest snapshot
    /// * `total_current_a` - Latest aggregate current, used for the cost estimate
    /// * `context` - Latest grid context, if one has been fetched
    pub fn compose(
        &self,
        health: HealthState,
        total_current_a: f64,
        context: Option<&GridContext>,
    ) -> Vec<Advisory> {
        let mut out = if health == HealthState::Critical {
            critical_set()
        } else {
            let mut contextual = context
                .map(|ctx| self.contextual(ctx, total_current_a))
                .unwrap_or_default();
            contextual.extend(default_set());
            contextual
        };
        out.truncate(self.max_messages);
        out
    }

    fn contextual(&self, ctx: &GridContext, total_current_a: f64) -> Vec<Advisory> {
        let mut out = Vec::new();

        match ctx.carbon_level {
            Band::High => out.push(Advisory::new(
                AdvisoryKind::CarbonHigh,
                format!(
                    "High carbon intensity ({} gCO\u{2082}/kWh). Consider deferring non-critical loads.",
                    ctx.carbon_intensity.round()
                ),
            )),
            Band::Low => out.push(Advisory::new(
                AdvisoryKind::CarbonLow,
                "Low carbon intensity period. Good time to run heavy equipment.",
            )),
            Band::Medium => {}
        }

        match ctx.pricing_tier {
            Band::High => {
                // Approximate kW from amps at nominal voltage, not measured power.
                let approx_kw = total_current_a * self.nominal_voltage_v / 1000.0;
                let cost = approx_kw * ctx.electricity_price;
                out.push(Advisory::new(
                    AdvisoryKind::PriceHigh,
                    format!(
                        "Peak pricing period (${:.4}/kWh). Running at {}A costs ~${:.2}/hr.",
                        ctx.electricity_price,
                        total_current_a.round(),
                        cost
                    ),
                ));
            }
            Band::Low => out.push(Advisory::new(
                AdvisoryKind::PriceLow,
                "Off-peak pricing. Cost-effective time to operate heavy loads.",
            )),
            Band::Medium => {}
        }

        if ctx.grid_renewable_percentage > self.renewable_favorable_pct {
            out.push(Advisory::new(
                AdvisoryKind::RenewableHigh,
                format!(
                    "Grid is {:.1}% renewable. Clean energy period!",
                    ctx.grid_renewable_percentage
                ),
            ));
        }

        out
    }
}

fn critical_set() -> Vec<Advisory> {
    vec![
        Advisory::new(
            AdvisoryKind::CriticalCurrent,
            "Critical current threshold exceeded",
        ),
        Advisory::new(
            AdvisoryKind::FaultAttention,
            "Immediate attention required for fault condition",
        ),
        Advisory::new(
            AdvisoryKind::LoadReduction,
            "Consider reducing load or shutting down non-essential devices",
        ),
    ]
}

fn default_set() -> Vec<Advisory> {
    vec![
        Advisory::new(
            AdvisoryKind::NominalOperation,
            "All systems operating within normal parameters",
        ),
        Advisory::new(
            AdvisoryKind::OptimalConsumption,
            "Power consumption is optimal",
        ),
        Advisory::new(
            AdvisoryKind::NoAnomalies,
            "No anomalies detected in the last hour",
        ),
    ]
}
