//! TOML-based monitor configuration.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::pipeline::advisory::{MAX_ADVISORIES, NOMINAL_VOLTAGE_V, RENEWABLE_FAVORABLE_PCT};
use crate::pipeline::health::{CRITICAL_CURRENT_A, WARNING_CURRENT_A};
use crate::pipeline::series::DEFAULT_CAPACITY;

/// Top-level configuration parsed from TOML.
///
/// Every section is optional and falls back to the built-in defaults. Load
/// with [`DashboardConfig::from_toml_file`] or use
/// [`DashboardConfig::default`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DashboardConfig {
    /// Health classification thresholds.
    #[serde(default)]
    pub thresholds: ThresholdsConfig,
    /// Rolling chart window.
    #[serde(default)]
    pub series: SeriesConfig,
    /// Fast and slow polling cadences.
    #[serde(default)]
    pub polling: PollingConfig,
    /// Advisory composition parameters.
    #[serde(default)]
    pub advisory: AdvisoryConfig,
    /// Telemetry backend connection.
    #[serde(default)]
    pub source: SourceConfig,
}

/// Health classification thresholds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThresholdsConfig {
    /// Total current above which health is `warning` (A).
    pub warning_current_a: f64,
    /// Total current above which health is `critical` (A).
    pub critical_current_a: f64,
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            warning_current_a: WARNING_CURRENT_A,
            critical_current_a: CRITICAL_CURRENT_A,
        }
    }
}

/// Rolling chart window.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeriesConfig {
    /// Maximum number of samples kept (must be > 0).
    pub capacity: usize,
}

impl Default for SeriesConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

/// Fast and slow polling cadences.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PollingConfig {
    /// Telemetry refetch interval (ms).
    pub telemetry_interval_ms: u64,
    /// Grid-context refetch interval (s).
    pub grid_interval_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            telemetry_interval_ms: 1_000,
            grid_interval_secs: 15 * 60,
        }
    }
}

impl PollingConfig {
    pub fn telemetry_interval(&self) -> Duration {
        Duration::from_millis(self.telemetry_interval_ms)
    }

    pub fn grid_interval(&self) -> Duration {
        Duration::from_secs(self.grid_interval_secs)
    }
}

/// Advisory composition parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdvisoryConfig {
    /// Nominal voltage used for the peak-price cost estimate (V).
    pub nominal_voltage_v: f64,
    /// Renewable share above which the clean-energy advisory fires (%).
    pub renewable_favorable_pct: f64,
    /// Maximum advisories returned per tick; at least 3.
    pub max_messages: usize,
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self {
            nominal_voltage_v: NOMINAL_VOLTAGE_V,
            renewable_favorable_pct: RENEWABLE_FAVORABLE_PCT,
            max_messages: MAX_ADVISORIES,
        }
    }
}

/// Telemetry backend connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    /// Base URL of the dashboard backend.
    pub base_url: String,
    /// Per-request timeout (ms).
    pub timeout_ms: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_ms: 3_000,
        }
    }
}

impl SourceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl DashboardConfig {
    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("config", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns every violation found.
    ///
    /// Returns an empty vector if the configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let t = &self.thresholds;
        if !t.warning_current_a.is_finite() || t.warning_current_a < 0.0 {
            errors.push(ConfigError::new(
                "thresholds.warning_current_a",
                "must be finite and >= 0",
            ));
        }
        if !t.critical_current_a.is_finite() || t.critical_current_a < 0.0 {
            errors.push(ConfigError::new(
                "thresholds.critical_current_a",
                "must be finite and >= 0",
            ));
        }
        if t.warning_current_a > t.critical_current_a {
            errors.push(ConfigError::new(
                "thresholds.warning_current_a",
                "must be <= thresholds.critical_current_a",
            ));
        }

        if self.series.capacity == 0 {
            errors.push(ConfigError::new("series.capacity", "must be > 0"));
        }

        let p = &self.polling;
        if p.telemetry_interval_ms == 0 {
            errors.push(ConfigError::new("polling.telemetry_interval_ms", "must be > 0"));
        }
        if p.grid_interval_secs == 0 {
            errors.push(ConfigError::new("polling.grid_interval_secs", "must be > 0"));
        }

        let a = &self.advisory;
        if !a.nominal_voltage_v.is_finite() || a.nominal_voltage_v <= 0.0 {
            errors.push(ConfigError::new("advisory.nominal_voltage_v", "must be > 0"));
        }
        if !(0.0..=100.0).contains(&a.renewable_favorable_pct) {
            errors.push(ConfigError::new(
                "advisory.renewable_favorable_pct",
                "must be in [0, 100]",
            ));
        }
        if a.max_messages < MAX_ADVISORIES {
            errors.push(ConfigError::new(
                "advisory.max_messages",
                format!("must be >= {MAX_ADVISORIES}"),
            ));
        }

        let s = &self.source;
        if !(s.base_url.starts_with("http://") || s.base_url.starts_with("https://")) {
            errors.push(ConfigError::new(
                "source.base_url",
                "must start with http:// or https://",
            ));
        }
        if s.timeout_ms == 0 {
            errors.push(ConfigError::new("source.timeout_ms", "must be > 0"));
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_valid() {
        let errors = DashboardConfig::default().validate();
        assert!(errors.is_empty(), "defaults should be valid: {errors:?}");
    }

    #[test]
    fn defaults_match_dashboard_constants() {
        let cfg = DashboardConfig::default();
        assert_eq!(cfg.thresholds.critical_current_a, 100.0);
        assert_eq!(cfg.thresholds.warning_current_a, 80.0);
        assert_eq!(cfg.series.capacity, 30);
        assert_eq!(cfg.polling.telemetry_interval(), Duration::from_secs(1));
        assert_eq!(cfg.polling.grid_interval(), Duration::from_secs(900));
        assert_eq!(cfg.advisory.max_messages, 3);
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[thresholds]
warning_current_a = 60.0
critical_current_a = 75.0

[series]
capacity = 120

[polling]
telemetry_interval_ms = 500
grid_interval_secs = 60

[advisory]
nominal_voltage_v = 120.0
renewable_favorable_pct = 50.0
max_messages = 5

[source]
base_url = "https://grid.example.com"
timeout_ms = 1500
"#;
        let cfg = DashboardConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.series.capacity), Some(120));
        assert_eq!(
            cfg.as_ref().map(|c| c.source.base_url.as_str()),
            Some("https://grid.example.com")
        );
        assert_eq!(cfg.as_ref().map(|c| c.advisory.max_messages), Some(5));
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[series]
capacity = 10
bogus_field = true
"#;
        assert!(DashboardConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[thresholds]
critical_current_a = 150.0
"#;
        let cfg = DashboardConfig::from_toml_str(toml).expect("partial TOML should parse");
        assert_eq!(cfg.thresholds.critical_current_a, 150.0);
        assert_eq!(cfg.thresholds.warning_current_a, 80.0);
        assert_eq!(cfg.series.capacity, 30);
    }

    #[test]
    fn validation_catches_zero_capacity() {
        let mut cfg = DashboardConfig::default();
        cfg.series.capacity = 0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "series.capacity"));
    }

    #[test]
    fn validation_catches_zero_advisory_cap() {
        let cfg = DashboardConfig::from_toml_str("[advisory]\nmax_messages = 0")
            .expect("TOML should parse");
        let errors = cfg.validate();
        assert!(
            errors.iter().any(|e| e.field == "advisory.max_messages"),
            "{errors:?}"
        );
    }

    #[test]
    fn validation_catches_inverted_thresholds() {
        let mut cfg = DashboardConfig::default();
        cfg.thresholds.warning_current_a = 120.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "thresholds.warning_current_a"));
    }

    #[test]
    fn validation_collects_multiple_errors() {
        let mut cfg = DashboardConfig::default();
        cfg.polling.telemetry_interval_ms = 0;
        cfg.source.base_url = "localhost:8000".to_string();
        let errors = cfg.validate();
        assert_eq!(errors.len(), 2, "{errors:?}");
    }

    #[test]
    fn missing_file_reports_path() {
        let err = DashboardConfig::from_toml_file(Path::new("/nonexistent/grid-sense.toml"))
            .unwrap_err();
        assert_eq!(err.field, "config");
        assert!(err.message.contains("/nonexistent/grid-sense.toml"));
    }
}
