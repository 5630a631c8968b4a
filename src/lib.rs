//! Live telemetry aggregation and alerting for an industrial dashboard.
//!
//! A [`monitor::Monitor`] polls a [`source::TelemetrySource`] on two timers,
//! feeds each completed fetch through the [`pipeline::Pipeline`] and
//! publishes a read-only [`pipeline::DashboardView`].

#[cfg(feature = "api")]
pub mod api;
pub mod config;
pub mod error;
pub mod io;
pub mod logging;
pub mod monitor;
/// Aggregation, health classification, rolling series and advisories.
pub mod pipeline;
pub mod source;

pub use config::DashboardConfig;
pub use error::{ConfigError, FetchError};
pub use monitor::{Monitor, MonitorClient, MonitorHandle};
pub use pipeline::{DashboardView, Pipeline};
