//! Data source abstraction for the telemetry backend.
//!
//! The monitor never talks to the network directly; it is handed a
//! [`TelemetrySource`] at construction. Implementations:
//!
//! - [`HttpSource`]: the dashboard backend over HTTP (feature `http`)
//! - [`FileSource`]: a JSON fixture re-read on every fetch
//! - [`MemorySource`]: an in-process backend for tests and demos

mod file;
#[cfg(feature = "http")]
mod http;
mod memory;

pub use file::{FileSource, Fixture};
#[cfg(feature = "http")]
pub use http::HttpSource;
pub use memory::MemorySource;

use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::FetchError;
use crate::pipeline::types::{
    ControlAck, ControlAction, DeviceList, DeviceReading, DeviceSummary, GridContext,
    TelemetryBatch,
};

/// Backend operations consumed by the monitor.
#[async_trait]
pub trait TelemetrySource: Send + Sync + Debug {
    /// Fetches the latest reading of every device, keyed by device id.
    async fn fetch_live_telemetry(&self) -> Result<TelemetryBatch, FetchError>;

    /// Fetches the current grid context.
    async fn fetch_grid_context(&self) -> Result<GridContext, FetchError>;

    /// Lists every device with its type and status.
    ///
    /// The default derives the inventory from a live-telemetry fetch.
    async fn list_devices(&self) -> Result<DeviceList, FetchError> {
        let batch = self.fetch_live_telemetry().await?;
        Ok(batch.values().map(DeviceSummary::from).collect())
    }

    /// Fetches the latest reading of a single device.
    ///
    /// The default picks the device out of a live-telemetry fetch.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::UnknownDevice` if no device has this id.
    async fn fetch_device(&self, device_id: &str) -> Result<DeviceReading, FetchError> {
        let mut batch = self.fetch_live_telemetry().await?;
        batch
            .remove(device_id)
            .ok_or_else(|| FetchError::UnknownDevice(device_id.to_string()))
    }

    /// Sends a control command to a device.
    ///
    /// A refusal for the device's current state comes back as an `Ok` ack
    /// with `status: "error"`. A command the device type does not support is
    /// `FetchError::Rejected`.
    async fn send_device_control(
        &self,
        device_id: &str,
        action: ControlAction,
    ) -> Result<ControlAck, FetchError>;

    /// Human-readable description used in logs.
    fn description(&self) -> &str;
}
