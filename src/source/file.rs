//! File-based data source.
//!
//! Reads a JSON fixture on every fetch so that edits to the file show up on
//! the next tick without restarting the monitor.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::TelemetrySource;
use crate::error::FetchError;
use crate::pipeline::types::{ControlAck, ControlAction, GridContext, TelemetryBatch};

/// On-disk fixture layout.
///
/// ```json
/// { "devices": { "motor_001": { ... } }, "grid": { ... } }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub devices: TelemetryBatch,
    #[serde(default)]
    pub grid: Option<GridContext>,
}

/// A read-only source backed by a JSON fixture file.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    description: String,
}

impl FileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self { path, description }
    }

    fn read_fixture(&self) -> Result<Fixture, FetchError> {
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[async_trait]
impl TelemetrySource for FileSource {
    async fn fetch_live_telemetry(&self) -> Result<TelemetryBatch, FetchError> {
        Ok(self.read_fixture()?.devices)
    }

    async fn fetch_grid_context(&self) -> Result<GridContext, FetchError> {
        self.read_fixture()?.grid.ok_or(FetchError::NoGridContext)
    }

    async fn send_device_control(
        &self,
        _device_id: &str,
        _action: ControlAction,
    ) -> Result<ControlAck, FetchError> {
        Err(FetchError::Status {
            status: 405,
            message: "file source is read-only".to_string(),
        })
    }

    fn description(&self) -> &str {
        &self.description
    }
}
