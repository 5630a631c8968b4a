//! API response types.

use serde::{Deserialize, Serialize};

use crate::pipeline::{Advisory, DeviceReading, HealthState};

/// Error body returned with any non-2xx status.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// `GET /devices` body: the device table from the last applied batch.
#[derive(Debug, Serialize)]
pub struct DevicesResponse {
    pub device_count: usize,
    pub devices: Vec<DeviceReading>,
}

/// Query string accepted by the control route.
#[derive(Debug, Default, Deserialize)]
pub struct ControlQuery {
    /// Brightness level (%), only for `brightness`.
    pub level: Option<u8>,
}

/// `GET /advisories` body.
#[derive(Debug, Serialize)]
pub struct AdvisoriesResponse {
    pub health: HealthState,
    pub advisories: Vec<Advisory>,
}
