//! Wire-level telemetry and grid-context types.
//!
//! Field names and enum spellings match the dashboard backend's JSON so that
//! payloads deserialize without an intermediate mapping layer.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of load a device represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Motor,
    Hvac,
    Compressor,
    Lighting,
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DeviceType::Motor => "motor",
            DeviceType::Hvac => "hvac",
            DeviceType::Compressor => "compressor",
            DeviceType::Lighting => "lighting",
        };
        f.pad(label)
    }
}

/// Operating state reported by a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Off,
    Starting,
    Running,
    Fault,
}

impl DeviceStatus {
    pub fn is_fault(self) -> bool {
        matches!(self, DeviceStatus::Fault)
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DeviceStatus::Off => "off",
            DeviceStatus::Starting => "starting",
            DeviceStatus::Running => "running",
            DeviceStatus::Fault => "fault",
        };
        f.pad(label)
    }
}

/// One device's instantaneous electrical state.
///
/// Values are carried exactly as reported; no validation or clamping is
/// applied here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceReading {
    /// Unique device identifier.
    pub device_id: String,
    pub device_type: DeviceType,
    pub status: DeviceStatus,
    /// Line voltage (V).
    pub voltage: f64,
    /// Current draw (A).
    pub current: f64,
    /// Power consumption (W).
    pub power: f64,
    /// Sample time as Unix seconds.
    pub timestamp: f64,
}

/// A batch of readings keyed by device id, as returned by the live endpoint.
///
/// Keying by id enforces at most one reading per device.
pub type TelemetryBatch = BTreeMap<String, DeviceReading>;

/// Qualitative band attached to a numeric grid signal.
///
/// Bands are computed by the backend; this crate only consumes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Band {
    Low,
    #[serde(alias = "NORMAL")]
    Medium,
    High,
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Band::Low => "LOW",
            Band::Medium => "MEDIUM",
            Band::High => "HIGH",
        };
        f.write_str(label)
    }
}

/// Exogenous market and environmental data, refreshed on the slow cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridContext {
    /// Carbon intensity (gCO2/kWh).
    pub carbon_intensity: f64,
    pub carbon_level: Band,
    /// Electricity price ($/kWh).
    pub electricity_price: f64,
    pub pricing_tier: Band,
    /// Share of renewable generation on the grid (0-100).
    pub grid_renewable_percentage: f64,
    /// Time the backend last refreshed the context, Unix seconds.
    #[serde(default, alias = "last_updated")]
    pub timestamp: f64,
    /// Seconds until the backend's next refresh, when advertised.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_update_in: Option<f64>,
}

/// Inventory entry returned by the device-list endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSummary {
    pub device_id: String,
    pub device_type: DeviceType,
    pub status: DeviceStatus,
}

impl From<&DeviceReading> for DeviceSummary {
    fn from(r: &DeviceReading) -> Self {
        Self {
            device_id: r.device_id.clone(),
            device_type: r.device_type,
            status: r.status,
        }
    }
}

/// Device inventory as served by `GET /api/devices`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceList {
    pub device_count: usize,
    pub devices: Vec<DeviceSummary>,
}

impl FromIterator<DeviceSummary> for DeviceList {
    fn from_iter<I: IntoIterator<Item = DeviceSummary>>(iter: I) -> Self {
        let devices: Vec<DeviceSummary> = iter.into_iter().collect();
        Self {
            device_count: devices.len(),
            devices,
        }
    }
}

/// Highest accepted lighting brightness (%).
pub const MAX_BRIGHTNESS_PCT: u8 = 100;

/// Command accepted by the device-control endpoints.
///
/// `On` and `Off` apply to every device type. `Start` and `InjectFault` are
/// motor-only and `Brightness` is lighting-only; the backend rejects them for
/// other device types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    On,
    Off,
    /// Motor start from `off`; the motor passes through `starting`.
    Start,
    /// Forces a motor into a locked-rotor fault.
    InjectFault,
    /// Lighting dimmer level in percent, `0..=100`.
    Brightness(u8),
}

impl ControlAction {
    /// Path segment used by the backend's control routes.
    pub fn as_str(self) -> &'static str {
        match self {
            ControlAction::On => "on",
            ControlAction::Off => "off",
            ControlAction::Start => "start",
            ControlAction::InjectFault => "inject-fault",
            ControlAction::Brightness(_) => "brightness",
        }
    }

    /// Query parameters the route expects alongside the path segment.
    pub fn query(self) -> Option<(&'static str, u8)> {
        match self {
            ControlAction::Brightness(level) => Some(("level", level)),
            _ => None,
        }
    }

    /// Builds an action from a route segment and its optional `level`.
    ///
    /// # Errors
    ///
    /// Returns a message if the segment is unknown, if `brightness` has no
    /// level or a level above 100, or if a level is given to another action.
    pub fn from_parts(segment: &str, level: Option<u8>) -> Result<Self, String> {
        let action = match segment {
            "on" => ControlAction::On,
            "off" => ControlAction::Off,
            "start" => ControlAction::Start,
            "inject-fault" => ControlAction::InjectFault,
            "brightness" => {
                let level = level.ok_or_else(|| "brightness requires a level".to_string())?;
                if level > MAX_BRIGHTNESS_PCT {
                    return Err(format!(
                        "brightness level must be 0-{MAX_BRIGHTNESS_PCT}, got {level}"
                    ));
                }
                return Ok(ControlAction::Brightness(level));
            }
            other => {
                return Err(format!(
                    "unknown control action \"{other}\", expected on|off|start|inject-fault|brightness"
                ));
            }
        };
        match level {
            Some(_) => Err(format!("{segment} does not take a level")),
            None => Ok(action),
        }
    }
}

impl fmt::Display for ControlAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlAction::Brightness(level) => write!(f, "brightness={level}"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Parses the `Display` form: `on`, `off`, `start`, `inject-fault` or
/// `brightness=<0-100>`.
impl std::str::FromStr for ControlAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((segment, level)) => {
                let level = level
                    .parse::<u8>()
                    .map_err(|e| format!("invalid level \"{level}\": {e}"))?;
                Self::from_parts(segment, Some(level))
            }
            None => Self::from_parts(s, None),
        }
    }
}

/// Acknowledgement returned by the backend for a control command.
///
/// A backend that refuses a command for the device's current state answers
/// with `status: "error"` rather than an HTTP error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlAck {
    pub status: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_status: Option<DeviceStatus>,
    /// Status before an injected fault.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_status: Option<DeviceStatus>,
    /// Applied lighting level after a brightness command (%).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brightness: Option<u8>,
}

impl ControlAck {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            device_status: None,
            previous_status: None,
            brightness: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            ..Self::success(message)
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}
