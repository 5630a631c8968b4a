//! In-process backend.
//!
//! Holds device readings and grid context behind a mutex so tests can mutate
//! the backend while a monitor is polling it. Failures and per-call latency
//! can be injected to exercise the skip-tick and stale-completion paths.
//!
//! Control commands follow the dashboard backend's device rules: motors
//! start only from `off` and take injected faults, lighting takes brightness
//! levels, and any device switches on or off.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::TelemetrySource;
use crate::error::FetchError;
use crate::pipeline::types::{
    ControlAck, ControlAction, DeviceReading, DeviceStatus, DeviceType, GridContext,
    TelemetryBatch,
};

/// Motor current while holding peak inrush after a start (A).
const MOTOR_INRUSH_A: f64 = 120.0;
/// Motor current with a locked rotor (A).
const MOTOR_LOCKED_ROTOR_A: f64 = 110.0;
/// Lighting current at full brightness (A).
const LIGHTING_FULL_A: f64 = 2.5;

#[derive(Debug, Default)]
struct MemoryState {
    devices: TelemetryBatch,
    grid: Option<GridContext>,
    fail_telemetry: u32,
    fail_grid: u32,
    telemetry_delays: VecDeque<Duration>,
}

/// A [`TelemetrySource`] backed by in-memory state.
#[derive(Debug, Default)]
pub struct MemorySource {
    state: Mutex<MemoryState>,
    telemetry_calls: AtomicU64,
    grid_calls: AtomicU64,
    control_calls: AtomicU64,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a source pre-loaded with readings and an optional grid context.
    pub fn with_devices(
        readings: impl IntoIterator<Item = DeviceReading>,
        grid: Option<GridContext>,
    ) -> Self {
        let source = Self::new();
        {
            let mut state = source.lock();
            for r in readings {
                state.devices.insert(r.device_id.clone(), r);
            }
            state.grid = grid;
        }
        source
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        // A poisoned lock only means a test panicked mid-update; the data is still usable.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Inserts or replaces a device reading.
    pub fn upsert(&self, reading: DeviceReading) {
        self.lock().devices.insert(reading.device_id.clone(), reading);
    }

    pub fn set_grid_context(&self, grid: Option<GridContext>) {
        self.lock().grid = grid;
    }

    /// Makes the next `n` telemetry fetches fail.
    pub fn fail_next_telemetry(&self, n: u32) {
        self.lock().fail_telemetry = n;
    }

    /// Makes the next `n` grid-context fetches fail.
    pub fn fail_next_grid(&self, n: u32) {
        self.lock().fail_grid = n;
    }

    /// Queues latencies applied to upcoming telemetry fetches, one per call.
    pub fn queue_telemetry_delays(&self, delays: impl IntoIterator<Item = Duration>) {
        self.lock().telemetry_delays.extend(delays);
    }

    pub fn telemetry_calls(&self) -> u64 {
        self.telemetry_calls.load(Ordering::SeqCst)
    }

    pub fn grid_calls(&self) -> u64 {
        self.grid_calls.load(Ordering::SeqCst)
    }

    pub fn control_calls(&self) -> u64 {
        self.control_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TelemetrySource for MemorySource {
    async fn fetch_live_telemetry(&self) -> Result<TelemetryBatch, FetchError> {
        self.telemetry_calls.fetch_add(1, Ordering::SeqCst);
        // Snapshot the batch at issue time; the delay models response latency.
        let (batch, delay) = {
            let mut state = self.lock();
            if state.fail_telemetry > 0 {
                state.fail_telemetry -= 1;
                return Err(FetchError::Transport("injected telemetry failure".into()));
            }
            (state.devices.clone(), state.telemetry_delays.pop_front())
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(batch)
    }

    async fn fetch_grid_context(&self) -> Result<GridContext, FetchError> {
        self.grid_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.lock();
        if state.fail_grid > 0 {
            state.fail_grid -= 1;
            return Err(FetchError::Transport("injected grid failure".into()));
        }
        state.grid.clone().ok_or(FetchError::NoGridContext)
    }

    async fn send_device_control(
        &self,
        device_id: &str,
        action: ControlAction,
    ) -> Result<ControlAck, FetchError> {
        self.control_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.lock();
        let device = state
            .devices
            .get_mut(device_id)
            .ok_or_else(|| FetchError::UnknownDevice(device_id.to_string()))?;
        apply_control(device, action)
    }

    fn description(&self) -> &str {
        "memory"
    }
}

fn set_current(device: &mut DeviceReading, current: f64) {
    device.current = current;
    device.power = device.voltage * current;
}

fn require_type(
    device: &DeviceReading,
    expected: DeviceType,
    reason: &str,
) -> Result<(), FetchError> {
    if device.device_type == expected {
        Ok(())
    } else {
        Err(FetchError::Rejected(format!("{}: {reason}", device.device_id)))
    }
}

fn apply_control(
    device: &mut DeviceReading,
    action: ControlAction,
) -> Result<ControlAck, FetchError> {
    let ack = match action {
        ControlAction::On => {
            device.status = DeviceStatus::Running;
            ControlAck::success(format!("Device {} turned on", device.device_id))
        }
        ControlAction::Off => {
            device.status = DeviceStatus::Off;
            set_current(device, 0.0);
            ControlAck::success(format!("Device {} turned off", device.device_id))
        }
        ControlAction::Start => {
            require_type(device, DeviceType::Motor, "Device is not a motor")?;
            if device.status != DeviceStatus::Off {
                return Ok(ControlAck {
                    device_status: Some(device.status),
                    ..ControlAck::error(format!("Cannot start from {} state", device.status))
                });
            }
            device.status = DeviceStatus::Starting;
            set_current(device, MOTOR_INRUSH_A);
            ControlAck::success("Motor starting - peak inrush 120A for 0.5s, then decay to 45A")
        }
        ControlAction::InjectFault => {
            require_type(device, DeviceType::Motor, "Device is not a motor")?;
            let previous = device.status;
            device.status = DeviceStatus::Fault;
            set_current(device, MOTOR_LOCKED_ROTOR_A);
            ControlAck {
                previous_status: Some(previous),
                ..ControlAck::success("Locked rotor fault injected")
            }
        }
        ControlAction::Brightness(level) => {
            require_type(device, DeviceType::Lighting, "Device is not a lighting system")?;
            if device.status == DeviceStatus::Running {
                set_current(device, f64::from(level) / 100.0 * LIGHTING_FULL_A);
            }
            ControlAck {
                brightness: Some(level),
                ..ControlAck::success(format!("Brightness set to {level}%"))
            }
        }
    };
    Ok(ControlAck {
        device_status: Some(device.status),
        ..ack
    })
}
