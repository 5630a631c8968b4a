//! Shared test fixtures for integration tests.
#![allow(dead_code)]

use grid_sense::config::PollingConfig;
use grid_sense::pipeline::{Band, DeviceReading, DeviceStatus, DeviceType, GridContext};

/// A running device drawing `current` amps at 230 V.
pub fn reading(id: &str, current: f64) -> DeviceReading {
    DeviceReading {
        device_id: id.to_string(),
        device_type: DeviceType::Motor,
        status: DeviceStatus::Running,
        voltage: 230.0,
        current,
        power: 230.0 * current,
        timestamp: 1_708_563_245.0,
    }
}

/// A faulted device drawing `current` amps.
pub fn faulted(id: &str, current: f64) -> DeviceReading {
    DeviceReading {
        status: DeviceStatus::Fault,
        ..reading(id, current)
    }
}

/// The four-device plant used by the dashboard backend's demo data.
pub fn plant() -> Vec<DeviceReading> {
    vec![
        DeviceReading {
            device_type: DeviceType::Motor,
            ..reading("motor_001", 45.2)
        },
        DeviceReading {
            device_type: DeviceType::Hvac,
            ..reading("hvac_001", 18.5)
        },
        DeviceReading {
            device_type: DeviceType::Compressor,
            ..reading("compressor_001", 27.1)
        },
        DeviceReading {
            device_type: DeviceType::Lighting,
            ..reading("lighting_001", 2.5)
        },
    ]
}

/// Grid context with the given carbon and price bands.
pub fn grid(carbon: Band, price: Band, renewable_pct: f64) -> GridContext {
    GridContext {
        carbon_intensity: match carbon {
            Band::High => 520.4,
            Band::Medium => 380.0,
            Band::Low => 210.0,
        },
        carbon_level: carbon,
        electricity_price: match price {
            Band::High => 0.25,
            Band::Medium => 0.15,
            Band::Low => 0.08,
        },
        pricing_tier: price,
        grid_renewable_percentage: renewable_pct,
        timestamp: 1_708_563_245.0,
        next_update_in: Some(900.0),
    }
}

/// One-second telemetry, fifteen-minute grid context.
pub fn polling() -> PollingConfig {
    PollingConfig::default()
}
