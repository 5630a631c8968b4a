//! End-to-end behaviour of the per-tick pipeline through the public API.

mod common;

use chrono::{Duration, TimeZone, Utc};
use pretty_assertions::assert_eq;

use grid_sense::DashboardConfig;
use grid_sense::pipeline::{
    AdvisoryComposer, AdvisoryKind, Band, HealthState, Pipeline, RollingSeries, SeriesPoint,
    Thresholds, aggregate, classify,
};

use common::{faulted, grid, plant, reading};

fn kinds(p: &Pipeline) -> Vec<AdvisoryKind> {
    p.advisories().iter().map(|a| a.kind).collect()
}

#[test]
fn sixty_plus_fifty_amps_is_critical_without_faults() {
    let batch = vec![reading("a", 60.0), reading("b", 50.0)];
    let snapshot = aggregate(&batch);
    assert!((snapshot.total_current - 110.0).abs() < 1e-9);
    assert!(!snapshot.has_fault);
    assert_eq!(classify(&snapshot), HealthState::Critical);
}

#[test]
fn threshold_boundaries_are_strict() {
    let at = |current: f64| classify(&aggregate(&[reading("m", current)]));
    assert_eq!(at(80.0), HealthState::Normal);
    assert_eq!(at(80.01), HealthState::Warning);
    assert_eq!(at(100.0), HealthState::Warning);
    assert_eq!(at(100.01), HealthState::Critical);
}

#[test]
fn any_fault_is_critical_regardless_of_current() {
    let batch = vec![reading("a", 1.0), faulted("b", 0.0)];
    assert_eq!(classify(&aggregate(&batch)), HealthState::Critical);
}

#[test]
fn classification_is_pure() {
    let snapshot = aggregate(&plant());
    let first = classify(&snapshot);
    for _ in 0..10 {
        assert_eq!(classify(&snapshot), first);
    }
}

#[test]
fn thirty_five_appends_keep_last_thirty_in_order() {
    let mut series = RollingSeries::default();
    let t0 = Utc.timestamp_opt(1_708_563_245, 0).single().expect("valid");
    for i in 0..35 {
        series.append(SeriesPoint::new(t0 + Duration::seconds(i), i as f64));
    }
    let currents: Vec<f64> = series.iter().map(|p| p.current).collect();
    let expected: Vec<f64> = (5..35).map(|i| i as f64).collect();
    assert_eq!(currents, expected);
}

#[test]
fn plant_ticks_fill_series_and_follow_health() {
    let mut p = Pipeline::default();
    let t0 = Utc::now();

    // 93.3 A total: warning.
    assert!(p.apply_telemetry(1, &plant(), t0));
    assert_eq!(p.health(), HealthState::Warning);
    assert_eq!(p.snapshot().device_count, 4);

    // Motor switched off: 48.1 A, normal.
    let mut batch = plant();
    batch[0].current = 0.0;
    assert!(p.apply_telemetry(2, &batch, t0 + Duration::seconds(1)));
    assert_eq!(p.health(), HealthState::Normal);

    // Compressor faults.
    batch[2].status = grid_sense::pipeline::DeviceStatus::Fault;
    assert!(p.apply_telemetry(3, &batch, t0 + Duration::seconds(2)));
    assert_eq!(p.health(), HealthState::Critical);
    assert_eq!(
        kinds(&p),
        vec![
            AdvisoryKind::CriticalCurrent,
            AdvisoryKind::FaultAttention,
            AdvisoryKind::LoadReduction
        ]
    );

    assert_eq!(p.series().len(), 3);
}

#[test]
fn critical_health_ignores_grid_context() {
    let mut p = Pipeline::default();
    p.apply_grid_context(1, grid(Band::High, Band::High, 90.0));
    p.apply_telemetry(1, &[reading("m", 120.0)], Utc::now());
    assert_eq!(
        kinds(&p),
        vec![
            AdvisoryKind::CriticalCurrent,
            AdvisoryKind::FaultAttention,
            AdvisoryKind::LoadReduction
        ]
    );
}

#[test]
fn high_carbon_low_price_renewable_context_orders_advisories() {
    let mut p = Pipeline::default();
    p.apply_telemetry(1, &[reading("m", 20.0)], Utc::now());
    p.apply_grid_context(1, grid(Band::High, Band::Low, 70.0));
    assert_eq!(
        kinds(&p),
        vec![
            AdvisoryKind::CarbonHigh,
            AdvisoryKind::PriceLow,
            AdvisoryKind::RenewableHigh
        ]
    );
    assert_eq!(
        p.advisories()[0].message,
        "High carbon intensity (520 gCO\u{2082}/kWh). Consider deferring non-critical loads."
    );
}

#[test]
fn peak_price_message_uses_nominal_voltage() {
    let mut p = Pipeline::default();
    p.apply_telemetry(1, &[reading("m", 40.0)], Utc::now());
    p.apply_grid_context(1, grid(Band::Medium, Band::High, 20.0));
    // 40 A * 230 V = 9.2 kW at $0.25/kWh
    assert_eq!(
        p.advisories()[0].message,
        "Peak pricing period ($0.2500/kWh). Running at 40A costs ~$2.30/hr."
    );
    // Contextual first, then padded from the default set.
    assert_eq!(
        kinds(&p),
        vec![
            AdvisoryKind::PriceHigh,
            AdvisoryKind::NominalOperation,
            AdvisoryKind::OptimalConsumption
        ]
    );
}

#[test]
fn pipeline_from_config_uses_custom_thresholds() {
    let cfg = DashboardConfig::from_toml_str(
        r#"
        [thresholds]
        warning_current_a = 20.0
        critical_current_a = 40.0

        [series]
        capacity = 2
        "#,
    )
    .expect("config should parse");
    let mut p = Pipeline::from_config(&cfg).expect("config should be valid");

    let t0 = Utc::now();
    p.apply_telemetry(1, &[reading("m", 30.0)], t0);
    assert_eq!(p.health(), HealthState::Warning);
    p.apply_telemetry(2, &[reading("m", 41.0)], t0 + Duration::seconds(1));
    assert_eq!(p.health(), HealthState::Critical);
    p.apply_telemetry(3, &[reading("m", 5.0)], t0 + Duration::seconds(2));
    assert_eq!(p.series().len(), 2);
}

#[test]
fn invalid_construction_is_rejected() {
    assert!(RollingSeries::with_capacity(0).is_err());
    assert!(Thresholds::new(120.0, 100.0).is_err());
    assert!(Pipeline::new(Thresholds::default(), AdvisoryComposer::default(), 0).is_err());
}
