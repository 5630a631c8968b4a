//! Runs the binary against a fixture file.

mod common;

use std::io::Write;
use std::process::Command;

use serde_json::{Value, json};
use tempfile::NamedTempFile;

use grid_sense::pipeline::Band;

use common::{grid, plant};

fn fixture() -> NamedTempFile {
    let devices: serde_json::Map<String, Value> = plant()
        .into_iter()
        .map(|r| (r.device_id.clone(), serde_json::to_value(r).unwrap()))
        .collect();
    let body = json!({
        "devices": devices,
        "grid": grid(Band::High, Band::Low, 70.0),
    });
    let mut file = NamedTempFile::new().expect("temp file");
    write!(file, "{body}").expect("write fixture");
    file
}

fn grid_sense() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_grid-sense"));
    cmd.env("GRID_SENSE_LOG", "off");
    cmd
}

#[test]
fn once_prints_view_as_json() {
    let file = fixture();
    let output = grid_sense()
        .arg("--fixture")
        .arg(file.path())
        .arg("--once")
        .output()
        .expect("binary should run");
    assert!(output.status.success(), "{output:?}");

    let view: Value = serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(view["snapshot"]["device_count"], 4);
    assert_eq!(view["health"], "warning");
    assert_eq!(view["series"].as_array().map(Vec::len), Some(1));
    assert_eq!(view["advisories"][0]["kind"], "carbon_high");
    assert_eq!(view["devices"].as_array().map(Vec::len), Some(4));
}

#[test]
fn once_writes_series_csv() {
    let file = fixture();
    let dir = tempfile::tempdir().expect("temp dir");
    let csv_path = dir.path().join("series.csv");
    let output = grid_sense()
        .arg("--fixture")
        .arg(file.path())
        .arg("--once")
        .arg("--series-out")
        .arg(&csv_path)
        .output()
        .expect("binary should run");
    assert!(output.status.success(), "{output:?}");

    let csv = std::fs::read_to_string(&csv_path).expect("csv should exist");
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("timestamp,current_a"));
    assert!(lines.next().is_some_and(|l| l.ends_with(",93.3000")));
}

#[test]
fn list_devices_prints_device_table() {
    let file = fixture();
    let output = grid_sense()
        .arg("--fixture")
        .arg(file.path())
        .arg("--list-devices")
        .output()
        .expect("binary should run");
    assert!(output.status.success(), "{output:?}");

    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut lines = stdout.lines();
    assert_eq!(lines.next(), Some("4 device(s)"));
    let rows: Vec<&str> = lines.collect();
    assert_eq!(rows.len(), 4, "{stdout}");
    assert!(
        rows.iter().any(|r| r.contains("motor_001") && r.contains("45.20 A")),
        "{stdout}"
    );
}

#[test]
fn control_against_read_only_fixture_fails() {
    let file = fixture();
    let output = grid_sense()
        .arg("--fixture")
        .arg(file.path())
        .args(["--control", "motor_001=inject-fault"])
        .output()
        .expect("binary should run");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("405"), "{stderr}");
}

#[test]
fn malformed_control_argument_is_a_usage_error() {
    let output = grid_sense()
        .args(["--control", "lighting_001=brightness=140"])
        .output()
        .expect("binary should run");
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn invalid_config_exits_nonzero() {
    let mut cfg = NamedTempFile::new().expect("temp file");
    write!(
        cfg,
        "[thresholds]\nwarning_current_a = 150.0\ncritical_current_a = 100.0\n"
    )
    .expect("write config");
    let file = fixture();

    let output = grid_sense()
        .arg("--config")
        .arg(cfg.path())
        .arg("--fixture")
        .arg(file.path())
        .arg("--once")
        .output()
        .expect("binary should run");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("thresholds"), "{stderr}");
}

#[test]
fn missing_fixture_exits_nonzero() {
    let output = grid_sense()
        .args(["--fixture", "/nonexistent/fixture.json", "--once"])
        .output()
        .expect("binary should run");
    assert!(!output.status.success());
}
