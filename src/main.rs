//! grid-sense entry point: CLI wiring from config to source to monitor.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::Parser;
use tracing::{info, warn};

use grid_sense::io::export::export_series_csv;
use grid_sense::logging;
use grid_sense::pipeline::{ControlAction, DashboardView, DeviceReading};
use grid_sense::source::{FileSource, TelemetrySource};
use grid_sense::{DashboardConfig, Monitor, Pipeline};

#[derive(Parser, Debug)]
#[command(name = "grid-sense")]
#[command(about = "Polls device telemetry and grid context, classifies health, prints advisories")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend base URL (overrides `[source] base_url`)
    #[arg(long, conflicts_with = "fixture")]
    base_url: Option<String>,

    /// Read telemetry and grid context from a JSON fixture instead of HTTP
    #[arg(short, long)]
    fixture: Option<PathBuf>,

    /// Run a single tick, print the view as JSON and exit
    #[arg(long, conflicts_with = "duration")]
    once: bool,

    /// Stop polling after this many seconds (default: run until Ctrl-C)
    #[arg(short, long)]
    duration: Option<u64>,

    /// Write the rolling current series to CSV on exit
    #[arg(long)]
    series_out: Option<PathBuf>,

    /// Print the backend's device inventory and exit
    #[arg(long, conflicts_with_all = ["once", "duration", "control"])]
    list_devices: bool,

    /// Send one command and exit, e.g. `motor_001=start` or `lighting_001=brightness=40`
    #[arg(
        long,
        value_name = "DEVICE=ACTION",
        value_parser = parse_control,
        conflicts_with_all = ["once", "duration"]
    )]
    control: Option<(String, ControlAction)>,

    /// Serve the REST API while polling
    #[cfg(feature = "api")]
    #[arg(long)]
    serve: bool,

    /// API server port
    #[cfg(feature = "api")]
    #[arg(long, default_value = "3000", requires = "serve")]
    port: u16,

    /// Log filter directive (e.g. "grid_sense=debug")
    #[arg(long)]
    log: Option<String>,
}

fn parse_control(s: &str) -> Result<(String, ControlAction), String> {
    let (device_id, action) = s
        .split_once('=')
        .ok_or_else(|| format!("expected DEVICE=ACTION, got \"{s}\""))?;
    if device_id.is_empty() {
        return Err("device id is empty".to_string());
    }
    Ok((device_id.to_string(), action.parse()?))
}

fn load_config(args: &Args) -> Result<DashboardConfig> {
    let mut cfg = match args.config {
        Some(ref path) => DashboardConfig::from_toml_file(path)?,
        None => DashboardConfig::default(),
    };
    if let Some(ref url) = args.base_url {
        cfg.source.base_url = url.clone();
    }

    let errors = cfg.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        bail!("invalid configuration ({} error(s))", errors.len());
    }
    Ok(cfg)
}

fn build_source(args: &Args, cfg: &DashboardConfig) -> Result<Arc<dyn TelemetrySource>> {
    if let Some(ref path) = args.fixture {
        return Ok(Arc::new(FileSource::new(path)));
    }
    http_source(cfg)
}

#[cfg(feature = "http")]
fn http_source(cfg: &DashboardConfig) -> Result<Arc<dyn TelemetrySource>> {
    let source = grid_sense::source::HttpSource::new(&cfg.source)
        .context("failed to create http source")?;
    Ok(Arc::new(source))
}

#[cfg(not(feature = "http"))]
fn http_source(_cfg: &DashboardConfig) -> Result<Arc<dyn TelemetrySource>> {
    bail!("built without the `http` feature; pass --fixture <json>")
}

/// Fetches both cycles once and prints the resulting view.
async fn run_once(
    source: &dyn TelemetrySource,
    mut pipeline: Pipeline,
    series_out: Option<&Path>,
) -> Result<()> {
    let batch = source
        .fetch_live_telemetry()
        .await
        .context("telemetry fetch failed")?;
    pipeline.apply_telemetry(1, batch.values(), Utc::now());

    match source.fetch_grid_context().await {
        Ok(context) => {
            pipeline.apply_grid_context(1, context);
        }
        Err(e) => warn!(error = %e, "grid context unavailable"),
    }

    let view = pipeline.view();
    println!("{}", serde_json::to_string_pretty(&view)?);
    write_series(&view, series_out)
}

/// Prints `GET /api/devices`, then each device's latest reading.
async fn list_devices(source: &dyn TelemetrySource) -> Result<()> {
    let list = source
        .list_devices()
        .await
        .context("device list fetch failed")?;
    println!("{} device(s)", list.device_count);
    for summary in &list.devices {
        match source.fetch_device(&summary.device_id).await {
            Ok(reading) => print_device(&reading),
            Err(e) => {
                warn!(device_id = %summary.device_id, error = %e, "device fetch failed");
                println!(
                    "  {:<16} {:<10} {:<8}",
                    summary.device_id, summary.device_type, summary.status
                );
            }
        }
    }
    Ok(())
}

async fn send_control(
    source: &dyn TelemetrySource,
    device_id: &str,
    action: ControlAction,
) -> Result<()> {
    let ack = source
        .send_device_control(device_id, action)
        .await
        .with_context(|| format!("{action} on {device_id} failed"))?;
    println!("{}", serde_json::to_string_pretty(&ack)?);
    if !ack.is_success() {
        bail!("{device_id}: {}", ack.message);
    }
    Ok(())
}

fn write_series(view: &DashboardView, path: Option<&Path>) -> Result<()> {
    if let Some(path) = path {
        export_series_csv(&view.series, path)
            .with_context(|| format!("failed to write CSV to {}", path.display()))?;
        eprintln!("Series written to {}", path.display());
    }
    Ok(())
}

fn print_device(d: &DeviceReading) {
    println!(
        "  {:<16} {:<10} {:<8} {:>8.2} A {:>10.1} W",
        d.device_id, d.device_type, d.status, d.current, d.power
    );
}

fn print_summary(view: &DashboardView) {
    for d in &view.devices {
        print_device(d);
    }
    println!("{}", view.snapshot);
    println!("health: {} {}", view.health.symbol(), view.health);
    if let Some(ref ctx) = view.grid_context {
        println!(
            "grid: carbon {} ({:.0} gCO2/kWh), price {} (${:.4}/kWh), est. ${:.2}/hr",
            ctx.carbon_level,
            ctx.carbon_intensity,
            ctx.pricing_tier,
            ctx.electricity_price,
            view.estimated_cost_per_hour
        );
    }
    for a in &view.advisories {
        let marker = if a.kind.is_alert() { '!' } else { '-' };
        println!("  {marker} {}", a.message);
    }
}

async fn wait_for_exit(duration: Option<u64>) {
    match duration {
        Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
        None => {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for ctrl-c");
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.log.as_deref());

    let cfg = load_config(&args)?;
    let pipeline = Pipeline::from_config(&cfg)?;
    let source = build_source(&args, &cfg)?;

    if args.list_devices {
        return list_devices(source.as_ref()).await;
    }
    if let Some((ref device_id, action)) = args.control {
        return send_control(source.as_ref(), device_id, action).await;
    }
    if args.once {
        return run_once(source.as_ref(), pipeline, args.series_out.as_deref()).await;
    }

    let monitor = Monitor::spawn(Arc::clone(&source), pipeline, &cfg.polling);

    #[cfg(feature = "api")]
    let api = if args.serve {
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], args.port));
        let state = grid_sense::api::AppState::new(monitor.client());
        Some(
            grid_sense::api::spawn(state, addr)
                .await
                .with_context(|| format!("failed to bind to {addr}"))?,
        )
    } else {
        None
    };

    wait_for_exit(args.duration).await;
    info!("shutting down");

    #[cfg(feature = "api")]
    if let Some(api) = api {
        api.shutdown().await;
    }

    let view = monitor.stop().await;
    print_summary(&view);
    write_series(&view, args.series_out.as_deref())
}
