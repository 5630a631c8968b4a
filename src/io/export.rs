//! CSV export for the rolling current series.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use chrono::SecondsFormat;

use crate::pipeline::SeriesPoint;

/// Column header for series export.
const HEADER: [&str; 2] = ["timestamp", "current_a"];

/// Exports series points to a CSV file at the given path.
///
/// Writes a header row followed by one row per point, oldest first.
///
/// # Arguments
///
/// * `points` - Series points in append order
/// * `path` - Output file path
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_series_csv(points: &[SeriesPoint], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_series_csv(points, buf)
}

/// Writes series points as CSV to any writer.
///
/// Timestamps are RFC 3339 in UTC with millisecond precision; currents are
/// amperes with four decimals.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_series_csv(points: &[SeriesPoint], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(HEADER)?;

    for p in points {
        wtr.write_record(&[
            p.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            format!("{:.4}", p.current),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
