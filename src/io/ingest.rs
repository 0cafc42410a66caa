//! CSV telemetry ingest.
//!
//! This module is responsible for turning a ride export into a clean,
//! time-ordered list of `TelemetrySample`s that are safe to preprocess.
//!
//! Design goals:
//! - **Strict schema** for required columns (`MissingColumn`, exit code 2)
//! - **Row-level validation** (skip incomplete rows, but report what happened)
//! - **Separation of concerns**: no estimation logic here

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime};
use csv::StringRecord;
use tracing::warn;

use crate::domain::{TelemetrySample, Timestamp};
use crate::error::{AppError, EstimateError};

/// Columns every ride file must provide.
pub const REQUIRED_COLUMNS: [&str; 5] = ["timestamp", "distance", "altitude", "speed", "power"];

/// Summary stats about the samples actually read.
#[derive(Debug, Clone)]
pub struct RideStats {
    pub n_samples: usize,
    /// Seconds between the first and last sample.
    pub duration_s: f64,
    /// Distance covered (m).
    pub distance_m: f64,
    pub altitude_min: f64,
    pub altitude_max: f64,
    pub mean_speed: f64,
    pub mean_power: f64,
}

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: samples + stats + row errors.
#[derive(Debug, Clone)]
pub struct IngestedRide {
    pub samples: Vec<TelemetrySample>,
    pub stats: RideStats,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

/// Load a ride CSV from disk.
pub fn load_telemetry(path: &Path) -> Result<IngestedRide, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    read_telemetry(file)
}

/// Parse a ride CSV from any reader.
pub fn read_telemetry<R: Read>(reader: R) -> Result<IngestedRide, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();

    let header_map = build_header_map(&headers);
    ensure_required_columns_exist(&header_map)?;

    let mut samples: Vec<TelemetrySample> = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: header is line 1, records are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, &header_map) {
            Ok(sample) => {
                let same_kind = samples
                    .first()
                    .is_none_or(|first| sample.timestamp.seconds_since(&first.timestamp).is_some());
                if same_kind {
                    samples.push(sample);
                } else {
                    row_errors.push(RowError {
                        line,
                        message: "Timestamp format differs from the first row.".to_string(),
                    });
                }
            }
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    for e in &row_errors {
        warn!(line = e.line, "skipped row: {}", e.message);
    }

    let rows_used = samples.len();
    let stats = compute_stats(&samples).ok_or_else(|| {
        AppError::from(EstimateError::EmptyInput(
            "no complete telemetry rows in the CSV".to_string(),
        ))
    })?;

    Ok(IngestedRide {
        samples,
        stats,
        row_errors,
        rows_read,
        rows_used,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn ensure_required_columns_exist(header_map: &HashMap<String, usize>) -> Result<(), EstimateError> {
    for name in REQUIRED_COLUMNS {
        if !header_map.contains_key(name) {
            return Err(EstimateError::MissingColumn(name.to_string()));
        }
    }
    Ok(())
}

fn parse_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> Result<TelemetrySample, String> {
    let timestamp = parse_timestamp(get_required(record, header_map, "timestamp")?)?;
    let distance = parse_f64(record, header_map, "distance")?;
    let altitude = parse_f64(record, header_map, "altitude")?;
    let speed = parse_f64(record, header_map, "speed")?;
    let power = parse_f64(record, header_map, "power")?;

    Ok(TelemetrySample {
        timestamp,
        distance,
        altitude,
        speed,
        power,
    })
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn parse_f64(record: &StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Result<f64, String> {
    let raw = get_required(record, header_map, name)?;
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("Invalid `{name}` value '{raw}'.")),
    }
}

fn parse_timestamp(s: &str) -> Result<Timestamp, String> {
    if let Ok(secs) = s.parse::<f64>() {
        if secs.is_finite() {
            return Ok(Timestamp::Seconds(secs));
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(Timestamp::DateTime(dt.naive_utc()));
    }
    const FMTS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
    ];
    for fmt in FMTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(Timestamp::DateTime(dt));
        }
    }
    Err(format!(
        "Invalid timestamp '{s}'. Expected seconds or a datetime (RFC 3339 or YYYY-MM-DD HH:MM:SS)."
    ))
}

fn compute_stats(samples: &[TelemetrySample]) -> Option<RideStats> {
    let first = samples.first()?;
    let last = samples.last()?;

    let mut altitude_min = f64::INFINITY;
    let mut altitude_max = f64::NEG_INFINITY;
    let mut speed_sum = 0.0;
    let mut power_sum = 0.0;
    for s in samples {
        altitude_min = altitude_min.min(s.altitude);
        altitude_max = altitude_max.max(s.altitude);
        speed_sum += s.speed;
        power_sum += s.power;
    }
    let n = samples.len() as f64;

    Some(RideStats {
        n_samples: samples.len(),
        duration_s: last.timestamp.seconds_since(&first.timestamp).unwrap_or(0.0),
        distance_m: last.distance - first.distance,
        altitude_min,
        altitude_max,
        mean_speed: speed_sum / n,
        mean_power: power_sum / n,
    })
}
