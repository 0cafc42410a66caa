//! Export the fitted sample table to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{DerivedSample, FitDiagnostics, TelemetrySample, Timestamp};
use crate::error::AppError;

/// Write one row per fitted sample, with the solve's target, fit and residual.
pub fn write_samples_csv(path: &Path, samples: &[DerivedSample], diagnostics: &FitDiagnostics) -> Result<(), AppError> {
    if samples.len() != diagnostics.n() {
        return Err(AppError::new(
            4,
            format!(
                "Export mismatch: {} samples but {} residuals.",
                samples.len(),
                diagnostics.n()
            ),
        ));
    }

    let mut file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;

    writeln!(
        file,
        "index,elapsed_s,distance,altitude,speed,power,grade,theta,dt,speed_diff,target,fitted,residual"
    )
    .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    let origin = samples.first().map(|s| s.sample.timestamp);
    for (i, s) in samples.iter().enumerate() {
        let elapsed = origin
            .and_then(|o| s.sample.timestamp.seconds_since(&o))
            .unwrap_or(f64::NAN);
        writeln!(
            file,
            "{},{:.3},{:.3},{:.3},{:.4},{:.1},{:.6},{:.6},{:.3},{:.4},{:.8},{:.8},{:.8}",
            s.index,
            elapsed,
            s.sample.distance,
            s.sample.altitude,
            s.sample.speed,
            s.sample.power,
            s.grade,
            s.theta,
            s.dt,
            s.speed_diff,
            diagnostics.target[i],
            diagnostics.fitted[i],
            diagnostics.residuals[i],
        )
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}

/// Write raw telemetry in the layout `io::ingest` reads back.
pub fn write_telemetry_csv(path: &Path, samples: &[TelemetrySample]) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create telemetry CSV '{}': {e}", path.display())))?;

    writeln!(file, "timestamp,distance,altitude,speed,power")
        .map_err(|e| AppError::new(2, format!("Failed to write telemetry CSV header: {e}")))?;

    for s in samples {
        let timestamp = match s.timestamp {
            Timestamp::Seconds(secs) => format!("{secs:.3}"),
            Timestamp::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
        };
        writeln!(
            file,
            "{},{:.6},{:.6},{:.6},{:.6}",
            timestamp, s.distance, s.altitude, s.speed, s.power
        )
        .map_err(|e| AppError::new(2, format!("Failed to write telemetry CSV row: {e}")))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::preprocess::derive_samples;
    use crate::data::synthetic::{SyntheticRide, generate_ride};
    use crate::fit::estimate_parameters;

    #[test]
    fn writes_one_line_per_sample() {
        let config = SyntheticRide {
            n_samples: 25,
            ..SyntheticRide::default()
        };
        let samples = derive_samples(&generate_ride(&config).unwrap()).unwrap();
        let est = estimate_parameters(&samples, &config.constants).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("samples.csv");
        write_samples_csv(&path, &samples, &est.diagnostics).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 26);
        assert!(lines[0].starts_with("index,elapsed_s"));
        assert!(lines[1].starts_with("0,0.000,"));
        assert_eq!(lines[1].split(',').count(), 13);
    }

    #[test]
    fn telemetry_export_reads_back() {
        let config = SyntheticRide {
            n_samples: 30,
            ..SyntheticRide::default()
        };
        let ride = generate_ride(&config).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ride.csv");
        write_telemetry_csv(&path, &ride).unwrap();

        let loaded = crate::io::ingest::load_telemetry(&path).unwrap();
        assert_eq!(loaded.rows_used, 30);
        assert!(loaded.row_errors.is_empty());
        assert!((loaded.samples[29].power - ride[29].power).abs() < 1e-5);
        assert_eq!(loaded.samples[3].timestamp, Timestamp::Seconds(3.0));
    }

    #[test]
    fn misaligned_diagnostics_are_rejected() {
        let config = SyntheticRide {
            n_samples: 10,
            ..SyntheticRide::default()
        };
        let samples = derive_samples(&generate_ride(&config).unwrap()).unwrap();
        let est = estimate_parameters(&samples, &config.constants).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let err = write_samples_csv(&dir.path().join("x.csv"), &samples[..5], &est.diagnostics).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }
}
