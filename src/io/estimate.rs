//! Read/write estimate JSON files.
//!
//! An estimate file is the portable record of one run:
//! - constants the fit assumed
//! - fitted parameters (and first-pass parameters for robust fits)
//! - solve diagnostics and sample counts
//!
//! The schema is defined by `domain::EstimateFile`.

use std::fs::File;
use std::path::Path;

use crate::domain::{Estimate, EstimateFile, FitMode, PhysicalConstants, RobustEstimate};
use crate::error::AppError;

const TOOL: &str = "ridefit";

/// Describe a single-pass estimate.
pub fn single_pass_file(estimate: &Estimate, constants: &PhysicalConstants, source: Option<String>) -> EstimateFile {
    EstimateFile {
        tool: TOOL.to_string(),
        source,
        mode: FitMode::SinglePass,
        constants: *constants,
        params: estimate.params,
        first_pass: None,
        rank: estimate.diagnostics.rank,
        singular_values: estimate.diagnostics.singular_values.clone(),
        residual_ss: estimate.diagnostics.residual_ss,
        rmse: estimate.diagnostics.rmse(),
        samples_used: estimate.diagnostics.n(),
        samples_removed: 0,
        cutoff: None,
    }
}

/// Describe a robust (two-pass) estimate.
pub fn robust_file(robust: &RobustEstimate, constants: &PhysicalConstants, source: Option<String>) -> EstimateFile {
    EstimateFile {
        mode: FitMode::Robust,
        first_pass: Some(robust.first_pass),
        samples_removed: robust.removed,
        cutoff: Some(robust.cutoff),
        ..single_pass_file(&robust.estimate, constants, source)
    }
}

/// Write an estimate JSON file.
pub fn write_estimate_json(path: &Path, estimate: &EstimateFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create estimate JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(file, estimate)
        .map_err(|e| AppError::new(2, format!("Failed to write estimate JSON: {e}")))?;

    Ok(())
}

/// Read an estimate JSON file.
pub fn read_estimate_json(path: &Path) -> Result<EstimateFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open estimate JSON '{}': {e}", path.display())))?;
    let estimate: EstimateFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid estimate JSON: {e}")))?;
    Ok(estimate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::preprocess::derive_samples;
    use crate::data::synthetic::{SyntheticRide, generate_ride};
    use crate::fit::{TrimOptions, estimate_parameters_robust};

    #[test]
    fn robust_estimate_survives_a_save_and_load() {
        let config = SyntheticRide {
            n_samples: 80,
            ..SyntheticRide::default()
        };
        let samples = derive_samples(&generate_ride(&config).unwrap()).unwrap();
        let robust = estimate_parameters_robust(&samples, &config.constants, &TrimOptions::default()).unwrap();
        let file = robust_file(&robust, &config.constants, Some("synthetic".to_string()));

        assert_eq!(file.mode, FitMode::Robust);
        assert_eq!(file.samples_used + file.samples_removed, 80);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("estimate.json");
        write_estimate_json(&path, &file).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"mode\": \"robust\""));

        let loaded = read_estimate_json(&path).unwrap();
        assert_eq!(loaded.params, file.params);
        assert_eq!(loaded.rank, file.rank);
        assert_eq!(loaded.cutoff, file.cutoff);
    }

    #[test]
    fn invalid_json_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = read_estimate_json(&path).unwrap_err();
        assert!(err.to_string().contains("Invalid estimate JSON"));
    }
}
