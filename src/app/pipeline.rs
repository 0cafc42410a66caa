//! Shared "estimate pipeline" logic.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! CSV ingest -> preprocessing -> stationary filter -> single or two-pass solve
//!
//! Front-ends can then focus on presentation and exports.

use crate::data::{derive_samples, filter_moving};
use crate::domain::{DerivedSample, Estimate, EstimateConfig, EstimateFile, FitMode, RobustEstimate};
use crate::error::{AppError, EstimateError};
use crate::fit::{TrimOptions, estimate_parameters, estimate_parameters_robust};
use crate::io::estimate::{robust_file, single_pass_file};
use crate::io::ingest::{IngestedRide, load_telemetry};

/// Result of whichever estimator the run used.
#[derive(Debug, Clone)]
pub enum FitOutcome {
    SinglePass(Estimate),
    Robust(RobustEstimate),
}

impl FitOutcome {
    /// The final solve.
    pub fn estimate(&self) -> &Estimate {
        match self {
            FitOutcome::SinglePass(est) => est,
            FitOutcome::Robust(robust) => &robust.estimate,
        }
    }
}

/// All computed outputs of a single `ridefit estimate` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub ride: IngestedRide,
    /// Preprocessed samples that passed the stationary filter.
    pub moving: Vec<DerivedSample>,
    pub fit: FitOutcome,
    pub file: EstimateFile,
}

impl RunOutput {
    /// Samples aligned with the final solve's diagnostics.
    pub fn fitted_samples(&self) -> &[DerivedSample] {
        match &self.fit {
            FitOutcome::SinglePass(_) => &self.moving,
            FitOutcome::Robust(robust) => &robust.trimmed,
        }
    }
}

/// Execute the full pipeline from a CSV on disk.
pub fn run_estimate(config: &EstimateConfig) -> Result<RunOutput, AppError> {
    let ride = load_telemetry(&config.csv_path)?;
    run_estimate_on(ride, config)
}

/// Execute the pipeline on an already-ingested ride.
pub fn run_estimate_on(ride: IngestedRide, config: &EstimateConfig) -> Result<RunOutput, AppError> {
    let derived = derive_samples(&ride.samples)?;

    let moving = filter_moving(&derived, config.min_speed);
    if moving.is_empty() {
        return Err(EstimateError::EmptyInput(format!(
            "no samples faster than {} m/s",
            config.min_speed
        ))
        .into());
    }

    let source = Some(config.csv_path.display().to_string());
    let constants = &config.constants;

    let (fit, file) = match config.mode {
        FitMode::SinglePass => {
            let est = estimate_parameters(&moving, constants)?;
            let file = single_pass_file(&est, constants, source);
            (FitOutcome::SinglePass(est), file)
        }
        FitMode::Robust => {
            let opts = TrimOptions {
                quantile: config.quantile,
                verbose: config.verbose,
            };
            let robust = estimate_parameters_robust(&moving, constants, &opts)?;
            let file = robust_file(&robust, constants, source);
            (FitOutcome::Robust(robust), file)
        }
    };

    Ok(RunOutput {
        ride,
        moving,
        fit,
        file,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::data::synthetic::{SyntheticRide, generate_ride};
    use crate::domain::{PhysicalConstants, TelemetrySample};
    use crate::io::ingest::read_telemetry;

    fn config(mode: FitMode, constants: PhysicalConstants) -> EstimateConfig {
        EstimateConfig {
            csv_path: PathBuf::from("synthetic.csv"),
            constants,
            quantile: 95.0,
            mode,
            min_speed: 0.0,
            verbose: false,
            export_samples: None,
            export_estimate: None,
        }
    }

    fn to_csv(rows: &[TelemetrySample]) -> String {
        let mut out = String::from("timestamp,distance,altitude,speed,power\n");
        for r in rows {
            let crate::domain::Timestamp::Seconds(t) = r.timestamp else {
                panic!("synthetic rides use seconds");
            };
            out.push_str(&format!(
                "{t},{},{},{},{}\n",
                r.distance, r.altitude, r.speed, r.power
            ));
        }
        out
    }

    #[test]
    fn stationary_stops_are_filtered_before_solving() {
        let synth = SyntheticRide {
            n_samples: 150,
            ..SyntheticRide::default()
        };
        let mut rows = generate_ride(&synth).unwrap();
        // A traffic-light stop: zero speed and zero power.
        for r in rows.iter_mut().skip(70).take(5) {
            r.speed = 0.0;
            r.power = 0.0;
        }
        let ride = read_telemetry(to_csv(&rows).as_bytes()).unwrap();

        let run = run_estimate_on(ride, &config(FitMode::SinglePass, synth.constants)).unwrap();
        assert_eq!(run.moving.len(), 145);
        assert!(run.moving.iter().all(|s| s.speed() > 0.0));
        assert_eq!(run.fitted_samples().len(), run.fit.estimate().diagnostics.n());
        assert_eq!(run.file.mode, FitMode::SinglePass);
        assert_eq!(run.file.samples_used, 145);
    }

    #[test]
    fn robust_run_reports_trimmed_table() {
        let synth = SyntheticRide {
            n_samples: 200,
            power_noise_sd: 2.0,
            ..SyntheticRide::default()
        };
        let rows = generate_ride(&synth).unwrap();
        let ride = read_telemetry(to_csv(&rows).as_bytes()).unwrap();

        let run = run_estimate_on(ride, &config(FitMode::Robust, synth.constants)).unwrap();
        let FitOutcome::Robust(robust) = &run.fit else {
            panic!("expected robust outcome");
        };
        assert_eq!(run.fitted_samples().len(), robust.trimmed.len());
        assert_eq!(run.file.samples_used + run.file.samples_removed, 200);
        assert!(run.file.first_pass.is_some());
    }

    #[test]
    fn all_stationary_ride_is_empty_input() {
        let csv = "timestamp,distance,altitude,speed,power\n0,0,0,0,0\n1,0,0,0,0\n";
        let ride = read_telemetry(csv.as_bytes()).unwrap();
        let constants = PhysicalConstants::new(70.0, 8.0, 1.2).unwrap();

        let err = run_estimate_on(ride, &config(FitMode::Robust, constants)).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
