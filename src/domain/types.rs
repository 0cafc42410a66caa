//! Shared domain types.
//!
//! These types are intentionally kept lightweight and strongly typed so the
//! estimator never depends on a particular tabular-data representation:
//!
//! - telemetry input records (`TelemetrySample`, `Timestamp`)
//! - preprocessed rows (`DerivedSample`)
//! - caller-supplied constants (`PhysicalConstants`)
//! - fit outputs (`ParameterVector`, `FitDiagnostics`, `Estimate`, `RobustEstimate`)

use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::EstimateError;
use crate::fit::N_PARAMS;

/// Standard gravity (m/s²).
pub const G: f64 = 9.81;

/// Sample time as recorded by the device.
///
/// Activity files usually carry wall-clock datetimes; simulated or pre-cleaned
/// tables carry elapsed seconds. A single table must use one kind throughout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Timestamp {
    /// Elapsed seconds from an arbitrary origin.
    Seconds(f64),
    /// Wall-clock time (no zone; only differences matter).
    DateTime(NaiveDateTime),
}

impl Timestamp {
    /// Seconds elapsed from `earlier` to `self`.
    ///
    /// Returns `None` when the two timestamps are of different kinds.
    pub fn seconds_since(&self, earlier: &Timestamp) -> Option<f64> {
        match (self, earlier) {
            (Timestamp::Seconds(a), Timestamp::Seconds(b)) => Some(a - b),
            (Timestamp::DateTime(a), Timestamp::DateTime(b)) => {
                let delta = *a - *b;
                Some(match delta.num_microseconds() {
                    Some(us) => us as f64 / 1e6,
                    None => delta.num_milliseconds() as f64 / 1e3,
                })
            }
            _ => None,
        }
    }
}

/// One raw telemetry record.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySample {
    pub timestamp: Timestamp,
    /// Cumulative distance (m).
    pub distance: f64,
    /// Altitude (m).
    pub altitude: f64,
    /// Instantaneous speed (m/s).
    pub speed: f64,
    /// Instantaneous rider power (W).
    pub power: f64,
}

/// A telemetry record enriched with backward differences.
///
/// For the first row of a table every derived field is `0.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedSample {
    /// Row position in the table the sample was derived from.
    pub index: usize,
    pub sample: TelemetrySample,
    pub dx: f64,
    pub dy: f64,
    pub grade: f64,
    /// Slope angle (radians).
    pub theta: f64,
    pub speed_diff: f64,
    /// Seconds since the previous row.
    pub dt: f64,
}

impl DerivedSample {
    pub fn speed(&self) -> f64 {
        self.sample.speed
    }

    pub fn power(&self) -> f64 {
        self.sample.power
    }
}

/// Caller-supplied physical constants, fixed for one estimation call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicalConstants {
    pub rider_mass_kg: f64,
    pub bike_mass_kg: f64,
    pub rho_kg_m3: f64,
}

impl PhysicalConstants {
    pub const DEFAULT_BIKE_MASS_KG: f64 = 8.0;
    pub const DEFAULT_RHO_KG_M3: f64 = 1.225;

    /// Validate and build constants.
    pub fn new(rider_mass_kg: f64, bike_mass_kg: f64, rho_kg_m3: f64) -> Result<Self, EstimateError> {
        if !(rider_mass_kg.is_finite() && rider_mass_kg > 0.0) {
            return Err(EstimateError::InvalidInput(format!(
                "rider mass must be > 0 kg (got {rider_mass_kg})"
            )));
        }
        if !(bike_mass_kg.is_finite() && bike_mass_kg >= 0.0) {
            return Err(EstimateError::InvalidInput(format!(
                "bike mass must be >= 0 kg (got {bike_mass_kg})"
            )));
        }
        if !(rho_kg_m3.is_finite() && rho_kg_m3 > 0.0) {
            return Err(EstimateError::InvalidInput(format!(
                "air density must be > 0 kg/m³ (got {rho_kg_m3})"
            )));
        }
        Ok(Self {
            rider_mass_kg,
            bike_mass_kg,
            rho_kg_m3,
        })
    }

    /// Combined rider + bike mass `m`.
    pub fn total_mass(&self) -> f64 {
        self.rider_mass_kg + self.bike_mass_kg
    }
}

/// The three unknowns, in solve order.
///
/// The solver is unconstrained, so none of these is guaranteed non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterVector {
    /// Multiplier on rider power reaching the wheel (drivetrain term).
    pub drivetrain_loss: f64,
    /// Rolling-resistance coefficient.
    pub crr: f64,
    /// Drag area (m²).
    pub cda: f64,
}

impl ParameterVector {
    pub fn from_array(x: [f64; N_PARAMS]) -> Self {
        Self {
            drivetrain_loss: x[0],
            crr: x[1],
            cda: x[2],
        }
    }

    pub fn as_array(&self) -> [f64; N_PARAMS] {
        [self.drivetrain_loss, self.crr, self.cda]
    }

    /// Euclidean distance between two parameter vectors.
    pub fn distance_to(&self, other: &ParameterVector) -> f64 {
        self.as_array()
            .iter()
            .zip(other.as_array().iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt()
    }
}

/// Read-only diagnostics of one least-squares solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitDiagnostics {
    /// `b - ŷ`, one entry per sample.
    pub residuals: Vec<f64>,
    /// Residual sum of squares; `None` when rank-deficient or `n <= N_PARAMS`.
    pub residual_ss: Option<f64>,
    /// Numerical rank of the system matrix.
    pub rank: usize,
    /// Singular values of the system matrix, descending.
    pub singular_values: Vec<f64>,
    /// `ŷ = A·x`.
    pub fitted: Vec<f64>,
    /// `b`.
    pub target: Vec<f64>,
}

impl FitDiagnostics {
    pub fn n(&self) -> usize {
        self.residuals.len()
    }

    pub fn is_full_rank(&self) -> bool {
        self.rank == N_PARAMS
    }

    pub fn rmse(&self) -> f64 {
        if self.residuals.is_empty() {
            return 0.0;
        }
        let sse: f64 = self.residuals.iter().map(|r| r * r).sum();
        (sse / self.residuals.len() as f64).sqrt()
    }
}

/// Output of a single-pass solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    pub params: ParameterVector,
    pub diagnostics: FitDiagnostics,
}

/// Output of the two-pass (trim-and-refit) estimator.
#[derive(Debug, Clone, PartialEq)]
pub struct RobustEstimate {
    /// Second-pass solve on the trimmed table.
    pub estimate: Estimate,
    /// Parameters of the first pass on the full table.
    pub first_pass: ParameterVector,
    /// First-pass signed errors `b - ŷ`, aligned with the input table.
    pub first_pass_errors: Vec<f64>,
    /// Absolute-error percentile; samples at or above it were dropped.
    pub cutoff: f64,
    /// Number of samples dropped.
    pub removed: usize,
    /// Samples that survived the trim, in input order.
    pub trimmed: Vec<DerivedSample>,
}

/// Which estimator variant produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FitMode {
    SinglePass,
    Robust,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus environment and defaults).
#[derive(Debug, Clone)]
pub struct EstimateConfig {
    pub csv_path: PathBuf,
    pub constants: PhysicalConstants,
    /// Trim percentile for the robust pass, in percent.
    pub quantile: f64,
    pub mode: FitMode,
    /// Samples with `speed <= min_speed` are excluded before solving.
    pub min_speed: f64,
    pub verbose: bool,

    pub export_samples: Option<PathBuf>,
    pub export_estimate: Option<PathBuf>,
}

/// A saved estimate (JSON).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateFile {
    pub tool: String,
    pub source: Option<String>,
    pub mode: FitMode,
    pub constants: PhysicalConstants,
    pub params: ParameterVector,
    /// Present for robust fits.
    pub first_pass: Option<ParameterVector>,
    pub rank: usize,
    pub singular_values: Vec<f64>,
    pub residual_ss: Option<f64>,
    pub rmse: f64,
    pub samples_used: usize,
    pub samples_removed: usize,
    /// Present for robust fits.
    pub cutoff: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn datetime_differences_are_seconds() {
        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let a = Timestamp::DateTime(day.and_hms_milli_opt(10, 0, 0, 0).unwrap());
        let b = Timestamp::DateTime(day.and_hms_milli_opt(10, 0, 2, 500).unwrap());
        assert_eq!(b.seconds_since(&a), Some(2.5));
        assert_eq!(a.seconds_since(&b), Some(-2.5));
    }

    #[test]
    fn mixed_timestamp_kinds_have_no_difference() {
        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let a = Timestamp::DateTime(day.and_hms_opt(10, 0, 0).unwrap());
        let b = Timestamp::Seconds(3.0);
        assert_eq!(a.seconds_since(&b), None);
    }

    #[test]
    fn constants_are_validated() {
        assert!(PhysicalConstants::new(72.0, 8.0, 1.2).is_ok());
        assert!(PhysicalConstants::new(72.0, 0.0, 1.2).is_ok());
        assert!(matches!(
            PhysicalConstants::new(0.0, 8.0, 1.2),
            Err(EstimateError::InvalidInput(_))
        ));
        assert!(PhysicalConstants::new(72.0, -1.0, 1.2).is_err());
        assert!(PhysicalConstants::new(72.0, 8.0, 0.0).is_err());
        assert!(PhysicalConstants::new(f64::NAN, 8.0, 1.2).is_err());

        let c = PhysicalConstants::new(72.0, 8.0, 1.2).unwrap();
        assert_eq!(c.total_mass(), 80.0);
    }

    #[test]
    fn rmse_of_known_residuals() {
        let d = FitDiagnostics {
            residuals: vec![3.0, -4.0],
            residual_ss: Some(25.0),
            rank: 3,
            singular_values: vec![1.0, 1.0, 1.0],
            fitted: vec![0.0, 0.0],
            target: vec![3.0, -4.0],
        };
        assert!((d.rmse() - (12.5f64).sqrt()).abs() < 1e-12);
        assert!(d.is_full_rank());
        assert_eq!(d.n(), 2);

        let deficient = FitDiagnostics {
            rank: N_PARAMS - 1,
            ..d
        };
        assert!(!deficient.is_full_rank());
    }
}
