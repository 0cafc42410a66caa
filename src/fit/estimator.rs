//! Single-pass estimator: one ordinary least-squares solve.

use nalgebra::DVector;
use tracing::{debug, warn};

use crate::domain::{DerivedSample, Estimate, FitDiagnostics, ParameterVector, PhysicalConstants};
use crate::error::EstimateError;
use crate::fit::system::{N_PARAMS, build_system};
use crate::math::lstsq;

/// Estimate `(drivetrain, Crr, CdA)` from a preprocessed table.
///
/// Precondition: every row with `dt != 0` has `speed > 0`. Violations are
/// reported as `DivisionHazard`, never patched.
///
/// A rank-deficient system still returns the minimum-norm solution; check
/// `diagnostics.rank` before trusting it.
pub fn estimate_parameters(
    samples: &[DerivedSample],
    constants: &PhysicalConstants,
) -> Result<Estimate, EstimateError> {
    let system = build_system(samples, constants)?;

    let ls = lstsq(&system.a, &system.b).ok_or_else(|| {
        EstimateError::InvalidInput("least-squares solve rejected the assembled system".to_string())
    })?;

    let fitted: DVector<f64> = &system.a * &ls.x;
    let residuals = &system.b - &fitted;

    if ls.rank < N_PARAMS {
        warn!(
            rank = ls.rank,
            n = samples.len(),
            "rank-deficient system; the estimate is a minimum-norm solution"
        );
    }

    let params = ParameterVector::from_array([ls.x[0], ls.x[1], ls.x[2]]);
    debug!(
        n = samples.len(),
        rank = ls.rank,
        drivetrain = params.drivetrain_loss,
        crr = params.crr,
        cda = params.cda,
        "solved power-balance system"
    );

    Ok(Estimate {
        params,
        diagnostics: FitDiagnostics {
            residuals: residuals.iter().copied().collect(),
            residual_ss: ls.residual_ss,
            rank: ls.rank,
            singular_values: ls.singular_values,
            fitted: fitted.iter().copied().collect(),
            target: system.b.iter().copied().collect(),
        },
    })
}
