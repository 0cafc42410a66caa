//! Two-pass estimator: fit, trim the worst-fitting samples, refit.
//!
//! The trim is a fixed quantile of absolute first-pass error, applied once.
//! It always removes roughly the worst `100 - q` percent of samples whatever
//! their magnitude, and it never iterates, so every call costs exactly two
//! solves. A very large outlier can bias the first pass enough to mis-rank
//! which samples are worst.

use tracing::{debug, info};

use crate::domain::{DerivedSample, PhysicalConstants, RobustEstimate};
use crate::error::EstimateError;
use crate::fit::estimator::estimate_parameters;
use crate::math::percentile;

/// Default trim percentile (keep samples below the 95th percentile of error).
pub const DEFAULT_TRIM_QUANTILE: f64 = 95.0;

/// Options for the robust estimator.
#[derive(Debug, Clone, Copy)]
pub struct TrimOptions {
    /// Percentile of absolute error (in percent) at or above which samples are dropped.
    pub quantile: f64,
    /// Report the number of removed samples at `info` level.
    pub verbose: bool,
}

impl Default for TrimOptions {
    fn default() -> Self {
        Self {
            quantile: DEFAULT_TRIM_QUANTILE,
            verbose: false,
        }
    }
}

/// Keep samples whose absolute error is strictly below the `quantile`
/// percentile of absolute errors.
///
/// `errors` must be aligned with `samples`. Returns a new table and the cutoff.
pub fn trim_by_error(
    samples: &[DerivedSample],
    errors: &[f64],
    quantile: f64,
) -> Result<(Vec<DerivedSample>, f64), EstimateError> {
    if !(quantile > 0.0 && quantile <= 100.0) {
        return Err(EstimateError::InvalidInput(format!(
            "trim quantile must be in (0, 100] (got {quantile})"
        )));
    }
    if samples.len() != errors.len() {
        return Err(EstimateError::InvalidInput(format!(
            "{} samples but {} errors",
            samples.len(),
            errors.len()
        )));
    }

    let abs_errors: Vec<f64> = errors.iter().map(|e| e.abs()).collect();
    let cutoff = percentile(&abs_errors, quantile)
        .ok_or_else(|| EstimateError::EmptyInput("no errors to trim".to_string()))?;

    let kept = samples
        .iter()
        .zip(abs_errors.iter())
        .filter(|(_, e)| **e < cutoff)
        .map(|(s, _)| s.clone())
        .collect();

    Ok((kept, cutoff))
}

/// Estimate parameters with one trim-and-refit cycle.
pub fn estimate_parameters_robust(
    samples: &[DerivedSample],
    constants: &PhysicalConstants,
    opts: &TrimOptions,
) -> Result<RobustEstimate, EstimateError> {
    let first = estimate_parameters(samples, constants)?;
    let errors = first.diagnostics.residuals.clone();

    let (trimmed, cutoff) = trim_by_error(samples, &errors, opts.quantile)?;
    let removed = samples.len() - trimmed.len();

    if opts.verbose {
        info!("Removed {removed} outliers");
    } else {
        debug!(removed, cutoff, "trimmed first-pass outliers");
    }

    if trimmed.is_empty() {
        return Err(EstimateError::EmptyInput(format!(
            "every sample has absolute error at or above the p{} cutoff {cutoff:e}",
            opts.quantile
        )));
    }

    let estimate = estimate_parameters(&trimmed, constants)?;

    Ok(RobustEstimate {
        estimate,
        first_pass: first.params,
        first_pass_errors: errors,
        cutoff,
        removed,
        trimmed,
    })
}
