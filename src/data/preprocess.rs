//! Per-sample kinematics from raw telemetry.
//!
//! Every derived field is a first-order backward difference against the
//! previous row; the first row is filled with `0.0` so it contributes an
//! all-zero row to the linear system instead of NaN.

use crate::domain::{DerivedSample, TelemetrySample};
use crate::error::EstimateError;

/// Derive `dx`, `dy`, `grade`, `theta`, `speed_diff` and `dt` for every row.
///
/// The input must be time-ordered. The output has exactly one row per input row.
pub fn derive_samples(samples: &[TelemetrySample]) -> Result<Vec<DerivedSample>, EstimateError> {
    let mut out = Vec::with_capacity(samples.len());
    let mut prev: Option<&TelemetrySample> = None;

    for (index, s) in samples.iter().enumerate() {
        let derived = match prev {
            None => DerivedSample {
                index,
                sample: s.clone(),
                dx: 0.0,
                dy: 0.0,
                grade: 0.0,
                theta: 0.0,
                speed_diff: 0.0,
                dt: 0.0,
            },
            Some(p) => {
                let dx = s.distance - p.distance;
                let dy = s.altitude - p.altitude;
                let grade = slope(dx, dy);
                let dt = s.timestamp.seconds_since(&p.timestamp).ok_or_else(|| {
                    EstimateError::InvalidInput(format!(
                        "row {index}: timestamp kind differs from the previous row"
                    ))
                })?;
                DerivedSample {
                    index,
                    sample: s.clone(),
                    dx,
                    dy,
                    grade,
                    theta: grade.atan(),
                    speed_diff: s.speed - p.speed,
                    dt,
                }
            }
        };
        out.push(derived);
        prev = Some(s);
    }

    Ok(out)
}

/// Keep only samples moving faster than `min_speed`.
///
/// Returns a new vector; derived fields are not recomputed, so `dt` and
/// `speed_diff` still refer to the original neighbouring rows.
pub fn filter_moving(samples: &[DerivedSample], min_speed: f64) -> Vec<DerivedSample> {
    samples
        .iter()
        .filter(|s| s.speed() > min_speed)
        .cloned()
        .collect()
}

fn slope(dx: f64, dy: f64) -> f64 {
    if dx == 0.0 || !dx.is_finite() {
        return 0.0;
    }
    let g = dy / dx;
    if g.is_finite() { g } else { 0.0 }
}
