//! Assembly of the power-balance linear system.
//!
//! For each sample `i` the acceleration over the step must be explained by
//! rider power, rolling resistance and aerodynamic drag:
//!
//! ```text
//! b_i  = Δv_i + dt_i · g · sin θ_i
//! c1_i =  dt_i · P_i / (m · v_i)
//! c2_i = −dt_i · g · cos θ_i
//! c3_i = −dt_i · ρ · v_i² / (2m)
//! ```
//!
//! so that `A·x ≈ b` with `x = (drivetrain, Crr, CdA)`.

use nalgebra::{DMatrix, DVector};

use crate::domain::{DerivedSample, G, PhysicalConstants};
use crate::error::EstimateError;

/// Number of unknowns.
pub const N_PARAMS: usize = 3;

/// `A` (n × 3) and `b` (n).
#[derive(Debug, Clone)]
pub struct LinearSystem {
    pub a: DMatrix<f64>,
    pub b: DVector<f64>,
}

/// Coefficients and target for a single sample.
///
/// Requires `speed > 0` whenever `dt != 0`; otherwise the result is not finite.
/// Rows with `dt == 0` are all zero, target included.
pub fn design_row(s: &DerivedSample, mass: f64, rho: f64) -> ([f64; N_PARAMS], f64) {
    let v = s.speed();
    let dt = s.dt;
    if dt == 0.0 {
        // No elapsed time: an all-zero equation, whatever the speed.
        return ([0.0; N_PARAMS], 0.0);
    }

    let target = s.speed_diff + dt * G * s.theta.sin();
    let row = [
        dt * s.power() / (mass * v),
        -dt * G * s.theta.cos(),
        -dt * rho * v * v / (2.0 * mass),
    ];
    (row, target)
}

/// Build the system for a table of derived samples.
pub fn build_system(
    samples: &[DerivedSample],
    constants: &PhysicalConstants,
) -> Result<LinearSystem, EstimateError> {
    if samples.is_empty() {
        return Err(EstimateError::EmptyInput(
            "the telemetry table has no rows".to_string(),
        ));
    }

    let mass = constants.total_mass();
    let rho = constants.rho_kg_m3;
    let n = samples.len();

    let mut a = DMatrix::zeros(n, N_PARAMS);
    let mut b = DVector::zeros(n);

    for (i, s) in samples.iter().enumerate() {
        let (row, target) = design_row(s, mass, rho);
        if !target.is_finite() || row.iter().any(|c| !c.is_finite()) {
            return Err(EstimateError::DivisionHazard { row: s.index });
        }
        for (j, c) in row.iter().enumerate() {
            a[(i, j)] = *c;
        }
        b[i] = target;
    }

    Ok(LinearSystem { a, b })
}
