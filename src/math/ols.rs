//! Ordinary least squares via SVD.
//!
//! We solve small, tall problems of the form:
//!
//! ```text
//! minimize ||A·x - b||₂
//! ```
//!
//! with `A` having one row per telemetry sample and three columns.
//!
//! Implementation choices:
//! - SVD handles tall and rank-deficient matrices uniformly.
//!   (Nalgebra's `QR::solve` is intended for square systems.)
//! - Singular values at or below `eps · max(n, p) · σ_max` are treated as zero,
//!   which yields the minimum-norm solution when `A` is rank-deficient. The
//!   same cutoff defines the reported rank.

use nalgebra::{DMatrix, DVector};

/// Result of a least-squares solve.
#[derive(Debug, Clone)]
pub struct LeastSquares {
    pub x: DVector<f64>,
    /// Sum of squared residuals, only when `rank == p` and `n > p`.
    pub residual_ss: Option<f64>,
    pub rank: usize,
    /// Descending.
    pub singular_values: Vec<f64>,
}

/// Solve `A·x ≈ b` in the least-squares sense.
///
/// Returns `None` on a shape mismatch or when any input entry is not finite.
pub fn lstsq(a: &DMatrix<f64>, b: &DVector<f64>) -> Option<LeastSquares> {
    let (n, p) = a.shape();
    if n != b.len() || n == 0 || p == 0 {
        return None;
    }
    // SVD iterations on NaN/∞ input do not converge.
    if a.iter().chain(b.iter()).any(|v| !v.is_finite()) {
        return None;
    }

    let svd = a.clone().svd(true, true);

    let mut singular_values: Vec<f64> = svd.singular_values.iter().copied().collect();
    singular_values.sort_by(|x, y| y.total_cmp(x));

    let sigma_max = singular_values.first().copied().unwrap_or(0.0);
    let cutoff = f64::EPSILON * n.max(p) as f64 * sigma_max;
    let rank = singular_values.iter().filter(|&&s| s > cutoff).count();

    let x = svd.solve(b, cutoff).ok()?;

    let residual_ss = if rank == p && n > p {
        let r = b - a * &x;
        Some(r.norm_squared())
    } else {
        None
    };

    Some(LeastSquares {
        x,
        residual_ss,
        rank,
        singular_values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let a = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let b = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let ls = lstsq(&a, &b).unwrap();
        assert!((ls.x[0] - 2.0).abs() < 1e-10);
        assert!((ls.x[1] - 3.0).abs() < 1e-10);
        assert_eq!(ls.rank, 2);
        assert!(ls.residual_ss.unwrap() < 1e-20);
    }

    #[test]
    fn overdetermined_residual_matches_hand_computation() {
        // y = c on [1, 2, 3, 6] -> c = 3, residuals [-2, -1, 0, 3].
        let a = DMatrix::from_element(4, 1, 1.0);
        let b = DVector::from_row_slice(&[1.0, 2.0, 3.0, 6.0]);

        let ls = lstsq(&a, &b).unwrap();
        assert!((ls.x[0] - 3.0).abs() < 1e-12);
        assert!((ls.residual_ss.unwrap() - 14.0).abs() < 1e-10);
    }

    #[test]
    fn rank_deficient_returns_minimum_norm() {
        // Two identical columns: any x0 + x1 = 1 fits; min-norm is (0.5, 0.5).
        let a = DMatrix::from_row_slice(3, 2, &[1.0, 1.0, 2.0, 2.0, 3.0, 3.0]);
        let b = DVector::from_row_slice(&[1.0, 2.0, 3.0]);

        let ls = lstsq(&a, &b).unwrap();
        assert_eq!(ls.rank, 1);
        assert!(ls.residual_ss.is_none());
        assert!((ls.x[0] - 0.5).abs() < 1e-10);
        assert!((ls.x[1] - 0.5).abs() < 1e-10);
        assert!(ls.singular_values[0] >= ls.singular_values[1]);
    }

    #[test]
    fn zero_matrix_has_rank_zero() {
        let a = DMatrix::zeros(4, 3);
        let b = DVector::zeros(4);

        let ls = lstsq(&a, &b).unwrap();
        assert_eq!(ls.rank, 0);
        assert!(ls.x.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn non_finite_input_is_rejected() {
        let a = DMatrix::from_row_slice(2, 1, &[1.0, f64::NAN]);
        let b = DVector::from_row_slice(&[1.0, 2.0]);
        assert!(lstsq(&a, &b).is_none());
    }
}
