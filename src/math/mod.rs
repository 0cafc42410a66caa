//! Mathematical utilities: SVD least squares and percentiles.

pub mod ols;
pub mod stats;

pub use ols::*;
pub use stats::*;
