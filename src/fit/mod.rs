//! Parameter estimation.
//!
//! Responsibilities:
//!
//! - assemble the per-sample power-balance system (`system`)
//! - solve it once by ordinary least squares (`estimator`)
//! - trim the worst-fitting samples and refit (`robust`)

pub mod estimator;
pub mod robust;
pub mod system;

pub use estimator::*;
pub use robust::*;
pub use system::*;
