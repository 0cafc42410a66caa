//! Telemetry preparation: backward differences, stationary filtering and
//! synthetic rides.

pub mod preprocess;
pub mod synthetic;

pub use preprocess::*;
pub use synthetic::*;
