//! `ride-fit` library crate.
//!
//! Estimates a drivetrain term, rolling-resistance coefficient (Crr) and drag
//! area (CdA) from one ride's telemetry by ordinary least squares on the
//! per-sample power balance, optionally trimming the worst-fitting samples and
//! refitting.
//!
//! The binary (`ridefit`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the estimator is reusable without the CLI, CSV or logging layers

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod report;
