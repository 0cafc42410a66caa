//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - telemetry records (`TelemetrySample`, `DerivedSample`)
//! - physical constants (`PhysicalConstants`)
//! - fit outputs (`ParameterVector`, `FitDiagnostics`, `Estimate`, `RobustEstimate`)
//! - run configuration and the saved estimate schema

pub mod types;

pub use types::*;
