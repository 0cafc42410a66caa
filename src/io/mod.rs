//! Input/output helpers.
//!
//! - CSV telemetry ingest + validation (`ingest`)
//! - fitted sample table export (CSV) (`export`)
//! - estimate JSON read/write (`estimate`)

pub mod estimate;
pub mod export;
pub mod ingest;

pub use estimate::*;
pub use export::*;
pub use ingest::*;
