//! Reporting utilities: formatted terminal output for rides and estimates.

pub mod format;

pub use format::*;
