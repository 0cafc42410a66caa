//! Command-line parsing for the ride parameter estimator.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the estimation code.
//!
//! Physical constants can also be supplied through the environment (or a
//! `.env` file): `RIDEFIT_RIDER_MASS_KG`, `RIDEFIT_BIKE_MASS_KG`, `RIDEFIT_RHO_KG_M3`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::PhysicalConstants;
use crate::fit::DEFAULT_TRIM_QUANTILE;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "ridefit", version, about = "Estimate drivetrain loss, Crr and CdA from ride telemetry")]
pub struct Cli {
    /// Log progress (equivalent to RUST_LOG=info).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Estimate parameters from a ride CSV and print diagnostics.
    Estimate(EstimateArgs),
    /// Generate a synthetic ride CSV from known parameters.
    Simulate(SimulateArgs),
    /// Print a previously exported estimate JSON.
    Show(ShowArgs),
}

/// Rider and air constants shared by `estimate` and `simulate`.
#[derive(Debug, Args, Clone)]
pub struct ConstantsArgs {
    /// Rider mass (kg).
    #[arg(long, env = "RIDEFIT_RIDER_MASS_KG")]
    pub rider_mass: f64,

    /// Bicycle mass (kg).
    #[arg(long, env = "RIDEFIT_BIKE_MASS_KG", default_value_t = PhysicalConstants::DEFAULT_BIKE_MASS_KG)]
    pub bike_mass: f64,

    /// Air density (kg/m³).
    #[arg(long, env = "RIDEFIT_RHO_KG_M3", default_value_t = PhysicalConstants::DEFAULT_RHO_KG_M3)]
    pub rho: f64,
}

/// Options for `ridefit estimate`.
#[derive(Debug, Parser, Clone)]
pub struct EstimateArgs {
    /// Ride CSV with timestamp, distance, altitude, speed and power columns.
    #[arg(long, value_name = "CSV")]
    pub csv: PathBuf,

    #[command(flatten)]
    pub constants: ConstantsArgs,

    /// Drop samples with absolute first-pass error at or above this percentile.
    #[arg(long, default_value_t = DEFAULT_TRIM_QUANTILE)]
    pub quantile: f64,

    /// Solve once, without trimming outliers.
    #[arg(long)]
    pub single_pass: bool,

    /// Exclude samples at or below this speed (m/s) before solving.
    #[arg(long, default_value_t = 0.0)]
    pub min_speed: f64,

    /// Export the fitted sample table to CSV.
    #[arg(long = "export-samples")]
    pub export_samples: Option<PathBuf>,

    /// Export the estimate (parameters + diagnostics) to JSON.
    #[arg(long = "export-estimate")]
    pub export_estimate: Option<PathBuf>,
}

/// Options for `ridefit simulate`.
#[derive(Debug, Parser, Clone)]
pub struct SimulateArgs {
    /// Output CSV path.
    #[arg(long, value_name = "CSV")]
    pub out: PathBuf,

    #[command(flatten)]
    pub constants: ConstantsArgs,

    /// Number of samples.
    #[arg(short = 'n', long, default_value_t = 600)]
    pub samples: usize,

    /// Sampling interval (s).
    #[arg(long, default_value_t = 1.0)]
    pub dt: f64,

    /// True drivetrain term.
    #[arg(long, default_value_t = 0.97)]
    pub drivetrain: f64,

    /// True rolling-resistance coefficient.
    #[arg(long, default_value_t = 0.004)]
    pub crr: f64,

    /// True drag area (m²).
    #[arg(long, default_value_t = 0.32)]
    pub cda: f64,

    /// Standard deviation of additive power noise (W).
    #[arg(long, default_value_t = 0.0)]
    pub noise: f64,

    /// Random seed for power noise.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// Options for `ridefit show`.
#[derive(Debug, Parser)]
pub struct ShowArgs {
    /// Estimate JSON produced by `ridefit estimate --export-estimate`.
    #[arg(long, value_name = "JSON")]
    pub estimate: PathBuf,
}
