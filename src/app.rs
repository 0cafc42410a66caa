//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - installs the tracing subscriber
//! - runs the estimate pipeline or the ride simulator
//! - prints reports
//! - writes optional exports

use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Command, ConstantsArgs, EstimateArgs, ShowArgs, SimulateArgs};
use crate::data::synthetic::{SyntheticRide, generate_ride};
use crate::domain::{EstimateConfig, FitMode, ParameterVector, PhysicalConstants};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `ridefit` binary.
pub fn run() -> Result<(), AppError> {
    // Constants may come from a `.env` file via clap's `env` fallbacks.
    dotenvy::dotenv().ok();
    let cli = crate::cli::Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Estimate(args) => handle_estimate(args, cli.verbose),
        Command::Simulate(args) => handle_simulate(args),
        Command::Show(args) => handle_show(args),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    // A second initialisation (e.g. from an embedding program) is not an error.
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn handle_estimate(args: EstimateArgs, verbose: bool) -> Result<(), AppError> {
    let config = estimate_config_from_args(&args, verbose)?;
    let run = pipeline::run_estimate(&config)?;

    println!(
        "{}",
        crate::report::format_ride_summary(&run.ride, run.moving.len())
    );
    println!("{}", crate::report::format_estimate(&run.file));

    // Optional exports.
    if let Some(path) = &config.export_samples {
        crate::io::export::write_samples_csv(path, run.fitted_samples(), &run.fit.estimate().diagnostics)?;
        info!(path = %path.display(), "wrote fitted samples");
    }
    if let Some(path) = &config.export_estimate {
        crate::io::estimate::write_estimate_json(path, &run.file)?;
        info!(path = %path.display(), "wrote estimate");
    }

    Ok(())
}

fn handle_simulate(args: SimulateArgs) -> Result<(), AppError> {
    let constants = constants_from_args(&args.constants)?;
    let config = SyntheticRide {
        n_samples: args.samples,
        dt: args.dt,
        params: ParameterVector {
            drivetrain_loss: args.drivetrain,
            crr: args.crr,
            cda: args.cda,
        },
        constants,
        power_noise_sd: args.noise,
        seed: args.seed,
        ..SyntheticRide::default()
    };

    let ride = generate_ride(&config)?;
    crate::io::export::write_telemetry_csv(&args.out, &ride)?;

    println!("Wrote {} samples to {}", ride.len(), args.out.display());
    Ok(())
}

fn handle_show(args: ShowArgs) -> Result<(), AppError> {
    let estimate = crate::io::estimate::read_estimate_json(&args.estimate)?;
    println!("{}", crate::report::format_estimate(&estimate));
    Ok(())
}

pub fn constants_from_args(args: &ConstantsArgs) -> Result<PhysicalConstants, AppError> {
    Ok(PhysicalConstants::new(args.rider_mass, args.bike_mass, args.rho)?)
}

pub fn estimate_config_from_args(args: &EstimateArgs, verbose: bool) -> Result<EstimateConfig, AppError> {
    Ok(EstimateConfig {
        csv_path: args.csv.clone(),
        constants: constants_from_args(&args.constants)?,
        quantile: args.quantile,
        mode: if args.single_pass {
            FitMode::SinglePass
        } else {
            FitMode::Robust
        },
        min_speed: args.min_speed,
        verbose,
        export_samples: args.export_samples.clone(),
        export_estimate: args.export_estimate.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;

    #[test]
    fn config_from_args_selects_mode_and_validates_constants() {
        let cli = Cli::parse_from([
            "ridefit", "estimate", "--csv", "r.csv", "--rider-mass", "70", "--single-pass", "--min-speed", "1.5",
        ]);
        let Command::Estimate(args) = cli.command else {
            panic!("expected estimate");
        };
        let config = estimate_config_from_args(&args, true).unwrap();
        assert_eq!(config.mode, FitMode::SinglePass);
        assert_eq!(config.min_speed, 1.5);
        assert!(config.verbose);
        assert_eq!(config.constants.total_mass(), 70.0 + PhysicalConstants::DEFAULT_BIKE_MASS_KG);

        let bad = ConstantsArgs {
            rider_mass: -3.0,
            bike_mass: 8.0,
            rho: 1.2,
        };
        assert_eq!(constants_from_args(&bad).unwrap_err().exit_code(), 2);
    }
}
