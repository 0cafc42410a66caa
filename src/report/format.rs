//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the estimation code stays clean and testable
//! - output changes are localized

use crate::domain::{EstimateFile, FitMode, ParameterVector};
use crate::fit::N_PARAMS;
use crate::io::ingest::IngestedRide;

/// Format the ride summary (what was read and what was used).
pub fn format_ride_summary(ride: &IngestedRide, moving: usize) -> String {
    let mut out = String::new();
    let s = &ride.stats;

    out.push_str("=== ridefit - drivetrain / Crr / CdA estimate ===\n");
    out.push_str(&format!(
        "Rows: read={} used={} skipped={} moving={}\n",
        ride.rows_read,
        ride.rows_used,
        ride.row_errors.len(),
        moving
    ));
    out.push_str(&format!(
        "Ride: {:.0}s | {:.2}km | altitude=[{:.1}, {:.1}]m | mean speed={:.2}m/s | mean power={:.0}W\n",
        s.duration_s,
        s.distance_m / 1000.0,
        s.altitude_min,
        s.altitude_max,
        s.mean_speed,
        s.mean_power
    ));

    out
}

/// Format an estimate (fresh or loaded from JSON).
pub fn format_estimate(est: &EstimateFile) -> String {
    let mut out = String::new();

    if let Some(source) = &est.source {
        out.push_str(&format!("Source: {source}\n"));
    }
    out.push_str(&format!(
        "Constants: rider={:.1}kg bike={:.1}kg rho={:.3}kg/m³\n",
        est.constants.rider_mass_kg, est.constants.bike_mass_kg, est.constants.rho_kg_m3
    ));

    let mode = match est.mode {
        FitMode::SinglePass => "single pass",
        FitMode::Robust => "two pass (trimmed)",
    };
    out.push_str(&format!("\nFit: {mode}\n"));
    out.push_str(&format!(
        "Samples: used={} removed={}",
        est.samples_used, est.samples_removed
    ));
    if let Some(cutoff) = est.cutoff {
        out.push_str(&format!(" | cutoff |e|>={cutoff:.3e}"));
    }
    out.push('\n');

    let confidence = if est.rank == N_PARAMS { "" } else { "  (rank-deficient: low confidence)" };
    out.push_str(&format!("Rank: {}{confidence}\n", est.rank));
    out.push_str(&format!("Singular values: {}\n", fmt_vec(&est.singular_values)));
    match est.residual_ss {
        Some(ss) => out.push_str(&format!("Residual SS: {ss:.6e} | RMSE: {:.6e}\n", est.rmse)),
        None => out.push_str(&format!("Residual SS: - | RMSE: {:.6e}\n", est.rmse)),
    }

    out.push_str("\nParameters:\n");
    out.push_str(&format_params_table(&est.params, est.first_pass.as_ref()));
    if let Some(first) = &est.first_pass {
        out.push_str(&format!("Shift from first pass: {:.3e}\n", est.params.distance_to(first)));
    }

    out
}

fn format_params_table(params: &ParameterVector, first_pass: Option<&ParameterVector>) -> String {
    let mut out = String::new();

    let rows = [
        ("drivetrain", params.drivetrain_loss, first_pass.map(|p| p.drivetrain_loss)),
        ("crr", params.crr, first_pass.map(|p| p.crr)),
        ("cda (m²)", params.cda, first_pass.map(|p| p.cda)),
    ];

    if first_pass.is_some() {
        out.push_str(format!("{:<12} {:>14} {:>14}\n", "parameter", "estimate", "first pass").trim_end());
        out.push('\n');
        out.push_str(format!("{:-<12} {:-<14} {:-<14}\n", "", "", "").trim_end());
        out.push('\n');
    } else {
        out.push_str(format!("{:<12} {:>14}\n", "parameter", "estimate").trim_end());
        out.push('\n');
        out.push_str(format!("{:-<12} {:-<14}\n", "", "").trim_end());
        out.push('\n');
    }

    for (name, value, first) in rows {
        let line = match first {
            Some(f) => format!("{name:<12} {value:>14.6} {f:>14.6}"),
            None => format!("{name:<12} {value:>14.6}"),
        };
        out.push_str(line.trim_end());
        out.push('\n');
    }

    out
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.6}")).collect();
    format!("[{}]", parts.join(", "))
}
