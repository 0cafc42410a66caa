//! Error types.
//!
//! - `EstimateError`: failures of the numerical core (preprocessing + solves).
//! - `AppError`: what the binary reports, carrying a process exit code.
//!
//! Exit codes:
//! - 2: usage / input schema problems
//! - 3: no usable data
//! - 4: numerical failures

use thiserror::Error;

/// Errors raised by preprocessing and estimation.
///
/// Rank deficiency is deliberately absent: a rank-deficient system still has a
/// minimum-norm solution, and callers read `FitDiagnostics::rank` instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimateError {
    /// A required telemetry column is absent.
    #[error("Missing required column: `{0}`")]
    MissingColumn(String),

    /// No samples left to solve on.
    #[error("No usable samples: {0}")]
    EmptyInput(String),

    /// A coefficient or target is not finite (typically a stationary sample).
    #[error("Non-finite coefficient at row {row} (zero speed?); filter stationary samples before estimating")]
    DivisionHazard { row: usize },

    /// Inputs that violate a documented contract.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl EstimateError {
    pub fn exit_code(&self) -> u8 {
        match self {
            EstimateError::MissingColumn(_) | EstimateError::InvalidInput(_) => 2,
            EstimateError::EmptyInput(_) => 3,
            EstimateError::DivisionHazard { .. } => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<EstimateError> for AppError {
    fn from(err: EstimateError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_errors_map_to_exit_codes() {
        let missing: AppError = EstimateError::MissingColumn("power".to_string()).into();
        assert_eq!(missing.exit_code(), 2);
        assert!(missing.to_string().contains("`power`"));

        let empty: AppError = EstimateError::EmptyInput("after trimming".to_string()).into();
        assert_eq!(empty.exit_code(), 3);

        let hazard: AppError = EstimateError::DivisionHazard { row: 7 }.into();
        assert_eq!(hazard.exit_code(), 4);
        assert!(hazard.to_string().contains("row 7"));
    }
}
