//! Error types for the MNA solver.
//!
//! Every failure of `update()`, `stamp()` or `solve()` is reported through
//! [`CircuitError`]. None of them are retried internally.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`CircuitError`].
pub type Result<T> = std::result::Result<T, CircuitError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CircuitError {
    /// Calculation mode is unset or not applicable to the component variant
    #[error("Invalid calculation mode for component '{component}': {message}")]
    InvalidMode { component: String, message: String },

    /// A quantity needed by `update()` or `stamp()` is missing or out of range
    #[error("Invalid parameter for component '{component}': {message}")]
    InvalidParameter { component: String, message: String },

    /// The assembled system matrix is rank deficient
    #[error("A in Ax=b is rank deficient: {0}")]
    SingularSystem(SingularDiagnostic),

    /// No connected node is left to act as ground
    #[error("Network has no connected nodes to solve")]
    EmptyNetwork,
}

impl CircuitError {
    pub fn invalid_mode(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidMode {
            component: component.into(),
            message: message.into(),
        }
    }

    pub fn invalid_parameter(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            component: component.into(),
            message: message.into(),
        }
    }
}

/// Row-level diagnostics gathered when the system matrix is singular.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingularDiagnostic {
    pub dimension: usize,
    pub rank: usize,
    /// Euclidean norm of every matrix row, in row order
    pub row_norms: Vec<f64>,
    /// Rows whose norm is numerically zero, labelled with what they stand for
    pub zero_rows: Vec<(usize, String)>,
}

impl fmt::Display for SingularDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rank {} < dimension {}", self.rank, self.dimension)?;
        for (row, label) in &self.zero_rows {
            write!(f, "; row {}: {}", row, label)?;
        }
        Ok(())
    }
}
