//! Two-tier error taxonomy.
//!
//! - [`ValidationError`]: caller input is unusable. Raised before simulation
//!   starts and always propagated to the caller unchanged.
//! - [`SimulationError`]: something went wrong while replaying bars or computing
//!   metrics. Caught exactly once by the orchestrator, which substitutes the
//!   degraded result.

use thiserror::Error;

/// Caller-input problems detected before the simulation starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("empty series")]
    EmptySeries,

    #[error("missing columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("insufficient rows: got {rows}, need at least {min}")]
    InsufficientRows { rows: usize, min: usize },

    #[error("column '{column}' has {actual} values, expected {expected}")]
    ColumnLengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("non-finite value in column '{column}' at row {row}")]
    NonFiniteValue { column: String, row: usize },

    #[error("invalid bar at row {row}: {reason}")]
    InvalidBar { row: usize, reason: String },

    #[error("timestamps must be strictly increasing (row {row})")]
    UnorderedTimestamps { row: usize },

    #[error("unknown strategy type: {0}")]
    UnknownStrategy(String),

    #[error("invalid parameter '{name}': {value}")]
    InvalidParameter { name: String, value: f64 },

    #[error("invalid execution control '{name}': {value}")]
    InvalidControl { name: &'static str, value: f64 },
}

/// Failures arising during the bar replay or the metrics computation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("non-finite {quantity} at bar {bar}")]
    NonFinite { quantity: &'static str, bar: usize },

    #[error("indicator '{indicator}' produced an invalid value at bar {bar}")]
    Indicator { indicator: String, bar: usize },

    #[error("broker invariant violated at bar {bar}: {reason}")]
    Broker { bar: usize, reason: String },

    #[error("metrics computation failed: {0}")]
    Metrics(String),
}
