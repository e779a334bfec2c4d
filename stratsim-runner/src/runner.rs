//! Single-run entry points: config → data → orchestrated backtest → report.
//!
//! - `run_from_config()`: loads the data the config names, then runs.
//! - `run_on_frame()`: takes a pre-loaded frame. Used by the sweep so the
//!   data is read once per sweep, not once per grid point.

use serde::Serialize;
use thiserror::Error;

use stratsim_core::{run_backtest_detailed, BacktestRun, EngineConfig, PriceFrame, ValidationError};

use crate::config::{ConfigError, RunConfig, RunId};
use crate::data_loader::{dataset_hash, load_data, LoadError};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Everything persisted about one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub schema_version: u32,
    pub run_id: RunId,
    pub dataset_hash: String,
    pub config: RunConfig,
    pub run: BacktestRun,
}

impl RunReport {
    pub fn total_return(&self) -> f64 {
        self.run.result.total_return
    }
}

/// Run a single backtest from a config, loading its data first.
pub fn run_from_config(config: &RunConfig) -> Result<RunReport, RunError> {
    let frame = load_data(&config.data)?;
    let hash = dataset_hash(&frame);
    run_on_frame(config, &frame, &hash)
}

/// Run a backtest on data the caller already loaded. No I/O.
pub fn run_on_frame(
    config: &RunConfig,
    frame: &PriceFrame,
    dataset_hash: &str,
) -> Result<RunReport, RunError> {
    let run_id = config.run_id()?;
    tracing::info!(
        run_id = %short_id(&run_id),
        strategy = %config.strategy.strategy,
        rows = frame.row_count(),
        "starting run"
    );

    let run = run_backtest_detailed(
        frame,
        &config.strategy,
        &config.execution,
        &EngineConfig::default(),
    )?;

    if run.is_degraded() {
        tracing::warn!(run_id = %short_id(&run_id), "run degraded");
    }
    tracing::info!(
        run_id = %short_id(&run_id),
        trades = run.result.trades.len(),
        total_return = run.result.total_return,
        "run finished"
    );

    Ok(RunReport {
        schema_version: SCHEMA_VERSION,
        run_id,
        dataset_hash: dataset_hash.to_string(),
        config: config.clone(),
        run,
    })
}

/// First 12 hex chars of a run id, for log lines and directory names.
pub fn short_id(run_id: &str) -> &str {
    run_id.get(..12).unwrap_or(run_id)
}
