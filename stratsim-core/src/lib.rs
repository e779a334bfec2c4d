//! stratsim core — validation, parameter adjustment, strategies, simulation loop, metrics.
//!
//! This crate contains the backtest engine and performs no I/O:
//! - Domain types (bars, series, positions, trades, equity points)
//! - Frame validation into a [`domain::PriceSeries`]
//! - Data-length-aware parameter clamping
//! - Streaming indicators and the three strategy variants
//! - Risk-based position sizing
//! - Bar-by-bar simulation loop with stop handling
//! - Metrics and the fail-safe orchestrator

pub mod backtest;
pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod metrics;
pub mod params;
pub mod sizing;
pub mod strategy;

pub use backtest::{run_backtest, run_backtest_detailed, BacktestResult, BacktestRun};
pub use config::{EngineConfig, ExecutionControls};
pub use data::{validate_frame, PriceFrame};
pub use error::{SimulationError, ValidationError};
pub use params::{adjust_parameters, AdjustedParameters, StrategyKind, StrategyRequest};
