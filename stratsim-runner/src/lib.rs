//! Stratsim Runner — config files, data loading, runs, sweeps and artifacts.
//!
//! This crate builds on `stratsim-core` to provide:
//! - TOML run configs with content-addressed run ids
//! - CSV loading and seeded synthetic data
//! - Single runs producing a `RunReport`
//! - Parallel parameter sweeps
//! - JSON/CSV artifact export

pub mod config;
pub mod data_loader;
pub mod export;
pub mod runner;
pub mod sweep;

pub use config::{ConfigError, DataConfig, RunConfig, RunId};
pub use data_loader::{generate_synthetic, load_csv, load_data, read_csv, LoadError};
pub use export::{save_artifacts, save_sweep_summary};
pub use runner::{run_from_config, run_on_frame, RunError, RunReport, SCHEMA_VERSION};
pub use sweep::{GridError, ParamGrid, ParamSweep, SweepResults};
