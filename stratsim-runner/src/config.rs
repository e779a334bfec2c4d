//! Serializable run configuration, loaded from TOML.
//!
//! ```toml
//! [data]
//! source = "csv"
//! path = "spy.csv"
//!
//! [strategy]
//! type = "sma_cross"
//! params = { fast = 10, slow = 40 }
//!
//! [execution]
//! initial_cash = 100000.0
//! commission = 0.001
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use stratsim_core::{ExecutionControls, StrategyRequest};

/// Unique identifier for a run (content-addressable hash).
pub type RunId = String;

/// Errors from loading or hashing a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Everything needed to reproduce one backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub data: DataConfig,
    pub strategy: StrategyRequest,
    #[serde(default)]
    pub execution: ExecutionControls,
}

/// Where the price series comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum DataConfig {
    /// OHLCV CSV file with a date/timestamp column.
    Csv { path: PathBuf },
    /// Seeded random walk, for demos and tests.
    Synthetic {
        #[serde(default = "default_seed")]
        seed: u64,
        #[serde(default = "default_bars")]
        bars: usize,
        #[serde(default = "default_start")]
        start: NaiveDate,
    },
}

fn default_seed() -> u64 {
    42
}

fn default_bars() -> usize {
    756
}

fn default_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 2).unwrap_or_default()
}

impl DataConfig {
    pub fn synthetic(seed: u64, bars: usize) -> Self {
        DataConfig::Synthetic {
            seed,
            bars,
            start: default_start(),
        }
    }
}

impl RunConfig {
    pub fn new(data: DataConfig, strategy: StrategyRequest) -> Self {
        Self {
            data,
            strategy,
            execution: ExecutionControls::default(),
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load a config file. A relative CSV path is resolved against the
    /// directory containing the config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&text)?;
        if let DataConfig::Csv { path: csv_path } = &mut config.data {
            if csv_path.is_relative() {
                if let Some(dir) = path.parent() {
                    *csv_path = dir.join(&*csv_path);
                }
            }
        }
        Ok(config)
    }

    /// Deterministic hash of this configuration.
    ///
    /// Two runs with identical configs share a RunId.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}
