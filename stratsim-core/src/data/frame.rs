//! PriceFrame — columnar OHLCV input as handed over by the ingestion layer.
//!
//! A frame is untrusted: it may be empty, may lack columns, or may carry
//! extra ones. [`super::validate_frame`] turns it into a [`PriceSeries`].
//!
//! [`PriceSeries`]: crate::domain::PriceSeries

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::PriceBar;

/// Columns every frame must provide.
pub const REQUIRED_COLUMNS: [&str; 5] = ["open", "high", "low", "close", "volume"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceFrame {
    pub timestamps: Vec<NaiveDateTime>,
    /// Column name → values, one per timestamp. Names are lowercase.
    pub columns: BTreeMap<String, Vec<f64>>,
}

impl PriceFrame {
    pub fn new(timestamps: Vec<NaiveDateTime>) -> Self {
        Self {
            timestamps,
            columns: BTreeMap::new(),
        }
    }

    /// Builder-style column insertion. The name is lowercased.
    pub fn with_column(mut self, name: &str, values: Vec<f64>) -> Self {
        self.insert_column(name, values);
        self
    }

    pub fn insert_column(&mut self, name: &str, values: Vec<f64>) {
        self.columns.insert(name.to_ascii_lowercase(), values);
    }

    pub fn remove_column(&mut self, name: &str) -> Option<Vec<f64>> {
        self.columns.remove(&name.to_ascii_lowercase())
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(|v| v.as_slice())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn row_count(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Required columns absent from this frame, in canonical order.
    pub fn missing_columns(&self) -> Vec<String> {
        REQUIRED_COLUMNS
            .iter()
            .filter(|c| !self.has_column(c))
            .map(|c| c.to_string())
            .collect()
    }

    /// Columnar view of a bar slice. Handy for callers holding rows already.
    pub fn from_bars(bars: &[PriceBar]) -> Self {
        let timestamps = bars.iter().map(|b| b.timestamp).collect();
        Self::new(timestamps)
            .with_column("open", bars.iter().map(|b| b.open).collect())
            .with_column("high", bars.iter().map(|b| b.high).collect())
            .with_column("low", bars.iter().map(|b| b.low).collect())
            .with_column("close", bars.iter().map(|b| b.close).collect())
            .with_column("volume", bars.iter().map(|b| b.volume).collect())
    }
}
