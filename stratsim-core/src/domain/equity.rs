//! EquityPoint — one mark-to-market snapshot per bar.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub cash: f64,
    /// Mark-to-market value of the open position at the bar close (0 when flat).
    pub market_value: f64,
    pub equity: f64,
}

impl EquityPoint {
    pub fn new(timestamp: NaiveDateTime, cash: f64, market_value: f64) -> Self {
        Self {
            timestamp,
            cash,
            market_value,
            equity: cash + market_value,
        }
    }
}

/// Project an equity curve onto its equity values.
pub fn equity_values(points: &[EquityPoint]) -> Vec<f64> {
    points.iter().map(|p| p.equity).collect()
}
