//! Fixed-fractional risk sizing.
//!
//! # Formula
//! ```text
//! risk_per_share = |entry - stop|
//! raw            = floor(equity * risk_fraction / risk_per_share)
//! affordable     = floor(cash / entry)
//! quantity       = max(0, min(raw, affordable))
//! ```
//!
//! # Example
//! - Equity: $100,000, cash: $50,000
//! - Entry $100, stop $95 → $5 risk per share
//! - Risk budget: 1% = $1,000 → 200 shares; affordable 500 → 200 shares

use serde::{Deserialize, Serialize};

/// Default share of equity put at risk per trade.
pub const RISK_FRACTION: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSizer {
    /// Risk fraction per trade (e.g., 0.01 = 1%)
    risk_fraction: f64,
}

impl Default for PositionSizer {
    fn default() -> Self {
        Self::new(RISK_FRACTION)
    }
}

impl PositionSizer {
    pub fn new(risk_fraction: f64) -> Self {
        assert!(
            risk_fraction > 0.0 && risk_fraction < 1.0,
            "risk_fraction must be in (0, 1)"
        );
        Self { risk_fraction }
    }

    pub fn risk_fraction(&self) -> f64 {
        self.risk_fraction
    }

    /// Whole-share quantity for a long entry. Never fails; degenerate inputs
    /// (zero stop distance, non-finite intermediates, no cash) size to 0.
    pub fn size(&self, equity: f64, cash: f64, price: f64, stop: f64) -> u64 {
        let risk_per_share = (price - stop).abs();
        if risk_per_share == 0.0 || !risk_per_share.is_finite() {
            return 0;
        }

        let raw = (equity * self.risk_fraction / risk_per_share).floor();
        let affordable = (cash / price).floor();
        if !raw.is_finite() || !affordable.is_finite() {
            return 0;
        }

        let qty = raw.min(affordable);
        if qty <= 0.0 {
            return 0;
        }
        qty as u64
    }
}
