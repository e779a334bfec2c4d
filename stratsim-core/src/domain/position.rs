//! Position — the single open holding of the single-instrument model.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// An open position. Quantity is signed; the engine only ever opens longs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub quantity: i64,
    pub entry_price: f64,
    pub stop_price: f64,
    pub entry_timestamp: NaiveDateTime,
    pub entry_bar: usize,
    /// Commission paid on the entry fill.
    pub entry_commission: f64,
}

impl Position {
    pub fn is_long(&self) -> bool {
        self.quantity > 0
    }

    pub fn is_short(&self) -> bool {
        self.quantity < 0
    }

    pub fn market_value(&self, current_price: f64) -> f64 {
        self.quantity as f64 * current_price
    }

    pub fn unrealized_pnl(&self, current_price: f64) -> f64 {
        self.quantity as f64 * (current_price - self.entry_price)
    }

    /// Bars elapsed since the entry bar.
    pub fn bars_held(&self, bar_index: usize) -> usize {
        bar_index.saturating_sub(self.entry_bar)
    }

    /// Move the stop toward the price, never away from it.
    ///
    /// Returns true if the stop changed. Non-finite candidates are ignored.
    pub fn ratchet_stop(&mut self, candidate: f64) -> bool {
        if !candidate.is_finite() {
            return false;
        }
        let tighter = if self.is_short() {
            candidate < self.stop_price
        } else {
            candidate > self.stop_price
        };
        if tighter {
            self.stop_price = candidate;
        }
        tighter
    }
}
