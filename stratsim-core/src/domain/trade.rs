//! Trade — a completed round trip, created when a position closes.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// The strategy emitted an exit signal; filled at the bar close.
    Signal,
    /// The bar traded through the protective stop.
    StopLoss,
}

/// A complete round-trip trade: entry → exit. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub entry_timestamp: NaiveDateTime,
    pub exit_timestamp: NaiveDateTime,
    pub entry_price: f64,
    pub exit_price: f64,
    pub quantity: i64,
    /// Gross realized PnL: price move times quantity, before commission.
    pub pnl: f64,
    /// Commission paid on both fills.
    pub commission: f64,
    pub net_pnl: f64,
    pub bars_held: usize,
    pub exit_reason: ExitReason,
}

impl Trade {
    /// Net return as a fraction of entry notional.
    pub fn return_pct(&self) -> f64 {
        let notional = self.entry_price * self.quantity as f64;
        if notional == 0.0 {
            return 0.0;
        }
        self.net_pnl / notional
    }

    /// A trade is won when its gross PnL is positive.
    pub fn is_winner(&self) -> bool {
        self.pnl > 0.0
    }
}
