//! SimulationContext — cash, the open position, and the run's records.
//!
//! A fresh context is created for every run and dropped with it; nothing is
//! shared between runs.

use serde::{Deserialize, Serialize};

use crate::domain::{EquityPoint, ExitReason, Position, PriceBar, Trade};
use crate::error::SimulationError;

/// Position state of the single-instrument model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionState {
    Flat,
    Long,
}

#[derive(Debug, Clone)]
pub struct SimulationContext {
    pub cash: f64,
    commission: f64,
    pub position: Option<Position>,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
}

impl SimulationContext {
    pub fn new(initial_cash: f64, commission: f64, num_bars: usize) -> Self {
        Self {
            cash: initial_cash,
            commission,
            position: None,
            trades: Vec::new(),
            equity_curve: Vec::with_capacity(num_bars),
        }
    }

    pub fn state(&self) -> PositionState {
        match &self.position {
            Some(p) if p.is_long() => PositionState::Long,
            _ => PositionState::Flat,
        }
    }

    pub fn commission(&self) -> f64 {
        self.commission
    }

    /// Cash plus the open position marked at `price`.
    pub fn equity(&self, price: f64) -> f64 {
        self.cash + self.position.as_ref().map_or(0.0, |p| p.market_value(price))
    }

    /// Largest whole quantity whose cost including commission fits in cash.
    pub fn affordable_quantity(&self, price: f64) -> u64 {
        let per_share = price * (1.0 + self.commission);
        let qty = (self.cash / per_share).floor();
        if !qty.is_finite() || qty <= 0.0 {
            return 0;
        }
        let mut qty = qty as u64;
        // Division rounding can overshoot by a share; settle on the fill arithmetic.
        while qty > 0 && self.entry_cost(qty, price) > self.cash {
            qty -= 1;
        }
        qty
    }

    /// Notional plus commission for buying `quantity` at `price`.
    fn entry_cost(&self, quantity: u64, price: f64) -> f64 {
        let notional = quantity as f64 * price;
        notional + notional * self.commission
    }

    /// Open a long of `quantity` at `bar.close` with the given stop.
    pub fn open_long(
        &mut self,
        bar_index: usize,
        bar: &PriceBar,
        quantity: u64,
        stop: f64,
    ) -> Result<(), SimulationError> {
        if self.position.is_some() {
            return Err(SimulationError::Broker {
                bar: bar_index,
                reason: "entry while a position is already open".into(),
            });
        }
        if !stop.is_finite() {
            return Err(SimulationError::NonFinite {
                quantity: "stop",
                bar: bar_index,
            });
        }

        let price = bar.close;
        let cost = self.entry_cost(quantity, price);
        let commission = cost - quantity as f64 * price;
        let cash_after = self.cash - cost;
        if !cash_after.is_finite() {
            return Err(SimulationError::NonFinite {
                quantity: "cash",
                bar: bar_index,
            });
        }
        if cash_after < 0.0 {
            return Err(SimulationError::Broker {
                bar: bar_index,
                reason: format!("entry cost {cost:.2} exceeds cash {:.2}", self.cash),
            });
        }

        self.cash = cash_after;
        self.position = Some(Position {
            quantity: quantity as i64,
            entry_price: price,
            stop_price: stop,
            entry_timestamp: bar.timestamp,
            entry_bar: bar_index,
            entry_commission: commission,
        });
        tracing::debug!(
            bar = bar_index,
            quantity,
            price,
            stop,
            cash = self.cash,
            "opened long"
        );
        Ok(())
    }

    /// Close the open position at `exit_price` and record the trade.
    pub fn close_position(
        &mut self,
        bar_index: usize,
        bar: &PriceBar,
        exit_price: f64,
        reason: ExitReason,
    ) -> Result<&Trade, SimulationError> {
        let Some(position) = self.position.take() else {
            return Err(SimulationError::Broker {
                bar: bar_index,
                reason: "exit without an open position".into(),
            });
        };

        let qty = position.quantity as f64;
        let proceeds = qty * exit_price;
        let exit_commission = proceeds.abs() * self.commission;
        let cash_after = self.cash + proceeds - exit_commission;
        if !cash_after.is_finite() {
            return Err(SimulationError::NonFinite {
                quantity: "cash",
                bar: bar_index,
            });
        }
        self.cash = cash_after;

        let pnl = qty * (exit_price - position.entry_price);
        let commission = position.entry_commission + exit_commission;
        let trade = Trade {
            entry_timestamp: position.entry_timestamp,
            exit_timestamp: bar.timestamp,
            entry_price: position.entry_price,
            exit_price,
            quantity: position.quantity,
            pnl,
            commission,
            net_pnl: pnl - commission,
            bars_held: position.bars_held(bar_index),
            exit_reason: reason,
        };
        tracing::debug!(
            bar = bar_index,
            quantity = trade.quantity,
            entry = trade.entry_price,
            exit = exit_price,
            pnl,
            reason = ?reason,
            "closed position"
        );
        self.trades.push(trade);
        Ok(&self.trades[self.trades.len() - 1])
    }

    /// Append the end-of-bar equity point.
    pub fn mark(&mut self, bar_index: usize, bar: &PriceBar) -> Result<&EquityPoint, SimulationError> {
        let market_value = self
            .position
            .as_ref()
            .map_or(0.0, |p| p.market_value(bar.close));
        let point = EquityPoint::new(bar.timestamp, self.cash, market_value);
        if !point.cash.is_finite() {
            return Err(SimulationError::NonFinite {
                quantity: "cash",
                bar: bar_index,
            });
        }
        if !point.equity.is_finite() {
            return Err(SimulationError::NonFinite {
                quantity: "equity",
                bar: bar_index,
            });
        }
        self.equity_curve.push(point);
        Ok(&self.equity_curve[self.equity_curve.len() - 1])
    }
}
