//! Strategy variants — per-bar state machines that turn bars into signals.
//!
//! Strategies own their streaming indicators and see one bar at a time, so
//! the signal emitted at bar t depends on bars `0..=t` only. They read the
//! open position (if any) but never cash or the trade log.

pub mod donchian;
pub mod momentum;
pub mod sma_cross;

pub use donchian::DonchianBreakout;
pub use momentum::Momentum;
pub use sma_cross::SmaCross;

use serde::{Deserialize, Serialize};

use crate::domain::{PriceBar, Position};
use crate::error::SimulationError;
use crate::params::{AdjustedParameters, StrategyKind};

/// What the strategy wants the loop to do on the current bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Signal {
    Hold,
    /// Open a long position with the given protective stop.
    EnterLong { stop: f64 },
    /// Close the open long at the bar close.
    ExitLong,
}

/// Trait for bar-driven signal generators.
///
/// `on_bar` must be called exactly once per bar, in order. Implementations
/// only return `EnterLong` when `position` is `None` and only return
/// `ExitLong` when it is `Some`.
pub trait SignalGenerator: Send + Sync {
    /// Human-readable name (e.g., "sma_cross").
    fn name(&self) -> &str;

    /// Number of bars consumed before the first non-Hold signal is possible.
    fn warmup_bars(&self) -> usize;

    fn on_bar(
        &mut self,
        bar_index: usize,
        bar: &PriceBar,
        position: Option<&Position>,
    ) -> Result<Signal, SimulationError>;

    /// Trailing stop candidate for an open long after `bar` has been fed.
    ///
    /// The loop only ever ratchets the stop upward with this value.
    fn trailing_stop(&self, _bar: &PriceBar) -> Option<f64> {
        None
    }
}

/// The closed set of strategies the engine can run.
#[derive(Debug, Clone)]
pub enum Strategy {
    SmaCross(SmaCross),
    DonchianBreakout(DonchianBreakout),
    Momentum(Momentum),
}

impl Strategy {
    /// Build a fresh strategy from clamped parameters.
    pub fn from_params(params: &AdjustedParameters, stop_multiplier: f64) -> Self {
        match params {
            AdjustedParameters::SmaCross(p) => Strategy::SmaCross(SmaCross::new(*p, stop_multiplier)),
            AdjustedParameters::DonchianBreakout(p) => {
                Strategy::DonchianBreakout(DonchianBreakout::new(*p, stop_multiplier))
            }
            AdjustedParameters::Momentum(p) => Strategy::Momentum(Momentum::new(*p, stop_multiplier)),
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::SmaCross(_) => StrategyKind::SmaCross,
            Strategy::DonchianBreakout(_) => StrategyKind::DonchianBreakout,
            Strategy::Momentum(_) => StrategyKind::Momentum,
        }
    }

    fn inner(&self) -> &dyn SignalGenerator {
        match self {
            Strategy::SmaCross(s) => s,
            Strategy::DonchianBreakout(s) => s,
            Strategy::Momentum(s) => s,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn SignalGenerator {
        match self {
            Strategy::SmaCross(s) => s,
            Strategy::DonchianBreakout(s) => s,
            Strategy::Momentum(s) => s,
        }
    }
}

impl SignalGenerator for Strategy {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn warmup_bars(&self) -> usize {
        self.inner().warmup_bars()
    }

    fn on_bar(
        &mut self,
        bar_index: usize,
        bar: &PriceBar,
        position: Option<&Position>,
    ) -> Result<Signal, SimulationError> {
        self.inner_mut().on_bar(bar_index, bar, position)
    }

    fn trailing_stop(&self, bar: &PriceBar) -> Option<f64> {
        self.inner().trailing_stop(bar)
    }
}

/// Reject a warmed-up indicator value that is not a finite number.
pub(crate) fn checked(
    value: Option<f64>,
    indicator: &str,
    bar_index: usize,
) -> Result<Option<f64>, SimulationError> {
    match value {
        Some(v) if !v.is_finite() => Err(SimulationError::Indicator {
            indicator: indicator.to_string(),
            bar: bar_index,
        }),
        other => Ok(other),
    }
}

/// `close - multiplier * atr`.
pub(crate) fn atr_stop(close: f64, atr: f64, multiplier: f64) -> f64 {
    close - multiplier * atr
}

#[cfg(test)]
pub(crate) fn run_signals(strategy: &mut impl SignalGenerator, bars: &[PriceBar]) -> Vec<Signal> {
    // Drives the strategy like the loop does, tracking a notional position.
    let mut position: Option<Position> = None;
    let mut out = Vec::with_capacity(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        let signal = strategy.on_bar(i, bar, position.as_ref()).unwrap();
        match signal {
            Signal::EnterLong { stop } => {
                position = Some(Position {
                    quantity: 1,
                    entry_price: bar.close,
                    stop_price: stop,
                    entry_timestamp: bar.timestamp,
                    entry_bar: i,
                    entry_commission: 0.0,
                });
            }
            Signal::ExitLong => position = None,
            Signal::Hold => {}
        }
        out.push(signal);
    }
    out
}
