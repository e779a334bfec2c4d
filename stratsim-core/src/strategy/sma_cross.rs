//! Moving average crossover — golden cross entry, death cross exit.
//!
//! Long when the fast SMA crosses strictly above the slow SMA
//! (`fast > slow` now, `fast <= slow` on the previous bar). Exit on the
//! mirror-image cross below. The stop starts at `close - k*ATR` and trails
//! upward while the position is open.

use super::{atr_stop, checked, Signal, SignalGenerator};
use crate::domain::{PriceBar, Position};
use crate::error::SimulationError;
use crate::indicators::{Atr, Indicator, Sma};
use crate::params::SmaCrossParams;

#[derive(Debug, Clone)]
pub struct SmaCross {
    pub params: SmaCrossParams,
    stop_multiplier: f64,
    fast: Sma,
    slow: Sma,
    atr: Atr,
    /// (fast, slow) from the previous bar, once both are warmed up.
    prev: Option<(f64, f64)>,
}

impl SmaCross {
    pub fn new(params: SmaCrossParams, stop_multiplier: f64) -> Self {
        assert!(
            params.slow > params.fast,
            "slow period must be > fast period"
        );
        Self {
            params,
            stop_multiplier,
            fast: Sma::new(params.fast),
            slow: Sma::new(params.slow),
            atr: Atr::new(params.atr_period),
            prev: None,
        }
    }
}

impl SignalGenerator for SmaCross {
    fn name(&self) -> &str {
        "sma_cross"
    }

    fn warmup_bars(&self) -> usize {
        self.params.slow.max(self.params.atr_period)
    }

    fn on_bar(
        &mut self,
        bar_index: usize,
        bar: &PriceBar,
        position: Option<&Position>,
    ) -> Result<Signal, SimulationError> {
        let fast = checked(self.fast.update(bar), self.fast.name(), bar_index)?;
        let slow = checked(self.slow.update(bar), self.slow.name(), bar_index)?;
        let atr = checked(self.atr.update(bar), self.atr.name(), bar_index)?;

        let (Some(fast_cur), Some(slow_cur)) = (fast, slow) else {
            return Ok(Signal::Hold);
        };
        let Some((fast_prev, slow_prev)) = self.prev.replace((fast_cur, slow_cur)) else {
            return Ok(Signal::Hold);
        };

        match position {
            None => {
                if fast_cur > slow_cur && fast_prev <= slow_prev {
                    if let Some(atr) = atr {
                        return Ok(Signal::EnterLong {
                            stop: atr_stop(bar.close, atr, self.stop_multiplier),
                        });
                    }
                }
            }
            Some(_) => {
                if fast_cur < slow_cur && fast_prev >= slow_prev {
                    return Ok(Signal::ExitLong);
                }
            }
        }
        Ok(Signal::Hold)
    }

    fn trailing_stop(&self, bar: &PriceBar) -> Option<f64> {
        self.atr
            .value()
            .map(|atr| atr_stop(bar.close, atr, self.stop_multiplier))
    }
}
