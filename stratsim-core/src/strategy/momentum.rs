//! Time-series momentum ranked against its own recent history.
//!
//! The trailing `lookback`-bar return is ranked against the previous
//! `lookback` trailing returns. Rank = percentage of those prior returns that
//! are strictly lower. Entry when rank > threshold; exit when rank falls below
//! the threshold or the position has been held `max_holding_period` bars.

use std::collections::VecDeque;

use super::{atr_stop, checked, Signal, SignalGenerator};
use crate::domain::{PriceBar, Position};
use crate::error::SimulationError;
use crate::indicators::{Atr, Indicator, Roc};
use crate::params::MomentumParams;

/// Fewest prior returns that make a percentile rank meaningful.
pub const MIN_RANK_SAMPLES: usize = 5;

#[derive(Debug, Clone)]
pub struct Momentum {
    pub params: MomentumParams,
    stop_multiplier: f64,
    roc: Roc,
    atr: Atr,
    history: VecDeque<f64>,
}

impl Momentum {
    pub fn new(params: MomentumParams, stop_multiplier: f64) -> Self {
        Self {
            params,
            stop_multiplier,
            roc: Roc::new(params.lookback),
            atr: Atr::new(params.atr_period),
            history: VecDeque::with_capacity(params.lookback + 1),
        }
    }

    fn percentile_rank(&self, value: f64) -> Option<f64> {
        if self.history.len() < MIN_RANK_SAMPLES {
            return None;
        }
        let below = self.history.iter().filter(|&&r| r < value).count();
        Some(100.0 * below as f64 / self.history.len() as f64)
    }
}

impl SignalGenerator for Momentum {
    fn name(&self) -> &str {
        "momentum"
    }

    fn warmup_bars(&self) -> usize {
        (self.params.lookback + MIN_RANK_SAMPLES).max(self.params.atr_period)
    }

    fn on_bar(
        &mut self,
        bar_index: usize,
        bar: &PriceBar,
        position: Option<&Position>,
    ) -> Result<Signal, SimulationError> {
        let atr = checked(self.atr.update(bar), self.atr.name(), bar_index)?;
        let ret = checked(self.roc.update(bar), self.roc.name(), bar_index)?;

        let rank = ret.and_then(|r| self.percentile_rank(r));
        if let Some(r) = ret {
            self.history.push_back(r);
            if self.history.len() > self.params.lookback {
                self.history.pop_front();
            }
        }

        let threshold = self.params.percentile_threshold;
        let signal = match position {
            Some(pos) => {
                if pos.bars_held(bar_index) >= self.params.max_holding_period {
                    Signal::ExitLong
                } else if rank.is_some_and(|r| r < threshold) {
                    Signal::ExitLong
                } else {
                    Signal::Hold
                }
            }
            None => match (rank, atr) {
                (Some(r), Some(atr)) if r > threshold => Signal::EnterLong {
                    stop: atr_stop(bar.close, atr, self.stop_multiplier),
                },
                _ => Signal::Hold,
            },
        };
        Ok(signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;
    use crate::strategy::run_signals;

    fn strategy(max_holding_period: usize) -> Momentum {
        Momentum::new(
            MomentumParams {
                lookback: 5,
                atr_period: 2,
                percentile_threshold: 70.0,
                max_holding_period,
            },
            2.0,
        )
    }

    #[test]
    fn enters_on_top_rank_and_exits_when_rank_fades() {
        // Gentle drift, then a jump at bar 10.
        let mut closes: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
        closes.extend([130.0, 131.0, 132.0]);
        let signals = run_signals(&mut strategy(20), &make_bars(&closes));

        for (i, s) in signals.iter().enumerate().take(10) {
            assert_eq!(*s, Signal::Hold, "unexpected signal at bar {i}");
        }
        assert!(matches!(signals[10], Signal::EnterLong { .. }));
        // bar 11 ranks 80 (4 of 5 lower), bar 12 ranks 60.
        assert_eq!(signals[11], Signal::Hold);
        assert_eq!(signals[12], Signal::ExitLong);
    }

    #[test]
    fn max_holding_period_forces_exit() {
        // Accelerating closes keep each return above the previous five.
        let closes: Vec<f64> = (0..14).map(|i| 100.0 + (i * i) as f64).collect();
        let signals = run_signals(&mut strategy(2), &make_bars(&closes));

        assert!(matches!(signals[10], Signal::EnterLong { .. }));
        assert_eq!(signals[11], Signal::Hold);
        assert_eq!(signals[12], Signal::ExitLong);
        assert!(matches!(signals[13], Signal::EnterLong { .. }));
    }

    #[test]
    fn rank_needs_five_samples() {
        let mut s = strategy(20);
        assert_eq!(s.percentile_rank(1.0), None);
        s.history.extend([0.1, 0.2, 0.3, 0.4]);
        assert_eq!(s.percentile_rank(1.0), None);
        s.history.push_back(0.5);
        assert_eq!(s.percentile_rank(0.35), Some(60.0));
        assert_eq!(s.percentile_rank(0.1), Some(0.0));
    }
}
