//! Donchian channel breakout.
//!
//! Entry: close above the highest high of the prior `entry_period` bars.
//! Exit: close below the lowest low of the prior `exit_period` bars.
//! The channel is read before the current bar is fed, so a bar never
//! breaks out of a channel that contains itself.

use super::{atr_stop, checked, Signal, SignalGenerator};
use crate::domain::{PriceBar, Position};
use crate::error::SimulationError;
use crate::indicators::{Atr, Donchian, Indicator};
use crate::params::DonchianParams;

#[derive(Debug, Clone)]
pub struct DonchianBreakout {
    pub params: DonchianParams,
    stop_multiplier: f64,
    upper: Donchian,
    lower: Donchian,
    atr: Atr,
}

impl DonchianBreakout {
    pub fn new(params: DonchianParams, stop_multiplier: f64) -> Self {
        Self {
            params,
            stop_multiplier,
            upper: Donchian::upper(params.entry_period),
            lower: Donchian::lower(params.exit_period),
            atr: Atr::new(params.atr_period),
        }
    }
}

impl SignalGenerator for DonchianBreakout {
    fn name(&self) -> &str {
        "donchian_breakout"
    }

    fn warmup_bars(&self) -> usize {
        self.params.entry_period.max(self.params.atr_period)
    }

    fn on_bar(
        &mut self,
        bar_index: usize,
        bar: &PriceBar,
        position: Option<&Position>,
    ) -> Result<Signal, SimulationError> {
        let prior_upper = checked(self.upper.value(), self.upper.name(), bar_index)?;
        let prior_lower = checked(self.lower.value(), self.lower.name(), bar_index)?;
        self.upper.update(bar);
        self.lower.update(bar);
        let atr = checked(self.atr.update(bar), self.atr.name(), bar_index)?;

        let signal = match position {
            None => match (prior_upper, atr) {
                (Some(upper), Some(atr)) if bar.close > upper => Signal::EnterLong {
                    stop: atr_stop(bar.close, atr, self.stop_multiplier),
                },
                _ => Signal::Hold,
            },
            Some(_) => match prior_lower {
                Some(lower) if bar.close < lower => Signal::ExitLong,
                _ => Signal::Hold,
            },
        };
        Ok(signal)
    }
}
