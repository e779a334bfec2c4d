//! Donchian Channel — highest high / lowest low over a rolling window.
//!
//! - Upper: max(high[t-period+1..=t])
//! - Lower: min(low[t-period+1..=t])
//!
//! Breakout rules compare against the channel of the *prior* bars: read
//! [`Indicator::value`] before feeding the current bar.

use std::collections::VecDeque;

use super::Indicator;
use crate::domain::PriceBar;

/// Which band of the Donchian channel to track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DonchianBand {
    Upper,
    Lower,
}

#[derive(Debug, Clone)]
pub struct Donchian {
    period: usize,
    band: DonchianBand,
    name: String,
    window: VecDeque<f64>,
}

impl Donchian {
    pub fn upper(period: usize) -> Self {
        Self::new(period, DonchianBand::Upper)
    }

    pub fn lower(period: usize) -> Self {
        Self::new(period, DonchianBand::Lower)
    }

    fn new(period: usize, band: DonchianBand) -> Self {
        assert!(period >= 1, "Donchian period must be >= 1");
        let side = match band {
            DonchianBand::Upper => "upper",
            DonchianBand::Lower => "lower",
        };
        Self {
            period,
            band,
            name: format!("donchian_{side}_{period}"),
            window: VecDeque::with_capacity(period + 1),
        }
    }
}

impl Indicator for Donchian {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn update(&mut self, bar: &PriceBar) -> Option<f64> {
        let v = match self.band {
            DonchianBand::Upper => bar.high,
            DonchianBand::Lower => bar.low,
        };
        self.window.push_back(v);
        if self.window.len() > self.period {
            self.window.pop_front();
        }
        self.value()
    }

    fn value(&self) -> Option<f64> {
        if self.window.len() < self.period {
            return None;
        }
        let values = self.window.iter().copied();
        Some(match self.band {
            DonchianBand::Upper => values.fold(f64::NEG_INFINITY, f64::max),
            DonchianBand::Lower => values.fold(f64::INFINITY, f64::min),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_ohlc_bars, DEFAULT_EPSILON};

    fn bars() -> Vec<PriceBar> {
        make_ohlc_bars(&[
            (10.0, 12.0, 9.0, 11.0),
            (11.0, 15.0, 10.0, 14.0),
            (14.0, 14.0, 13.0, 13.5),
            (13.5, 16.0, 12.0, 15.0),
            (15.0, 15.5, 14.0, 14.5),
        ])
    }

    #[test]
    fn donchian_upper_3() {
        let result = Donchian::upper(3).compute(&bars());
        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert_approx(result[2], 15.0, DEFAULT_EPSILON);
        assert_approx(result[3], 16.0, DEFAULT_EPSILON);
        assert_approx(result[4], 16.0, DEFAULT_EPSILON);
    }

    #[test]
    fn donchian_lower_3() {
        let result = Donchian::lower(3).compute(&bars());
        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert_approx(result[2], 9.0, DEFAULT_EPSILON);
        assert_approx(result[3], 10.0, DEFAULT_EPSILON);
        assert_approx(result[4], 12.0, DEFAULT_EPSILON);
    }

    #[test]
    fn donchian_names_and_lookback() {
        assert_eq!(Donchian::upper(20).name(), "donchian_upper_20");
        assert_eq!(Donchian::upper(20).lookback(), 19);
        assert_eq!(Donchian::lower(1).lookback(), 0);
    }
}
