//! Rate of Change (ROC) — trailing return over N bars, as a fraction.
//!
//! ROC[t] = (close[t] - close[t-period]) / close[t-period]
//! Lookback: period. A zero base close yields no value.

use std::collections::VecDeque;

use super::Indicator;
use crate::domain::PriceBar;

#[derive(Debug, Clone)]
pub struct Roc {
    period: usize,
    name: String,
    closes: VecDeque<f64>,
    current: Option<f64>,
}

impl Roc {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ROC period must be >= 1");
        Self {
            period,
            name: format!("roc_{period}"),
            closes: VecDeque::with_capacity(period + 2),
            current: None,
        }
    }
}

impl Indicator for Roc {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn update(&mut self, bar: &PriceBar) -> Option<f64> {
        self.closes.push_back(bar.close);
        if self.closes.len() > self.period + 1 {
            self.closes.pop_front();
        }
        self.current = match self.closes.front() {
            Some(&base) if self.closes.len() == self.period + 1 && base != 0.0 => {
                Some((bar.close - base) / base)
            }
            _ => None,
        };
        self.current
    }

    fn value(&self) -> Option<f64> {
        self.current
    }
}
