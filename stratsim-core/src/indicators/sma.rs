//! Simple Moving Average (SMA) of close prices.
//!
//! Lookback: period - 1 (first value on the period-th bar).

use std::collections::VecDeque;

use super::Indicator;
use crate::domain::PriceBar;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
    window: VecDeque<f64>,
    sum: f64,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            name: format!("sma_{period}"),
            window: VecDeque::with_capacity(period + 1),
            sum: 0.0,
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn update(&mut self, bar: &PriceBar) -> Option<f64> {
        self.window.push_back(bar.close);
        self.sum += bar.close;
        if self.window.len() > self.period {
            if let Some(leaving) = self.window.pop_front() {
                self.sum -= leaving;
            }
        }
        self.value()
    }

    fn value(&self) -> Option<f64> {
        if self.window.len() < self.period {
            return None;
        }
        Some(self.sum / self.period as f64)
    }
}
