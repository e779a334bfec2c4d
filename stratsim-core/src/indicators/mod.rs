//! Streaming indicators.
//!
//! Every indicator is advanced one bar at a time and only ever sees bars it
//! has already been fed, so a value at bar t can never depend on bar t+1.
//! `update` returns `None` until the warmup window is full.

pub mod atr;
pub mod donchian;
pub mod roc;
pub mod sma;

pub use atr::{true_range, Atr};
pub use donchian::{Donchian, DonchianBand};
pub use roc::Roc;
pub use sma::Sma;

use crate::domain::PriceBar;

/// A single-series indicator fed bar by bar.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_20", "atr_14").
    fn name(&self) -> &str;

    /// Number of bars consumed before the first value appears.
    fn lookback(&self) -> usize;

    /// Feed the next bar and return the updated value.
    fn update(&mut self, bar: &PriceBar) -> Option<f64>;

    /// Latest value, if the warmup is complete.
    fn value(&self) -> Option<f64>;

    /// Feed a whole slice, producing one output per bar (`NaN` during warmup).
    fn compute(&mut self, bars: &[PriceBar]) -> Vec<f64> {
        bars.iter()
            .map(|b| self.update(b).unwrap_or(f64::NAN))
            .collect()
    }
}

/// Create synthetic bars from close prices for testing.
///
/// open = prev_close (or close for the first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<PriceBar> {
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            PriceBar {
                timestamp: base + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Bars from explicit (open, high, low, close) tuples.
#[cfg(test)]
pub fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<PriceBar> {
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| PriceBar {
            timestamp: base + chrono::Duration::days(i as i64),
            open,
            high,
            low,
            close,
            volume: 1000.0,
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
