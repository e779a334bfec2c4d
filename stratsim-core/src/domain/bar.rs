//! PriceBar and PriceSeries — the validated market data the engine reads.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// OHLCV bar for a single instrument at a single timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    /// True if every OHLCV field is a finite number.
    pub fn is_finite(&self) -> bool {
        self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.volume.is_finite()
    }

    /// Shape check used by validation: finite, `high >= low >= 0`.
    pub fn is_sane(&self) -> bool {
        self.is_finite() && self.high >= self.low && self.low >= 0.0
    }

    /// High minus low.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }
}

/// Ordered, validated sequence of bars.
///
/// Only constructed by [`crate::data::validate_frame`] or
/// [`crate::data::validate_bars`], so every instance holds at least one bar,
/// finite sane bars, and strictly increasing timestamps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub(crate) fn from_validated(bars: Vec<PriceBar>) -> Self {
        debug_assert!(!bars.is_empty());
        Self { bars }
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> &PriceBar {
        &self.bars[0]
    }

    pub fn last(&self) -> &PriceBar {
        &self.bars[self.bars.len() - 1]
    }
}
