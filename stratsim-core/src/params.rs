//! Strategy selection and data-length-aware parameter adjustment.
//!
//! Callers name a strategy by identifier and pass a loose `name → number`
//! map. [`adjust_parameters`] resolves the identifier and clamps every
//! lookback so no indicator window can exceed the available history.
//! All division is integer floor division.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// The closed set of strategy variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    SmaCross,
    DonchianBreakout,
    Momentum,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 3] = [
        StrategyKind::SmaCross,
        StrategyKind::DonchianBreakout,
        StrategyKind::Momentum,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::SmaCross => "sma_cross",
            StrategyKind::DonchianBreakout => "donchian_breakout",
            StrategyKind::Momentum => "momentum",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StrategyKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownStrategy(s.to_string()))
    }
}

/// A strategy as requested by the caller, before any clamping.
///
/// `BTreeMap` keeps parameter order deterministic for hashing and output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyRequest {
    #[serde(rename = "type")]
    pub strategy: String,
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
}

impl StrategyRequest {
    pub fn new(strategy: impl Into<String>) -> Self {
        Self {
            strategy: strategy.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: f64) -> Self {
        self.params.insert(name.into(), value);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmaCrossParams {
    pub fast: usize,
    pub slow: usize,
    pub atr_period: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonchianParams {
    pub entry_period: usize,
    pub exit_period: usize,
    pub atr_period: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MomentumParams {
    pub lookback: usize,
    pub atr_period: usize,
    /// Percentile rank (0–100) the trailing return must exceed to enter.
    pub percentile_threshold: f64,
    /// Maximum bars a position is held before a forced exit.
    pub max_holding_period: usize,
}

/// Parameters after clamping to the series length. Immutable from here on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AdjustedParameters {
    SmaCross(SmaCrossParams),
    DonchianBreakout(DonchianParams),
    Momentum(MomentumParams),
}

impl AdjustedParameters {
    pub fn kind(&self) -> StrategyKind {
        match self {
            AdjustedParameters::SmaCross(_) => StrategyKind::SmaCross,
            AdjustedParameters::DonchianBreakout(_) => StrategyKind::DonchianBreakout,
            AdjustedParameters::Momentum(_) => StrategyKind::Momentum,
        }
    }

    pub fn atr_period(&self) -> usize {
        match self {
            AdjustedParameters::SmaCross(p) => p.atr_period,
            AdjustedParameters::DonchianBreakout(p) => p.atr_period,
            AdjustedParameters::Momentum(p) => p.atr_period,
        }
    }

    /// Flatten back into the loose `name → number` form callers speak.
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        let pairs: Vec<(&str, f64)> = match self {
            AdjustedParameters::SmaCross(p) => vec![
                ("fast", p.fast as f64),
                ("slow", p.slow as f64),
                ("atr_period", p.atr_period as f64),
            ],
            AdjustedParameters::DonchianBreakout(p) => vec![
                ("entry_period", p.entry_period as f64),
                ("exit_period", p.exit_period as f64),
                ("atr_period", p.atr_period as f64),
            ],
            AdjustedParameters::Momentum(p) => vec![
                ("lookback", p.lookback as f64),
                ("atr_period", p.atr_period as f64),
                ("percentile_threshold", p.percentile_threshold),
                ("max_holding_period", p.max_holding_period as f64),
            ],
        };
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }
}

const SMA_PARAMS: &[&str] = &["fast", "slow", "atr_period"];
const DONCHIAN_PARAMS: &[&str] = &["entry_period", "exit_period", "atr_period"];
const MOMENTUM_PARAMS: &[&str] = &[
    "lookback",
    "atr_period",
    "percentile_threshold",
    "max_holding_period",
];

/// Resolve the strategy identifier and clamp its parameters to `n` bars.
pub fn adjust_parameters(
    request: &StrategyRequest,
    n: usize,
) -> Result<AdjustedParameters, ValidationError> {
    let kind: StrategyKind = request.strategy.parse()?;
    let params = &request.params;

    for (name, value) in params {
        if !value.is_finite() {
            return Err(ValidationError::InvalidParameter {
                name: name.clone(),
                value: *value,
            });
        }
    }

    let known = match kind {
        StrategyKind::SmaCross => SMA_PARAMS,
        StrategyKind::DonchianBreakout => DONCHIAN_PARAMS,
        StrategyKind::Momentum => MOMENTUM_PARAMS,
    };
    for name in params.keys().filter(|k| !known.contains(&k.as_str())) {
        tracing::warn!(strategy = %kind, parameter = %name, "ignoring unrecognized parameter");
    }

    let n = n as i64;
    let atr_period = clamp_atr_period(requested(params, "atr_period", 14), n);

    let adjusted = match kind {
        StrategyKind::SmaCross => {
            let slow = 3_i64.max(requested(params, "slow", 50).min(n / 3));
            let fast = 2_i64.max(requested(params, "fast", 20).min(slow - 1));
            AdjustedParameters::SmaCross(SmaCrossParams {
                fast: fast as usize,
                slow: slow as usize,
                atr_period,
            })
        }
        StrategyKind::DonchianBreakout => {
            let entry = 2_i64.max(requested(params, "entry_period", 20).min(n / 3));
            let exit = 2_i64.max(requested(params, "exit_period", 10).min(n / 4));
            AdjustedParameters::DonchianBreakout(DonchianParams {
                entry_period: entry as usize,
                exit_period: exit as usize,
                atr_period,
            })
        }
        StrategyKind::Momentum => {
            let lookback = 5_i64.max(requested(params, "lookback", 60).min(n / 2));
            let threshold = params
                .get("percentile_threshold")
                .copied()
                .unwrap_or(70.0)
                .clamp(0.0, 100.0);
            let max_hold = requested(params, "max_holding_period", 20).max(1);
            AdjustedParameters::Momentum(MomentumParams {
                lookback: lookback as usize,
                atr_period,
                percentile_threshold: threshold,
                max_holding_period: max_hold as usize,
            })
        }
    };

    let final_map = adjusted.to_map();
    for (name, value) in params {
        if let Some(applied) = final_map.get(name) {
            if applied != value {
                tracing::debug!(
                    strategy = %kind,
                    parameter = %name,
                    requested = value,
                    applied = applied,
                    bars = n,
                    "parameter adjusted to data length"
                );
            }
        }
    }

    Ok(adjusted)
}

/// `min(requested, max(2, n/4))`, never below one bar.
fn clamp_atr_period(requested: i64, n: i64) -> usize {
    requested.min(2_i64.max(n / 4)).max(1) as usize
}

/// Requested integer value (floored), or the default when absent.
fn requested(params: &BTreeMap<String, f64>, name: &str, default: i64) -> i64 {
    params
        .get(name)
        .map(|v| v.floor() as i64)
        .unwrap_or(default)
}
