//! Engine constants, bundled so a run can be reproduced from its inputs.

use serde::{Deserialize, Serialize};

use crate::data::MIN_ROWS;
use crate::error::ValidationError;
use crate::metrics::PERIODS_PER_YEAR;
use crate::sizing::RISK_FRACTION;

/// Stop distance in ATRs for every strategy's initial stop.
pub const STOP_MULTIPLIER: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub min_rows: usize,
    pub risk_fraction: f64,
    pub stop_multiplier: f64,
    pub periods_per_year: f64,
    /// Annual risk-free rate used for the Sharpe excess return.
    pub risk_free_rate: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_rows: MIN_ROWS,
            risk_fraction: RISK_FRACTION,
            stop_multiplier: STOP_MULTIPLIER,
            periods_per_year: PERIODS_PER_YEAR,
            risk_free_rate: 0.0,
        }
    }
}

/// Caller-chosen execution settings for one run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionControls {
    pub initial_cash: f64,
    /// Commission as a fraction of traded notional, charged on every fill.
    pub commission: f64,
}

impl Default for ExecutionControls {
    fn default() -> Self {
        Self {
            initial_cash: 100_000.0,
            commission: 0.001,
        }
    }
}

impl ExecutionControls {
    pub fn new(initial_cash: f64, commission: f64) -> Self {
        Self {
            initial_cash,
            commission,
        }
    }

    /// Cash must be finite; commission must be finite and in `[0, 1)`.
    ///
    /// Zero or negative cash is allowed: such a run never sizes a position.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.initial_cash.is_finite() {
            return Err(ValidationError::InvalidControl {
                name: "initial_cash",
                value: self.initial_cash,
            });
        }
        if !self.commission.is_finite() || !(0.0..1.0).contains(&self.commission) {
            return Err(ValidationError::InvalidControl {
                name: "commission",
                value: self.commission,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn controls_validation() {
        assert!(ExecutionControls::default().validate().is_ok());
        assert!(ExecutionControls::new(0.0, 0.0).validate().is_ok());
        assert!(ExecutionControls::new(-500.0, 0.0).validate().is_ok());
        assert_eq!(
            ExecutionControls::new(f64::INFINITY, 0.0).validate(),
            Err(ValidationError::InvalidControl {
                name: "initial_cash",
                value: f64::INFINITY,
            })
        );
        assert!(ExecutionControls::new(1_000.0, 1.0).validate().is_err());
        assert!(ExecutionControls::new(1_000.0, -0.01).validate().is_err());
        assert!(ExecutionControls::new(1_000.0, f64::NAN).validate().is_err());
    }

    #[test]
    fn defaults() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.min_rows, 5);
        assert_eq!(cfg.risk_fraction, 0.01);
        assert_eq!(cfg.stop_multiplier, 2.0);
        assert_eq!(cfg.periods_per_year, 252.0);
        assert_eq!(cfg.risk_free_rate, 0.0);
    }
}
