//! Performance metrics — pure functions over the trade list and equity curve.
//!
//! Metrics that cannot be computed from the data (zero variance, empty curve,
//! non-finite inputs) resolve to `None`/0 locally. Only a non-finite total
//! return is treated as a fault of the run itself.

use serde::{Deserialize, Serialize};

use crate::domain::{equity_values, EquityPoint, Trade};
use crate::error::SimulationError;

/// Bars per year used to annualize the Sharpe ratio.
pub const PERIODS_PER_YEAR: f64 = 252.0;

/// Standard deviations below this are treated as zero variance.
const MIN_STD: f64 = 1e-15;

/// Aggregate metrics for a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestMetrics {
    pub total_return: f64,
    pub sharpe: Option<f64>,
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub avg_trade_return: f64,
    pub trade_count: usize,
}

impl BacktestMetrics {
    /// Compute all metrics. Fails only when the total return is not finite.
    pub fn compute(
        initial_cash: f64,
        final_cash: f64,
        equity_curve: &[EquityPoint],
        trades: &[Trade],
        risk_free_rate: f64,
        periods_per_year: f64,
    ) -> Result<Self, SimulationError> {
        let total_return = total_return(initial_cash, final_cash);
        if !total_return.is_finite() {
            return Err(SimulationError::Metrics(format!(
                "total return is {total_return} (initial cash {initial_cash}, final cash {final_cash})"
            )));
        }

        let equity = equity_values(equity_curve);
        Ok(Self {
            total_return,
            sharpe: sharpe_ratio(&equity, risk_free_rate, periods_per_year),
            max_drawdown: max_drawdown(&equity).unwrap_or(0.0),
            win_rate: win_rate(trades),
            avg_trade_return: avg_trade_return(trades),
            trade_count: trades.len(),
        })
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return as a fraction: (final - initial) / initial.
///
/// Zero initial cash yields a non-finite value; callers decide what that means.
pub fn total_return(initial_cash: f64, final_cash: f64) -> f64 {
    (final_cash - initial_cash) / initial_cash
}

/// Per-bar simple returns of an equity curve. Non-finite returns are dropped.
pub fn bar_returns(equity_curve: &[f64]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .map(|w| (w[1] - w[0]) / w[0])
        .filter(|r| r.is_finite())
        .collect()
}

/// Annualized Sharpe ratio of an equity curve.
pub fn sharpe_ratio(equity_curve: &[f64], risk_free_rate: f64, periods_per_year: f64) -> Option<f64> {
    sharpe_from_returns(&bar_returns(equity_curve), risk_free_rate, periods_per_year)
}

/// Annualized Sharpe ratio from per-bar returns.
///
/// Sharpe = mean(r - rf/periods) / std(r - rf/periods) * sqrt(periods).
/// `None` with fewer than 2 returns, zero variance, or a non-finite result.
pub fn sharpe_from_returns(returns: &[f64], risk_free_rate: f64, periods_per_year: f64) -> Option<f64> {
    if returns.len() < 2 {
        return None;
    }
    let per_period_rf = risk_free_rate / periods_per_year;
    let excess: Vec<f64> = returns.iter().map(|r| r - per_period_rf).collect();
    let std = std_dev(&excess);
    if std.is_nan() || std < MIN_STD {
        return None;
    }
    let sharpe = mean_f64(&excess) / std * periods_per_year.sqrt();
    sharpe.is_finite().then_some(sharpe)
}

/// Maximum drawdown as a non-positive fraction (e.g., -0.15 = 15% drawdown).
///
/// `None` for an empty curve. NaN points are skipped, and points are not
/// measured against a non-positive peak.
pub fn max_drawdown(equity_curve: &[f64]) -> Option<f64> {
    if equity_curve.is_empty() {
        return None;
    }
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;

    for &eq in equity_curve.iter().filter(|v| !v.is_nan()) {
        if eq > peak {
            peak = eq;
        }
        if peak > 0.0 && peak.is_finite() {
            let dd = (eq - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    Some(max_dd)
}

/// Fraction of trades with a positive gross pnl.
pub fn win_rate(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / trades.len().max(1) as f64
}

/// Mean gross pnl per trade; 0 with no trades.
pub fn avg_trade_return(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().map(|t| t.pnl).sum::<f64>() / trades.len() as f64
}

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1).
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ExitReason;
    use chrono::NaiveDate;

    fn trade(pnl: f64) -> Trade {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Trade {
            entry_timestamp: ts,
            exit_timestamp: ts + chrono::Duration::days(3),
            entry_price: 100.0,
            exit_price: 100.0 + pnl / 10.0,
            quantity: 10,
            pnl,
            commission: 0.0,
            net_pnl: pnl,
            bars_held: 3,
            exit_reason: ExitReason::Signal,
        }
    }

    // ── Total return ──

    #[test]
    fn total_return_identity() {
        assert!((total_return(100_000.0, 110_000.0) - 0.1).abs() < 1e-12);
        assert!((total_return(100_000.0, 90_000.0) + 0.1).abs() < 1e-12);
        assert_eq!(total_return(100_000.0, 100_000.0), 0.0);
    }

    #[test]
    fn total_return_zero_cash_is_not_finite() {
        assert!(!total_return(0.0, 0.0).is_finite());
        assert!(!total_return(0.0, 10.0).is_finite());
    }

    // ── Sharpe ──

    #[test]
    fn sharpe_constant_returns_is_none() {
        assert_eq!(sharpe_from_returns(&[0.01, 0.01, 0.01], 0.0, PERIODS_PER_YEAR), None);
    }

    #[test]
    fn sharpe_constant_equity_is_none() {
        assert_eq!(sharpe_ratio(&[100.0; 50], 0.0, PERIODS_PER_YEAR), None);
    }

    #[test]
    fn sharpe_too_few_returns() {
        assert_eq!(sharpe_ratio(&[100.0, 101.0], 0.0, PERIODS_PER_YEAR), None);
        assert_eq!(sharpe_from_returns(&[], 0.0, PERIODS_PER_YEAR), None);
    }

    #[test]
    fn sharpe_known_value() {
        // mean = 0.02, sample std = 0.01
        let s = sharpe_from_returns(&[0.01, 0.02, 0.03], 0.0, PERIODS_PER_YEAR).unwrap();
        assert!((s - 2.0 * 252.0_f64.sqrt()).abs() < 1e-9, "got {s}");
    }

    #[test]
    fn sharpe_risk_free_rate_reduces_ratio() {
        let returns = [0.01, 0.02, 0.03, 0.015];
        let base = sharpe_from_returns(&returns, 0.0, PERIODS_PER_YEAR).unwrap();
        let with_rf = sharpe_from_returns(&returns, 0.05, PERIODS_PER_YEAR).unwrap();
        assert!(with_rf < base);
    }

    #[test]
    fn sharpe_skips_non_finite_returns() {
        // 0 -> 100 is an infinite return and is dropped.
        let r = bar_returns(&[0.0, 100.0, 110.0, 99.0]);
        assert_eq!(r.len(), 2);
        assert!((r[0] - 0.1).abs() < 1e-12);
    }

    // ── Max drawdown ──

    #[test]
    fn max_drawdown_reference_curve() {
        let dd = max_drawdown(&[100.0, 120.0, 80.0, 90.0, 150.0, 130.0]).unwrap();
        assert!((dd - (-1.0 / 3.0)).abs() < 1e-4, "got {dd}");
    }

    #[test]
    fn max_drawdown_monotonic_is_zero() {
        assert_eq!(max_drawdown(&[100.0, 110.0, 120.0, 130.0]), Some(0.0));
        assert_eq!(max_drawdown(&[100.0, 100.0, 100.0]), Some(0.0));
    }

    #[test]
    fn max_drawdown_empty_is_none() {
        assert_eq!(max_drawdown(&[]), None);
    }

    #[test]
    fn max_drawdown_skips_nan() {
        let dd = max_drawdown(&[100.0, f64::NAN, 50.0]).unwrap();
        assert!((dd + 0.5).abs() < 1e-12);
    }

    #[test]
    fn max_drawdown_ignores_non_positive_peaks() {
        assert_eq!(max_drawdown(&[0.0, -5.0, -10.0]), Some(0.0));
        let dd = max_drawdown(&[-5.0, 100.0, 75.0]).unwrap();
        assert!((dd + 0.25).abs() < 1e-12);
    }

    // ── Trades ──

    #[test]
    fn win_rate_and_average() {
        let trades = vec![trade(100.0), trade(-50.0), trade(0.0), trade(30.0)];
        assert!((win_rate(&trades) - 0.5).abs() < 1e-12);
        assert!((avg_trade_return(&trades) - 20.0).abs() < 1e-12);
    }

    #[test]
    fn no_trades_is_zero() {
        assert_eq!(win_rate(&[]), 0.0);
        assert_eq!(avg_trade_return(&[]), 0.0);
    }

    #[test]
    fn compute_rejects_non_finite_total_return() {
        let err = BacktestMetrics::compute(0.0, 0.0, &[], &[], 0.0, PERIODS_PER_YEAR).unwrap_err();
        assert!(matches!(err, SimulationError::Metrics(_)));
    }

    #[test]
    fn compute_without_curve() {
        let m = BacktestMetrics::compute(1_000.0, 1_100.0, &[], &[trade(100.0)], 0.0, PERIODS_PER_YEAR)
            .unwrap();
        assert!((m.total_return - 0.1).abs() < 1e-12);
        assert_eq!(m.sharpe, None);
        assert_eq!(m.max_drawdown, 0.0);
        assert_eq!(m.win_rate, 1.0);
        assert_eq!(m.trade_count, 1);
    }
}
