//! Backtest orchestration: validate → adjust → simulate → measure.
//!
//! Validation and parameter errors are returned to the caller. A fault during
//! simulation or metrics is caught here, logged, and replaced by the
//! degraded result; it never escapes [`run_backtest`].

use serde::{Deserialize, Serialize};

use crate::config::{EngineConfig, ExecutionControls};
use crate::data::{validate_frame_with_min_rows, PriceFrame};
use crate::domain::{EquityPoint, Position, PriceSeries, Trade};
use crate::engine::{simulate, SimulationOutput};
use crate::error::{SimulationError, ValidationError};
use crate::metrics::BacktestMetrics;
use crate::params::{adjust_parameters, AdjustedParameters, StrategyRequest};
use crate::sizing::PositionSizer;
use crate::strategy::Strategy;

/// Outcome of one backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Cash after the last bar; an open position is not included.
    pub final_cash: f64,
    pub total_return: f64,
    pub sharpe: Option<f64>,
    pub max_drawdown: f64,
    pub trades: Vec<Trade>,
    /// One equity point per bar.
    pub daily_positions: Vec<EquityPoint>,
    pub win_rate: f64,
    pub avg_trade_return: f64,
}

impl BacktestResult {
    /// The canonical result substituted for a failed simulation.
    pub fn degraded(initial_cash: f64) -> Self {
        Self {
            final_cash: initial_cash,
            total_return: 0.0,
            sharpe: None,
            max_drawdown: 0.0,
            trades: Vec::new(),
            daily_positions: Vec::new(),
            win_rate: 0.0,
            avg_trade_return: 0.0,
        }
    }

    fn from_parts(output: SimulationOutput, metrics: BacktestMetrics) -> Self {
        Self {
            final_cash: output.final_cash,
            total_return: metrics.total_return,
            sharpe: metrics.sharpe,
            max_drawdown: metrics.max_drawdown,
            trades: output.trades,
            daily_positions: output.equity_curve,
            win_rate: metrics.win_rate,
            avg_trade_return: metrics.avg_trade_return,
        }
    }
}

/// A result plus the context needed to interpret it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestRun {
    pub result: BacktestResult,
    /// Parameters actually simulated, after clamping to the series length.
    pub parameters: AdjustedParameters,
    /// Cash plus any open position marked at the last close.
    pub final_equity: f64,
    pub open_position: Option<Position>,
    pub bars: usize,
    /// Why the run was degraded, if it was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl BacktestRun {
    pub fn is_degraded(&self) -> bool {
        self.failure.is_some()
    }
}

/// Run one backtest with default engine constants.
pub fn run_backtest(
    frame: &PriceFrame,
    request: &StrategyRequest,
    controls: &ExecutionControls,
) -> Result<BacktestResult, ValidationError> {
    run_backtest_detailed(frame, request, controls, &EngineConfig::default()).map(|run| run.result)
}

/// Run one backtest and keep the adjusted parameters and final equity.
pub fn run_backtest_detailed(
    frame: &PriceFrame,
    request: &StrategyRequest,
    controls: &ExecutionControls,
    engine: &EngineConfig,
) -> Result<BacktestRun, ValidationError> {
    controls.validate()?;
    let series = validate_frame_with_min_rows(frame, engine.min_rows)?;
    let parameters = adjust_parameters(request, series.len())?;

    let _span = tracing::debug_span!(
        "backtest",
        strategy = %parameters.kind(),
        bars = series.len()
    )
    .entered();

    match simulate_and_measure(&series, &parameters, controls, engine) {
        Ok((output, metrics)) => {
            tracing::debug!(
                trades = metrics.trade_count,
                total_return = metrics.total_return,
                "backtest complete"
            );
            let final_equity = output.final_equity;
            let open_position = output.open_position.clone();
            Ok(BacktestRun {
                result: BacktestResult::from_parts(output, metrics),
                parameters,
                final_equity,
                open_position,
                bars: series.len(),
                failure: None,
            })
        }
        Err(err) => {
            tracing::warn!(error = %err, "simulation failed; returning degraded result");
            Ok(BacktestRun {
                result: BacktestResult::degraded(controls.initial_cash),
                parameters,
                final_equity: controls.initial_cash,
                open_position: None,
                bars: series.len(),
                failure: Some(err.to_string()),
            })
        }
    }
}

fn simulate_and_measure(
    series: &PriceSeries,
    parameters: &AdjustedParameters,
    controls: &ExecutionControls,
    engine: &EngineConfig,
) -> Result<(SimulationOutput, BacktestMetrics), SimulationError> {
    let mut strategy = Strategy::from_params(parameters, engine.stop_multiplier);
    let sizer = PositionSizer::new(engine.risk_fraction);
    let output = simulate(series, &mut strategy, &sizer, controls)?;
    let metrics = BacktestMetrics::compute(
        controls.initial_cash,
        output.final_cash,
        &output.equity_curve,
        &output.trades,
        engine.risk_free_rate,
        engine.periods_per_year,
    )?;
    Ok((output, metrics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PriceBar;
    use chrono::NaiveDate;

    fn frame(closes: &[f64]) -> PriceFrame {
        let base = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let bars: Vec<PriceBar> = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PriceBar {
                timestamp: base + chrono::Duration::days(i as i64),
                open: c,
                high: c + 1.0,
                low: c - 1.0,
                close: c,
                volume: 1_000.0,
            })
            .collect();
        PriceFrame::from_bars(&bars)
    }

    fn wave(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + 10.0 * (i as f64 / 7.0).sin())
            .collect()
    }

    #[test]
    fn degraded_shape() {
        let r = BacktestResult::degraded(50_000.0);
        assert_eq!(r.final_cash, 50_000.0);
        assert!(r.trades.is_empty());
        assert!(r.daily_positions.is_empty());
        assert_eq!(r.sharpe, None);
        assert_eq!(r.total_return, 0.0);
        assert_eq!(r.max_drawdown, 0.0);
        assert_eq!(r.win_rate, 0.0);
        assert_eq!(r.avg_trade_return, 0.0);
    }

    #[test]
    fn validation_errors_propagate() {
        let controls = ExecutionControls::default();
        let req = StrategyRequest::new("sma_cross");

        let empty = PriceFrame::default();
        assert_eq!(
            run_backtest(&empty, &req, &controls).unwrap_err(),
            ValidationError::EmptySeries
        );

        let short = frame(&[1.0, 2.0, 3.0, 4.0]);
        assert!(matches!(
            run_backtest(&short, &req, &controls).unwrap_err(),
            ValidationError::InsufficientRows { rows: 4, min: 5 }
        ));

        let unknown = StrategyRequest::new("pairs");
        assert_eq!(
            run_backtest(&frame(&wave(50)), &unknown, &controls).unwrap_err(),
            ValidationError::UnknownStrategy("pairs".into())
        );
    }

    #[test]
    fn invalid_controls_rejected_before_data() {
        let controls = ExecutionControls::new(f64::NAN, 0.001);
        let err = run_backtest(&PriceFrame::default(), &StrategyRequest::new("sma_cross"), &controls)
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidControl { name: "initial_cash", .. }));
    }

    #[test]
    fn zero_cash_degrades() {
        let controls = ExecutionControls::new(0.0, 0.001);
        let run = run_backtest_detailed(
            &frame(&wave(60)),
            &StrategyRequest::new("sma_cross"),
            &controls,
            &EngineConfig::default(),
        )
        .unwrap();
        assert!(run.is_degraded());
        assert_eq!(run.result, BacktestResult::degraded(0.0));
    }

    #[test]
    fn every_strategy_runs() {
        let data = frame(&wave(200));
        for kind in crate::params::StrategyKind::ALL {
            let run = run_backtest_detailed(
                &data,
                &StrategyRequest::new(kind.as_str()),
                &ExecutionControls::default(),
                &EngineConfig::default(),
            )
            .unwrap();
            assert!(!run.is_degraded(), "{kind} degraded: {:?}", run.failure);
            assert_eq!(run.parameters.kind(), kind);
            assert_eq!(run.result.daily_positions.len(), 200);
            assert!(run.result.max_drawdown <= 0.0);
            assert!((0.0..=1.0).contains(&run.result.win_rate));
        }
    }

    #[test]
    fn adjusted_parameters_are_reported() {
        let run = run_backtest_detailed(
            &frame(&wave(30)),
            &StrategyRequest::new("sma_cross"),
            &ExecutionControls::default(),
            &EngineConfig::default(),
        )
        .unwrap();
        assert_eq!(run.parameters.to_map()["slow"], 10.0);
        assert_eq!(run.parameters.to_map()["fast"], 9.0);
    }
}
