//! Bar-by-bar simulation loop.

use serde::Serialize;

use super::context::SimulationContext;
use crate::config::ExecutionControls;
use crate::domain::{EquityPoint, ExitReason, Position, PriceSeries, Trade};
use crate::error::SimulationError;
use crate::sizing::PositionSizer;
use crate::strategy::{Signal, SignalGenerator};

/// Everything the loop produced, before metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationOutput {
    /// Cash after the last bar. An open position is not liquidated.
    pub final_cash: f64,
    /// Cash plus the open position marked at the last close.
    pub final_equity: f64,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    pub open_position: Option<Position>,
}

/// Replay `series` through `strategy`, one bar at a time.
///
/// Per bar: stop check, strategy signal, entry or exit, trailing-stop
/// ratchet, equity point. Any arithmetic, indicator or broker fault aborts
/// the run with a [`SimulationError`].
pub fn simulate<S>(
    series: &PriceSeries,
    strategy: &mut S,
    sizer: &PositionSizer,
    controls: &ExecutionControls,
) -> Result<SimulationOutput, SimulationError>
where
    S: SignalGenerator + ?Sized,
{
    let bars = series.bars();
    let mut ctx = SimulationContext::new(controls.initial_cash, controls.commission, bars.len());

    for (t, bar) in bars.iter().enumerate() {
        // ─── Phase 1: Stop check ───
        // A gap through the stop fills at the open, otherwise at the stop.
        let stop = ctx
            .position
            .as_ref()
            .filter(|p| p.is_long())
            .map(|p| p.stop_price);
        if let Some(stop) = stop {
            if bar.low <= stop {
                let fill = if bar.open < stop { bar.open } else { stop };
                ctx.close_position(t, bar, fill, ExitReason::StopLoss)?;
            }
        }

        // ─── Phase 2: Strategy ───
        let signal = strategy.on_bar(t, bar, ctx.position.as_ref())?;

        // ─── Phase 3/4: Entry or exit at the close ───
        match signal {
            Signal::Hold => {}
            Signal::EnterLong { stop } => {
                let equity = ctx.equity(bar.close);
                let quantity = sizer
                    .size(equity, ctx.cash, bar.close, stop)
                    .min(ctx.affordable_quantity(bar.close));
                if quantity > 0 {
                    ctx.open_long(t, bar, quantity, stop)?;
                } else {
                    tracing::trace!(bar = t, stop, "entry signal sized to zero");
                }
            }
            Signal::ExitLong => {
                ctx.close_position(t, bar, bar.close, ExitReason::Signal)?;
            }
        }

        // ─── Phase 5: Post-bar ───
        if let Some(candidate) = strategy.trailing_stop(bar) {
            if let Some(position) = ctx.position.as_mut() {
                if position.ratchet_stop(candidate) {
                    tracing::trace!(bar = t, stop = position.stop_price, "trailing stop raised");
                }
            }
        }
        ctx.mark(t, bar)?;
    }

    let final_equity = ctx.equity_curve.last().map_or(ctx.cash, |p| p.equity);
    Ok(SimulationOutput {
        final_cash: ctx.cash,
        final_equity,
        trades: ctx.trades,
        equity_curve: ctx.equity_curve,
        open_position: ctx.position,
    })
}
