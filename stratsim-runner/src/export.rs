//! Artifact export: JSON report plus CSV trade tape and equity curve.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use stratsim_core::domain::{EquityPoint, ExitReason, Trade};

use crate::runner::{short_id, RunReport};
use crate::sweep::SweepResults;

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `RunReport` to pretty JSON.
pub fn export_json(report: &RunReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize RunReport to JSON")
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Columns: entry_timestamp, exit_timestamp, entry_price, exit_price,
/// quantity, pnl, commission, net_pnl, bars_held, exit_reason
pub fn export_trades_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "entry_timestamp",
        "exit_timestamp",
        "entry_price",
        "exit_price",
        "quantity",
        "pnl",
        "commission",
        "net_pnl",
        "bars_held",
        "exit_reason",
    ])?;

    for t in trades {
        let reason = match t.exit_reason {
            ExitReason::Signal => "signal",
            ExitReason::StopLoss => "stop_loss",
        }
        .to_string();
        wtr.write_record([
            &t.entry_timestamp.to_string(),
            &t.exit_timestamp.to_string(),
            &format!("{:.6}", t.entry_price),
            &format!("{:.6}", t.exit_price),
            &t.quantity.to_string(),
            &format!("{:.2}", t.pnl),
            &format!("{:.2}", t.commission),
            &format!("{:.2}", t.net_pnl),
            &t.bars_held.to_string(),
            &reason,
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// One row per bar: timestamp, cash, market_value, equity.
pub fn export_equity_csv(points: &[EquityPoint]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["timestamp", "cash", "market_value", "equity"])?;
    for p in points {
        wtr.write_record([
            &p.timestamp.to_string(),
            &format!("{:.2}", p.cash),
            &format!("{:.2}", p.market_value),
            &format!("{:.2}", p.equity),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// One row per grid point, in the sweep's ranking order.
pub fn export_sweep_csv(results: &SweepResults) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "rank",
        "run_id",
        "params",
        "total_return",
        "sharpe",
        "max_drawdown",
        "win_rate",
        "trades",
        "degraded",
    ])?;
    for (rank, report) in results.all().iter().enumerate() {
        let result = &report.run.result;
        let params = report
            .config
            .strategy
            .params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(";");
        wtr.write_record([
            &(rank + 1).to_string(),
            &report.run_id,
            &params,
            &format!("{:.6}", result.total_return),
            &result.sharpe.map(|s| format!("{s:.4}")).unwrap_or_default(),
            &format!("{:.6}", result.max_drawdown),
            &format!("{:.4}", result.win_rate),
            &result.trades.len().to_string(),
            &report.run.is_degraded().to_string(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a single run.
///
/// Creates `{strategy}_{run_id prefix}/` under `output_dir` containing
/// `result.json`, `trades.csv` and `equity.csv`. Rerunning the same config
/// overwrites the same directory. Returns the directory path.
pub fn save_artifacts(report: &RunReport, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!(
        "{}_{}",
        report.config.strategy.strategy,
        short_id(&report.run_id)
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    write_file(&run_dir.join("result.json"), &export_json(report)?)?;
    write_file(
        &run_dir.join("trades.csv"),
        &export_trades_csv(&report.run.result.trades)?,
    )?;
    write_file(
        &run_dir.join("equity.csv"),
        &export_equity_csv(&report.run.result.daily_positions)?,
    )?;

    tracing::debug!(dir = %run_dir.display(), "saved artifacts");
    Ok(run_dir)
}

/// Write `sweep.csv` under `output_dir` and return its path.
pub fn save_sweep_summary(results: &SweepResults, output_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output dir: {}", output_dir.display()))?;
    let path = output_dir.join("sweep.csv");
    write_file(&path, &export_sweep_csv(results)?)?;
    Ok(path)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}
