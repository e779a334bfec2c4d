//! Integration tests for the runner pipeline: CSV on disk → config → run →
//! artifacts, plus sweeps over the same file.

use chrono::NaiveDate;
use std::fmt::Write as _;
use std::path::Path;

use stratsim_core::ValidationError;
use stratsim_runner::export::{save_artifacts, save_sweep_summary};
use stratsim_runner::{
    generate_synthetic, run_from_config, ParamGrid, ParamSweep, RunConfig, RunError,
};

/// Write `bars` synthetic rows as CSV, optionally without the volume column.
fn write_csv(path: &Path, bars: usize, with_volume: bool) {
    let start = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
    let frame = generate_synthetic(99, bars, start);
    let col = |name: &str| frame.column(name).unwrap().to_vec();
    let (open, high, low, close, volume) =
        (col("open"), col("high"), col("low"), col("close"), col("volume"));

    let mut out = String::from(if with_volume {
        "Date,Open,High,Low,Close,Volume\n"
    } else {
        "Date,Open,High,Low,Close\n"
    });
    for i in 0..bars {
        write!(
            out,
            "{},{},{},{},{}",
            frame.timestamps[i].date(),
            open[i],
            high[i],
            low[i],
            close[i]
        )
        .unwrap();
        if with_volume {
            write!(out, ",{}", volume[i]).unwrap();
        }
        out.push('\n');
    }
    std::fs::write(path, out).unwrap();
}

fn write_config(dir: &Path, strategy: &str) -> std::path::PathBuf {
    let path = dir.join("run.toml");
    std::fs::write(
        &path,
        format!(
            r#"
[data]
source = "csv"
path = "prices.csv"

[strategy]
type = "{strategy}"
params = {{ fast = 5, slow = 20 }}

[execution]
initial_cash = 50000.0
commission = 0.0005
"#
        ),
    )
    .unwrap();
    path
}

#[test]
fn csv_config_runs_and_saves_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    write_csv(&dir.path().join("prices.csv"), 250, true);
    let config = RunConfig::from_file(&write_config(dir.path(), "sma_cross")).unwrap();

    let report = run_from_config(&config).unwrap();
    assert_eq!(report.run.bars, 250);
    assert!(!report.run.is_degraded());
    assert_eq!(report.run.result.daily_positions.len(), 250);
    assert_eq!(report.run.result.daily_positions[0].equity, 50_000.0);

    let out = dir.path().join("results");
    let run_dir = save_artifacts(&report, &out).unwrap();
    for file in ["result.json", "trades.csv", "equity.csv"] {
        assert!(run_dir.join(file).exists(), "missing {file}");
    }

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(run_dir.join("result.json")).unwrap())
            .unwrap();
    assert_eq!(json["run_id"], report.run_id.as_str());
    assert!(json["run"]["result"]["final_cash"].is_number());

    let equity = std::fs::read_to_string(run_dir.join("equity.csv")).unwrap();
    assert_eq!(equity.lines().count(), 251);
    let trades = std::fs::read_to_string(run_dir.join("trades.csv")).unwrap();
    assert_eq!(trades.lines().count(), report.run.result.trades.len() + 1);
}

#[test]
fn missing_volume_column_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    write_csv(&dir.path().join("prices.csv"), 30, false);
    let config = RunConfig::from_file(&write_config(dir.path(), "donchian_breakout")).unwrap();

    match run_from_config(&config) {
        Err(RunError::Validation(ValidationError::MissingColumns(cols))) => {
            assert_eq!(cols, vec!["volume".to_string()]);
        }
        other => panic!("expected missing volume, got {other:?}"),
    }
}

#[test]
fn four_rows_is_insufficient() {
    let dir = tempfile::tempdir().unwrap();
    write_csv(&dir.path().join("prices.csv"), 4, true);
    let config = RunConfig::from_file(&write_config(dir.path(), "momentum")).unwrap();

    assert!(matches!(
        run_from_config(&config),
        Err(RunError::Validation(ValidationError::InsufficientRows { rows: 4, min: 5 }))
    ));
}

#[test]
fn sweep_over_csv_writes_summary() {
    let dir = tempfile::tempdir().unwrap();
    write_csv(&dir.path().join("prices.csv"), 200, true);
    let config = RunConfig::from_file(&write_config(dir.path(), "sma_cross")).unwrap();

    let grid = ParamGrid::parse(&["fast=3,5,8", "slow=15,30"]).unwrap();
    let results = ParamSweep::new().sweep(&grid, &config).unwrap();
    assert_eq!(results.len(), 6);

    let path = save_sweep_summary(&results, dir.path()).unwrap();
    let summary = std::fs::read_to_string(path).unwrap();
    let lines: Vec<&str> = summary.lines().collect();
    assert_eq!(lines.len(), 7);
    assert!(lines[0].starts_with("rank,run_id,params"));
    assert!(lines[1].starts_with("1,"));
}

#[test]
fn rerun_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    write_csv(&dir.path().join("prices.csv"), 120, true);
    let config = RunConfig::from_file(&write_config(dir.path(), "donchian_breakout")).unwrap();

    let a = serde_json::to_string(&run_from_config(&config).unwrap()).unwrap();
    let b = serde_json::to_string(&run_from_config(&config).unwrap()).unwrap();
    assert_eq!(a, b);
}
