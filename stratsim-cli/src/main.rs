//! Stratsim CLI — run, sweep, and data validation commands.
//!
//! Commands:
//! - `run` — execute one backtest from a TOML config file
//! - `sweep` — run a parameter grid over one config's data in parallel
//! - `validate` — check a CSV file against the engine's input rules

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use stratsim_core::validate_frame;
use stratsim_runner::export::{save_artifacts, save_sweep_summary};
use stratsim_runner::{load_csv, run_from_config, ParamGrid, ParamSweep, RunConfig, RunReport};

#[derive(Parser)]
#[command(name = "stratsim", about = "Stratsim CLI — single-instrument strategy backtester")]
struct Cli {
    /// Log level used when RUST_LOG is unset (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Log output format. STRATSIM_ENV=production forces json.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest from a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Output directory for result.json, trades.csv and equity.csv.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Run every combination of a parameter grid.
    Sweep {
        /// Path to the base TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Grid axis as name=v1,v2,... (repeatable).
        #[arg(long = "grid", required = true)]
        grid: Vec<String>,

        /// Number of ranked results to print.
        #[arg(long, default_value_t = 10)]
        top: usize,

        /// Run grid points one at a time.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        /// Output directory for sweep.csv.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Validate a CSV price file without running a backtest.
    Validate {
        /// Path to an OHLCV CSV file.
        #[arg(long)]
        data: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_format);

    match cli.command {
        Commands::Run { config, output_dir } => run_single(config, output_dir),
        Commands::Sweep {
            config,
            grid,
            top,
            sequential,
            output_dir,
        } => run_sweep(config, grid, top, sequential, output_dir),
        Commands::Validate { data } => run_validate(data),
    }
}

fn init_logging(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let production = std::env::var("STRATSIM_ENV").is_ok_and(|v| v == "production");
    let registry = tracing_subscriber::registry().with(filter);

    if format == LogFormat::Json || production {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn run_single(config_path: PathBuf, output_dir: PathBuf) -> Result<()> {
    let config = RunConfig::from_file(&config_path)
        .with_context(|| format!("failed to load config {}", config_path.display()))?;
    let report = run_from_config(&config)?;

    let run_dir = save_artifacts(&report, &output_dir)?;
    print_summary(&report);
    println!("Artifacts:      {}", run_dir.display());
    Ok(())
}

fn run_sweep(
    config_path: PathBuf,
    axes: Vec<String>,
    top: usize,
    sequential: bool,
    output_dir: PathBuf,
) -> Result<()> {
    let config = RunConfig::from_file(&config_path)
        .with_context(|| format!("failed to load config {}", config_path.display()))?;
    let grid = ParamGrid::parse(axes.as_slice())?;
    println!("Sweeping {} combinations...", grid.size());

    let results = ParamSweep::new()
        .with_parallelism(!sequential)
        .sweep(&grid, &config)?;
    let path = save_sweep_summary(&results, &output_dir)?;

    println!();
    println!("=== Sweep Results ({} runs) ===", results.len());
    println!(
        "{:<5} {:<30} {:>10} {:>8} {:>9} {:>7}",
        "Rank", "Params", "Return", "Sharpe", "MaxDD", "Trades"
    );
    for (i, report) in results.top_n(top).iter().enumerate() {
        let result = &report.run.result;
        let params = report
            .config
            .strategy
            .params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(" ");
        println!(
            "{:<5} {:<30} {:>9.2}% {:>8} {:>8.2}% {:>7}",
            i + 1,
            params,
            result.total_return * 100.0,
            fmt_sharpe(result.sharpe),
            result.max_drawdown * 100.0,
            result.trades.len()
        );
    }
    println!();
    println!("Summary:        {}", path.display());
    Ok(())
}

fn run_validate(path: PathBuf) -> Result<()> {
    let frame = load_csv(&path)?;
    let series = validate_frame(&frame)
        .with_context(|| format!("{} failed validation", path.display()))?;
    println!("OK: {} bars", series.len());
    println!(
        "Period:         {} to {}",
        series.first().timestamp,
        series.last().timestamp
    );
    Ok(())
}

fn fmt_sharpe(sharpe: Option<f64>) -> String {
    sharpe.map_or_else(|| "n/a".to_string(), |s| format!("{s:.3}"))
}

fn print_summary(report: &RunReport) {
    let run = &report.run;
    let result = &run.result;
    println!();
    println!("=== Backtest Result ===");
    println!("Run:            {}", report.run_id);
    println!("Strategy:       {}", run.parameters.kind());
    println!("Bars:           {}", run.bars);
    println!("Trades:         {}", result.trades.len());
    println!();
    println!("--- Performance ---");
    println!("Final Cash:     {:.2}", result.final_cash);
    println!("Final Equity:   {:.2}", run.final_equity);
    println!("Total Return:   {:.2}%", result.total_return * 100.0);
    println!("Sharpe:         {}", fmt_sharpe(result.sharpe));
    println!("Max Drawdown:   {:.2}%", result.max_drawdown * 100.0);
    println!("Win Rate:       {:.1}%", result.win_rate * 100.0);
    println!("Avg Trade PnL:  {:.2}", result.avg_trade_return);
    if let Some(pos) = &run.open_position {
        println!("Open Position:  {} @ {:.2}", pos.quantity, pos.entry_price);
    }
    if let Some(reason) = &run.failure {
        println!();
        println!("WARNING: simulation failed, degraded result returned: {reason}");
    }
    println!();
}
