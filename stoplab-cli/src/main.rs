//! StopLab CLI: run, sweep and grid commands.
//!
//! Commands:
//! - `run`: run the configured strategy on every configured instrument
//! - `sweep`: run every `[sweep]` parameter pair per instrument, ranked by final net worth
//! - `grid`: multi-instrument gain grid over the `[sweep]` ranges

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use stoplab_core::engine::RunResult;
use stoplab_runner::{
    export_equity_curves_csv, export_gain_grid_csv, load_instruments, run_from_config,
    save_artifacts, write_report, BacktestConfig, GainGrid, InstrumentRun, SweepRunner,
    SweepSection,
};

#[derive(Parser)]
#[command(name = "stoplab", about = "StopLab CLI: stoploss strategy backtester")]
struct Cli {
    /// Run sweeps on the current thread instead of the rayon pool.
    #[arg(long, global = true, default_value_t = false)]
    sequential: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the configured strategy on each instrument.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Save run.json, trades.csv and equity.csv per instrument here.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Run every parameter pair of `[sweep]` on each instrument.
    Sweep {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Number of best combinations to print per instrument.
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Gain grid over `[sweep]` aggregated across all instruments.
    Grid {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Write the gain matrix (semicolon separated) to this file.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Write aggregated equity curves per parameter pair to this file.
        #[arg(long)]
        equity_output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let parallel = !cli.sequential;

    match cli.command {
        Commands::Run { config, output_dir } => run_cmd(&config, output_dir.as_deref()),
        Commands::Sweep { config, top } => sweep_cmd(&config, top, parallel),
        Commands::Grid {
            config,
            output,
            equity_output,
        } => grid_cmd(&config, output.as_deref(), equity_output.as_deref(), parallel),
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: &Path) -> Result<BacktestConfig> {
    BacktestConfig::from_file(path)
        .with_context(|| format!("failed to load config {}", path.display()))
}

fn require_sweep(config: &BacktestConfig) -> Result<&SweepSection> {
    match &config.sweep {
        Some(sweep) => Ok(sweep),
        None => bail!("config has no [sweep] section"),
    }
}

fn run_cmd(config_path: &Path, output_dir: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let runs = run_from_config(&config, &config.bar_source())?;

    for run in &runs {
        print_summary(run);
        if let Some(dir) = output_dir {
            let run_dir = save_artifacts(run, dir)?;
            println!("Artifacts saved to: {}", run_dir.display());
        }
    }
    Ok(())
}

fn sweep_cmd(config_path: &Path, top: usize, parallel: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let sweep = require_sweep(&config)?;
    let kind = config.strategy.kind;

    // Parameterless strategies have a single combination
    let tuples = if kind.param_count() == 0 {
        vec![Vec::new()]
    } else {
        sweep.param_tuples()
    };

    let runner = SweepRunner::new(config.engine_config(), config.backtest.seed)
        .with_parallelism(parallel);
    let instruments = load_instruments(&config.bar_source(), &config.symbols())?;

    for instrument in &instruments {
        let mut results = runner.run_parameter_sweep(kind, &tuples, instrument)?;
        results.sort_by(|a, b| b.final_net_worth.total_cmp(&a.final_net_worth));
        print_ranking(&instrument.symbol, &results, top);
    }
    Ok(())
}

fn grid_cmd(
    config_path: &Path,
    output: Option<&Path>,
    equity_output: Option<&Path>,
    parallel: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let sweep = require_sweep(&config)?;
    let kind = config.strategy.kind;
    let rows = sweep.row_values();
    let cols = sweep.col_values();

    let runner = SweepRunner::new(config.engine_config(), config.backtest.seed)
        .with_parallelism(parallel);
    let instruments = load_instruments(&config.bar_source(), &config.symbols())?;

    // Curves come from the same runs as the grid, so only ask for them when written
    let (grid, curves) = match equity_output {
        Some(_) => {
            let (grid, curves) =
                runner.run_multi_instrument_grid_with_equity(kind, &rows, &cols, &instruments)?;
            (grid, Some(curves))
        }
        None => (runner.run_multi_instrument_grid(kind, &rows, &cols, &instruments)?, None),
    };
    print_grid(&grid);

    if let Some(path) = output {
        write_report(path, &export_gain_grid_csv(&grid)?)?;
        info!(path = %path.display(), "gain grid written");
    }
    if let (Some(path), Some(curves)) = (equity_output, curves) {
        write_report(path, &export_equity_curves_csv(&curves)?)?;
        info!(path = %path.display(), curves = curves.len(), "equity curves written");
    }
    Ok(())
}

fn print_summary(run: &InstrumentRun) {
    let m = &run.metrics;
    let params: Vec<String> = run.result.params.iter().map(|p| p.to_string()).collect();
    println!();
    println!("=== Backtest Result ===");
    println!("Symbol:          {}", run.symbol);
    println!("Strategy:        {}({})", run.result.strategy, params.join(", "));
    println!("Bars:            {}", run.result.valuations.len());
    println!("Orders:          {}", m.total_orders);
    println!();
    println!("--- Performance ---");
    println!("Initial Balance: {:.2}", run.result.initial_balance);
    println!("Final Net Worth: {:.2}", m.final_net_worth);
    println!("Gain:            {:.4}", m.gain);
    println!("Buy & Hold Gain: {:.4}", m.buy_and_hold_gain);
    println!("Max Drawdown:    {:.2}%", m.max_drawdown * 100.0);
    println!("Final Position:  {:?}", run.result.final_account.position);
    println!();
}

fn print_ranking(symbol: &str, results: &[RunResult], top: usize) {
    println!();
    println!("=== {symbol}: top {} of {} ===", top.min(results.len()), results.len());
    println!("{:<4} {:<24} {:>14} {:>8} {:>7}", "#", "Params", "Net Worth", "Gain", "Orders");
    println!("{}", "-".repeat(61));
    for (rank, result) in results.iter().take(top).enumerate() {
        let params: Vec<String> = result.params.iter().map(|p| p.to_string()).collect();
        println!(
            "{:<4} {:<24} {:>14.2} {:>8.4} {:>7}",
            rank + 1,
            params.join(", "),
            result.final_net_worth,
            result.gain(),
            result.total_orders
        );
    }
}

fn print_grid(grid: &GainGrid) {
    println!();
    println!(
        "=== {} gain grid: {} x {} over {} instrument(s) ===",
        grid.kind,
        grid.rows.len(),
        grid.cols.len(),
        grid.instrument_count
    );
    if let Some((row, col, cell)) = grid.best() {
        println!("Best:  ({row}, {col}) gain {:.4}", cell.gain);
        println!("Mean final net worth: {:.2}", cell.mean_net_worth);
    }
    println!();
}
