//! Reporting and export: JSON and CSV artifacts.
//!
//! - **JSON**: full round-trip serialization of an instrument run
//! - **CSV**: trade log, equity curve, aggregated equity curves
//! - **Gain grid**: semicolon-delimited matrix, column params across the
//!   header and one row per row param

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use stoplab_core::domain::{TradeRecord, ValuationSample};

use crate::runner::InstrumentRun;
use crate::sweep::{GainGrid, ParamEquityCurve};

/// Delimiter of the gain grid report.
pub const GRID_DELIMITER: u8 = b';';

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(run: &InstrumentRun) -> Result<String> {
    serde_json::to_string_pretty(run).context("failed to serialize run to JSON")
}

pub fn import_json(json: &str) -> Result<InstrumentRun> {
    serde_json::from_str(json).context("failed to deserialize run from JSON")
}

// ─── CSV export ─────────────────────────────────────────────────────

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Columns: bar_index, side, bid, fill_price, shares_after, balance_after, net_worth
pub fn export_trades_csv(trades: &[TradeRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "bar_index",
        "side",
        "bid",
        "fill_price",
        "shares_after",
        "balance_after",
        "net_worth",
    ])?;

    for t in trades {
        wtr.write_record([
            &t.bar_index.to_string(),
            &format!("{:?}", t.side),
            &format!("{:.4}", t.bid),
            &format!("{:.6}", t.fill_price),
            &t.shares_after.to_string(),
            &format!("{:.2}", t.balance_after),
            &format!("{:.2}", t.net_worth),
        ])?;
    }

    finish(wtr)
}

/// Columns: bar_index, net_worth
pub fn export_equity_csv(valuations: &[ValuationSample]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["bar_index", "net_worth"])?;
    for v in valuations {
        wtr.write_record([&v.bar_index.to_string(), &format!("{:.2}", v.net_worth)])?;
    }
    finish(wtr)
}

/// One column per parameter pair, labeled `row|col`, one row per bar.
pub fn export_equity_curves_csv(curves: &[ParamEquityCurve]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec!["bar_index".to_string()];
    header.extend(curves.iter().map(|c| {
        c.params
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join("|")
    }));
    wtr.write_record(&header)?;

    let bars = curves.iter().map(|c| c.curve.len()).max().unwrap_or(0);
    for i in 0..bars {
        let mut row = vec![i.to_string()];
        row.extend(
            curves
                .iter()
                .map(|c| c.curve.get(i).map(|v| format!("{v:.2}")).unwrap_or_default()),
        );
        wtr.write_record(&row)?;
    }
    finish(wtr)
}

/// Gain matrix: an empty corner cell, column params across, then each
/// row param followed by its gains.
pub fn export_gain_grid_csv(grid: &GainGrid) -> Result<String> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(GRID_DELIMITER)
        .flexible(true)
        .from_writer(vec![]);

    let mut header = vec![String::new()];
    header.extend(grid.cols.iter().map(|c| c.to_string()));
    wtr.write_record(&header)?;

    for (row_param, cells) in grid.rows.iter().zip(&grid.cells) {
        let mut record = vec![row_param.to_string()];
        record.extend(cells.iter().map(|cell| format!("{:.6}", cell.gain)));
        wtr.write_record(&record)?;
    }

    finish(wtr)
}

// ─── Files ──────────────────────────────────────────────────────────

/// Write `contents` to `path`, creating parent directories.
pub fn write_report(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

/// Save the artifact set for one instrument run.
///
/// Creates `{symbol}_{strategy}_{timestamp}/` under `output_dir` containing
/// `run.json`, `trades.csv` and `equity.csv`. Returns the directory.
pub fn save_artifacts(run: &InstrumentRun, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!(
        "{}_{}_{}",
        run.symbol,
        run.result.strategy,
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    write_report(&run_dir.join("run.json"), &export_json(run)?)?;
    write_report(&run_dir.join("trades.csv"), &export_trades_csv(&run.result.trades)?)?;
    write_report(&run_dir.join("equity.csv"), &export_equity_csv(&run.result.valuations)?)?;

    Ok(run_dir)
}

/// Load an instrument run back from an artifact directory.
pub fn load_artifacts(dir: &Path) -> Result<InstrumentRun> {
    let path = dir.join("run.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}
