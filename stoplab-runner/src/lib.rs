//! StopLab Runner: backtest orchestration, sweeps, data loading, reports.
//!
//! This crate builds on `stoplab-core` to provide:
//! - CSV bar loading (Yahoo daily format)
//! - TOML backtest configuration
//! - Single runs per instrument with summary metrics
//! - Parameter sweeps and multi-instrument gain grids on rayon
//! - Parameter ranges and their permutations
//! - JSON and CSV export

pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod range;
pub mod runner;
pub mod sweep;

pub use config::{BacktestConfig, ConfigError, InstrumentConfig, SweepSection};
pub use data_loader::{load_instruments, BarSource, CsvBarSource, InstrumentBars, LoadError};
pub use export::{
    export_equity_csv, export_equity_curves_csv, export_gain_grid_csv, export_json,
    export_trades_csv, import_json, save_artifacts, write_report,
};
pub use metrics::PerformanceMetrics;
pub use range::{permutations, range, RangeSpec};
pub use runner::{run_from_config, run_single, InstrumentRun, RunError};
pub use sweep::{GainGrid, GridCell, ParamEquityCurve, SweepError, SweepRunner};
