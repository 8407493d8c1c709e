//! Backtest runner: wires strategy construction, the engine and data loading.
//!
//! Two entry points:
//! - `run_single()`: one strategy spec over one bar series. No I/O.
//! - `run_from_config()`: loads every configured instrument and runs the
//!   configured strategy on each. Used by the CLI `run` command.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use stoplab_core::domain::Bar;
use stoplab_core::engine::{run_backtest, EngineConfig, EngineError, RunResult};
use stoplab_core::rng::RngHierarchy;
use stoplab_core::strategy::{StrategyError, StrategySpec};

use crate::config::{BacktestConfig, ConfigError};
use crate::data_loader::{load_instruments, BarSource, LoadError};
use crate::metrics::PerformanceMetrics;
use crate::sweep::SweepError;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("strategy error: {0}")]
    Strategy(#[from] StrategyError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("sweep error: {0}")]
    Sweep(#[from] SweepError),
}

/// Result of running one strategy on one instrument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentRun {
    pub symbol: String,
    pub metrics: PerformanceMetrics,
    pub result: RunResult,
}

/// Build a fresh strategy from `spec` and run it over `bars`.
///
/// `seed` only matters for randomized strategies.
pub fn run_single(
    spec: &StrategySpec,
    bars: &[Bar],
    config: &EngineConfig,
    seed: u64,
) -> Result<RunResult, RunError> {
    let mut strategy = spec.build(seed)?;
    Ok(run_backtest(strategy.as_mut(), bars, config)?)
}

/// Run the `[strategy]` of `config` on every configured instrument.
pub fn run_from_config(
    config: &BacktestConfig,
    source: &dyn BarSource,
) -> Result<Vec<InstrumentRun>, RunError> {
    let spec = config.strategy_spec()?;
    let engine = config.engine_config();
    let seeds = RngHierarchy::new(config.backtest.seed);
    let instruments = load_instruments(source, &config.symbols())?;

    info!(strategy = %spec.label(), instruments = instruments.len(), "starting run");

    instruments
        .iter()
        .map(|instrument| {
            let seed = seeds.sub_seed(&instrument.symbol, 0);
            let result = run_single(&spec, &instrument.bars, &engine, seed)?;
            let metrics = PerformanceMetrics::compute(&result, &instrument.bars);
            info!(
                symbol = %instrument.symbol,
                orders = result.total_orders,
                final_net_worth = result.final_net_worth,
                "run complete"
            );
            Ok(InstrumentRun {
                symbol: instrument.symbol.clone(),
                metrics,
                result,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use stoplab_core::strategy::StrategyKind;

    fn bars(closes: &[f64]) -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar::new(start + chrono::Duration::days(i as i64), c, c, c, c))
            .collect()
    }

    #[test]
    fn run_single_builds_fresh_strategy() {
        let spec = StrategySpec::pair(StrategyKind::Unit, 0.0, 0.0);
        let config = EngineConfig::new(1000.0, 0.0);
        let result = run_single(&spec, &bars(&[10.0, 12.0, 9.0]), &config, 0).unwrap();
        assert_eq!(result.total_orders, 2);
        assert_eq!(result.strategy, "unit");
    }

    #[test]
    fn run_single_propagates_errors() {
        let config = EngineConfig::new(1000.0, 0.0);
        let spec = StrategySpec::pair(StrategyKind::Ott, 1.0, 1.0);
        assert!(matches!(
            run_single(&spec, &[], &config, 0),
            Err(RunError::Engine(EngineError::EmptyInput))
        ));

        let bad = StrategySpec {
            kind: StrategyKind::Ott,
            params: vec![1.0],
        };
        assert!(matches!(
            run_single(&bad, &bars(&[1.0]), &config, 0),
            Err(RunError::Strategy(_))
        ));
    }
}
