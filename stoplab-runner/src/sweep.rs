//! Parameter sweeps and multi-instrument grids.
//!
//! Every run builds a fresh strategy whose seed comes from the seed
//! hierarchy keyed by `(instrument, combination index)`, so parallel and
//! sequential execution produce identical results.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use stoplab_core::engine::{run_backtest, EngineConfig, EngineError, RunResult};
use stoplab_core::rng::RngHierarchy;
use stoplab_core::strategy::{StrategyError, StrategyKind, StrategySpec};

use crate::data_loader::InstrumentBars;

/// Errors from sweep execution.
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("'{symbol}' has {got} bars, expected {expected}")]
    LengthMismatch {
        symbol: String,
        expected: usize,
        got: usize,
    },
    #[error("no instruments to sweep over")]
    NoInstruments,
    #[error(transparent)]
    Strategy(#[from] StrategyError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// One cell of a gain grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    /// Final net worth summed over instruments.
    pub total_net_worth: f64,
    pub mean_net_worth: f64,
    /// `total_net_worth / (balance * instrument_count)`.
    pub gain: f64,
}

/// Gains for every `(row, col)` parameter pair across a set of instruments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GainGrid {
    pub kind: StrategyKind,
    pub rows: Vec<f64>,
    pub cols: Vec<f64>,
    pub instrument_count: usize,
    /// `cells[r][c]` belongs to `(rows[r], cols[c])`.
    pub cells: Vec<Vec<GridCell>>,
}

impl GainGrid {
    pub fn cell(&self, row: usize, col: usize) -> Option<&GridCell> {
        self.cells.get(row)?.get(col)
    }

    /// Parameter pair with the highest gain. Ties keep the first in row-major order.
    pub fn best(&self) -> Option<(f64, f64, GridCell)> {
        let mut best: Option<(f64, f64, GridCell)> = None;
        for (r, row) in self.cells.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                if best.map_or(true, |(_, _, b)| cell.gain > b.gain) {
                    best = Some((self.rows[r], self.cols[c], *cell));
                }
            }
        }
        best
    }
}

/// Aggregated equity curve for one parameter pair across instruments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamEquityCurve {
    pub params: Vec<f64>,
    pub curve: Vec<f64>,
}

/// Sweep executor.
///
/// Runs independent backtests, in parallel on the rayon pool by default.
#[derive(Debug, Clone)]
pub struct SweepRunner {
    engine: EngineConfig,
    seeds: RngHierarchy,
    parallel: bool,
}

impl SweepRunner {
    pub fn new(engine: EngineConfig, master_seed: u64) -> Self {
        Self {
            engine,
            seeds: RngHierarchy::new(master_seed),
            parallel: true,
        }
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn engine_config(&self) -> &EngineConfig {
        &self.engine
    }

    /// Map `f` over `items`, keeping input order.
    fn map_ordered<T, R, F>(&self, items: &[T], f: F) -> Result<Vec<R>, SweepError>
    where
        T: Sync,
        R: Send,
        F: Fn(usize, &T) -> Result<R, SweepError> + Sync + Send,
    {
        if self.parallel {
            items
                .par_iter()
                .enumerate()
                .map(|(idx, item)| f(idx, item))
                .collect()
        } else {
            items
                .iter()
                .enumerate()
                .map(|(idx, item)| f(idx, item))
                .collect()
        }
    }

    fn run_one(
        &self,
        spec: &StrategySpec,
        instrument: &InstrumentBars,
        combination: usize,
    ) -> Result<RunResult, SweepError> {
        let seed = self.seeds.sub_seed(&instrument.symbol, combination as u64);
        let mut strategy = spec.build(seed)?;
        Ok(run_backtest(strategy.as_mut(), &instrument.bars, &self.engine)?)
    }

    /// Run `kind` once per parameter tuple on a single instrument.
    ///
    /// Results come back in the order of `param_tuples`.
    pub fn run_parameter_sweep(
        &self,
        kind: StrategyKind,
        param_tuples: &[Vec<f64>],
        instrument: &InstrumentBars,
    ) -> Result<Vec<RunResult>, SweepError> {
        let specs = param_tuples
            .iter()
            .map(|params| StrategySpec::from_parameter_vector(kind, params))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            strategy = %kind,
            symbol = %instrument.symbol,
            combinations = specs.len(),
            parallel = self.parallel,
            "starting parameter sweep"
        );
        let results = self.map_ordered(&specs, |idx, spec| self.run_one(spec, instrument, idx))?;
        info!(strategy = %kind, runs = results.len(), "parameter sweep finished");

        Ok(results)
    }

    /// Run every `(row, col)` pair on every instrument and collect gains.
    pub fn run_multi_instrument_grid(
        &self,
        kind: StrategyKind,
        rows: &[f64],
        cols: &[f64],
        instruments: &[InstrumentBars],
    ) -> Result<GainGrid, SweepError> {
        if instruments.is_empty() {
            return Err(SweepError::NoInstruments);
        }
        let passes = self.run_grid_pass(kind, rows, cols, instruments, false)?;
        let totals: Vec<f64> = passes.iter().map(|(total, _)| *total).collect();
        Ok(self.build_grid(kind, rows, cols, instruments.len(), &totals))
    }

    /// Gain grid and aggregated equity curves from a single simulation pass.
    ///
    /// Each `(pair, instrument)` run feeds both its final net worth to the
    /// grid cell and its valuations to the pair's curve.
    pub fn run_multi_instrument_grid_with_equity(
        &self,
        kind: StrategyKind,
        rows: &[f64],
        cols: &[f64],
        instruments: &[InstrumentBars],
    ) -> Result<(GainGrid, Vec<ParamEquityCurve>), SweepError> {
        check_lengths(instruments)?;
        let passes = self.run_grid_pass(kind, rows, cols, instruments, true)?;

        let totals: Vec<f64> = passes.iter().map(|(total, _)| *total).collect();
        let grid = self.build_grid(kind, rows, cols, instruments.len(), &totals);
        let curves = grid_pairs(rows, cols)
            .into_iter()
            .zip(passes)
            .map(|((row, col), (_, curve))| ParamEquityCurve {
                params: StrategySpec::pair(kind, row, col).params,
                curve: curve.unwrap_or_default(),
            })
            .collect();
        Ok((grid, curves))
    }

    /// Per-bar sum of valuations across instruments for one strategy spec.
    ///
    /// All instruments must have the same number of bars. `combination`
    /// selects the seed slot, matching the grid cell index.
    pub fn aggregate_equity_curve(
        &self,
        spec: &StrategySpec,
        instruments: &[InstrumentBars],
        combination: usize,
    ) -> Result<Vec<f64>, SweepError> {
        check_lengths(instruments)?;
        let (_, curve) = self.run_across(spec, instruments, combination, true)?;
        Ok(curve.unwrap_or_default())
    }

    /// One aggregated equity curve per `(row, col)` pair.
    pub fn run_multi_instrument_equity(
        &self,
        kind: StrategyKind,
        rows: &[f64],
        cols: &[f64],
        instruments: &[InstrumentBars],
    ) -> Result<Vec<ParamEquityCurve>, SweepError> {
        let (_, curves) = self.run_multi_instrument_grid_with_equity(kind, rows, cols, instruments)?;
        Ok(curves)
    }

    /// Summed final net worth, and optionally summed valuations, of one spec
    /// over every instrument.
    fn run_across(
        &self,
        spec: &StrategySpec,
        instruments: &[InstrumentBars],
        combination: usize,
        with_curve: bool,
    ) -> Result<(f64, Option<Vec<f64>>), SweepError> {
        let mut total = 0.0;
        let mut curve: Option<Vec<f64>> = None;
        for instrument in instruments {
            let result = self.run_one(spec, instrument, combination)?;
            total += result.final_net_worth;
            if with_curve {
                let sums = curve.get_or_insert_with(|| vec![0.0; result.valuations.len()]);
                for (sum, sample) in sums.iter_mut().zip(&result.valuations) {
                    *sum += sample.net_worth;
                }
            }
        }
        Ok((total, curve))
    }

    fn run_grid_pass(
        &self,
        kind: StrategyKind,
        rows: &[f64],
        cols: &[f64],
        instruments: &[InstrumentBars],
        with_curves: bool,
    ) -> Result<Vec<(f64, Option<Vec<f64>>)>, SweepError> {
        let pairs = grid_pairs(rows, cols);
        info!(
            strategy = %kind,
            cells = pairs.len(),
            instruments = instruments.len(),
            curves = with_curves,
            parallel = self.parallel,
            "starting multi-instrument grid"
        );

        let passes = self.map_ordered(&pairs, |idx, &(row, col)| {
            let spec = StrategySpec::pair(kind, row, col);
            self.run_across(&spec, instruments, idx, with_curves)
        })?;

        info!(strategy = %kind, cells = passes.len(), "multi-instrument grid finished");
        Ok(passes)
    }

    fn build_grid(
        &self,
        kind: StrategyKind,
        rows: &[f64],
        cols: &[f64],
        count: usize,
        totals: &[f64],
    ) -> GainGrid {
        let balance = self.engine.initial_balance;
        let flat: Vec<GridCell> = totals
            .iter()
            .map(|&total| GridCell {
                total_net_worth: total,
                mean_net_worth: total / count as f64,
                gain: total / (balance * count as f64),
            })
            .collect();

        let cells = if cols.is_empty() {
            vec![Vec::new(); rows.len()]
        } else {
            flat.chunks(cols.len()).map(<[GridCell]>::to_vec).collect()
        };

        GainGrid {
            kind,
            rows: rows.to_vec(),
            cols: cols.to_vec(),
            instrument_count: count,
            cells,
        }
    }
}

fn grid_pairs(rows: &[f64], cols: &[f64]) -> Vec<(f64, f64)> {
    rows.iter()
        .flat_map(|&r| cols.iter().map(move |&c| (r, c)))
        .collect()
}

/// Common bar count of all instruments.
fn check_lengths(instruments: &[InstrumentBars]) -> Result<usize, SweepError> {
    let first = instruments.first().ok_or(SweepError::NoInstruments)?;
    let expected = first.bars.len();
    for instrument in instruments {
        if instrument.bars.len() != expected {
            return Err(SweepError::LengthMismatch {
                symbol: instrument.symbol.clone(),
                expected,
                got: instrument.bars.len(),
            });
        }
    }
    Ok(expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use stoplab_core::domain::Bar;

    fn instrument(symbol: &str, closes: &[f64]) -> InstrumentBars {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar::new(start + chrono::Duration::days(i as i64), c, c, c, c))
            .collect();
        InstrumentBars::new(symbol, bars)
    }

    #[test]
    fn grid_pairs_row_major() {
        assert_eq!(
            grid_pairs(&[1.0, 2.0], &[3.0, 4.0]),
            vec![(1.0, 3.0), (1.0, 4.0), (2.0, 3.0), (2.0, 4.0)]
        );
    }

    #[test]
    fn check_lengths_reports_offender() {
        let a = instrument("A", &[1.0, 2.0, 3.0]);
        let b = instrument("B", &[1.0, 2.0]);
        match check_lengths(&[a, b]) {
            Err(SweepError::LengthMismatch { symbol, expected, got }) => {
                assert_eq!(symbol, "B");
                assert_eq!((expected, got), (3, 2));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn best_cell_picks_highest_gain() {
        let cell = |gain| GridCell {
            total_net_worth: gain * 100.0,
            mean_net_worth: gain * 100.0,
            gain,
        };
        let grid = GainGrid {
            kind: StrategyKind::Ott,
            rows: vec![1.0, 2.0],
            cols: vec![5.0, 6.0],
            instrument_count: 1,
            cells: vec![vec![cell(1.0), cell(1.3)], vec![cell(0.9), cell(1.1)]],
        };
        let (row, col, best) = grid.best().unwrap();
        assert_eq!((row, col), (1.0, 6.0));
        assert_eq!(best.gain, 1.3);
        assert_eq!(grid.cell(1, 0).unwrap().gain, 0.9);
        assert!(grid.cell(2, 0).is_none());
    }
}
