//! Performance metrics: pure functions over bars, equity curves and run results.

use serde::{Deserialize, Serialize};

use stoplab_core::domain::Bar;
use stoplab_core::engine::RunResult;

/// Summary numbers printed and exported for a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub final_net_worth: f64,
    /// Final net worth over initial balance.
    pub gain: f64,
    /// Last close over first open of the same bars.
    pub buy_and_hold_gain: f64,
    /// Largest peak-to-trough decline as a positive fraction.
    pub max_drawdown: f64,
    pub total_orders: usize,
}

impl PerformanceMetrics {
    pub fn compute(result: &RunResult, bars: &[Bar]) -> Self {
        Self {
            final_net_worth: result.final_net_worth,
            gain: gain(result),
            buy_and_hold_gain: buy_and_hold_gain(bars).unwrap_or(1.0),
            max_drawdown: max_drawdown(&result.equity_curve()),
            total_orders: result.total_orders,
        }
    }
}

/// Gain from buying at the first open and selling at the last close.
///
/// Returns `None` for an empty series or a zero first open.
pub fn buy_and_hold_gain(bars: &[Bar]) -> Option<f64> {
    let first = bars.first()?;
    let last = bars.last()?;
    if first.open == 0.0 {
        return None;
    }
    Some(last.close / first.open)
}

/// Divide every value by the first one. A missing or zero first value divides by 1.
pub fn normalize(curve: &[f64]) -> Vec<f64> {
    let base = match curve.first() {
        Some(&first) if first != 0.0 => first,
        _ => 1.0,
    };
    curve.iter().map(|v| v / base).collect()
}

pub fn gain(result: &RunResult) -> f64 {
    result.gain()
}

/// Maximum drawdown as a positive fraction (0.15 = 15% drawdown).
///
/// Returns 0.0 for curves shorter than two points or never declining.
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    if equity_curve.len() < 2 {
        return 0.0;
    }
    let mut peak = equity_curve[0];
    let mut max_dd = 0.0_f64;

    for &eq in equity_curve {
        if eq > peak {
            peak = eq;
        }
        if peak > 0.0 {
            max_dd = max_dd.max((peak - eq) / peak);
        }
    }
    max_dd
}
