//! Tick-by-tick event loop.
//!
//! 1. Start: tick from the first bar's open, `on_start`, execute
//! 2. Per bar: tick from the close, `on_bar_closed`, execute, value the account
//! 3. Stop: tick from the last bar's close, `on_stop`, execute

use super::state::{EngineConfig, RunResult};
use super::EngineError;
use crate::domain::{AccountState, Bar, Tick, ValuationSample};
use crate::strategy::{BarClosedEvent, StartEvent, StopEvent, Strategy};

/// Run one strategy over one bar series.
///
/// The strategy is driven in place, so the caller must hand in a fresh
/// instance for every run. The stop tick's trade reports `bars.len()` as
/// its bar index.
pub fn run_backtest(
    strategy: &mut dyn Strategy,
    bars: &[Bar],
    config: &EngineConfig,
) -> Result<RunResult, EngineError> {
    let (first, last) = match (bars.first(), bars.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(EngineError::EmptyInput),
    };
    config.validate()?;

    let engine = config.execution_engine();
    let mut account = AccountState::new(config.initial_balance);
    let mut trades = Vec::new();
    let mut valuations = Vec::with_capacity(bars.len());

    let start_tick = Tick::from_bid(first.open);
    let intent = strategy.on_start(&StartEvent::new(start_tick, account.position));
    trades.extend(engine.execute(intent, start_tick, 0, &mut account));

    for (bar_index, bar) in bars.iter().enumerate() {
        let tick = Tick::from_bid(bar.close);
        let event = BarClosedEvent::new(tick, bar, account.position);
        let intent = strategy.on_bar_closed(&event);
        trades.extend(engine.execute(intent, tick, bar_index, &mut account));

        valuations.push(ValuationSample {
            bar_index,
            net_worth: account.net_worth(tick.bid),
        });
    }

    let stop_tick = Tick::from_bid(last.close);
    let intent = strategy.on_stop(&StopEvent::new(stop_tick, account.position));
    trades.extend(engine.execute(intent, stop_tick, bars.len(), &mut account));

    let final_net_worth = valuations
        .last()
        .map(|v| v.net_worth)
        .unwrap_or(config.initial_balance);

    Ok(RunResult {
        strategy: strategy.name().to_string(),
        params: strategy.params(),
        initial_balance: config.initial_balance,
        total_orders: trades.len(),
        trades,
        valuations,
        final_net_worth,
        final_account: account,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OrderSide;
    use crate::strategy::Unit;
    use chrono::NaiveDate;

    fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let date = start + chrono::Duration::days(i as i64);
                Bar::new(date, c, c, c, c)
            })
            .collect()
    }

    #[test]
    fn empty_input_rejected() {
        let mut unit = Unit::new();
        let err = run_backtest(&mut unit, &[], &EngineConfig::new(1000.0, 0.0)).unwrap_err();
        assert_eq!(err, EngineError::EmptyInput);
    }

    #[test]
    fn one_valuation_per_bar() {
        let bars = bars_from_closes(&[10.0, 11.0, 12.0, 13.0]);
        let mut unit = Unit::new();
        let result = run_backtest(&mut unit, &bars, &EngineConfig::new(1000.0, 0.0)).unwrap();
        assert_eq!(result.valuations.len(), 4);
        let indices: Vec<usize> = result.valuations.iter().map(|v| v.bar_index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn stop_trade_uses_bar_count_as_index() {
        let bars = bars_from_closes(&[10.0, 12.0, 9.0]);
        let mut unit = Unit::new();
        let result = run_backtest(&mut unit, &bars, &EngineConfig::new(1000.0, 0.0)).unwrap();

        assert_eq!(result.trades[0].bar_index, 0);
        assert_eq!(result.trades[0].side, OrderSide::Buy);
        assert_eq!(result.trades[1].bar_index, 3);
        assert_eq!(result.trades[1].side, OrderSide::Sell);
        assert_eq!(result.total_orders, 2);
    }

    #[test]
    fn result_carries_strategy_identity() {
        let bars = bars_from_closes(&[10.0]);
        let mut unit = Unit::new();
        let result = run_backtest(&mut unit, &bars, &EngineConfig::new(1000.0, 0.0)).unwrap();
        assert_eq!(result.strategy, "unit");
        assert!(result.params.is_empty());
        assert_eq!(result.initial_balance, 1000.0);
    }
}
