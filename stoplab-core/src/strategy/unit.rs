//! Unit strategy: buy on the opening tick, sell on the closing tick.
//!
//! The buy-and-hold baseline every other strategy is compared against.

use super::{
    expect_params, BarClosedEvent, OrderIntent, StartEvent, StopEvent, Strategy, StrategyError,
    StrategyKind,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct Unit;

impl Unit {
    pub fn new() -> Self {
        Self
    }

    pub fn from_params(params: &[f64]) -> Result<Self, StrategyError> {
        let [] = expect_params::<0>(StrategyKind::Unit, params)?;
        Ok(Self)
    }
}

impl Strategy for Unit {
    fn name(&self) -> &'static str {
        "unit"
    }

    fn on_start(&mut self, _event: &StartEvent) -> OrderIntent {
        OrderIntent::OpenPosition
    }

    fn on_bar_closed(&mut self, _event: &BarClosedEvent<'_>) -> OrderIntent {
        OrderIntent::None
    }

    fn on_stop(&mut self, _event: &StopEvent) -> OrderIntent {
        OrderIntent::ClosePosition
    }

    fn params(&self) -> Vec<f64> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Bar, PositionStatus, Tick};
    use crate::strategy::TickEvent;
    use chrono::NaiveDate;

    #[test]
    fn opens_on_start_and_closes_on_stop() {
        let mut unit = Unit::new();
        let event = TickEvent::new(Tick::from_bid(10.0), PositionStatus::Flat);
        assert_eq!(unit.on_start(&event), OrderIntent::OpenPosition);
        assert_eq!(unit.on_stop(&event), OrderIntent::ClosePosition);
    }

    #[test]
    fn holds_through_bars() {
        let mut unit = Unit::new();
        let bar = Bar::new(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), 9.0, 11.0, 8.0, 10.0);
        for position in [PositionStatus::Flat, PositionStatus::Long] {
            let event = BarClosedEvent::new(Tick::from_bid(bar.close), &bar, position);
            assert_eq!(unit.on_bar_closed(&event), OrderIntent::None);
        }
    }

    #[test]
    fn takes_no_parameters() {
        assert!(Unit::from_params(&[]).is_ok());
        assert!(Unit::from_params(&[1.0]).is_err());
        assert!(Unit::new().params().is_empty());
    }
}
