//! OTT: trailing entry/exit thresholds that keep ratcheting across transitions.
//!
//! Unlike [`TrailingStoploss`](super::TrailingStoploss), the threshold is not
//! re-seeded when the position flips: the flat-side trigger only ever falls
//! and the long-side stop only ever rises. The position is closed on stop.

use super::{
    expect_params, BarClosedEvent, OrderIntent, Ratchet, StartEvent, StopEvent, Strategy,
    StrategyError, StrategyKind,
};
use crate::domain::PositionStatus;

#[derive(Debug, Clone)]
pub struct Ott {
    buy_pct: f64,
    sell_pct: f64,
    furthest_bid: f64,
    stoploss: Ratchet,
}

impl Ott {
    pub fn new(buy_pct: f64, sell_pct: f64) -> Self {
        Self {
            buy_pct,
            sell_pct,
            furthest_bid: 0.0,
            stoploss: Ratchet::default(),
        }
    }

    pub fn from_params(params: &[f64]) -> Result<Self, StrategyError> {
        let [buy_pct, sell_pct] = expect_params(StrategyKind::Ott, params)?;
        Ok(Self::new(buy_pct, sell_pct))
    }

    pub fn furthest_bid(&self) -> f64 {
        self.furthest_bid
    }

    pub fn stoploss(&self) -> f64 {
        self.stoploss.level()
    }

    fn buy_factor(&self) -> f64 {
        1.0 + self.buy_pct / 100.0
    }

    fn sell_factor(&self) -> f64 {
        1.0 - self.sell_pct / 100.0
    }
}

impl Strategy for Ott {
    fn name(&self) -> &'static str {
        "ott"
    }

    fn on_start(&mut self, event: &StartEvent) -> OrderIntent {
        self.furthest_bid = event.bid;
        self.stoploss.reset(event.bid * self.buy_factor());
        OrderIntent::None
    }

    fn on_bar_closed(&mut self, event: &BarClosedEvent<'_>) -> OrderIntent {
        let bid = event.bid;
        match event.position {
            PositionStatus::Flat => {
                if bid < self.furthest_bid {
                    self.furthest_bid = bid;
                    self.stoploss.tighten_down(bid * self.buy_factor());
                }
                if bid > self.stoploss.level() {
                    self.furthest_bid = bid;
                    return OrderIntent::OpenPosition;
                }
            }
            PositionStatus::Long => {
                if bid > self.furthest_bid {
                    self.furthest_bid = bid;
                    self.stoploss.tighten_up(bid * self.sell_factor());
                }
                if bid < self.stoploss.level() {
                    self.furthest_bid = bid;
                    return OrderIntent::ClosePosition;
                }
            }
        }
        OrderIntent::None
    }

    fn on_stop(&mut self, _event: &StopEvent) -> OrderIntent {
        OrderIntent::ClosePosition
    }

    fn params(&self) -> Vec<f64> {
        vec![self.buy_pct, self.sell_pct]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Bar, Tick};
    use crate::strategy::TickEvent;
    use chrono::NaiveDate;

    fn feed(s: &mut Ott, close: f64, position: PositionStatus) -> OrderIntent {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let bar = Bar::new(date, close, close, close, close);
        s.on_bar_closed(&BarClosedEvent::new(Tick::from_bid(close), &bar, position))
    }

    fn started(bid: f64) -> Ott {
        let mut s = Ott::new(10.0, 10.0);
        s.on_start(&TickEvent::new(Tick::from_bid(bid), PositionStatus::Flat));
        s
    }

    #[test]
    fn entry_keeps_the_lowered_trigger() {
        let mut s = started(100.0);
        assert!((s.stoploss() - 110.0).abs() < 1e-9);

        feed(&mut s, 90.0, PositionStatus::Flat);
        assert!((s.stoploss() - 99.0).abs() < 1e-9);

        assert_eq!(feed(&mut s, 100.0, PositionStatus::Flat), OrderIntent::OpenPosition);
        assert_eq!(s.furthest_bid(), 100.0);
        assert!((s.stoploss() - 99.0).abs() < 1e-9);
    }

    #[test]
    fn long_stop_never_drops_below_carried_threshold() {
        let mut s = started(100.0);
        feed(&mut s, 90.0, PositionStatus::Flat);
        feed(&mut s, 100.0, PositionStatus::Flat);

        // 101 * 0.9 = 90.9 is below the carried 99
        assert_eq!(feed(&mut s, 101.0, PositionStatus::Long), OrderIntent::None);
        assert!((s.stoploss() - 99.0).abs() < 1e-9);

        assert_eq!(feed(&mut s, 120.0, PositionStatus::Long), OrderIntent::None);
        assert!((s.stoploss() - 108.0).abs() < 1e-9);

        assert_eq!(feed(&mut s, 107.0, PositionStatus::Long), OrderIntent::ClosePosition);
        assert_eq!(s.furthest_bid(), 107.0);
        assert!((s.stoploss() - 108.0).abs() < 1e-9);
    }

    #[test]
    fn reenters_as_soon_as_price_clears_the_old_stop() {
        let mut s = started(100.0);
        feed(&mut s, 90.0, PositionStatus::Flat);
        feed(&mut s, 100.0, PositionStatus::Flat);
        feed(&mut s, 120.0, PositionStatus::Long);
        feed(&mut s, 107.0, PositionStatus::Long);

        assert_eq!(feed(&mut s, 108.5, PositionStatus::Flat), OrderIntent::OpenPosition);
    }

    #[test]
    fn closes_on_stop() {
        let mut s = started(100.0);
        let event = TickEvent::new(Tick::from_bid(100.0), PositionStatus::Long);
        assert_eq!(s.on_stop(&event), OrderIntent::ClosePosition);
    }

    #[test]
    fn rejects_wrong_arity() {
        assert!(Ott::from_params(&[]).is_err());
        assert_eq!(Ott::from_params(&[1.0, 2.0]).unwrap().params(), vec![1.0, 2.0]);
    }
}
