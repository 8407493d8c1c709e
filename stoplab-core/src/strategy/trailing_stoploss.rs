//! Trailing stoploss: enter on a rebound from the running low, exit on a
//! pullback from the running high.
//!
//! While flat: the entry trigger trails `furthest_bid * (1 + buy_pct)`
//! below-to-above; a close above it opens the position.
//! While long: the exit trigger trails `furthest_bid * (1 - sell_pct)`;
//! a close below it closes the position.
//!
//! Both trackers are re-seeded from the fill bid on every transition.
//! The stop callback does nothing, so an open position stays open at the end.

use super::{
    expect_params, BarClosedEvent, OrderIntent, StartEvent, StopEvent, Strategy, StrategyError,
    StrategyKind,
};
use crate::domain::PositionStatus;

#[derive(Debug, Clone)]
pub struct TrailingStoploss {
    buy_pct: f64,
    sell_pct: f64,
    furthest_bid: f64,
    stoploss: f64,
}

impl TrailingStoploss {
    /// `buy_pct` and `sell_pct` are percentages (3.0 means 3%).
    pub fn new(buy_pct: f64, sell_pct: f64) -> Self {
        Self {
            buy_pct,
            sell_pct,
            furthest_bid: 0.0,
            stoploss: 0.0,
        }
    }

    pub fn from_params(params: &[f64]) -> Result<Self, StrategyError> {
        let [buy_pct, sell_pct] = expect_params(StrategyKind::TrailingStoploss, params)?;
        Ok(Self::new(buy_pct, sell_pct))
    }

    pub fn furthest_bid(&self) -> f64 {
        self.furthest_bid
    }

    pub fn stoploss(&self) -> f64 {
        self.stoploss
    }

    fn buy_factor(&self) -> f64 {
        1.0 + self.buy_pct / 100.0
    }

    fn sell_factor(&self) -> f64 {
        1.0 - self.sell_pct / 100.0
    }

    fn on_flat(&mut self, bid: f64) -> OrderIntent {
        if bid < self.furthest_bid {
            self.furthest_bid = bid;
            self.stoploss = bid * self.buy_factor();
        }

        if bid > self.stoploss {
            self.furthest_bid = bid;
            self.stoploss = bid * self.sell_factor();
            return OrderIntent::OpenPosition;
        }

        OrderIntent::None
    }

    fn on_long(&mut self, bid: f64) -> OrderIntent {
        if bid > self.furthest_bid {
            self.furthest_bid = bid;
            self.stoploss = bid * self.sell_factor();
        }

        if bid < self.stoploss {
            self.furthest_bid = bid;
            self.stoploss = bid * self.buy_factor();
            return OrderIntent::ClosePosition;
        }

        OrderIntent::None
    }
}

impl Strategy for TrailingStoploss {
    fn name(&self) -> &'static str {
        "trailing_stoploss"
    }

    fn on_start(&mut self, event: &StartEvent) -> OrderIntent {
        self.furthest_bid = event.bid;
        self.stoploss = event.bid * self.buy_factor();
        OrderIntent::None
    }

    fn on_bar_closed(&mut self, event: &BarClosedEvent<'_>) -> OrderIntent {
        match event.position {
            PositionStatus::Flat => self.on_flat(event.bid),
            PositionStatus::Long => self.on_long(event.bid),
        }
    }

    fn on_stop(&mut self, _event: &StopEvent) -> OrderIntent {
        OrderIntent::None
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

    fn make_bar(close: f64) -> Bar {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        Bar::new(date, close, close + 1.0, close - 1.0, close)
    }

    fn feed(s: &mut TrailingStoploss, close: f64, position: PositionStatus) -> OrderIntent {
        let bar = make_bar(close);
        s.on_bar_closed(&BarClosedEvent::new(Tick::from_bid(close), &bar, position))
    }

    fn started(buy_pct: f64, sell_pct: f64, bid: f64) -> TrailingStoploss {
        let mut s = TrailingStoploss::new(buy_pct, sell_pct);
        let intent = s.on_start(&TickEvent::new(Tick::from_bid(bid), PositionStatus::Flat));
        assert_eq!(intent, OrderIntent::None);
        s
    }

    #[test]
    fn start_seeds_entry_trigger_above_bid() {
        let s = started(10.0, 10.0, 100.0);
        assert_eq!(s.furthest_bid(), 100.0);
        assert!((s.stoploss() - 110.0).abs() < 1e-9);
    }

    #[test]
    fn flat_trigger_follows_new_lows() {
        let mut s = started(10.0, 10.0, 100.0);
        assert_eq!(feed(&mut s, 90.0, PositionStatus::Flat), OrderIntent::None);
        assert_eq!(s.furthest_bid(), 90.0);
        assert!((s.stoploss() - 99.0).abs() < 1e-9);

        // A higher close inside the band changes nothing
        assert_eq!(feed(&mut s, 95.0, PositionStatus::Flat), OrderIntent::None);
        assert_eq!(s.furthest_bid(), 90.0);
    }

    #[test]
    fn rebound_above_trigger_opens_and_reseeds() {
        let mut s = started(10.0, 10.0, 100.0);
        feed(&mut s, 90.0, PositionStatus::Flat);
        assert_eq!(feed(&mut s, 100.0, PositionStatus::Flat), OrderIntent::OpenPosition);
        assert_eq!(s.furthest_bid(), 100.0);
        assert!((s.stoploss() - 90.0).abs() < 1e-9);
    }

    #[test]
    fn long_stop_trails_high_and_closes_on_pullback() {
        let mut s = started(10.0, 10.0, 100.0);
        feed(&mut s, 90.0, PositionStatus::Flat);
        feed(&mut s, 100.0, PositionStatus::Flat);

        assert_eq!(feed(&mut s, 120.0, PositionStatus::Long), OrderIntent::None);
        assert!((s.stoploss() - 108.0).abs() < 1e-9);

        assert_eq!(feed(&mut s, 110.0, PositionStatus::Long), OrderIntent::None);
        assert!((s.stoploss() - 108.0).abs() < 1e-9);

        assert_eq!(feed(&mut s, 107.0, PositionStatus::Long), OrderIntent::ClosePosition);
        assert_eq!(s.furthest_bid(), 107.0);
        assert!((s.stoploss() - 117.7).abs() < 1e-9);
    }

    #[test]
    fn stop_callback_leaves_position_open() {
        let mut s = started(5.0, 5.0, 100.0);
        let event = TickEvent::new(Tick::from_bid(130.0), PositionStatus::Long);
        assert_eq!(s.on_stop(&event), OrderIntent::None);
    }

    #[test]
    fn params_round_trip() {
        let s = TrailingStoploss::from_params(&[3.0, 7.0]).unwrap();
        assert_eq!(s.params(), vec![3.0, 7.0]);
        assert!(TrailingStoploss::from_params(&[3.0]).is_err());
        assert!(TrailingStoploss::from_params(&[3.0, 7.0, 1.0]).is_err());
    }
}
