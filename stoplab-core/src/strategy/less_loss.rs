//! LessLoss: trailing exit with a proposed stoploss that creeps up while
//! the price drifts sideways.
//!
//! While long and below the running high but above the committed stop, the
//! proposal moves to a quarter of the way from the stop toward the high.
//! A close below either the stop or the proposal exits, and the proposal
//! becomes the committed stop for the next entry.

use super::{
    expect_params, BarClosedEvent, OrderIntent, Ratchet, StartEvent, StopEvent, Strategy,
    StrategyError, StrategyKind,
};
use crate::domain::PositionStatus;

#[derive(Debug, Clone)]
pub struct LessLoss {
    buy_pct: f64,
    sell_pct: f64,
    furthest_bid: f64,
    stoploss: Ratchet,
    proposal: Ratchet,
}

impl LessLoss {
    pub fn new(buy_pct: f64, sell_pct: f64) -> Self {
        Self {
            buy_pct,
            sell_pct,
            furthest_bid: 0.0,
            stoploss: Ratchet::default(),
            proposal: Ratchet::default(),
        }
    }

    pub fn from_params(params: &[f64]) -> Result<Self, StrategyError> {
        let [buy_pct, sell_pct] = expect_params(StrategyKind::LessLoss, params)?;
        Ok(Self::new(buy_pct, sell_pct))
    }

    pub fn furthest_bid(&self) -> f64 {
        self.furthest_bid
    }

    pub fn stoploss(&self) -> f64 {
        self.stoploss.level()
    }

    pub fn proposal_stoploss(&self) -> f64 {
        self.proposal.level()
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
            let stop = self.stoploss.tighten_down(bid * self.buy_factor());
            self.proposal.reset(stop);
        }

        if bid > self.stoploss.level() {
            self.furthest_bid = bid;
            return OrderIntent::OpenPosition;
        }

        OrderIntent::None
    }

    fn on_long(&mut self, bid: f64) -> OrderIntent {
        if bid > self.furthest_bid {
            self.furthest_bid = bid;
            let stop = self.stoploss.tighten_up(bid * self.sell_factor());
            self.proposal.tighten_up(stop);
        } else if bid > self.stoploss.level() {
            let drift = (self.furthest_bid + 3.0 * self.stoploss.level()) / 4.0;
            self.proposal.tighten_up(drift);
        }

        if bid < self.stoploss.level() || bid < self.proposal.level() {
            self.furthest_bid = bid;
            self.stoploss.reset(self.proposal.level());
            return OrderIntent::ClosePosition;
        }

        OrderIntent::None
    }
}

impl Strategy for LessLoss {
    fn name(&self) -> &'static str {
        "less_loss"
    }

    fn on_start(&mut self, event: &StartEvent) -> OrderIntent {
        self.furthest_bid = event.bid;
        self.stoploss.reset(event.bid * self.buy_factor());
        self.proposal.reset(0.0);
        OrderIntent::None
    }

    fn on_bar_closed(&mut self, event: &BarClosedEvent<'_>) -> OrderIntent {
        match event.position {
            PositionStatus::Flat => self.on_flat(event.bid),
            PositionStatus::Long => self.on_long(event.bid),
        }
    }

    fn on_stop(&mut self, _event: &StopEvent) -> OrderIntent {
        OrderIntent::ClosePosition
    }

    fn params(&self) -> Vec<f64> {
        vec![self.buy_pct, self.sell_pct]
    }
}
