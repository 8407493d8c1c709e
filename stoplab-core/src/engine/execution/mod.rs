//! Execution engine: applies an order intent to the account.
//!
//! Stateless apart from configuration. Opening buys as many whole shares
//! as the cash covers; closing sells them all. An open while long or a
//! close while flat is a no-op and produces no record.

pub mod cost_model;

pub use cost_model::CostModel;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{AccountState, OrderSide, PositionStatus, Tick, TradeRecord};
use crate::strategy::OrderIntent;

/// What an open does when the cash does not cover a single share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroSharePolicy {
    /// Mark the account long with zero shares and record the trade.
    #[default]
    MarkLong,
    /// Treat the open as a no-op; the account stays flat.
    Skip,
}

#[derive(Debug, Clone, Default)]
pub struct ExecutionEngine {
    cost_model: CostModel,
    zero_share_policy: ZeroSharePolicy,
}

impl ExecutionEngine {
    pub fn new(cost_model: CostModel, zero_share_policy: ZeroSharePolicy) -> Self {
        Self {
            cost_model,
            zero_share_policy,
        }
    }

    pub fn zero_share_policy(&self) -> ZeroSharePolicy {
        self.zero_share_policy
    }

    /// Apply `intent` at `tick`. Returns the trade record when an order executed.
    pub fn execute(
        &self,
        intent: OrderIntent,
        tick: Tick,
        bar_index: usize,
        account: &mut AccountState,
    ) -> Option<TradeRecord> {
        let record = match intent {
            OrderIntent::None => None,
            OrderIntent::OpenPosition => self.open(tick, bar_index, account),
            OrderIntent::ClosePosition => self.close(tick, bar_index, account),
        };

        if let Some(trade) = &record {
            debug!(
                bar = trade.bar_index,
                side = ?trade.side,
                bid = trade.bid,
                fill = trade.fill_price,
                shares = trade.shares_after,
                balance = trade.balance_after,
                net_worth = trade.net_worth,
                "order executed"
            );
        }

        self.verify_account(account);
        record
    }

    fn open(&self, tick: Tick, bar_index: usize, account: &mut AccountState) -> Option<TradeRecord> {
        if account.position != PositionStatus::Flat {
            return None;
        }

        let fill = self.cost_model.fill_price(OrderSide::Buy, tick);
        let mut shares = (account.cash / fill).floor().max(0.0) as u64;
        // Rounding in the division can overshoot the cash by one share
        if shares > 0 && shares as f64 * fill > account.cash {
            shares -= 1;
        }

        if shares == 0 && self.zero_share_policy == ZeroSharePolicy::Skip {
            return None;
        }

        account.cash -= shares as f64 * fill;
        account.shares = shares;
        account.position = PositionStatus::Long;

        Some(Self::record(OrderSide::Buy, tick, fill, bar_index, account))
    }

    fn close(&self, tick: Tick, bar_index: usize, account: &mut AccountState) -> Option<TradeRecord> {
        if account.position != PositionStatus::Long {
            return None;
        }

        let fill = self.cost_model.fill_price(OrderSide::Sell, tick);
        account.cash += account.shares as f64 * fill;
        account.shares = 0;
        account.position = PositionStatus::Flat;

        Some(Self::record(OrderSide::Sell, tick, fill, bar_index, account))
    }

    fn record(
        side: OrderSide,
        tick: Tick,
        fill_price: f64,
        bar_index: usize,
        account: &AccountState,
    ) -> TradeRecord {
        TradeRecord {
            bar_index,
            bid: tick.bid,
            balance_after: account.cash,
            fill_price,
            shares_after: account.shares,
            side,
            net_worth: account.net_worth(tick.bid),
        }
    }

    /// Panics in debug builds if the account is left in an invalid state.
    fn verify_account(&self, account: &AccountState) {
        #[cfg(debug_assertions)]
        {
            assert!(
                account.cash >= -1e-9,
                "cash went negative: {}",
                account.cash
            );
            if account.position == PositionStatus::Flat {
                assert_eq!(account.shares, 0, "flat account holds shares");
            }
            if self.zero_share_policy == ZeroSharePolicy::Skip && account.is_long() {
                assert!(account.shares > 0, "long account holds no shares");
            }
        }
        #[cfg(not(debug_assertions))]
        let _ = account;
    }
}
