//! Audit records produced during a run: executed orders and per-bar valuations.

use serde::{Deserialize, Serialize};

/// Direction of an executed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    /// Position opened at the ask plus commission.
    Buy,
    /// Position closed at the bid minus commission.
    Sell,
}

/// One executed (non-no-op) order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Index of the bar being processed; the synthetic stop tick reuses `bars.len()`.
    pub bar_index: usize,
    pub bid: f64,
    /// Cash after the order.
    pub balance_after: f64,
    /// Per-share price including commission.
    pub fill_price: f64,
    pub shares_after: u64,
    pub side: OrderSide,
    /// `balance_after + shares_after * bid`.
    pub net_worth: f64,
}

/// Account value at the close of one bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValuationSample {
    pub bar_index: usize,
    pub net_worth: f64,
}
