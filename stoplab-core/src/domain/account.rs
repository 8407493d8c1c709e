//! Account: cash, share count and position status for a single instrument.

use serde::{Deserialize, Serialize};

/// Whether the account currently holds the instrument. Short selling is not modeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionStatus {
    Flat,
    Long,
}

/// Cash and position state mutated by the execution engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountState {
    pub cash: f64,
    pub shares: u64,
    pub position: PositionStatus,
}

impl AccountState {
    pub fn new(initial_balance: f64) -> Self {
        Self {
            cash: initial_balance,
            shares: 0,
            position: PositionStatus::Flat,
        }
    }

    /// Mark-to-market value at `bid`.
    pub fn net_worth(&self, bid: f64) -> f64 {
        self.cash + self.shares as f64 * bid
    }

    pub fn is_long(&self) -> bool {
        self.position == PositionStatus::Long
    }
}
