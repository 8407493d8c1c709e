//! Cost model: commission folded into the fill price.
//!
//! Buyers pay `ask * (1 + rate)`, sellers receive `bid * (1 - rate)`,
//! with `rate = commission_pct / 100`.

use crate::domain::{OrderSide, Tick};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostModel {
    /// Commission in percent per side (0.1 means 0.1%).
    pub commission_pct: f64,
}

impl CostModel {
    pub fn new(commission_pct: f64) -> Self {
        Self { commission_pct }
    }

    pub fn frictionless() -> Self {
        Self::new(0.0)
    }

    pub fn rate(&self) -> f64 {
        self.commission_pct / 100.0
    }

    /// Per-share fill price for `side` at `tick`, commission included.
    pub fn fill_price(&self, side: OrderSide, tick: Tick) -> f64 {
        match side {
            OrderSide::Buy => tick.ask * (1.0 + self.rate()),
            OrderSide::Sell => tick.bid * (1.0 - self.rate()),
        }
    }
}

impl Default for CostModel {
    fn default() -> Self {
        Self::frictionless()
    }
}
