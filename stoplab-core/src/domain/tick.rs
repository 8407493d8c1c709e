//! Tick derivation: bid from a bar price, ask one spread step above.

use serde::{Deserialize, Serialize};

/// Minimum price increment for a given price level.
///
/// A fixed staircase: 0.10 above 100, 0.05 above 50, 0.02 above 20, else 0.01.
pub fn spread_step(price: f64) -> f64 {
    if price > 100.0 {
        0.10
    } else if price > 50.0 {
        0.05
    } else if price > 20.0 {
        0.02
    } else {
        0.01
    }
}

/// Quote seen by the strategy and the execution engine at one step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub bid: f64,
    pub ask: f64,
}

impl Tick {
    /// Build a tick whose ask sits one spread step above `bid`.
    pub fn from_bid(bid: f64) -> Self {
        Self {
            bid,
            ask: bid + spread_step(bid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_staircase_boundaries() {
        assert_eq!(spread_step(150.0), 0.10);
        assert_eq!(spread_step(100.0), 0.05);
        assert_eq!(spread_step(50.01), 0.05);
        assert_eq!(spread_step(50.0), 0.02);
        assert_eq!(spread_step(20.5), 0.02);
        assert_eq!(spread_step(20.0), 0.01);
        assert_eq!(spread_step(0.0), 0.01);
    }

    #[test]
    fn ask_is_never_below_bid() {
        for bid in [0.0, 5.0, 20.0, 21.0, 50.0, 75.0, 100.0, 250.0] {
            let tick = Tick::from_bid(bid);
            assert!(tick.ask >= tick.bid);
        }
    }

    #[test]
    fn ask_adds_one_step() {
        let tick = Tick::from_bid(120.0);
        assert!((tick.ask - 120.10).abs() < 1e-9);
        let tick = Tick::from_bid(10.0);
        assert!((tick.ask - 10.01).abs() < 1e-9);
    }
}
