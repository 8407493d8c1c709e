//! OCO: one-cancels-other exit bands with random re-entry.
//!
//! Opens immediately at start with an upper and a lower band around the
//! entry bid. While long, leaving either band closes the position. While
//! flat, a coin flip on each bar decides whether to re-enter with fresh bands.
//!
//! The coin is an injected [`Rng`]; the factory supplies a seeded [`StdRng`]
//! so that runs are reproducible.

use super::{
    expect_params, BarClosedEvent, OrderIntent, StartEvent, StopEvent, Strategy, StrategyError,
    StrategyKind,
};
use crate::domain::PositionStatus;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone)]
pub struct Oco<R = StdRng> {
    upper_pct: f64,
    lower_pct: f64,
    upper_band: f64,
    lower_band: f64,
    rng: R,
}

impl Oco<StdRng> {
    pub fn new(upper_pct: f64, lower_pct: f64, seed: u64) -> Self {
        Self::with_rng(upper_pct, lower_pct, StdRng::seed_from_u64(seed))
    }

    pub fn from_params(params: &[f64], seed: u64) -> Result<Self, StrategyError> {
        let [upper_pct, lower_pct] = expect_params(StrategyKind::Oco, params)?;
        Ok(Self::new(upper_pct, lower_pct, seed))
    }
}

impl<R: Rng> Oco<R> {
    pub fn with_rng(upper_pct: f64, lower_pct: f64, rng: R) -> Self {
        Self {
            upper_pct,
            lower_pct,
            upper_band: 0.0,
            lower_band: 0.0,
            rng,
        }
    }

    pub fn upper_band(&self) -> f64 {
        self.upper_band
    }

    pub fn lower_band(&self) -> f64 {
        self.lower_band
    }

    fn set_bands(&mut self, bid: f64) {
        self.upper_band = bid * (1.0 + self.upper_pct / 100.0);
        self.lower_band = bid * (1.0 - self.lower_pct / 100.0);
    }
}

impl<R: Rng + Send> Strategy for Oco<R> {
    fn name(&self) -> &'static str {
        "oco"
    }

    fn on_start(&mut self, event: &StartEvent) -> OrderIntent {
        self.set_bands(event.bid);
        OrderIntent::OpenPosition
    }

    fn on_bar_closed(&mut self, event: &BarClosedEvent<'_>) -> OrderIntent {
        let bid = event.bid;
        match event.position {
            PositionStatus::Flat => {
                if self.rng.gen_bool(0.5) {
                    self.set_bands(bid);
                    return OrderIntent::OpenPosition;
                }
            }
            PositionStatus::Long => {
                if bid < self.lower_band || bid > self.upper_band {
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
        vec![self.upper_pct, self.lower_pct]
    }
}
