//! Strategies: stateful rule sets that decide when to open or close the position.
//!
//! The engine drives every strategy through three lifecycle callbacks and
//! routes the returned [`OrderIntent`] to the execution engine. Strategies
//! never see the account; they receive the current tick and position status
//! and keep their own thresholds between calls.
//!
//! ## Concrete implementations
//!
//! - [`Unit`]: buy on the first tick, sell on the last
//! - [`TrailingStoploss`]: trailing entry/exit thresholds, reset on every transition
//! - [`Ott`]: trailing thresholds that keep ratcheting across transitions
//! - [`LessLoss`]: trailing exit plus a proposed stoploss that creeps up during sideways drift
//! - [`Oco`]: random re-entry with fixed upper/lower exit bands

pub mod factory;
pub mod less_loss;
pub mod oco;
pub mod ott;
pub mod ratchet;
pub mod trailing_stoploss;
pub mod unit;

pub use factory::{StrategyKind, StrategySpec};
pub use less_loss::LessLoss;
pub use oco::Oco;
pub use ott::Ott;
pub use ratchet::Ratchet;
pub use trailing_stoploss::TrailingStoploss;
pub use unit::Unit;

use crate::domain::{Bar, PositionStatus, Tick};
use serde::{Deserialize, Serialize};

/// What the strategy wants the engine to do at the current tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrderIntent {
    #[default]
    None,
    OpenPosition,
    ClosePosition,
}

/// Market snapshot passed to `on_start` and `on_stop`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickEvent {
    pub bid: f64,
    pub ask: f64,
    pub position: PositionStatus,
}

impl TickEvent {
    pub fn new(tick: Tick, position: PositionStatus) -> Self {
        Self {
            bid: tick.bid,
            ask: tick.ask,
            position,
        }
    }
}

pub type StartEvent = TickEvent;
pub type StopEvent = TickEvent;

/// Market snapshot passed to `on_bar_closed`.
#[derive(Debug, Clone, Copy)]
pub struct BarClosedEvent<'a> {
    pub bid: f64,
    pub ask: f64,
    pub bar: &'a Bar,
    pub position: PositionStatus,
}

impl<'a> BarClosedEvent<'a> {
    pub fn new(tick: Tick, bar: &'a Bar, position: PositionStatus) -> Self {
        Self {
            bid: tick.bid,
            ask: tick.ask,
            bar,
            position,
        }
    }
}

/// Errors raised while constructing a strategy.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StrategyError {
    #[error("{kind} expects {expected} parameter(s), got {got}")]
    InvalidParameterCount {
        kind: StrategyKind,
        expected: usize,
        got: usize,
    },
    #[error("Unknown strategy type: {0}")]
    UnknownKind(String),
}

/// Trait for trading strategies.
///
/// # Contract
/// - Every callback returns a fresh intent; the engine consumes it once.
/// - `position` in the event is the engine's view of the account, never
///   recomputed by the strategy.
/// - The engine silently ignores an open while long or a close while flat.
pub trait Strategy: Send {
    /// Human-readable name (e.g., "trailing_stoploss").
    fn name(&self) -> &'static str;

    /// Called once with a tick built from the first bar's open.
    fn on_start(&mut self, event: &StartEvent) -> OrderIntent;

    /// Called for every bar with a tick built from its close.
    fn on_bar_closed(&mut self, event: &BarClosedEvent<'_>) -> OrderIntent;

    /// Called once with a tick built from the last bar's close.
    fn on_stop(&mut self, event: &StopEvent) -> OrderIntent;

    /// Construction parameters, in positional order.
    fn params(&self) -> Vec<f64>;
}

/// Validate a positional parameter vector against the arity of `kind`.
pub(crate) fn expect_params<const N: usize>(
    kind: StrategyKind,
    params: &[f64],
) -> Result<[f64; N], StrategyError> {
    <[f64; N]>::try_from(params).map_err(|_| StrategyError::InvalidParameterCount {
        kind,
        expected: N,
        got: params.len(),
    })
}
