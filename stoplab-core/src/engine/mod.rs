//! Simulation engine: replays bars through a strategy and an account.
//!
//! One run is a synthetic start tick (first open), one tick per bar close
//! and a synthetic stop tick (last close). Each strategy intent is handed
//! to the [`ExecutionEngine`], which mutates the account and logs a trade.

pub mod execution;
pub mod loop_runner;
pub mod state;

pub use execution::{CostModel, ExecutionEngine, ZeroSharePolicy};
pub use loop_runner::run_backtest;
pub use state::{EngineConfig, RunResult};

/// Errors raised by the simulation engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("bar sequence is empty")]
    EmptyInput,
    #[error("invalid engine config: {0}")]
    InvalidConfig(String),
}
