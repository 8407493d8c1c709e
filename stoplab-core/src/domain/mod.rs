//! Domain types for StopLab

pub mod account;
pub mod bar;
pub mod tick;
pub mod trade;

pub use account::{AccountState, PositionStatus};
pub use bar::Bar;
pub use tick::{spread_step, Tick};
pub use trade::{OrderSide, TradeRecord, ValuationSample};
