//! StopLab Core: domain types, strategies, execution and the simulation loop.
//!
//! This crate contains the heart of the backtester:
//! - Domain types (bars, ticks, account state, trade and valuation records)
//! - Strategy trait, the five stoploss strategies and their factory
//! - Execution engine with commission and zero-share policy
//! - Tick-by-tick simulation loop
//! - Deterministic seed hierarchy for randomized strategies

pub mod domain;
pub mod engine;
pub mod rng;
pub mod strategy;
