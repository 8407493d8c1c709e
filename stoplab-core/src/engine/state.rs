//! Engine configuration and run result types.

use serde::{Deserialize, Serialize};

use super::execution::{CostModel, ExecutionEngine, ZeroSharePolicy};
use super::EngineError;
use crate::domain::{AccountState, TradeRecord, ValuationSample};

/// Configuration for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub initial_balance: f64,
    /// Commission in percent per side.
    pub commission_pct: f64,
    #[serde(default)]
    pub zero_share_policy: ZeroSharePolicy,
}

impl EngineConfig {
    pub fn new(initial_balance: f64, commission_pct: f64) -> Self {
        Self {
            initial_balance,
            commission_pct,
            zero_share_policy: ZeroSharePolicy::default(),
        }
    }

    pub fn with_zero_share_policy(mut self, policy: ZeroSharePolicy) -> Self {
        self.zero_share_policy = policy;
        self
    }

    /// Balance must be positive and finite; commission in `[0, 100)` percent.
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.initial_balance.is_finite() && self.initial_balance > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "balance must be positive, got {}",
                self.initial_balance
            )));
        }
        if !(0.0..100.0).contains(&self.commission_pct) {
            return Err(EngineError::InvalidConfig(format!(
                "commission_pct must be in [0, 100), got {}",
                self.commission_pct
            )));
        }
        Ok(())
    }

    pub fn execution_engine(&self) -> ExecutionEngine {
        ExecutionEngine::new(CostModel::new(self.commission_pct), self.zero_share_policy)
    }
}

/// Result of a complete backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub strategy: String,
    pub params: Vec<f64>,
    pub initial_balance: f64,
    /// Every executed order, in execution order.
    pub trades: Vec<TradeRecord>,
    /// One sample per bar, post-execution.
    pub valuations: Vec<ValuationSample>,
    pub total_orders: usize,
    /// Last valuation sample; the stop tick does not revalue.
    pub final_net_worth: f64,
    /// Account after the stop tick.
    pub final_account: AccountState,
}

impl RunResult {
    pub fn equity_curve(&self) -> Vec<f64> {
        self.valuations.iter().map(|v| v.net_worth).collect()
    }

    /// Final net worth relative to the initial balance.
    pub fn gain(&self) -> f64 {
        if self.initial_balance == 0.0 {
            return 0.0;
        }
        self.final_net_worth / self.initial_balance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_config_defaults_to_mark_long() {
        let config = EngineConfig::new(10_000.0, 0.1);
        assert_eq!(config.zero_share_policy, ZeroSharePolicy::MarkLong);
        let config = config.with_zero_share_policy(ZeroSharePolicy::Skip);
        assert_eq!(config.execution_engine().zero_share_policy(), ZeroSharePolicy::Skip);
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        assert!(EngineConfig::new(1000.0, 0.0).validate().is_ok());
        assert!(EngineConfig::new(1000.0, 99.9).validate().is_ok());
        for config in [
            EngineConfig::new(1000.0, 100.0),
            EngineConfig::new(1000.0, 150.0),
            EngineConfig::new(1000.0, -0.1),
            EngineConfig::new(1000.0, f64::NAN),
            EngineConfig::new(0.0, 0.1),
            EngineConfig::new(-10.0, 0.1),
            EngineConfig::new(f64::INFINITY, 0.1),
        ] {
            assert!(matches!(config.validate(), Err(EngineError::InvalidConfig(_))));
        }
    }

    #[test]
    fn engine_config_deserializes_without_policy() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"initial_balance": 500.0, "commission_pct": 0.2}"#).unwrap();
        assert_eq!(config, EngineConfig::new(500.0, 0.2));
    }

    #[test]
    fn gain_and_equity_curve() {
        let result = RunResult {
            strategy: "unit".into(),
            params: vec![],
            initial_balance: 1000.0,
            trades: vec![],
            valuations: vec![
                ValuationSample { bar_index: 0, net_worth: 1000.0 },
                ValuationSample { bar_index: 1, net_worth: 1200.0 },
            ],
            total_orders: 0,
            final_net_worth: 1200.0,
            final_account: AccountState::new(1200.0),
        };
        assert_eq!(result.equity_curve(), vec![1000.0, 1200.0]);
        assert!((result.gain() - 1.2).abs() < 1e-12);
    }
}
