//! Factory: turns a `StrategySpec` into a fresh runtime strategy.
//!
//! Every run builds its own instance, so strategy state is never shared
//! between runs or threads. The seed is only consumed by [`Oco`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{LessLoss, Oco, Ott, Strategy, StrategyError, TrailingStoploss, Unit};

/// Closed set of strategy families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Unit,
    TrailingStoploss,
    Ott,
    LessLoss,
    Oco,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 5] = [
        StrategyKind::Unit,
        StrategyKind::TrailingStoploss,
        StrategyKind::Ott,
        StrategyKind::LessLoss,
        StrategyKind::Oco,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Unit => "unit",
            StrategyKind::TrailingStoploss => "trailing_stoploss",
            StrategyKind::Ott => "ott",
            StrategyKind::LessLoss => "less_loss",
            StrategyKind::Oco => "oco",
        }
    }

    pub fn param_count(&self) -> usize {
        self.param_names().len()
    }

    pub fn param_names(&self) -> &'static [&'static str] {
        match self {
            StrategyKind::Unit => &[],
            StrategyKind::TrailingStoploss | StrategyKind::Ott | StrategyKind::LessLoss => {
                &["buy_pct", "sell_pct"]
            }
            StrategyKind::Oco => &["upper_pct", "lower_pct"],
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = StrategyError;

    /// Accepts `snake_case`, `kebab-case` and `CamelCase` spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "unit" => Ok(StrategyKind::Unit),
            "trailingstoploss" => Ok(StrategyKind::TrailingStoploss),
            "ott" => Ok(StrategyKind::Ott),
            "lessloss" => Ok(StrategyKind::LessLoss),
            "oco" => Ok(StrategyKind::Oco),
            _ => Err(StrategyError::UnknownKind(s.to_string())),
        }
    }
}

/// Immutable strategy configuration: a kind plus its positional parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySpec {
    pub kind: StrategyKind,
    #[serde(default)]
    pub params: Vec<f64>,
}

impl StrategySpec {
    /// Validate `params` against the arity of `kind`.
    pub fn from_parameter_vector(kind: StrategyKind, params: &[f64]) -> Result<Self, StrategyError> {
        if params.len() != kind.param_count() {
            return Err(StrategyError::InvalidParameterCount {
                kind,
                expected: kind.param_count(),
                got: params.len(),
            });
        }
        Ok(Self {
            kind,
            params: params.to_vec(),
        })
    }

    /// Two-parameter spec as used by grid sweeps. `Unit` drops both values.
    pub fn pair(kind: StrategyKind, a: f64, b: f64) -> Self {
        let params = match kind {
            StrategyKind::Unit => Vec::new(),
            _ => vec![a, b],
        };
        Self { kind, params }
    }

    /// Build a fresh strategy instance.
    pub fn build(&self, seed: u64) -> Result<Box<dyn Strategy>, StrategyError> {
        let params = self.params.as_slice();
        let strategy: Box<dyn Strategy> = match self.kind {
            StrategyKind::Unit => Box::new(Unit::from_params(params)?),
            StrategyKind::TrailingStoploss => Box::new(TrailingStoploss::from_params(params)?),
            StrategyKind::Ott => Box::new(Ott::from_params(params)?),
            StrategyKind::LessLoss => Box::new(LessLoss::from_params(params)?),
            StrategyKind::Oco => Box::new(Oco::from_params(params, seed)?),
        };
        Ok(strategy)
    }

    /// Short label such as `less_loss(5, 2)`.
    pub fn label(&self) -> String {
        let params: Vec<String> = self.params.iter().map(|p| p.to_string()).collect();
        format!("{}({})", self.kind, params.join(", "))
    }
}
