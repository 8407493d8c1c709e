//! Serializable backtest configuration, read from TOML.
//!
//! ```toml
//! [backtest]
//! balance = 10000.0
//! commission_pct = 0.15
//! seed = 42
//! zero_share_policy = "mark_long"
//!
//! [strategy]
//! kind = "trailing_stoploss"
//! params = [3.0, 7.0]
//!
//! [[instruments]]
//! symbol = "ARCLK"
//! path = "data/ARCLK.csv"
//!
//! [sweep]
//! rows = { start = 0.5, end = 10.0, step = 0.5 }
//! cols = { start = 0.5, end = 10.0, step = 0.5 }
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use stoplab_core::engine::{EngineConfig, ZeroSharePolicy};
use stoplab_core::strategy::{StrategyError, StrategyKind, StrategySpec};

use crate::data_loader::CsvBarSource;
use crate::range::{permutations, RangeSpec};

/// Errors from loading or validating a config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("invalid strategy: {0}")]
    Strategy(#[from] StrategyError),
}

/// Complete configuration for the `run`, `sweep` and `grid` commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub backtest: BacktestSection,
    pub strategy: StrategySection,
    #[serde(default)]
    pub instruments: Vec<InstrumentConfig>,
    #[serde(default)]
    pub sweep: Option<SweepSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSection {
    #[serde(default = "default_balance")]
    pub balance: f64,
    /// Commission in percent per side.
    #[serde(default)]
    pub commission_pct: f64,
    /// Master seed for the seed hierarchy.
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub zero_share_policy: ZeroSharePolicy,
}

fn default_balance() -> f64 {
    10_000.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySection {
    pub kind: StrategyKind,
    #[serde(default)]
    pub params: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentConfig {
    pub symbol: String,
    pub path: PathBuf,
}

/// Two-dimensional parameter grid: row values are the first strategy
/// parameter, column values the second.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepSection {
    pub rows: RangeSpec,
    pub cols: RangeSpec,
}

impl SweepSection {
    pub fn row_values(&self) -> Vec<f64> {
        self.rows.values()
    }

    pub fn col_values(&self) -> Vec<f64> {
        self.cols.values()
    }

    /// Every `[row, col]` pair in row-major order.
    pub fn param_tuples(&self) -> Vec<Vec<f64>> {
        permutations(&[self.row_values(), self.col_values()])
    }
}

impl BacktestConfig {
    /// Load a config from a TOML file. Relative instrument paths resolve
    /// against the config file's directory.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&content)?;
        if let Some(dir) = path.parent() {
            for instrument in &mut config.instruments {
                if instrument.path.is_relative() {
                    instrument.path = dir.join(&instrument.path);
                }
            }
        }
        Ok(config)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine_config()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if self.instruments.is_empty() {
            return Err(ConfigError::Invalid("at least one [[instruments]] entry is required".into()));
        }
        let mut seen = HashSet::new();
        for instrument in &self.instruments {
            if !seen.insert(instrument.symbol.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate instrument '{}'",
                    instrument.symbol
                )));
            }
        }

        match &self.sweep {
            Some(sweep) => {
                if sweep.row_values().is_empty() || sweep.col_values().is_empty() {
                    return Err(ConfigError::Invalid("[sweep] ranges must not be empty".into()));
                }
                // Grid runs only use the kind; explicit params must still fit it
                if !self.strategy.params.is_empty() {
                    self.strategy_spec()?;
                }
            }
            None => {
                self.strategy_spec()?;
            }
        }
        Ok(())
    }

    /// The single-run strategy described by `[strategy]`.
    pub fn strategy_spec(&self) -> Result<StrategySpec, StrategyError> {
        StrategySpec::from_parameter_vector(self.strategy.kind, &self.strategy.params)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::new(self.backtest.balance, self.backtest.commission_pct)
            .with_zero_share_policy(self.backtest.zero_share_policy)
    }

    pub fn symbols(&self) -> Vec<&str> {
        self.instruments.iter().map(|i| i.symbol.as_str()).collect()
    }

    /// A bar source that knows every configured instrument's file.
    pub fn bar_source(&self) -> CsvBarSource {
        self.instruments
            .iter()
            .fold(CsvBarSource::new(), |source, i| source.with_path(&i.symbol, &i.path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[backtest]
balance = 10000.0
commission_pct = 0.15

[strategy]
kind = "trailing_stoploss"
params = [3.0, 7.0]

[[instruments]]
symbol = "ARCLK"
path = "ARCLK.csv"
"#;

    #[test]
    fn parses_minimal_config() {
        let config = BacktestConfig::from_toml(MINIMAL).unwrap();
        assert_eq!(config.backtest.balance, 10_000.0);
        assert_eq!(config.backtest.seed, 0);
        assert_eq!(config.backtest.zero_share_policy, ZeroSharePolicy::MarkLong);
        assert_eq!(config.strategy.kind, StrategyKind::TrailingStoploss);
        assert_eq!(config.symbols(), vec!["ARCLK"]);
        assert!(config.sweep.is_none());

        let spec = config.strategy_spec().unwrap();
        assert_eq!(spec.params, vec![3.0, 7.0]);
        assert_eq!(config.engine_config().commission_pct, 0.15);
    }

    #[test]
    fn parses_sweep_section() {
        let toml = format!(
            "{MINIMAL}\n[sweep]\nrows = {{ start = 1.0, end = 2.0, step = 1.0 }}\ncols = {{ start = 5.0, end = 6.0, step = 0.5 }}\n"
        );
        let config = BacktestConfig::from_toml(&toml).unwrap();
        let sweep = config.sweep.unwrap();
        assert_eq!(sweep.row_values(), vec![1.0, 2.0]);
        assert_eq!(sweep.col_values(), vec![5.0, 5.5, 6.0]);
        assert_eq!(sweep.param_tuples().len(), 6);
        assert_eq!(sweep.param_tuples()[1], vec![1.0, 5.5]);
    }

    #[test]
    fn rejects_wrong_param_count() {
        let toml = MINIMAL.replace("params = [3.0, 7.0]", "params = [3.0]");
        assert!(matches!(
            BacktestConfig::from_toml(&toml),
            Err(ConfigError::Strategy(StrategyError::InvalidParameterCount { .. }))
        ));
    }

    #[test]
    fn rejects_unknown_kind() {
        let toml = MINIMAL.replace("trailing_stoploss", "martingale");
        assert!(matches!(BacktestConfig::from_toml(&toml), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn rejects_bad_numbers() {
        let toml = MINIMAL.replace("balance = 10000.0", "balance = -5.0");
        assert!(matches!(BacktestConfig::from_toml(&toml), Err(ConfigError::Invalid(_))));

        let toml = MINIMAL.replace("commission_pct = 0.15", "commission_pct = 150.0");
        assert!(matches!(BacktestConfig::from_toml(&toml), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_missing_and_duplicate_instruments() {
        let (head, _) = MINIMAL.split_at(MINIMAL.find("[[instruments]]").unwrap());
        assert!(matches!(BacktestConfig::from_toml(head), Err(ConfigError::Invalid(_))));

        let toml = format!("{MINIMAL}\n[[instruments]]\nsymbol = \"ARCLK\"\npath = \"other.csv\"\n");
        assert!(matches!(BacktestConfig::from_toml(&toml), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn grid_config_may_omit_params() {
        let toml = MINIMAL.replace("params = [3.0, 7.0]", "")
            + "\n[sweep]\nrows = { start = 1.0, end = 2.0, step = 1.0 }\ncols = { start = 1.0, end = 2.0, step = 1.0 }\n";
        let config = BacktestConfig::from_toml(&toml).unwrap();
        assert!(config.strategy.params.is_empty());
    }

    #[test]
    fn rejects_empty_sweep_range() {
        let toml = format!(
            "{MINIMAL}\n[sweep]\nrows = {{ start = 2.0, end = 1.0, step = 1.0 }}\ncols = {{ start = 1.0, end = 2.0, step = 1.0 }}\n"
        );
        assert!(matches!(BacktestConfig::from_toml(&toml), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn defaults_apply() {
        let toml = r#"
[backtest]

[strategy]
kind = "unit"

[[instruments]]
symbol = "X"
path = "x.csv"
"#;
        let config = BacktestConfig::from_toml(toml).unwrap();
        assert_eq!(config.backtest.balance, 10_000.0);
        assert_eq!(config.backtest.commission_pct, 0.0);
    }
}
