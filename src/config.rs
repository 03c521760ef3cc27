use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{BuiltinStrategy, Result, ScanError};

/// Scanner config file (TOML).
///
/// Example `setupscan.toml`:
/// ```toml
/// validate_data = true
///
/// [[strategy]]
/// type = "turtle_breakout"
///
/// [strategy.params]
/// lookback = 60
/// signal_window = 40
///
/// [[strategy]]
/// type = "breakout"
/// ```
///
/// With no `[[strategy]]` tables the registry gets the default setups.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScannerConfig {
    /// Reject candles with non-finite prices before dispatch.
    #[serde(default = "default_validate_data")]
    pub validate_data: bool,
    #[serde(rename = "strategy", default)]
    pub strategies: Vec<StrategyConfig>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            validate_data: default_validate_data(),
            strategies: Vec::new(),
        }
    }
}

fn default_validate_data() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StrategyConfig {
    /// Strategy key, e.g. "turtle_breakout" or "u_pattern".
    #[serde(rename = "type")]
    pub strategy_type: String,
    /// Parameter overrides; anything not listed keeps its default.
    #[serde(default)]
    pub params: HashMap<String, toml::Value>,
}

impl ScannerConfig {
    /// Load from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

impl StrategyConfig {
    /// Parameter overrides as numbers; TOML integers and floats both work.
    pub fn numeric_params(&self) -> Result<HashMap<&str, f64>> {
        self.params
            .iter()
            .map(|(key, value)| {
                let number = match value {
                    toml::Value::Integer(i) => *i as f64,
                    toml::Value::Float(f) => *f,
                    other => {
                        return Err(ScanError::InvalidConfig(format!(
                            "parameter '{key}' of '{}' must be a number, got {}",
                            self.strategy_type,
                            other.type_str()
                        )))
                    }
                };
                Ok((key.as_str(), number))
            })
            .collect()
    }

    pub fn build(&self) -> Result<BuiltinStrategy> {
        BuiltinStrategy::from_params(&self.strategy_type, &self.numeric_params()?)
    }
}
