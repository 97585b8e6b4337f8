//! Configuration structures for the backtest core.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::Quantity;

/// Main configuration for a backtest run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Order book / signal configuration.
    pub book: BookConfig,
    /// Simulator configuration.
    pub simulator: SimulatorConfig,
    /// Reference strategy configuration.
    pub strategy: StrategyConfig,
}

impl Config {
    /// Parse a configuration from JSON. Missing sections fall back to defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.book.imbalance_depth == 0 {
            return Err(Error::config("book.imbalance_depth must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.strategy.entry_imbalance) {
            return Err(Error::config(format!(
                "strategy.entry_imbalance must be within [0, 1], got {}",
                self.strategy.entry_imbalance
            )));
        }
        if self.strategy.order_quantity <= 0 {
            return Err(Error::config("strategy.order_quantity must be positive"));
        }
        if self.strategy.max_active_orders == 0 {
            return Err(Error::config("strategy.max_active_orders must be at least 1"));
        }
        Ok(())
    }
}

/// Order book configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BookConfig {
    /// Levels per side summed for volume imbalance (1 = top of book).
    pub imbalance_depth: usize,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self { imbalance_depth: 1 }
    }
}

/// Backtest simulator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Accept locked/crossed raw ticks instead of rejecting them.
    pub allow_crossed_ticks: bool,
    /// Keep every rejection for later inspection.
    pub record_rejections: bool,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            allow_crossed_ticks: false,
            record_rejections: true,
        }
    }
}

/// Reference imbalance strategy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Minimum absolute imbalance before the strategy crosses the spread.
    pub entry_imbalance: f64,
    /// Quantity per child order.
    pub order_quantity: Quantity,
    /// Maximum working child orders at once.
    pub max_active_orders: usize,
    /// Maximum child orders over the whole run.
    pub max_child_orders: usize,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            entry_imbalance: 0.2,
            order_quantity: 100,
            max_active_orders: 3,
            max_child_orders: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.book.imbalance_depth, 1);
        assert!(!config.simulator.allow_crossed_ticks);
        assert_eq!(config.strategy.order_quantity, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config = Config::from_json_str(r#"{"book": {"imbalance_depth": 3}}"#).unwrap();
        assert_eq!(config.book.imbalance_depth, 3);
        assert_eq!(config.strategy.max_active_orders, 3);
    }

    #[test]
    fn test_invalid_values() {
        let err = Config::from_json_str(r#"{"book": {"imbalance_depth": 0}}"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = Config::from_json_str(r#"{"strategy": {"entry_imbalance": 1.5}}"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = Config::from_json_str("not json").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
