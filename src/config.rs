//! Configuration management
//!
//! A configuration file names a strategy preset, its free-form parameters and
//! the flat set of engine parameters:
//!
//! ```json
//! {
//!   "strategy_name": "macd",
//!   "direction": "short",
//!   "strategy": { "filter_series": "sma_130" },
//!   "symbol": "ES",
//!   "tick_size": 0.25,
//!   "point_value": 50,
//!   "stop_loss_amount": 4000,
//!   "take_profit_amount": 6000
//! }
//! ```
//!
//! Everything is resolved and validated once into an [`EngineConfig`]; an
//! engine never changes its configuration afterwards.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::events::DEFAULT_EVENT_LOG_CAPACITY;
use crate::oms::{BreakevenRule, OrderPlan, StopRule};
use crate::risk::DEFAULT_MAX_LEVEL_STEPS;
use crate::signal::SignalRules;
use crate::strategies;
use crate::{Direction, Money, Symbol};

/// Main configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_strategy_name")]
    pub strategy_name: String,

    #[serde(default = "default_direction")]
    pub direction: Direction,

    /// Preset parameters, parsed by the preset's own config type
    #[serde(default = "empty_object")]
    pub strategy: serde_json::Value,

    #[serde(flatten)]
    pub engine: EngineParams,
}

fn default_strategy_name() -> String {
    "stochastic".to_string()
}

fn default_direction() -> Direction {
    Direction::Long
}

fn empty_object() -> serde_json::Value {
    serde_json::json!({})
}

impl Config {
    /// Load configuration from JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config JSON {}", path.display()))?;
        Ok(config)
    }

    /// Resolve the preset into signal rules and validate everything
    pub fn engine_config(&self) -> Result<EngineConfig, ConfigError> {
        let rules = strategies::create_rules(&self.strategy_name, &self.strategy, self.direction)?;
        let config = EngineConfig {
            strategy_name: self.strategy_name.clone(),
            params: self.engine.clone(),
            rules,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Flat named engine parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineParams {
    pub symbol: String,

    /// Minimum price increment; every order price is a multiple of it
    pub tick_size: Money,

    /// Money per one-point price move of one contract
    pub point_value: Money,

    #[serde(default = "default_quantity")]
    pub quantity: u32,

    #[serde(default = "default_quantity")]
    pub max_open_position: u32,

    /// Initial stop at the level losing this amount
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_loss_amount: Option<Money>,

    /// Initial stop this many percent away from the close
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_loss_pct: Option<f64>,

    /// Exit once the close reaches the level gaining this amount
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub take_profit_amount: Option<Money>,

    /// Favorable move, in percent of entry, that shifts the stop to breakeven
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakeven_trigger_pct: Option<f64>,

    #[serde(default = "default_breakeven_offset_ticks")]
    pub breakeven_offset_ticks: u32,

    /// Percent stop used when the amount-based search finds no level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_stop_pct: Option<f64>,

    #[serde(default = "default_max_level_steps")]
    pub max_level_steps: u32,

    #[serde(default = "default_event_log_capacity")]
    pub event_log_capacity: usize,
}

fn default_quantity() -> u32 {
    1
}
fn default_breakeven_offset_ticks() -> u32 {
    100
}
fn default_max_level_steps() -> u32 {
    DEFAULT_MAX_LEVEL_STEPS
}
fn default_event_log_capacity() -> usize {
    DEFAULT_EVENT_LOG_CAPACITY
}

impl EngineParams {
    /// Parameters with defaults and no stop rule yet
    pub fn new(symbol: impl Into<String>, tick_size: Money, point_value: Money) -> Self {
        Self {
            symbol: symbol.into(),
            tick_size,
            point_value,
            quantity: default_quantity(),
            max_open_position: default_quantity(),
            stop_loss_amount: None,
            stop_loss_pct: None,
            take_profit_amount: None,
            breakeven_trigger_pct: None,
            breakeven_offset_ticks: default_breakeven_offset_ticks(),
            fallback_stop_pct: None,
            max_level_steps: default_max_level_steps(),
            event_log_capacity: default_event_log_capacity(),
        }
    }

    pub fn with_stop_loss_amount(mut self, amount: Money) -> Self {
        self.stop_loss_amount = Some(amount);
        self
    }

    pub fn with_stop_loss_pct(mut self, pct: f64) -> Self {
        self.stop_loss_pct = Some(pct);
        self
    }

    pub fn with_take_profit_amount(mut self, amount: Money) -> Self {
        self.take_profit_amount = Some(amount);
        self
    }

    pub fn with_breakeven(mut self, trigger_pct: f64, offset_ticks: u32) -> Self {
        self.breakeven_trigger_pct = Some(trigger_pct);
        self.breakeven_offset_ticks = offset_ticks;
        self
    }

    pub fn with_fallback_stop_pct(mut self, pct: f64) -> Self {
        self.fallback_stop_pct = Some(pct);
        self
    }

    pub fn with_quantity(mut self, quantity: u32, max_open_position: u32) -> Self {
        self.quantity = quantity;
        self.max_open_position = max_open_position;
        self
    }

    pub fn with_max_level_steps(mut self, steps: u32) -> Self {
        self.max_level_steps = steps;
        self
    }

    pub fn with_event_log_capacity(mut self, capacity: usize) -> Self {
        self.event_log_capacity = capacity;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbol.trim().is_empty() {
            return Err(ConfigError::MissingField("symbol"));
        }
        positive_money("tick_size", self.tick_size)?;
        positive_money("point_value", self.point_value)?;

        if self.quantity == 0 {
            return Err(ConfigError::ZeroQuantity);
        }
        if self.quantity > self.max_open_position {
            return Err(ConfigError::QuantityExceedsMax {
                quantity: self.quantity,
                max: self.max_open_position,
            });
        }

        match (self.stop_loss_amount, self.stop_loss_pct) {
            (Some(_), Some(_)) => return Err(ConfigError::ConflictingStopRules),
            (None, None) => return Err(ConfigError::NoStopRule),
            (Some(amount), None) => positive_money("stop_loss_amount", amount)?,
            (None, Some(pct)) => percent("stop_loss_pct", pct)?,
        }

        if let Some(amount) = self.take_profit_amount {
            positive_money("take_profit_amount", amount)?;
        }
        if let Some(pct) = self.breakeven_trigger_pct {
            if !(pct.is_finite() && pct > 0.0) {
                return Err(ConfigError::NonPositive {
                    name: "breakeven_trigger_pct",
                    value: pct.to_string(),
                });
            }
        }
        if let Some(pct) = self.fallback_stop_pct {
            percent("fallback_stop_pct", pct)?;
        }
        if self.max_level_steps == 0 {
            return Err(ConfigError::NonPositive {
                name: "max_level_steps",
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    /// Order sizing and risk rules for the lifecycle. Call after `validate`.
    pub fn order_plan(&self) -> Result<OrderPlan, ConfigError> {
        let stop = match (self.stop_loss_amount, self.stop_loss_pct) {
            (Some(amount), None) => StopRule::Amount(amount),
            (None, Some(pct)) => StopRule::Percent(pct),
            (Some(_), Some(_)) => return Err(ConfigError::ConflictingStopRules),
            (None, None) => return Err(ConfigError::NoStopRule),
        };
        Ok(OrderPlan {
            symbol: Symbol::new(&self.symbol),
            quantity: self.quantity,
            tick_size: self.tick_size,
            point_value: self.point_value,
            stop,
            fallback_stop_pct: self.fallback_stop_pct,
            take_profit_amount: self.take_profit_amount,
            breakeven: self.breakeven_trigger_pct.map(|trigger_pct| BreakevenRule {
                trigger_pct,
                offset_ticks: self.breakeven_offset_ticks,
            }),
            max_level_steps: self.max_level_steps,
        })
    }
}

fn positive_money(name: &'static str, value: Money) -> Result<(), ConfigError> {
    if value.is_positive() {
        Ok(())
    } else {
        Err(ConfigError::NonPositive {
            name,
            value: value.to_string(),
        })
    }
}

fn percent(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 && value < 100.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            range: "(0, 100)",
            value: value.to_string(),
        })
    }
}

/// Fully resolved, validated configuration of one engine instance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineConfig {
    pub strategy_name: String,
    pub params: EngineParams,
    pub rules: SignalRules,
}

impl EngineConfig {
    pub fn new(params: EngineParams, rules: SignalRules) -> Self {
        Self {
            strategy_name: strategies::CUSTOM.to_string(),
            params,
            rules,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.params.validate()?;
        self.rules.validate()
    }

    pub fn direction(&self) -> Direction {
        self.rules.direction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::Condition;
    use rust_decimal_macros::dec;

    fn params() -> EngineParams {
        EngineParams::new("ES", Money::from(dec!(0.25)), Money::from(dec!(20)))
            .with_stop_loss_amount(Money::from(dec!(3000)))
    }

    #[test]
    fn test_valid_params() {
        assert!(params().validate().is_ok());
        let plan = params().order_plan().unwrap();
        assert_eq!(plan.stop, StopRule::Amount(Money::from(dec!(3000))));
        assert!(plan.breakeven.is_none());
    }

    #[test]
    fn test_rejects_bad_grid() {
        let mut p = params();
        p.tick_size = Money::ZERO;
        assert!(matches!(
            p.validate(),
            Err(ConfigError::NonPositive { name: "tick_size", .. })
        ));

        let mut p = params();
        p.point_value = Money::from(dec!(-1));
        assert!(matches!(
            p.validate(),
            Err(ConfigError::NonPositive { name: "point_value", .. })
        ));
    }

    #[test]
    fn test_stop_rules() {
        let none = EngineParams::new("ES", Money::from(dec!(0.25)), Money::from(dec!(20)));
        assert_eq!(none.validate(), Err(ConfigError::NoStopRule));

        let both = params().with_stop_loss_pct(2.0);
        assert_eq!(both.validate(), Err(ConfigError::ConflictingStopRules));

        let pct = EngineParams::new("ES", Money::from(dec!(0.25)), Money::from(dec!(20)))
            .with_stop_loss_pct(150.0);
        assert!(matches!(pct.validate(), Err(ConfigError::OutOfRange { .. })));
    }

    #[test]
    fn test_quantity_cap() {
        assert_eq!(
            params().with_quantity(0, 1).validate(),
            Err(ConfigError::ZeroQuantity)
        );
        assert_eq!(
            params().with_quantity(2, 1).validate(),
            Err(ConfigError::QuantityExceedsMax { quantity: 2, max: 1 })
        );
        assert!(params().with_quantity(2, 2).validate().is_ok());
    }

    #[test]
    fn test_flat_json_config() {
        let json = r#"{
            "strategy_name": "stochastic",
            "direction": "short",
            "strategy": {"upper_line": 80, "lower_line": 20},
            "symbol": "ES",
            "tick_size": 0.25,
            "point_value": 50,
            "stop_loss_pct": 2.0,
            "breakeven_trigger_pct": 2.0
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.engine.quantity, 1);
        assert_eq!(config.engine.breakeven_offset_ticks, 100);

        let engine = config.engine_config().unwrap();
        assert_eq!(engine.direction(), Direction::Short);
        let plan = engine.params.order_plan().unwrap();
        assert_eq!(plan.stop, StopRule::Percent(2.0));
        assert_eq!(plan.breakeven.map(|b| b.offset_ticks), Some(100));
    }

    #[test]
    fn test_unknown_strategy() {
        let json = r#"{"strategy_name": "nope", "symbol": "ES", "tick_size": 1, "point_value": 1, "stop_loss_pct": 1}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(matches!(
            config.engine_config(),
            Err(ConfigError::UnknownStrategy { .. })
        ));
    }

    #[test]
    fn test_engine_config_checks_rules() {
        let rules = SignalRules::new(Direction::Long, Condition::all(vec![]));
        let config = EngineConfig::new(params(), rules);
        assert_eq!(config.validate(), Err(ConfigError::EmptyConditionGroup("all")));
    }
}
