//! Stochastic RSI Strategy
//!
//! Long entries come from the oversold side (lower line), short entries from
//! the overbought side (upper line), either as a crossing or as a level.

mod config;

pub use config::{StochasticRsiConfig, TriggerMode};

use crate::error::ConfigError;
use crate::indicators::CLOSE;
use crate::signal::{Condition, SignalRules};
use crate::Direction;

pub const NAME: &str = "stochastic_rsi";

/// Create rules from preset parameters (called by registry)
pub fn create(params: &serde_json::Value, direction: Direction) -> Result<SignalRules, ConfigError> {
    let config: StochasticRsiConfig = super::parse_params(NAME, params)?;
    if config.lower_line >= config.upper_line {
        return Err(ConfigError::InvalidStrategyParams {
            name: NAME.to_string(),
            reason: format!(
                "lower_line ({}) must be below upper_line ({})",
                config.lower_line, config.upper_line
            ),
        });
    }
    Ok(rules(&config, direction))
}

pub fn rules(config: &StochasticRsiConfig, direction: Direction) -> SignalRules {
    let d = config.stoch_d_series.as_str();

    let trigger = match (direction, config.mode) {
        (Direction::Long, TriggerMode::Cross) => Condition::crosses_above(d, config.lower_line),
        (Direction::Long, TriggerMode::Level) => Condition::at_or_below(d, config.lower_line),
        (Direction::Short, TriggerMode::Cross) => Condition::crosses_below(d, config.upper_line),
        (Direction::Short, TriggerMode::Level) => Condition::at_or_above(d, config.upper_line),
    };
    let mut rules = SignalRules::new(direction, trigger);

    if let Some(sma) = config.filter_series.as_deref() {
        rules = rules.with_entry_filter(match direction {
            Direction::Long => Condition::above(CLOSE, sma),
            Direction::Short => Condition::below(CLOSE, sma),
        });
    }

    if config.exit_on_cross {
        rules = rules.with_exit_trigger(match direction {
            Direction::Long => Condition::crosses_below(d, config.upper_line),
            Direction::Short => Condition::crosses_above(d, config.lower_line),
        });
    }
    rules
}
