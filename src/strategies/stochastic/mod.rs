//! Stochastic Crossing Strategy
//!
//! Long: %D crosses up through the lower line with the close above the filter
//! SMA; closed when %D crosses down through the upper line.
//! Short: %D crosses down through the upper line with the close below the
//! filter SMA; closed when %D crosses down through the lower line.
//!
//! Usually paired with a percent stop and breakeven shift.

mod config;

pub use config::StochasticConfig;

use crate::error::ConfigError;
use crate::indicators::CLOSE;
use crate::signal::{Condition, SignalRules};
use crate::Direction;

pub const NAME: &str = "stochastic";

/// Create rules from preset parameters (called by registry)
pub fn create(params: &serde_json::Value, direction: Direction) -> Result<SignalRules, ConfigError> {
    let config: StochasticConfig = super::parse_params(NAME, params)?;
    Ok(rules(&config, direction))
}

pub fn rules(config: &StochasticConfig, direction: Direction) -> SignalRules {
    let d = config.stoch_d_series.as_str();

    let mut rules = match direction {
        Direction::Long => SignalRules::new(direction, Condition::crosses_above(d, config.lower_line))
            .with_exit_trigger(Condition::crosses_below(d, config.upper_line)),
        Direction::Short => SignalRules::new(direction, Condition::crosses_below(d, config.upper_line))
            .with_exit_trigger(Condition::crosses_below(d, config.lower_line)),
    };

    if let Some(sma) = config.filter_series.as_deref() {
        let filter = match direction {
            Direction::Long => Condition::above(CLOSE, sma),
            Direction::Short => Condition::below(CLOSE, sma),
        };
        rules = rules.with_entry_filter(filter);
    }
    rules
}
