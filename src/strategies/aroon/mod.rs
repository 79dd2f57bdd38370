//! Aroon Sustained-Trend Strategy
//!
//! The trend line (Aroon Up for longs, Aroon Down for shorts) has to stay at
//! or above its level for a full confirmation window of completed bars. Entry
//! follows on the first bar where it still holds and the opposite line is low.
//! Closed when the opposite line crosses up through the exit level.

mod config;
mod strategy;

pub use config::AroonConfig;
pub use strategy::rules;

use crate::error::ConfigError;
use crate::signal::SignalRules;
use crate::Direction;

pub const NAME: &str = "aroon";

/// Create rules from preset parameters (called by registry)
pub fn create(params: &serde_json::Value, direction: Direction) -> Result<SignalRules, ConfigError> {
    let config: AroonConfig = super::parse_params(NAME, params)?;
    if config.window == 0 {
        return Err(ConfigError::ZeroWindow);
    }
    Ok(rules(&config, direction))
}
