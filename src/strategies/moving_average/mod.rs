//! Moving Average Strategy
//!
//! Two mutually exclusive forms of the same idea:
//! - crossing: fast crosses slow, optionally with the long average on the
//!   trend side of the slow one
//! - stacked: long < slow < fast for longs (reversed for shorts)

mod config;

pub use config::{AverageMode, MovingAverageConfig};

use crate::error::ConfigError;
use crate::indicators::CLOSE;
use crate::signal::{Condition, SignalRules};
use crate::Direction;

pub const NAME: &str = "moving_average";

/// Create rules from preset parameters (called by registry)
pub fn create(params: &serde_json::Value, direction: Direction) -> Result<SignalRules, ConfigError> {
    let config: MovingAverageConfig = super::parse_params(NAME, params)?;
    if config.mode == AverageMode::Stacked && config.long_series.is_none() {
        return Err(ConfigError::InvalidStrategyParams {
            name: NAME.to_string(),
            reason: "stacked mode needs long_series".to_string(),
        });
    }
    Ok(rules(&config, direction))
}

/// `a` on the trend side of `b`
fn beyond(direction: Direction, a: &str, b: &str) -> Condition {
    match direction {
        Direction::Long => Condition::above(a, b),
        Direction::Short => Condition::below(a, b),
    }
}

pub fn rules(config: &MovingAverageConfig, direction: Direction) -> SignalRules {
    let fast = config.fast_series.as_str();
    let slow = config.slow_series.as_str();
    let long = config.long_series.as_deref();

    match config.mode {
        AverageMode::Crossing => {
            let (trigger, exit) = match direction {
                Direction::Long => (
                    Condition::crosses_above(fast, slow),
                    Condition::crosses_below(fast, slow),
                ),
                Direction::Short => (
                    Condition::crosses_below(fast, slow),
                    Condition::crosses_above(fast, slow),
                ),
            };
            let rules = SignalRules::new(direction, trigger).with_exit_trigger(exit);
            match long {
                Some(long) => rules.with_entry_filter(beyond(direction, slow, long)),
                None => rules,
            }
        }
        AverageMode::Stacked => {
            let mut stack = vec![beyond(direction, fast, slow)];
            if let Some(long) = long {
                stack.push(beyond(direction, slow, long));
            }
            let back_through_slow = match direction {
                Direction::Long => Condition::at_or_below(CLOSE, slow),
                Direction::Short => Condition::at_or_above(CLOSE, slow),
            };
            SignalRules::new(direction, Condition::all(stack)).with_exit_trigger(back_through_slow)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stacked_short() {
        let rules = rules(&MovingAverageConfig::default(), Direction::Short);
        assert_eq!(
            rules.entry_trigger,
            Condition::all(vec![
                Condition::below("sma_fast", "sma_slow"),
                Condition::below("sma_slow", "sma_long"),
            ])
        );
        assert_eq!(rules.exit_trigger, Some(Condition::at_or_above(CLOSE, "sma_slow")));
    }

    #[test]
    fn test_crossing_without_long_average() {
        let rules = create(
            &json!({"mode": "crossing", "long_series": null}),
            Direction::Long,
        )
        .unwrap();
        assert!(rules.entry_filter.is_none());
        assert_eq!(rules.entry_trigger, Condition::crosses_above("sma_fast", "sma_slow"));
    }

    #[test]
    fn test_stacked_requires_long_average() {
        let err = create(&json!({"long_series": null}), Direction::Long);
        assert!(matches!(err, Err(ConfigError::InvalidStrategyParams { .. })));
    }
}
