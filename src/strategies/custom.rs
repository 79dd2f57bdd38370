//! Explicit rules
//!
//! The `strategy` object is a full rules definition. The top-level direction
//! is used when the object does not name one.

use crate::error::ConfigError;
use crate::signal::SignalRules;
use crate::Direction;

use super::CUSTOM;

/// Create rules from preset parameters (called by registry)
pub fn create(params: &serde_json::Value, direction: Direction) -> Result<SignalRules, ConfigError> {
    let mut params = params.clone();
    if let Some(object) = params.as_object_mut() {
        object
            .entry("direction")
            .or_insert_with(|| serde_json::json!(direction));
    }
    serde_json::from_value(params).map_err(|e| ConfigError::InvalidStrategyParams {
        name: CUSTOM.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::Condition;
    use serde_json::json;

    #[test]
    fn test_direction_defaults_to_top_level() {
        let rules = create(
            &json!({"entry_trigger": {"kind": "at_or_above", "series": "rsi", "level": 70}}),
            Direction::Short,
        )
        .unwrap();
        assert_eq!(rules.direction, Direction::Short);
        assert_eq!(rules.entry_trigger, Condition::at_or_above("rsi", 70.0));
    }

    #[test]
    fn test_missing_trigger_rejected() {
        assert!(create(&json!({}), Direction::Long).is_err());
    }
}
