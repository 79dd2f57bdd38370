//! Aroon rule construction

use super::AroonConfig;
use crate::signal::{Condition, SignalRules};
use crate::Direction;

/// (trend line, opposite line) for a direction
fn lines(config: &AroonConfig, direction: Direction) -> (&str, &str) {
    match direction {
        Direction::Long => (config.aroon_up_series.as_str(), config.aroon_down_series.as_str()),
        Direction::Short => (config.aroon_down_series.as_str(), config.aroon_up_series.as_str()),
    }
}

pub fn rules(config: &AroonConfig, direction: Direction) -> SignalRules {
    let (trend, opposite) = lines(config, direction);

    let sustained = Condition::at_or_above(trend, config.level);
    let trigger = match config.opposite_max {
        Some(max) => Condition::all(vec![
            sustained.clone(),
            Condition::at_or_below(opposite, max),
        ]),
        None => sustained.clone(),
    };

    SignalRules::new(direction, trigger)
        .with_confirmation(sustained, config.window)
        .with_exit_trigger(Condition::crosses_above(opposite, config.exit_level))
}
