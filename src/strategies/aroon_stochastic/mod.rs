//! Aroon + Stochastic Strategy
//!
//! Trend filter: close on the trade side of a slow SMA and the Aroon line in
//! the trade direction at or above its level. Trigger: stochastic %D beyond
//! the upper line (long) or lower line (short). Exits on filter reversal or
//! the take-profit level.

mod config;

pub use config::AroonStochasticConfig;

use crate::error::ConfigError;
use crate::indicators::CLOSE;
use crate::signal::{Condition, SignalRules};
use crate::Direction;

pub const NAME: &str = "aroon_stochastic";

/// Create rules from preset parameters (called by registry)
pub fn create(params: &serde_json::Value, direction: Direction) -> Result<SignalRules, ConfigError> {
    let config: AroonStochasticConfig = super::parse_params(NAME, params)?;
    Ok(rules(&config, direction))
}

pub fn rules(config: &AroonStochasticConfig, direction: Direction) -> SignalRules {
    let sma = config.filter_series.as_str();
    let d = config.stoch_d_series.as_str();

    let (filter, trigger, reversal) = match direction {
        Direction::Long => (
            Condition::all(vec![
                Condition::above(CLOSE, sma),
                Condition::at_or_above(config.aroon_up_series.as_str(), config.aroon_level),
            ]),
            Condition::above(d, config.upper_line),
            Condition::at_or_below(CLOSE, sma),
        ),
        Direction::Short => (
            Condition::all(vec![
                Condition::below(CLOSE, sma),
                Condition::at_or_above(config.aroon_down_series.as_str(), config.aroon_level),
            ]),
            Condition::below(d, config.lower_line),
            Condition::at_or_above(CLOSE, sma),
        ),
    };

    SignalRules::new(direction, trigger)
        .with_entry_filter(filter)
        .with_exit_filter(reversal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::SeriesBook;
    use crate::signal::{evaluate, ConfirmationCounter, Decision};

    #[test]
    fn test_long_entry() {
        let rules = rules(&AroonStochasticConfig::default(), Direction::Long);
        let mut src = SeriesBook::new([CLOSE, "sma", "aroon_up", "aroon_down", "stoch_d"]);
        src.push_bar([
            (CLOSE, 4000.0),
            ("sma", 3900.0),
            ("aroon_up", 80.0),
            ("aroon_down", 10.0),
            ("stoch_d", 72.0),
        ]);
        let mut counter = ConfirmationCounter::new();
        assert_eq!(evaluate(&rules, &src, None, &mut counter), Decision::EnterLong);
        assert_eq!(
            rules.required_series(),
            vec![CLOSE, "sma", "aroon_up", "stoch_d"]
        );
    }
}
