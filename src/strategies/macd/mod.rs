//! MACD Signal-Cross Strategy
//!
//! Long: close above the filter SMA and MACD crossing up through its signal
//! line while the signal line is below zero. Short mirrors it. Closed when the
//! close returns to the filter's other side, or on the mirrored crossing.

mod config;

pub use config::MacdConfig;

use crate::error::ConfigError;
use crate::indicators::CLOSE;
use crate::signal::{Condition, SignalRules};
use crate::Direction;

pub const NAME: &str = "macd";

/// Create rules from preset parameters (called by registry)
pub fn create(params: &serde_json::Value, direction: Direction) -> Result<SignalRules, ConfigError> {
    let config: MacdConfig = super::parse_params(NAME, params)?;
    Ok(rules(&config, direction))
}

/// MACD crossing its signal line upward while the signal is below zero
fn bullish_cross(config: &MacdConfig) -> Condition {
    Condition::all(vec![
        Condition::below(config.signal_series.as_str(), 0.0),
        Condition::crosses_above(config.macd_series.as_str(), config.signal_series.as_str()),
    ])
}

fn bearish_cross(config: &MacdConfig) -> Condition {
    Condition::all(vec![
        Condition::above(config.signal_series.as_str(), 0.0),
        Condition::crosses_below(config.macd_series.as_str(), config.signal_series.as_str()),
    ])
}

pub fn rules(config: &MacdConfig, direction: Direction) -> SignalRules {
    let sma = config.filter_series.as_str();

    let (filter, trigger, reversal, opposite) = match direction {
        Direction::Long => (
            Condition::above(CLOSE, sma),
            bullish_cross(config),
            Condition::at_or_below(CLOSE, sma),
            bearish_cross(config),
        ),
        Direction::Short => (
            Condition::below(CLOSE, sma),
            bearish_cross(config),
            Condition::at_or_above(CLOSE, sma),
            bullish_cross(config),
        ),
    };

    let rules = SignalRules::new(direction, trigger)
        .with_entry_filter(filter)
        .with_exit_filter(reversal);
    if config.exit_on_cross {
        rules.with_exit_trigger(opposite)
    } else {
        rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::SeriesBook;
    use crate::signal::{evaluate, ConfirmationCounter, Decision};

    fn book(rows: &[(f64, f64, f64, f64)]) -> SeriesBook {
        let mut src = SeriesBook::new([CLOSE, "sma", "macd", "macd_signal"]);
        for &(close, sma, macd, signal) in rows {
            src.push_bar([(CLOSE, close), ("sma", sma), ("macd", macd), ("macd_signal", signal)]);
        }
        src
    }

    #[test]
    fn test_short_needs_positive_signal() {
        let rules = rules(&MacdConfig::default(), Direction::Short);
        let mut counter = ConfirmationCounter::new();

        let src = book(&[(95.0, 100.0, 2.0, 1.0), (94.0, 100.0, 1.0, 1.0)]);
        assert_eq!(evaluate(&rules, &src, None, &mut counter), Decision::EnterShort);

        let src = book(&[(95.0, 100.0, -1.0, -2.0), (94.0, 100.0, -2.0, -2.0)]);
        assert_eq!(evaluate(&rules, &src, None, &mut counter), Decision::Hold);
    }
}
