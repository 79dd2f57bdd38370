//! Composable indicator conditions
//!
//! A condition is evaluated at a lookback offset. Crossings compare the offset
//! bar against the bar before it. Readings that are unavailable make the
//! condition undetermined (`None`), which callers treat as not satisfied.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ConfigError;
use crate::indicators::IndicatorSource;

/// Right-hand side of a comparison: a fixed level or another series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Operand {
    Value(f64),
    Series(String),
}

impl Operand {
    fn at(&self, source: &dyn IndicatorSource, lookback: usize) -> Option<f64> {
        match self {
            Operand::Value(v) => Some(*v),
            Operand::Series(name) => source.reading(name, lookback),
        }
    }
}

impl From<f64> for Operand {
    fn from(value: f64) -> Self {
        Operand::Value(value)
    }
}

impl From<&str> for Operand {
    fn from(name: &str) -> Self {
        Operand::Series(name.to_string())
    }
}

impl From<String> for Operand {
    fn from(name: String) -> Self {
        Operand::Series(name)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Value(v) => write!(f, "{}", v),
            Operand::Series(name) => f.write_str(name),
        }
    }
}

/// Boolean rule over indicator readings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    /// series > level
    Above { series: String, level: Operand },
    /// series >= level
    AtOrAbove { series: String, level: Operand },
    /// series < level
    Below { series: String, level: Operand },
    /// series <= level
    AtOrBelow { series: String, level: Operand },
    /// previous bar strictly below, this bar at or above
    CrossesAbove { series: String, level: Operand },
    /// previous bar strictly above, this bar at or below
    CrossesBelow { series: String, level: Operand },
    All { conditions: Vec<Condition> },
    Any { conditions: Vec<Condition> },
    Not { condition: Box<Condition> },
}

impl Condition {
    pub fn above(series: impl Into<String>, level: impl Into<Operand>) -> Self {
        Condition::Above { series: series.into(), level: level.into() }
    }

    pub fn at_or_above(series: impl Into<String>, level: impl Into<Operand>) -> Self {
        Condition::AtOrAbove { series: series.into(), level: level.into() }
    }

    pub fn below(series: impl Into<String>, level: impl Into<Operand>) -> Self {
        Condition::Below { series: series.into(), level: level.into() }
    }

    pub fn at_or_below(series: impl Into<String>, level: impl Into<Operand>) -> Self {
        Condition::AtOrBelow { series: series.into(), level: level.into() }
    }

    pub fn crosses_above(series: impl Into<String>, level: impl Into<Operand>) -> Self {
        Condition::CrossesAbove { series: series.into(), level: level.into() }
    }

    pub fn crosses_below(series: impl Into<String>, level: impl Into<Operand>) -> Self {
        Condition::CrossesBelow { series: series.into(), level: level.into() }
    }

    pub fn all(conditions: Vec<Condition>) -> Self {
        Condition::All { conditions }
    }

    pub fn any(conditions: Vec<Condition>) -> Self {
        Condition::Any { conditions }
    }

    pub fn negate(condition: Condition) -> Self {
        Condition::Not { condition: Box::new(condition) }
    }

    /// Evaluate at `lookback` bars ago. `None` when a needed reading is missing.
    pub fn evaluate(&self, source: &dyn IndicatorSource, lookback: usize) -> Option<bool> {
        match self {
            Condition::Above { series, level } => {
                Some(source.reading(series, lookback)? > level.at(source, lookback)?)
            }
            Condition::AtOrAbove { series, level } => {
                Some(source.reading(series, lookback)? >= level.at(source, lookback)?)
            }
            Condition::Below { series, level } => {
                Some(source.reading(series, lookback)? < level.at(source, lookback)?)
            }
            Condition::AtOrBelow { series, level } => {
                Some(source.reading(series, lookback)? <= level.at(source, lookback)?)
            }
            Condition::CrossesAbove { series, level } => {
                let prev = source.reading(series, lookback + 1)?;
                let prev_level = level.at(source, lookback + 1)?;
                let cur = source.reading(series, lookback)?;
                let cur_level = level.at(source, lookback)?;
                Some(prev < prev_level && cur >= cur_level)
            }
            Condition::CrossesBelow { series, level } => {
                let prev = source.reading(series, lookback + 1)?;
                let prev_level = level.at(source, lookback + 1)?;
                let cur = source.reading(series, lookback)?;
                let cur_level = level.at(source, lookback)?;
                Some(prev > prev_level && cur <= cur_level)
            }
            Condition::All { conditions } => {
                let mut result = true;
                for condition in conditions {
                    result &= condition.evaluate(source, lookback)?;
                }
                Some(result)
            }
            Condition::Any { conditions } => {
                let mut undetermined = false;
                for condition in conditions {
                    match condition.evaluate(source, lookback) {
                        Some(true) => return Some(true),
                        Some(false) => {}
                        None => undetermined = true,
                    }
                }
                if undetermined {
                    None
                } else {
                    Some(false)
                }
            }
            Condition::Not { condition } => condition.evaluate(source, lookback).map(|b| !b),
        }
    }

    /// Evaluate, treating missing history as not satisfied
    pub fn holds(&self, source: &dyn IndicatorSource, lookback: usize) -> bool {
        self.evaluate(source, lookback).unwrap_or(false)
    }

    /// Every series name this condition reads
    pub fn collect_series(&self, out: &mut Vec<String>) {
        match self {
            Condition::Above { series, level }
            | Condition::AtOrAbove { series, level }
            | Condition::Below { series, level }
            | Condition::AtOrBelow { series, level }
            | Condition::CrossesAbove { series, level }
            | Condition::CrossesBelow { series, level } => {
                push_unique(out, series);
                if let Operand::Series(name) = level {
                    push_unique(out, name);
                }
            }
            Condition::All { conditions } | Condition::Any { conditions } => {
                for condition in conditions {
                    condition.collect_series(out);
                }
            }
            Condition::Not { condition } => condition.collect_series(out),
        }
    }

    /// Structural checks done once at construction
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Condition::All { conditions } if conditions.is_empty() => {
                Err(ConfigError::EmptyConditionGroup("all"))
            }
            Condition::Any { conditions } if conditions.is_empty() => {
                Err(ConfigError::EmptyConditionGroup("any"))
            }
            Condition::All { conditions } | Condition::Any { conditions } => {
                conditions.iter().try_for_each(Condition::validate)
            }
            Condition::Not { condition } => condition.validate(),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Above { series, level } => write!(f, "{} > {}", series, level),
            Condition::AtOrAbove { series, level } => write!(f, "{} >= {}", series, level),
            Condition::Below { series, level } => write!(f, "{} < {}", series, level),
            Condition::AtOrBelow { series, level } => write!(f, "{} <= {}", series, level),
            Condition::CrossesAbove { series, level } => {
                write!(f, "{} crosses above {}", series, level)
            }
            Condition::CrossesBelow { series, level } => {
                write!(f, "{} crosses below {}", series, level)
            }
            Condition::All { conditions } => write_group(f, " and ", conditions),
            Condition::Any { conditions } => write_group(f, " or ", conditions),
            Condition::Not { condition } => write!(f, "not ({})", condition),
        }
    }
}

fn push_unique(out: &mut Vec<String>, name: &str) {
    if !out.iter().any(|existing| existing == name) {
        out.push(name.to_string());
    }
}

fn write_group(f: &mut fmt::Formatter<'_>, sep: &str, conditions: &[Condition]) -> fmt::Result {
    f.write_str("(")?;
    for (i, condition) in conditions.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{}", condition)?;
    }
    f.write_str(")")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::SeriesBook;

    fn book(rows: &[&[(&'static str, f64)]]) -> SeriesBook {
        let mut names: Vec<&str> = Vec::new();
        for row in rows {
            for (name, _) in row.iter() {
                if !names.contains(name) {
                    names.push(name);
                }
            }
        }
        let mut book = SeriesBook::new(names);
        for row in rows {
            book.push_bar(row.iter().copied());
        }
        book
    }

    #[test]
    fn test_crossing_counts_ties() {
        let src = book(&[&[("d", 18.0)], &[("d", 20.0)]]);
        assert!(Condition::crosses_above("d", 20.0).holds(&src, 0));

        let src = book(&[&[("d", 20.0)], &[("d", 25.0)]]);
        assert!(
            !Condition::crosses_above("d", 20.0).holds(&src, 0),
            "previous value must be strictly below"
        );

        let src = book(&[&[("d", 85.0)], &[("d", 80.0)]]);
        assert!(Condition::crosses_below("d", 80.0).holds(&src, 0));
    }

    #[test]
    fn test_series_crossing_uses_both_bars() {
        // macd below signal, then at signal
        let src = book(&[
            &[("macd", 1.0), ("signal", 2.0)],
            &[("macd", 1.5), ("signal", 1.5)],
        ]);
        assert!(Condition::crosses_above("macd", "signal").holds(&src, 0));
        assert!(!Condition::crosses_below("macd", "signal").holds(&src, 0));
    }

    #[test]
    fn test_missing_history_is_false() {
        let src = book(&[&[("d", 25.0)]]);
        assert_eq!(Condition::crosses_above("d", 20.0).evaluate(&src, 0), None);
        assert!(!Condition::crosses_above("d", 20.0).holds(&src, 0));
        assert!(!Condition::above("d", 20.0).holds(&src, 5));
        assert!(
            !Condition::negate(Condition::above("d", 20.0)).holds(&src, 5),
            "negating a missing reading stays unsatisfied"
        );
    }

    #[test]
    fn test_groups() {
        let src = book(&[&[("close", 101.0), ("sma", 100.0), ("up", 80.0)]]);
        let both = Condition::all(vec![
            Condition::above("close", "sma"),
            Condition::at_or_above("up", 75.0),
        ]);
        assert!(both.holds(&src, 0));

        let either = Condition::any(vec![
            Condition::below("close", "sma"),
            Condition::at_or_above("up", 80.0),
        ]);
        assert!(either.holds(&src, 0));
        assert_eq!(either.to_string(), "(close < sma or up >= 80)");
    }

    #[test]
    fn test_collect_series_and_validate() {
        let condition = Condition::all(vec![
            Condition::above("close", "sma"),
            Condition::crosses_above("macd", "signal"),
            Condition::at_or_above("signal", 0.0),
        ]);
        let mut names = Vec::new();
        condition.collect_series(&mut names);
        assert_eq!(names, vec!["close", "sma", "macd", "signal"]);

        assert!(condition.validate().is_ok());
        assert_eq!(
            Condition::any(vec![]).validate(),
            Err(ConfigError::EmptyConditionGroup("any"))
        );
    }

    #[test]
    fn test_serde_shape() {
        let json = r#"{"kind":"crosses_above","series":"d","level":20.0}"#;
        let parsed: Condition = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, Condition::crosses_above("d", 20.0));

        let json = r#"{"kind":"above","series":"close","level":"sma"}"#;
        let parsed: Condition = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, Condition::above("close", "sma"));
    }
}
