//! Indicator reading source
//!
//! Indicator values are computed elsewhere and consumed here as named series.
//! Lookback 0 is the current bar, 1 the previous bar, and so on. Any index past
//! the available history, and any NaN (indicator warm-up), reads as no value.

use std::collections::HashMap;

/// Name of the series carrying the bar close. Always required by the engine.
pub const CLOSE: &str = "close";

/// Typed accessor for precomputed indicator series
pub trait IndicatorSource {
    /// Value of `name` at `lookback` bars ago, or `None` when unavailable
    fn reading(&self, name: &str, lookback: usize) -> Option<f64>;

    /// Whether the source knows about `name` at all (checked once at construction)
    fn has_series(&self, name: &str) -> bool;

    /// Number of bars seen so far
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory reading source, extended by one row per bar
///
/// Series are declared up front; every appended row extends every declared
/// series by exactly one value (missing columns become no value) so lookback
/// indices stay aligned across series.
#[derive(Debug, Clone, Default)]
pub struct SeriesBook {
    series: HashMap<String, Vec<f64>>,
    bars: usize,
}

impl SeriesBook {
    /// Create a book with the given series names
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let series = names
            .into_iter()
            .map(|name| (name.into(), Vec::new()))
            .collect();
        Self { series, bars: 0 }
    }

    /// Declared series names (unordered)
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    /// Append one bar. Unknown names are ignored, absent names read as no value.
    pub fn push_bar<'a, I>(&mut self, row: I)
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let target = self.bars + 1;
        for (name, value) in row {
            match self.series.get_mut(name) {
                Some(values) if values.len() < target => values.push(value),
                Some(_) => tracing::warn!(series = name, "Duplicate value in one bar ignored"),
                None => tracing::debug!(series = name, "Value for undeclared series ignored"),
            }
        }
        for values in self.series.values_mut() {
            if values.len() < target {
                values.push(f64::NAN);
            }
        }
        self.bars = target;
    }
}

impl IndicatorSource for SeriesBook {
    fn reading(&self, name: &str, lookback: usize) -> Option<f64> {
        let values = self.series.get(name)?;
        let index = values.len().checked_sub(lookback + 1)?;
        values.get(index).copied().filter(|v| !v.is_nan())
    }

    fn has_series(&self, name: &str) -> bool {
        self.series.contains_key(name)
    }

    fn len(&self) -> usize {
        self.bars
    }
}
