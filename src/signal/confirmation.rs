//! Sustained-window trend confirmation

use serde::{Deserialize, Serialize};

use super::Condition;
use crate::indicators::IndicatorSource;

/// A condition that must hold on each of the last `window` completed bars
/// (lookbacks `1..=window`) before the entry gate opens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Confirmation {
    pub condition: Condition,
    pub window: usize,
}

/// Tally of bars satisfying a [`Confirmation`], plus the latched gate
///
/// The tally is recomputed over the full window on every observation. Once it
/// equals the window size the gate latches open and stays open until an entry
/// consumes it, or the lifecycle resets the counter on returning to flat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfirmationCounter {
    count: usize,
    armed: bool,
}

impl ConfirmationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bars in the window that satisfied the condition at the last observation
    pub fn count(&self) -> usize {
        self.count
    }

    /// Whether the gate is open
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Count the window and latch the gate when every bar satisfied it
    pub fn observe(&mut self, confirmation: &Confirmation, source: &dyn IndicatorSource) -> bool {
        self.count = (1..=confirmation.window)
            .filter(|&lookback| confirmation.condition.holds(source, lookback))
            .count();
        if self.count == confirmation.window {
            self.armed = true;
        }
        self.armed
    }

    /// Close the gate after it has been used
    pub fn consume(&mut self) {
        self.count = 0;
        self.armed = false;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::SeriesBook;

    fn aroon_down(values: &[f64]) -> SeriesBook {
        let mut book = SeriesBook::new(["aroon_down"]);
        for v in values {
            book.push_bar([("aroon_down", *v)]);
        }
        book
    }

    fn sustained() -> Confirmation {
        Confirmation {
            condition: Condition::at_or_above("aroon_down", 80.0),
            window: 3,
        }
    }

    #[test]
    fn test_arms_when_full_window_holds() {
        // lookbacks 3,2,1 = 85, 90, 80; current bar not part of the window
        let src = aroon_down(&[85.0, 90.0, 80.0, 10.0]);
        let mut counter = ConfirmationCounter::new();
        assert!(counter.observe(&sustained(), &src));
        assert_eq!(counter.count(), 3);
    }

    #[test]
    fn test_partial_window_does_not_arm() {
        let src = aroon_down(&[85.0, 70.0, 80.0, 95.0]);
        let mut counter = ConfirmationCounter::new();
        assert!(!counter.observe(&sustained(), &src));
        assert_eq!(counter.count(), 2);
    }

    #[test]
    fn test_short_history_does_not_arm() {
        let src = aroon_down(&[85.0, 90.0]);
        let mut counter = ConfirmationCounter::new();
        assert!(!counter.observe(&sustained(), &src));
        assert_eq!(counter.count(), 1);
    }

    #[test]
    fn test_latch_survives_until_consumed() {
        let mut src = aroon_down(&[85.0, 90.0, 80.0, 10.0]);
        let mut counter = ConfirmationCounter::new();
        assert!(counter.observe(&sustained(), &src));

        src.push_bar([("aroon_down", 5.0)]);
        assert!(counter.observe(&sustained(), &src), "gate stays latched");
        assert!(counter.count() < 3);

        counter.consume();
        assert!(!counter.is_armed());
        assert_eq!(counter.count(), 0);
        assert!(!counter.observe(&sustained(), &src));
    }
}
