//! Signal evaluation
//!
//! Maps the current indicator readings, the strategy's rules and the
//! confirmation counter to a single [`Decision`] per bar.
//!
//! - Flat: entry fires when the trend filter holds, the confirmation gate (if
//!   any) is open, and the trigger holds, all on bar 0.
//! - Open: the filter reversing wins over a reached take-profit level, which
//!   wins over the exit trigger.

pub mod condition;
pub mod confirmation;

pub use condition::{Condition, Operand};
pub use confirmation::{Confirmation, ConfirmationCounter};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::indicators::{IndicatorSource, CLOSE};
use crate::{Direction, Money};

/// Outcome of one evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Decision {
    EnterLong,
    EnterShort,
    ExitLong,
    ExitShort,
    /// Trend filter reversed while in position
    ExitOnFilter,
    /// Close reached the take-profit level
    TakeProfit,
    Hold,
}

impl Decision {
    pub fn enter(direction: Direction) -> Self {
        match direction {
            Direction::Long => Decision::EnterLong,
            Direction::Short => Decision::EnterShort,
        }
    }

    pub fn exit(direction: Direction) -> Self {
        match direction {
            Direction::Long => Decision::ExitLong,
            Direction::Short => Decision::ExitShort,
        }
    }

    /// Direction to open, for entry decisions
    pub fn entry_direction(self) -> Option<Direction> {
        match self {
            Decision::EnterLong => Some(Direction::Long),
            Decision::EnterShort => Some(Direction::Short),
            _ => None,
        }
    }

    pub fn is_exit(self) -> bool {
        matches!(
            self,
            Decision::ExitLong | Decision::ExitShort | Decision::ExitOnFilter | Decision::TakeProfit
        )
    }
}

/// Entry and exit rules of one strategy variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRules {
    pub direction: Direction,

    /// Trend filter evaluated on bar 0; absent means always open
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_filter: Option<Condition>,

    /// Sustained-window gate in front of the trigger
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation: Option<Confirmation>,

    pub entry_trigger: Condition,

    /// Filter reversal that cancels an open position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_filter: Option<Condition>,

    /// Opposing trigger that closes an open position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_trigger: Option<Condition>,
}

impl SignalRules {
    pub fn new(direction: Direction, entry_trigger: Condition) -> Self {
        Self {
            direction,
            entry_filter: None,
            confirmation: None,
            entry_trigger,
            exit_filter: None,
            exit_trigger: None,
        }
    }

    pub fn with_entry_filter(mut self, filter: Condition) -> Self {
        self.entry_filter = Some(filter);
        self
    }

    pub fn with_confirmation(mut self, condition: Condition, window: usize) -> Self {
        self.confirmation = Some(Confirmation { condition, window });
        self
    }

    pub fn with_exit_filter(mut self, filter: Condition) -> Self {
        self.exit_filter = Some(filter);
        self
    }

    pub fn with_exit_trigger(mut self, trigger: Condition) -> Self {
        self.exit_trigger = Some(trigger);
        self
    }

    fn conditions(&self) -> impl Iterator<Item = &Condition> {
        self.entry_filter
            .iter()
            .chain(self.confirmation.iter().map(|c| &c.condition))
            .chain(std::iter::once(&self.entry_trigger))
            .chain(self.exit_filter.iter())
            .chain(self.exit_trigger.iter())
    }

    /// Every series these rules read, `close` first
    pub fn required_series(&self) -> Vec<String> {
        let mut names = vec![CLOSE.to_string()];
        for condition in self.conditions() {
            condition.collect_series(&mut names);
        }
        names
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(confirmation) = &self.confirmation {
            if confirmation.window == 0 {
                return Err(ConfigError::ZeroWindow);
            }
        }
        self.conditions().try_for_each(Condition::validate)
    }
}

/// What the evaluator needs to know about an open position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpenPosition {
    pub direction: Direction,
    pub take_profit: Option<Money>,
}

/// Evaluate the rules for the current bar
///
/// `position` is `None` while flat. The counter is only touched while flat.
pub fn evaluate(
    rules: &SignalRules,
    source: &dyn IndicatorSource,
    position: Option<&OpenPosition>,
    counter: &mut ConfirmationCounter,
) -> Decision {
    match position {
        None => evaluate_entry(rules, source, counter),
        Some(open) => evaluate_exit(rules, source, open),
    }
}

fn evaluate_entry(
    rules: &SignalRules,
    source: &dyn IndicatorSource,
    counter: &mut ConfirmationCounter,
) -> Decision {
    let filter_open = rules
        .entry_filter
        .as_ref()
        .map_or(true, |filter| filter.holds(source, 0));

    let gate_open = match &rules.confirmation {
        Some(confirmation) => counter.observe(confirmation, source),
        None => true,
    };

    if filter_open && gate_open && rules.entry_trigger.holds(source, 0) {
        if rules.confirmation.is_some() {
            counter.consume();
        }
        return Decision::enter(rules.direction);
    }

    Decision::Hold
}

fn evaluate_exit(rules: &SignalRules, source: &dyn IndicatorSource, open: &OpenPosition) -> Decision {
    if let Some(filter) = &rules.exit_filter {
        if filter.holds(source, 0) {
            return Decision::ExitOnFilter;
        }
    }

    if let (Some(level), Some(close)) = (open.take_profit, source.reading(CLOSE, 0)) {
        let level = level.to_f64();
        let reached = match open.direction {
            Direction::Long => close >= level,
            Direction::Short => close <= level,
        };
        if reached {
            return Decision::TakeProfit;
        }
    }

    if let Some(trigger) = &rules.exit_trigger {
        if trigger.holds(source, 0) {
            return Decision::exit(open.direction);
        }
    }

    Decision::Hold
}
