//! Error types for configuration, level search, venue and engine failures

use thiserror::Error;

use crate::oms::OrderHandle;
use crate::Money;

/// Invalid configuration detected at construction. Fatal for the instance.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: String },

    #[error("{name} must be within {range}, got {value}")]
    OutOfRange {
        name: &'static str,
        range: &'static str,
        value: String,
    },

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("quantity must be at least 1")]
    ZeroQuantity,

    #[error("quantity ({quantity}) exceeds max_open_position ({max})")]
    QuantityExceedsMax { quantity: u32, max: u32 },

    #[error("no initial stop rule: set stop_loss_amount or stop_loss_pct")]
    NoStopRule,

    #[error("stop_loss_amount and stop_loss_pct are mutually exclusive")]
    ConflictingStopRules,

    #[error("confirmation window must be at least 1 bar")]
    ZeroWindow,

    #[error("condition group '{0}' has no members")]
    EmptyConditionGroup(&'static str),

    #[error("unknown strategy '{name}'. Available: {available}")]
    UnknownStrategy { name: String, available: String },

    #[error("invalid parameters for strategy '{name}': {reason}")]
    InvalidStrategyParams { name: String, reason: String },

    #[error("required indicator series '{0}' is not provided by the reading source")]
    MissingSeries(String),
}

/// Failures of the risk level calculator
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RiskError {
    #[error("no tick-aligned level reaches {target} from anchor {anchor} within {steps} steps")]
    UnreachableLevel {
        anchor: Money,
        target: Money,
        steps: u32,
    },

    #[error("invalid level search input: {0}")]
    InvalidInput(&'static str),
}

/// Venue refused or could not process a request
#[derive(Debug, Error, Clone, PartialEq)]
pub enum VenueError {
    #[error("order rejected: {0}")]
    Rejected(String),

    #[error("unknown order handle {0}")]
    UnknownOrder(OrderHandle),
}

/// Recoverable failure surfaced from a bar or fill callback
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("venue rejected {action}: {source}")]
    VenueRejection {
        action: &'static str,
        #[source]
        source: VenueError,
    },
}

impl EngineError {
    pub fn rejection(action: &'static str, source: VenueError) -> Self {
        EngineError::VenueRejection { action, source }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
