//! Core OMS types
//!
//! Order requests sent to a venue, the protective stop paired with a position,
//! the position itself and the lifecycle state. Prices use `Money` so tick
//! alignment is exact.

use crate::{Direction, Money, PositionSide, Side, Symbol};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Venue-issued order identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderHandle(pub u64);

impl fmt::Display for OrderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Order kind - determines execution at the venue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderKind {
    /// Execute at the venue's next available price
    Market,

    /// Protective stop: sell stop triggers when price <= stop price,
    /// buy stop triggers when price >= stop price
    Stop,
}

/// Order request from the lifecycle manager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: Symbol,
    pub side: Side,
    pub quantity: u32,
    pub kind: OrderKind,
    /// Stop price; `None` for market orders
    pub price: Option<Money>,
    pub label: String,
}

impl OrderRequest {
    pub fn market(symbol: Symbol, side: Side, quantity: u32, label: impl Into<String>) -> Self {
        Self {
            symbol,
            side,
            quantity,
            kind: OrderKind::Market,
            price: None,
            label: label.into(),
        }
    }

    pub fn stop(
        symbol: Symbol,
        side: Side,
        quantity: u32,
        price: Money,
        label: impl Into<String>,
    ) -> Self {
        Self {
            symbol,
            side,
            quantity,
            kind: OrderKind::Stop,
            price: Some(price),
            label: label.into(),
        }
    }
}

/// Resting stop protecting the open position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtectiveOrder {
    pub handle: OrderHandle,
    pub side: Side,
    pub price: Money,
    pub label: String,
}

/// The single position of a strategy instance
///
/// `side == Flat` exactly when `quantity == 0` and `entry_price` is unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub side: PositionSide,
    pub quantity: u32,
    pub entry_price: Option<Money>,
    pub breakeven_applied: bool,
}

impl Position {
    pub fn flat() -> Self {
        Self::default()
    }

    pub fn opened(direction: Direction, quantity: u32, entry_price: Money) -> Self {
        Self {
            side: direction.into(),
            quantity,
            entry_price: Some(entry_price),
            breakeven_applied: false,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.side.is_flat()
    }

    pub fn direction(&self) -> Option<Direction> {
        self.side.direction()
    }

    /// Clear in place
    pub fn reset(&mut self) {
        *self = Self::flat();
    }
}

/// Lifecycle state of the position/order pair
///
/// `EntryPending` and `ExitPending` only last until the venue reports the
/// market fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LifecycleState {
    #[default]
    Flat,
    EntryPending {
        direction: Direction,
    },
    Open {
        direction: Direction,
        breakeven_applied: bool,
    },
    ExitPending {
        direction: Direction,
    },
}

impl LifecycleState {
    pub fn is_flat(self) -> bool {
        self == LifecycleState::Flat
    }

    pub fn is_open(self) -> bool {
        matches!(self, LifecycleState::Open { .. })
    }

    pub fn is_pending(self) -> bool {
        matches!(
            self,
            LifecycleState::EntryPending { .. } | LifecycleState::ExitPending { .. }
        )
    }

    pub fn direction(self) -> Option<Direction> {
        match self {
            LifecycleState::Flat => None,
            LifecycleState::EntryPending { direction }
            | LifecycleState::Open { direction, .. }
            | LifecycleState::ExitPending { direction } => Some(direction),
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Flat => f.write_str("flat"),
            LifecycleState::EntryPending { direction } => write!(f, "entry pending ({})", direction),
            LifecycleState::Open {
                direction,
                breakeven_applied,
            } => {
                if *breakeven_applied {
                    write!(f, "open {} (breakeven)", direction)
                } else {
                    write!(f, "open {}", direction)
                }
            }
            LifecycleState::ExitPending { direction } => write!(f, "exit pending ({})", direction),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_stop_request() {
        let req = OrderRequest::stop(
            Symbol::new("ES"),
            Side::Sell,
            1,
            Money::from(dec!(3850)),
            "StopLoss triggered",
        );
        assert_eq!(req.kind, OrderKind::Stop);
        assert_eq!(req.price, Some(Money::from(dec!(3850))));
    }

    #[test]
    fn test_market_request_has_no_price() {
        let req = OrderRequest::market(Symbol::new("ES"), Side::Buy, 1, "entry");
        assert_eq!(req.kind, OrderKind::Market);
        assert!(req.price.is_none());
    }

    #[test]
    fn test_position_reset_matches_initial() {
        let mut position = Position::opened(Direction::Short, 1, Money::from(dec!(4000)));
        position.breakeven_applied = true;
        assert!(!position.is_flat());
        position.reset();
        assert_eq!(position, Position::default());
    }

    #[test]
    fn test_state_serde_shape() {
        let state = LifecycleState::Open {
            direction: Direction::Long,
            breakeven_applied: false,
        };
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, r#"{"state":"open","direction":"long","breakeven_applied":false}"#);
    }
}
