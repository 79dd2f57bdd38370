//! Order Management System (OMS)
//!
//! Single-position order handling for one strategy instance:
//! - Entry market order paired with a protective stop
//! - One-time breakeven shift of the stop
//! - Exit by cancelling the stop and sending an opposing market order
//! - Rollback to the pre-request state on venue rejection

pub mod lifecycle;
pub mod types;
pub mod venue;

// Re-export core types
pub use lifecycle::{
    BreakevenRule, FillOutcome, Lifecycle, OrderPlan, RoundTrip, StopRule, BREAKEVEN_LABEL,
    STOP_LABEL, TAKE_PROFIT_LABEL,
};
pub use types::{LifecycleState, OrderHandle, OrderKind, OrderRequest, Position, ProtectiveOrder};
pub use venue::{PaperVenue, Rejection, Venue, VenueRequest, WorkingOrder};
