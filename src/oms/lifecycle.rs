//! Position & order lifecycle
//!
//! ```text
//! Flat --enter--> EntryPending --fill--> Open(false) --breakeven--> Open(true)
//!                                          |                           |
//!                                          +--exit--> ExitPending --fill--> Flat
//!                                          +--stop fill-----------------> Flat
//! ```
//!
//! A venue rejection leaves the machine in the state it had before the request
//! and is returned to the caller. Nothing is retried.

use serde::Serialize;
use tracing::{error, info, warn};

use super::types::{LifecycleState, OrderHandle, OrderRequest, Position, ProtectiveOrder};
use super::venue::Venue;
use crate::error::{EngineError, EngineResult, VenueError};
use crate::events::{EventKind, EventLog};
use crate::risk::{
    breakeven_level, favorable_excursion_pct, percent_stop_level, pnl_at, LevelSearch, PnlTarget,
};
use crate::signal::{Decision, OpenPosition};
use crate::{Direction, Money, Symbol};

pub const STOP_LABEL: &str = "StopLoss triggered";
pub const BREAKEVEN_LABEL: &str = "Breakeven triggered";
pub const TAKE_PROFIT_LABEL: &str = "TakeProfit reached";

pub fn entry_label(direction: Direction) -> String {
    format!("Trend confirmed, open {}", direction)
}

pub fn exit_label(decision: Decision, direction: Direction) -> String {
    match decision {
        Decision::ExitOnFilter => format!("Filter signal cancelled the {}.", direction),
        Decision::TakeProfit => TAKE_PROFIT_LABEL.to_string(),
        _ => format!("Exit signal, close {}", direction),
    }
}

/// How the initial protective stop is placed
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopRule {
    /// Nearest level losing this much on the whole position
    Amount(Money),
    /// Percent of the signal bar's close
    Percent(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BreakevenRule {
    /// Favorable excursion, in percent of entry, that arms the shift
    pub trigger_pct: f64,
    /// Ticks past the entry price the stop is moved to
    pub offset_ticks: u32,
}

/// Order sizing and risk rules the lifecycle works with
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderPlan {
    pub symbol: Symbol,
    pub quantity: u32,
    pub tick_size: Money,
    pub point_value: Money,
    pub stop: StopRule,
    pub fallback_stop_pct: Option<f64>,
    pub take_profit_amount: Option<Money>,
    pub breakeven: Option<BreakevenRule>,
    pub max_level_steps: u32,
}

impl OrderPlan {
    /// Money per one-point move of the whole position
    fn position_point_value(&self) -> Money {
        self.point_value * Money::from_i64(i64::from(self.quantity))
    }

    fn level_search(&self, anchor: Money, direction: Direction, target: PnlTarget) -> LevelSearch {
        LevelSearch::new(
            anchor,
            direction,
            target,
            self.position_point_value(),
            self.tick_size,
        )
        .with_max_steps(self.max_level_steps)
    }
}

/// A completed entry/exit pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundTrip {
    pub direction: Direction,
    pub quantity: u32,
    pub entry_price: Money,
    pub exit_price: Money,
    /// Realized P&L of the whole position
    pub pnl: Money,
    /// Label of the order that closed the position
    pub exit_label: String,
    pub breakeven_applied: bool,
}

/// What a fill notification did
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FillOutcome {
    Opened { direction: Direction, price: Money },
    /// Protective stop filled while its entry was still pending; the entry
    /// fill closes the round trip at this price
    StopAheadOfEntry { direction: Direction, price: Money },
    Closed(RoundTrip),
    /// Not for a pending order; logged and dropped
    Ignored,
}

impl FillOutcome {
    pub fn round_trip(&self) -> Option<&RoundTrip> {
        match self {
            FillOutcome::Closed(trip) => Some(trip),
            _ => None,
        }
    }
}

/// Owns the position, its protective stop and the pending market order
#[derive(Debug, Clone)]
pub struct Lifecycle {
    plan: OrderPlan,
    state: LifecycleState,
    position: Position,
    protective: Option<ProtectiveOrder>,
    take_profit: Option<Money>,
    pending: Option<OrderHandle>,
    pending_label: String,
    /// Stop fill (price, label) received before the entry fill
    early_stop: Option<(Money, String)>,
}

impl Lifecycle {
    pub fn new(plan: OrderPlan) -> Self {
        Self {
            plan,
            state: LifecycleState::Flat,
            position: Position::flat(),
            protective: None,
            take_profit: None,
            pending: None,
            pending_label: String::new(),
            early_stop: None,
        }
    }

    pub fn plan(&self) -> &OrderPlan {
        &self.plan
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn protective(&self) -> Option<&ProtectiveOrder> {
        self.protective.as_ref()
    }

    pub fn take_profit(&self) -> Option<Money> {
        self.take_profit
    }

    /// Market order awaiting its fill
    pub fn pending_order(&self) -> Option<OrderHandle> {
        self.pending
    }

    /// Exit-evaluation view, only while open
    pub fn open_position(&self) -> Option<OpenPosition> {
        match self.state {
            LifecycleState::Open { direction, .. } => Some(OpenPosition {
                direction,
                take_profit: self.take_profit,
            }),
            _ => None,
        }
    }

    /// Submit the entry market order and its protective stop
    ///
    /// Returns `Ok(false)` when no stop level could be found and the entry was
    /// skipped, or when not flat.
    pub fn enter<V: Venue + ?Sized>(
        &mut self,
        direction: Direction,
        close: Money,
        venue: &mut V,
        log: &mut EventLog,
        bar: u64,
    ) -> EngineResult<bool> {
        if !self.state.is_flat() {
            return Ok(false);
        }

        let label = entry_label(direction);
        let Some(stop_price) = self.initial_stop(direction, close, log, bar) else {
            warn!(
                symbol = %self.plan.symbol,
                %direction,
                %close,
                "No stop level available, entry skipped"
            );
            log.record(bar, EventKind::EntrySkipped, label, "no protective stop level");
            return Ok(false);
        };

        let entry = OrderRequest::market(
            self.plan.symbol.clone(),
            direction.entry_side(),
            self.plan.quantity,
            label.as_str(),
        );
        let entry_handle = venue
            .submit(&entry)
            .map_err(|e| self.rejected(log, bar, "entry order", &label, e))?;

        let stop = OrderRequest::stop(
            self.plan.symbol.clone(),
            direction.exit_side(),
            self.plan.quantity,
            stop_price,
            STOP_LABEL,
        );
        let stop_handle = match venue.submit(&stop) {
            Ok(handle) => handle,
            Err(e) => {
                if let Err(cancel_err) = venue.cancel(entry_handle) {
                    error!(
                        symbol = %self.plan.symbol,
                        handle = %entry_handle,
                        "Failed to cancel entry after stop rejection: {}",
                        cancel_err
                    );
                    log.record(
                        bar,
                        EventKind::RollbackFailed,
                        label.as_str(),
                        format!("cancel {}: {}", entry_handle, cancel_err),
                    );
                }
                return Err(self.rejected(log, bar, "protective stop", STOP_LABEL, e));
            }
        };

        self.state = LifecycleState::EntryPending { direction };
        self.pending = Some(entry_handle);
        self.pending_label = label.clone();
        self.protective = Some(ProtectiveOrder {
            handle: stop_handle,
            side: direction.exit_side(),
            price: stop_price,
            label: STOP_LABEL.to_string(),
        });

        info!(
            symbol = %self.plan.symbol,
            %direction,
            %close,
            stop = %stop_price,
            "📈 {}", label
        );
        log.record(
            bar,
            EventKind::EntrySubmitted,
            label,
            format!("entry {} stop {} @ {}", entry_handle, stop_handle, stop_price),
        );
        Ok(true)
    }

    fn initial_stop(
        &self,
        direction: Direction,
        close: Money,
        log: &mut EventLog,
        bar: u64,
    ) -> Option<Money> {
        match self.plan.stop {
            StopRule::Percent(pct) => Some(percent_stop_level(close, direction, pct, self.plan.tick_size)),
            StopRule::Amount(amount) => {
                match self.level_search(close, direction, PnlTarget::Loss(amount)).solve() {
                    Ok(level) => Some(level),
                    Err(err) => {
                        warn!(symbol = %self.plan.symbol, "Stop level search failed: {}", err);
                        let fallback = self
                            .plan
                            .fallback_stop_pct
                            .map(|pct| percent_stop_level(close, direction, pct, self.plan.tick_size));
                        let detail = match fallback {
                            Some(level) => format!("{}; fallback stop {}", err, level),
                            None => err.to_string(),
                        };
                        log.record(bar, EventKind::UnreachableLevel, STOP_LABEL, detail);
                        fallback
                    }
                }
            }
        }
    }

    fn level_search(&self, anchor: Money, direction: Direction, target: PnlTarget) -> LevelSearch {
        self.plan.level_search(anchor, direction, target)
    }

    /// Move the stop to breakeven once the favorable excursion reaches the trigger
    ///
    /// Applies at most once per position. Returns whether the stop was moved.
    pub fn apply_breakeven<V: Venue + ?Sized>(
        &mut self,
        close: Money,
        venue: &mut V,
        log: &mut EventLog,
        bar: u64,
    ) -> EngineResult<bool> {
        let LifecycleState::Open {
            direction,
            breakeven_applied: false,
        } = self.state
        else {
            return Ok(false);
        };
        let (Some(rule), Some(entry)) = (self.plan.breakeven, self.position.entry_price) else {
            return Ok(false);
        };
        let Some(handle) = self.protective.as_ref().map(|p| p.handle) else {
            return Ok(false);
        };

        let excursion = favorable_excursion_pct(entry, close, direction);
        if excursion < rule.trigger_pct {
            return Ok(false);
        }

        let level = breakeven_level(entry, direction, rule.offset_ticks, self.plan.tick_size);
        venue
            .modify(handle, level, BREAKEVEN_LABEL)
            .map_err(|e| self.rejected(log, bar, "breakeven modify", BREAKEVEN_LABEL, e))?;

        if let Some(protective) = self.protective.as_mut() {
            protective.price = level;
            protective.label = BREAKEVEN_LABEL.to_string();
        }
        self.position.breakeven_applied = true;
        self.state = LifecycleState::Open {
            direction,
            breakeven_applied: true,
        };

        info!(
            symbol = %self.plan.symbol,
            %direction,
            %entry,
            stop = %level,
            excursion_pct = excursion,
            "{}", BREAKEVEN_LABEL
        );
        log.record(
            bar,
            EventKind::BreakevenApplied,
            BREAKEVEN_LABEL,
            format!("stop {} moved to {} at {:.2}% excursion", handle, level, excursion),
        );
        Ok(true)
    }

    /// Cancel the protective stop and submit the closing market order
    pub fn exit<V: Venue + ?Sized>(
        &mut self,
        decision: Decision,
        venue: &mut V,
        log: &mut EventLog,
        bar: u64,
    ) -> EngineResult<bool> {
        let LifecycleState::Open { direction, .. } = self.state else {
            return Ok(false);
        };
        let label = exit_label(decision, direction);

        let cancelled = self.protective.take();
        if let Some(stop) = &cancelled {
            if let Err(e) = venue.cancel(stop.handle) {
                self.protective = cancelled;
                return Err(self.rejected(log, bar, "protective stop cancel", &label, e));
            }
        }

        let request = OrderRequest::market(
            self.plan.symbol.clone(),
            direction.exit_side(),
            self.position.quantity,
            label.as_str(),
        );
        match venue.submit(&request) {
            Ok(handle) => {
                self.state = LifecycleState::ExitPending { direction };
                self.pending = Some(handle);
                self.pending_label = label.clone();
                info!(symbol = %self.plan.symbol, %direction, ?decision, "📉 {}", label);
                log.record(bar, EventKind::ExitSubmitted, label, format!("exit {}", handle));
                Ok(true)
            }
            Err(e) => {
                let err = self.rejected(log, bar, "exit order", &label, e);
                if let Some(stop) = cancelled {
                    self.restore_stop(stop, venue, log, bar);
                }
                Err(err)
            }
        }
    }

    fn restore_stop<V: Venue + ?Sized>(
        &mut self,
        stop: ProtectiveOrder,
        venue: &mut V,
        log: &mut EventLog,
        bar: u64,
    ) {
        let request = OrderRequest::stop(
            self.plan.symbol.clone(),
            stop.side,
            self.position.quantity,
            stop.price,
            stop.label.as_str(),
        );
        match venue.submit(&request) {
            Ok(handle) => {
                info!(symbol = %self.plan.symbol, %handle, price = %stop.price, "Protective stop restored");
                self.protective = Some(ProtectiveOrder { handle, ..stop });
            }
            Err(e) => {
                error!(
                    symbol = %self.plan.symbol,
                    price = %stop.price,
                    "Position left without protective stop: {}",
                    e
                );
                log.record(
                    bar,
                    EventKind::RollbackFailed,
                    stop.label,
                    format!("restore stop @ {}: {}", stop.price, e),
                );
            }
        }
    }

    /// Apply a fill reported by the venue
    pub fn on_fill(
        &mut self,
        handle: OrderHandle,
        price: Money,
        log: &mut EventLog,
        bar: u64,
    ) -> FillOutcome {
        let state = self.state;
        match state {
            LifecycleState::EntryPending { direction } if self.pending == Some(handle) => {
                let opened = self.open(direction, price, log, bar);
                let Some((stop_price, label)) = self.early_stop.take() else {
                    return opened;
                };
                let trip = self.close(direction, stop_price, label);
                info!(symbol = %self.plan.symbol, %direction, %price, pnl = %trip.pnl, "🛑 {}", trip.exit_label);
                log.record(
                    bar,
                    EventKind::StopFilled,
                    trip.exit_label.as_str(),
                    format!("entry {} @ {} closed by earlier stop @ {}, pnl {}", handle, price, stop_price, trip.pnl),
                );
                FillOutcome::Closed(trip)
            }
            LifecycleState::EntryPending { direction }
                if self.protective.as_ref().map(|p| p.handle) == Some(handle) =>
            {
                let label = self
                    .protective
                    .take()
                    .map(|p| p.label)
                    .unwrap_or_else(|| STOP_LABEL.to_string());
                warn!(symbol = %self.plan.symbol, %handle, %price, "Stop filled before its entry");
                log.record(
                    bar,
                    EventKind::StopFilled,
                    label.as_str(),
                    format!("filled {} @ {} before entry", handle, price),
                );
                self.early_stop = Some((price, label));
                FillOutcome::StopAheadOfEntry { direction, price }
            }
            LifecycleState::ExitPending { direction } if self.pending == Some(handle) => {
                let label = std::mem::take(&mut self.pending_label);
                let trip = self.close(direction, price, label);
                info!(symbol = %self.plan.symbol, %direction, %price, pnl = %trip.pnl, "Position closed");
                log.record(
                    bar,
                    EventKind::ExitFilled,
                    trip.exit_label.as_str(),
                    format!("filled {} @ {}, pnl {}", handle, price, trip.pnl),
                );
                FillOutcome::Closed(trip)
            }
            LifecycleState::Open { direction, .. }
                if self.protective.as_ref().map(|p| p.handle) == Some(handle) =>
            {
                let label = self
                    .protective
                    .as_ref()
                    .map(|p| p.label.clone())
                    .unwrap_or_else(|| STOP_LABEL.to_string());
                let trip = self.close(direction, price, label);
                info!(symbol = %self.plan.symbol, %direction, %price, pnl = %trip.pnl, "🛑 {}", trip.exit_label);
                log.record(
                    bar,
                    EventKind::StopFilled,
                    trip.exit_label.as_str(),
                    format!("filled {} @ {}, pnl {}", handle, price, trip.pnl),
                );
                FillOutcome::Closed(trip)
            }
            state => {
                warn!(symbol = %self.plan.symbol, %handle, %price, %state, "Ignoring fill for an order that is not pending");
                log.record(
                    bar,
                    EventKind::DuplicateFillNotification,
                    "",
                    format!("fill {} @ {} while {}", handle, price, state),
                );
                FillOutcome::Ignored
            }
        }
    }

    fn open(&mut self, direction: Direction, price: Money, log: &mut EventLog, bar: u64) -> FillOutcome {
        self.position = Position::opened(direction, self.plan.quantity, price);
        self.state = LifecycleState::Open {
            direction,
            breakeven_applied: false,
        };
        self.pending = None;
        let label = std::mem::take(&mut self.pending_label);

        self.take_profit = self.plan.take_profit_amount.and_then(|amount| {
            match self.level_search(price, direction, PnlTarget::Gain(amount)).solve() {
                Ok(level) => Some(level),
                Err(err) => {
                    warn!(symbol = %self.plan.symbol, "Take-profit level search failed: {}", err);
                    log.record(bar, EventKind::UnreachableLevel, TAKE_PROFIT_LABEL, err.to_string());
                    None
                }
            }
        });

        info!(
            symbol = %self.plan.symbol,
            %direction,
            %price,
            take_profit = ?self.take_profit.map(|tp| tp.to_string()),
            "Entry filled"
        );
        log.record(bar, EventKind::EntryFilled, label, format!("filled @ {}", price));
        FillOutcome::Opened { direction, price }
    }

    fn close(&mut self, direction: Direction, price: Money, exit_label: String) -> RoundTrip {
        let entry_price = self.position.entry_price.unwrap_or(price);
        let trip = RoundTrip {
            direction,
            quantity: self.position.quantity,
            entry_price,
            exit_price: price,
            pnl: pnl_at(entry_price, price, direction, self.plan.position_point_value()),
            exit_label,
            breakeven_applied: self.position.breakeven_applied,
        };
        self.reset();
        trip
    }

    fn reset(&mut self) {
        self.state = LifecycleState::Flat;
        self.position.reset();
        self.protective = None;
        self.take_profit = None;
        self.pending = None;
        self.pending_label.clear();
        self.early_stop = None;
    }

    fn rejected(
        &self,
        log: &mut EventLog,
        bar: u64,
        action: &'static str,
        label: &str,
        source: VenueError,
    ) -> EngineError {
        warn!(symbol = %self.plan.symbol, state = %self.state, "Venue rejected {}: {}", action, source);
        log.record(bar, EventKind::VenueRejection, label, format!("{}: {}", action, source));
        EngineError::rejection(action, source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oms::venue::{PaperVenue, Rejection, VenueRequest};
    use crate::oms::OrderKind;
    use rust_decimal_macros::dec;

    fn plan() -> OrderPlan {
        OrderPlan {
            symbol: Symbol::new("ES"),
            quantity: 1,
            tick_size: Money::from(dec!(0.25)),
            point_value: Money::from(dec!(20)),
            stop: StopRule::Amount(Money::from(dec!(3000))),
            fallback_stop_pct: None,
            take_profit_amount: Some(Money::from(dec!(2000))),
            breakeven: Some(BreakevenRule {
                trigger_pct: 2.0,
                offset_ticks: 100,
            }),
            max_level_steps: 10_000,
        }
    }

    fn open_long(lifecycle: &mut Lifecycle, venue: &mut PaperVenue, log: &mut EventLog) {
        assert!(lifecycle
            .enter(Direction::Long, Money::from(dec!(4000)), venue, log, 1)
            .unwrap());
        let fills = venue.fill_market_orders(Money::from(dec!(4000)));
        for (handle, price) in fills {
            lifecycle.on_fill(handle, price, log, 1);
        }
    }

    #[test]
    fn test_entry_submits_market_then_stop() {
        let mut lifecycle = Lifecycle::new(plan());
        let mut venue = PaperVenue::new();
        let mut log = EventLog::default();

        lifecycle
            .enter(Direction::Long, Money::from(dec!(4000)), &mut venue, &mut log, 1)
            .unwrap();

        assert!(venue.requests()[0].is_submit_of(OrderKind::Market));
        assert!(venue.requests()[1].is_submit_of(OrderKind::Stop));
        assert_eq!(lifecycle.state(), LifecycleState::EntryPending { direction: Direction::Long });
        let stop = lifecycle.protective().unwrap();
        assert_eq!(stop.price, Money::from(dec!(3850)));
        assert_eq!(stop.side, crate::Side::Sell);
    }

    #[test]
    fn test_entry_fill_sets_take_profit() {
        let mut lifecycle = Lifecycle::new(plan());
        let mut venue = PaperVenue::new();
        let mut log = EventLog::default();
        open_long(&mut lifecycle, &mut venue, &mut log);

        assert!(lifecycle.state().is_open());
        assert_eq!(lifecycle.position().entry_price, Some(Money::from(dec!(4000))));
        assert_eq!(lifecycle.take_profit(), Some(Money::from(dec!(4100))));
    }

    #[test]
    fn test_stop_rejection_cancels_entry() {
        let mut lifecycle = Lifecycle::new(plan());
        let mut venue = PaperVenue::new();
        let mut log = EventLog::default();
        venue.reject_next(Rejection::Submit(OrderKind::Stop), "no margin");

        let err = lifecycle
            .enter(Direction::Long, Money::from(dec!(4000)), &mut venue, &mut log, 1)
            .unwrap_err();
        assert!(matches!(err, EngineError::VenueRejection { action: "protective stop", .. }));
        assert!(lifecycle.state().is_flat());
        assert!(lifecycle.protective().is_none());
        assert!(venue.requests().last().unwrap().is_cancel());
        assert_eq!(venue.working_orders().count(), 0);
    }

    #[test]
    fn test_exit_rejection_restores_stop() {
        let mut lifecycle = Lifecycle::new(plan());
        let mut venue = PaperVenue::new();
        let mut log = EventLog::default();
        open_long(&mut lifecycle, &mut venue, &mut log);
        venue.reject_next(Rejection::Submit(OrderKind::Market), "market closed");

        let result = lifecycle.exit(Decision::ExitLong, &mut venue, &mut log, 2);
        assert!(result.is_err());
        assert!(lifecycle.state().is_open());
        let stop = lifecycle.protective().unwrap();
        assert_eq!(stop.price, Money::from(dec!(3850)));
        assert!(venue.working_order(stop.handle).is_some());
        assert_eq!(log.count(EventKind::VenueRejection), 1);
    }

    #[test]
    fn test_cancel_rejection_keeps_open() {
        let mut lifecycle = Lifecycle::new(plan());
        let mut venue = PaperVenue::new();
        let mut log = EventLog::default();
        open_long(&mut lifecycle, &mut venue, &mut log);
        let before = lifecycle.protective().cloned();
        venue.reject_next(Rejection::Cancel, "busy");

        assert!(lifecycle.exit(Decision::ExitLong, &mut venue, &mut log, 2).is_err());
        assert!(lifecycle.state().is_open());
        assert_eq!(lifecycle.protective().cloned(), before);
        assert!(!venue.requests().last().unwrap().is_submit_of(OrderKind::Market));
    }

    #[test]
    fn test_breakeven_once() {
        let mut lifecycle = Lifecycle::new(plan());
        let mut venue = PaperVenue::new();
        let mut log = EventLog::default();
        open_long(&mut lifecycle, &mut venue, &mut log);

        assert!(!lifecycle
            .apply_breakeven(Money::from(dec!(4079)), &mut venue, &mut log, 2)
            .unwrap());
        assert!(lifecycle
            .apply_breakeven(Money::from(dec!(4080)), &mut venue, &mut log, 3)
            .unwrap());
        assert!(!lifecycle
            .apply_breakeven(Money::from(dec!(4200)), &mut venue, &mut log, 4)
            .unwrap());

        let modifies = venue.requests().iter().filter(|r| r.is_modify()).count();
        assert_eq!(modifies, 1);
        assert_eq!(lifecycle.protective().unwrap().price, Money::from(dec!(4025)));
        assert!(lifecycle.position().breakeven_applied);
    }

    #[test]
    fn test_breakeven_rejection_keeps_flag_clear() {
        let mut lifecycle = Lifecycle::new(plan());
        let mut venue = PaperVenue::new();
        let mut log = EventLog::default();
        open_long(&mut lifecycle, &mut venue, &mut log);
        venue.reject_next(Rejection::Modify, "too close to market");

        assert!(lifecycle
            .apply_breakeven(Money::from(dec!(4100)), &mut venue, &mut log, 2)
            .is_err());
        assert!(!lifecycle.position().breakeven_applied);
        assert_eq!(lifecycle.protective().unwrap().price, Money::from(dec!(3850)));

        assert!(lifecycle
            .apply_breakeven(Money::from(dec!(4100)), &mut venue, &mut log, 3)
            .unwrap());
    }

    #[test]
    fn test_stop_fill_before_entry_fill() {
        let mut lifecycle = Lifecycle::new(plan());
        let mut venue = PaperVenue::new();
        let mut log = EventLog::default();
        lifecycle
            .enter(Direction::Long, Money::from(dec!(4000)), &mut venue, &mut log, 1)
            .unwrap();

        let stops = venue.triggered_stops(Money::from(dec!(3840)));
        let (handle, price) = stops[0];
        let outcome = lifecycle.on_fill(handle, price, &mut log, 1);
        assert_eq!(
            outcome,
            FillOutcome::StopAheadOfEntry { direction: Direction::Long, price: Money::from(dec!(3850)) }
        );
        assert!(lifecycle.protective().is_none());
        assert!(lifecycle.state().is_pending());

        let fills = venue.fill_market_orders(Money::from(dec!(4000)));
        let (handle, price) = fills[0];
        let trip = lifecycle.on_fill(handle, price, &mut log, 1).round_trip().cloned().unwrap();
        assert_eq!(trip.entry_price, Money::from(dec!(4000)));
        assert_eq!(trip.exit_price, Money::from(dec!(3850)));
        assert_eq!(trip.pnl, Money::from(dec!(-3000)));
        assert_eq!(trip.exit_label, STOP_LABEL);
        assert!(lifecycle.state().is_flat());
        assert!(lifecycle.position().is_flat());
        assert!(lifecycle.take_profit().is_none());
        assert_eq!(log.count(EventKind::StopFilled), 2);
        assert_eq!(log.count(EventKind::DuplicateFillNotification), 0);
    }

    #[test]
    fn test_unknown_fill_ignored() {
        let mut lifecycle = Lifecycle::new(plan());
        let mut log = EventLog::default();
        let outcome = lifecycle.on_fill(OrderHandle(99), Money::from(dec!(1)), &mut log, 1);
        assert_eq!(outcome, FillOutcome::Ignored);
        assert_eq!(log.count(EventKind::DuplicateFillNotification), 1);
    }

    #[test]
    fn test_unreachable_stop_uses_fallback_or_skips() {
        let mut tight = plan();
        tight.max_level_steps = 10;
        let mut lifecycle = Lifecycle::new(tight.clone());
        let mut venue = PaperVenue::new();
        let mut log = EventLog::default();

        assert!(!lifecycle
            .enter(Direction::Long, Money::from(dec!(4000)), &mut venue, &mut log, 1)
            .unwrap());
        assert!(venue.requests().is_empty());
        assert_eq!(log.count(EventKind::EntrySkipped), 1);

        tight.fallback_stop_pct = Some(1.0);
        let mut lifecycle = Lifecycle::new(tight);
        assert!(lifecycle
            .enter(Direction::Long, Money::from(dec!(4000)), &mut venue, &mut log, 2)
            .unwrap());
        assert_eq!(lifecycle.protective().unwrap().price, Money::from(dec!(3960)));
        assert!(matches!(
            venue.requests().last(),
            Some(VenueRequest::Submit { .. })
        ));
    }
}
