//! Bar-driven strategy engine
//!
//! One engine drives one position for one instrument. Per bar:
//! 1. read the close from the indicator source
//! 2. if open, shift the stop to breakeven when due (before any exit check).
//!    A refused shift is reported on the outcome and does not block exits.
//! 3. evaluate the signal rules
//! 4. hand the decision to the lifecycle, which talks to the venue
//!
//! Fills come back through [`StrategyEngine::on_fill`]. Engines share nothing,
//! so independent instances can run on separate threads.

use serde::Serialize;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::{ConfigError, EngineError, EngineResult};
use crate::events::{EngineEvent, EventLog};
use crate::indicators::{IndicatorSource, CLOSE};
use crate::oms::{
    FillOutcome, Lifecycle, LifecycleState, OrderHandle, Position, ProtectiveOrder, Venue,
};
use crate::signal::{self, ConfirmationCounter, Decision};
use crate::{Money, Symbol};

/// What one bar did
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarOutcome {
    /// Bars seen, including this one
    pub bar: u64,
    pub decision: Decision,
    /// Whether the stop was moved to breakeven on this bar
    pub breakeven_shifted: bool,
    /// Venue refusal of the breakeven modify. The bar still evaluated its
    /// exits; the shift is retried on the next bar.
    #[serde(skip)]
    pub breakeven_rejection: Option<EngineError>,
    /// Whether the decision produced venue requests
    pub acted: bool,
}

/// Read-only view of an engine
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineSnapshot {
    pub symbol: Symbol,
    pub bar: u64,
    pub state: LifecycleState,
    pub position: Position,
    pub protective: Option<ProtectiveOrder>,
    pub take_profit: Option<Money>,
    pub pending_order: Option<OrderHandle>,
    pub confirmation: ConfirmationCounter,
    pub last_decision: Option<Decision>,
    pub events: Vec<EngineEvent>,
}

impl EngineSnapshot {
    /// Position, orders and counter equal to a freshly built engine
    pub fn is_pristine(&self) -> bool {
        self.state == LifecycleState::Flat
            && self.position == Position::flat()
            && self.protective.is_none()
            && self.take_profit.is_none()
            && self.pending_order.is_none()
            && self.confirmation == ConfirmationCounter::default()
    }
}

pub struct StrategyEngine<S, V> {
    config: EngineConfig,
    source: S,
    venue: V,
    lifecycle: Lifecycle,
    counter: ConfirmationCounter,
    events: EventLog,
    bar: u64,
    last_decision: Option<Decision>,
}

impl<S: IndicatorSource, V: Venue> StrategyEngine<S, V> {
    /// Validate the configuration against the source and build the engine
    pub fn new(config: EngineConfig, source: S, venue: V) -> Result<Self, ConfigError> {
        config.validate()?;
        for name in config.rules.required_series() {
            if !source.has_series(&name) {
                return Err(ConfigError::MissingSeries(name));
            }
        }
        let plan = config.params.order_plan()?;
        let events = EventLog::new(config.params.event_log_capacity);

        info!(
            symbol = %plan.symbol,
            strategy = %config.strategy_name,
            direction = %config.rules.direction,
            "Strategy engine initialized"
        );

        Ok(Self {
            lifecycle: Lifecycle::new(plan),
            config,
            source,
            venue,
            counter: ConfirmationCounter::new(),
            events,
            bar: 0,
            last_decision: None,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Mutable access for appending the next bar's readings
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn venue(&self) -> &V {
        &self.venue
    }

    pub fn venue_mut(&mut self) -> &mut V {
        &mut self.venue
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Process the bar currently at lookback 0 of the source
    pub fn on_bar(&mut self) -> EngineResult<BarOutcome> {
        self.bar += 1;
        let bar = self.bar;

        let Some(close) = self.source.reading(CLOSE, 0) else {
            debug!(bar, "No close reading, bar skipped");
            return Ok(self.outcome(Decision::Hold, false, false, None));
        };
        let close = Money::from_f64(close);

        if self.lifecycle.state().is_pending() {
            debug!(bar, state = %self.lifecycle.state(), "Awaiting fill");
            return Ok(self.outcome(Decision::Hold, false, false, None));
        }

        let (shifted, breakeven_rejection) =
            match self
                .lifecycle
                .apply_breakeven(close, &mut self.venue, &mut self.events, bar)
            {
                Ok(shifted) => (shifted, None),
                Err(e) => (false, Some(e)),
            };

        let open = self.lifecycle.open_position();
        let decision = signal::evaluate(
            &self.config.rules,
            &self.source,
            open.as_ref(),
            &mut self.counter,
        );
        debug!(bar, %close, ?decision, state = %self.lifecycle.state(), "Bar evaluated");

        let acted = match decision {
            Decision::Hold => false,
            Decision::EnterLong | Decision::EnterShort => {
                let direction = decision.entry_direction().unwrap_or(self.config.rules.direction);
                self.lifecycle
                    .enter(direction, close, &mut self.venue, &mut self.events, bar)?
            }
            _ => self
                .lifecycle
                .exit(decision, &mut self.venue, &mut self.events, bar)?,
        };

        Ok(self.outcome(decision, shifted, acted, breakeven_rejection))
    }

    /// Venue callback for a fill of `handle` at `price`
    pub fn on_fill(&mut self, handle: OrderHandle, price: Money) -> FillOutcome {
        let outcome = self
            .lifecycle
            .on_fill(handle, price, &mut self.events, self.bar);
        if matches!(outcome, FillOutcome::Closed(_)) {
            self.counter.reset();
        }
        outcome
    }

    pub fn current_state(&self) -> EngineSnapshot {
        EngineSnapshot {
            symbol: self.lifecycle.plan().symbol.clone(),
            bar: self.bar,
            state: self.lifecycle.state(),
            position: self.lifecycle.position().clone(),
            protective: self.lifecycle.protective().cloned(),
            take_profit: self.lifecycle.take_profit(),
            pending_order: self.lifecycle.pending_order(),
            confirmation: self.counter,
            last_decision: self.last_decision,
            events: self.events.iter().cloned().collect(),
        }
    }

    fn outcome(
        &mut self,
        decision: Decision,
        breakeven_shifted: bool,
        acted: bool,
        breakeven_rejection: Option<EngineError>,
    ) -> BarOutcome {
        self.last_decision = Some(decision);
        BarOutcome {
            bar: self.bar,
            decision,
            breakeven_shifted,
            breakeven_rejection,
            acted,
        }
    }
}
