//! Replay harness
//!
//! Drives one engine over a table of precomputed readings with a
//! [`PaperVenue`]. Per row:
//!
//! 1. append the row to the reading source
//! 2. deliver fills for stops the row's close touched
//! 3. run `on_bar`
//! 4. fill market orders sent on this bar at the row's close
//! 5. drain the venue's request log into the report's request count
//!
//! Stop fills arrive before the bar is evaluated, so a stopped-out position is
//! already flat when the exit rules would have run.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::data::ReadingTable;
use crate::engine::{EngineSnapshot, StrategyEngine};
use crate::error::ConfigError;
use crate::indicators::SeriesBook;
use crate::oms::{FillOutcome, OrderHandle, PaperVenue, RoundTrip};
use crate::signal::Decision;
use crate::{Direction, Money};

/// Summary of one replay
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub strategy_name: String,
    pub direction: Direction,
    pub bars: usize,
    pub decisions: BTreeMap<Decision, usize>,
    pub round_trips: Vec<RoundTrip>,
    pub rejections: Vec<String>,
    /// Requests the venue received over the whole replay
    pub venue_requests: usize,
    pub final_state: EngineSnapshot,
}

impl ReplayReport {
    pub fn total_pnl(&self) -> Money {
        self.round_trips.iter().map(|t| t.pnl).sum()
    }

    pub fn winning_trades(&self) -> usize {
        self.round_trips.iter().filter(|t| t.pnl.is_positive()).count()
    }

    pub fn losing_trades(&self) -> usize {
        self.round_trips.iter().filter(|t| t.pnl.is_negative()).count()
    }

    /// Percent of round trips closed in profit
    pub fn win_rate(&self) -> f64 {
        if self.round_trips.is_empty() {
            return 0.0;
        }
        self.winning_trades() as f64 / self.round_trips.len() as f64 * 100.0
    }

    pub fn largest_win(&self) -> Money {
        self.round_trips
            .iter()
            .map(|t| t.pnl)
            .fold(Money::ZERO, Money::max)
    }

    pub fn largest_loss(&self) -> Money {
        self.round_trips
            .iter()
            .map(|t| t.pnl)
            .fold(Money::ZERO, Money::min)
    }

    /// Round trips closed by the protective stop (initial or breakeven)
    pub fn stopped_out(&self) -> usize {
        self.round_trips
            .iter()
            .filter(|t| {
                t.exit_label == crate::oms::STOP_LABEL || t.exit_label == crate::oms::BREAKEVEN_LABEL
            })
            .count()
    }

    pub fn decision_count(&self, decision: Decision) -> usize {
        self.decisions.get(&decision).copied().unwrap_or(0)
    }
}

/// Replays one configuration over a reading table
#[derive(Debug, Clone)]
pub struct Replay {
    config: EngineConfig,
}

impl Replay {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn run(&self, table: &ReadingTable) -> Result<ReplayReport, ConfigError> {
        let mut engine =
            StrategyEngine::new(self.config.clone(), table.empty_book(), PaperVenue::new())?;

        let mut decisions = BTreeMap::new();
        let mut round_trips = Vec::new();
        let mut rejections = Vec::new();
        let mut venue_requests = 0;

        for index in 0..table.len() {
            engine.source_mut().push_bar(table.row(index));
            let close = table.close(index).map(Money::from_f64);

            if let Some(close) = close {
                let stops = engine.venue_mut().triggered_stops(close);
                deliver(&mut engine, stops, &mut round_trips);
            }

            match engine.on_bar() {
                Ok(outcome) => {
                    if let Some(e) = &outcome.breakeven_rejection {
                        warn!(bar = index + 1, "Breakeven not applied: {}", e);
                        rejections.push(format!("bar {}: {}", index + 1, e));
                    }
                    *decisions.entry(outcome.decision).or_insert(0) += 1;
                }
                Err(e) => {
                    warn!(bar = index + 1, "Bar rejected: {}", e);
                    rejections.push(format!("bar {}: {}", index + 1, e));
                }
            }

            if let Some(close) = close {
                let fills = engine.venue_mut().fill_market_orders(close);
                deliver(&mut engine, fills, &mut round_trips);
            }

            venue_requests += engine.venue_mut().drain_requests().len();
        }

        let report = ReplayReport {
            strategy_name: self.config.strategy_name.clone(),
            direction: self.config.direction(),
            bars: table.len(),
            decisions,
            round_trips,
            rejections,
            venue_requests,
            final_state: engine.current_state(),
        };
        info!(
            strategy = %report.strategy_name,
            bars = report.bars,
            trades = report.round_trips.len(),
            pnl = %report.total_pnl(),
            "Replay finished"
        );
        Ok(report)
    }
}

fn deliver(
    engine: &mut StrategyEngine<SeriesBook, PaperVenue>,
    fills: Vec<(OrderHandle, Money)>,
    round_trips: &mut Vec<RoundTrip>,
) {
    for (handle, price) in fills {
        match engine.on_fill(handle, price) {
            FillOutcome::Closed(trip) => round_trips.push(trip),
            outcome => debug!(%handle, %price, ?outcome, "Fill applied"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineParams;
    use crate::data::read_readings;
    use crate::signal::{Condition, SignalRules};
    use rust_decimal_macros::dec;

    fn config() -> EngineConfig {
        let params = EngineParams::new("ES", Money::from(dec!(0.25)), Money::from(dec!(20)))
            .with_stop_loss_amount(Money::from(dec!(1000)));
        let rules = SignalRules::new(Direction::Long, Condition::crosses_above("d", 20.0))
            .with_exit_trigger(Condition::crosses_below("d", 80.0));
        EngineConfig::new(params, rules)
    }

    #[test]
    fn test_signal_round_trip() {
        let csv = "datetime,close,d\n\
            2024-01-01,100,10\n\
            2024-01-02,101,25\n\
            2024-01-03,110,85\n\
            2024-01-04,112,75\n\
            2024-01-05,111,70\n";
        let table = read_readings(csv.as_bytes()).unwrap();
        let report = Replay::new(config()).run(&table).unwrap();

        assert_eq!(report.round_trips.len(), 1);
        let trip = &report.round_trips[0];
        assert_eq!(trip.entry_price, Money::from(dec!(101)));
        assert_eq!(trip.exit_price, Money::from(dec!(112)));
        assert_eq!(trip.pnl, Money::from(dec!(220)));
        assert_eq!(report.decision_count(Decision::EnterLong), 1);
        assert_eq!(report.decision_count(Decision::ExitLong), 1);
        // entry market, stop, then cancel and exit market
        assert_eq!(report.venue_requests, 4);
        assert!(report.final_state.is_pristine());
    }

    #[test]
    fn test_stop_out_suppresses_exit() {
        // stop for 1000 at 20/pt is 50 points under 101 = 51
        let csv = "datetime,close,d\n\
            2024-01-01,100,10\n\
            2024-01-02,101,25\n\
            2024-01-03,90,85\n\
            2024-01-04,50,75\n";
        let table = read_readings(csv.as_bytes()).unwrap();
        let report = Replay::new(config()).run(&table).unwrap();

        assert_eq!(report.round_trips.len(), 1);
        assert_eq!(report.round_trips[0].exit_price, Money::from(dec!(51)));
        assert_eq!(report.stopped_out(), 1);
        assert_eq!(report.decision_count(Decision::ExitLong), 0);
        assert_eq!(report.total_pnl(), Money::from(dec!(-1000)));
    }
}
