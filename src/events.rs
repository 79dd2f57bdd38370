//! Structured engine event log
//!
//! Every transition and its cause is recorded here as well as traced, so a
//! host can inspect what happened through the snapshot without a subscriber.

use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;

/// Default number of events kept per engine
pub const DEFAULT_EVENT_LOG_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    EntrySubmitted,
    EntrySkipped,
    EntryFilled,
    BreakevenApplied,
    ExitSubmitted,
    ExitFilled,
    StopFilled,
    /// Level search gave up; a fallback (or nothing) was used
    UnreachableLevel,
    VenueRejection,
    /// Restoring the pre-request state after a rejection failed
    RollbackFailed,
    DuplicateFillNotification,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::EntrySubmitted => "entry_submitted",
            EventKind::EntrySkipped => "entry_skipped",
            EventKind::EntryFilled => "entry_filled",
            EventKind::BreakevenApplied => "breakeven_applied",
            EventKind::ExitSubmitted => "exit_submitted",
            EventKind::ExitFilled => "exit_filled",
            EventKind::StopFilled => "stop_filled",
            EventKind::UnreachableLevel => "unreachable_level",
            EventKind::VenueRejection => "venue_rejection",
            EventKind::RollbackFailed => "rollback_failed",
            EventKind::DuplicateFillNotification => "duplicate_fill_notification",
        };
        f.write_str(name)
    }
}

/// One recorded transition or anomaly
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineEvent {
    /// Bars seen when the event happened
    pub bar: u64,
    pub kind: EventKind,
    /// Order label involved, if any
    pub label: String,
    pub detail: String,
}

/// Ring buffer of the most recent events
#[derive(Debug, Clone)]
pub struct EventLog {
    capacity: usize,
    events: VecDeque<EngineEvent>,
    dropped: u64,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            events: VecDeque::with_capacity(capacity.min(DEFAULT_EVENT_LOG_CAPACITY)),
            dropped: 0,
        }
    }

    pub fn record(
        &mut self,
        bar: u64,
        kind: EventKind,
        label: impl Into<String>,
        detail: impl Into<String>,
    ) {
        if self.capacity == 0 {
            self.dropped += 1;
            return;
        }
        if self.events.len() == self.capacity {
            self.events.pop_front();
            self.dropped += 1;
        }
        self.events.push_back(EngineEvent {
            bar,
            kind,
            label: label.into(),
            detail: detail.into(),
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &EngineEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events evicted because the buffer was full
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }

    pub fn last(&self) -> Option<&EngineEvent> {
        self.events.back()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_LOG_CAPACITY)
    }
}
