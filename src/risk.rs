//! Risk level calculations
//!
//! Price levels for protective stops, profit targets and breakeven shifts.
//!
//! # P&L convention
//!
//! Per contract, unrealized P&L at `price` for a position opened at `anchor` is
//!
//! ```text
//! long:  (price - anchor) * point_value
//! short: (anchor - price) * point_value
//! ```
//!
//! All levels returned here lie on the instrument's tick grid. Arithmetic is
//! done in `Money` (decimal), so grid membership is exact.

use crate::error::RiskError;
use crate::{Direction, Money};

/// Default cap on tick steps scanned by [`LevelSearch`]
pub const DEFAULT_MAX_LEVEL_STEPS: u32 = 100_000;

/// Round `price` up to the tick grid.
///
/// Returns the smallest multiple of `tick_size` that is >= `price`; a price
/// already on the grid comes back unchanged. A non-positive tick leaves the
/// price untouched.
pub fn round_to_tick(price: Money, tick_size: Money) -> Money {
    if !tick_size.is_positive() {
        return price;
    }
    (price / tick_size).ceil() * tick_size
}

/// Whether `price` is an exact multiple of `tick_size`
pub fn is_on_tick(price: Money, tick_size: Money) -> bool {
    tick_size.is_positive() && round_to_tick(price, tick_size) == price
}

/// Per-contract P&L at `price` for a position opened at `anchor`
pub fn pnl_at(anchor: Money, price: Money, direction: Direction, point_value: Money) -> Money {
    (price - anchor) * point_value * Money::from_i64(direction.sign())
}

/// Which way the searched level lies from the anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PnlTarget {
    /// Level where the position has lost at least this amount (stop)
    Loss(Money),
    /// Level where the position has gained at least this amount (target)
    Gain(Money),
}

impl PnlTarget {
    pub fn amount(self) -> Money {
        match self {
            PnlTarget::Loss(amount) | PnlTarget::Gain(amount) => amount,
        }
    }

    fn reached(self, pnl: Money) -> bool {
        match self {
            PnlTarget::Loss(amount) => -pnl >= amount,
            PnlTarget::Gain(amount) => pnl >= amount,
        }
    }

    /// +1 when the scan walks up in price, -1 when it walks down
    fn scan_sign(self, direction: Direction) -> i64 {
        match self {
            PnlTarget::Loss(_) => -direction.sign(),
            PnlTarget::Gain(_) => direction.sign(),
        }
    }
}

/// Bounded tick-by-tick scan for the level reaching a P&L target
///
/// The scan starts at `start` (the anchor by default) snapped up to the grid,
/// walks one tick at a time toward loss or gain, and stops at the first level
/// whose P&L reaches the target. It gives up with
/// [`RiskError::UnreachableLevel`] after `max_steps` ticks, or as soon as a
/// downward walk would reach a non-positive price.
#[derive(Debug, Clone)]
pub struct LevelSearch {
    pub anchor: Money,
    pub start: Money,
    pub direction: Direction,
    pub target: PnlTarget,
    pub point_value: Money,
    pub tick_size: Money,
    pub max_steps: u32,
}

impl LevelSearch {
    pub fn new(
        anchor: Money,
        direction: Direction,
        target: PnlTarget,
        point_value: Money,
        tick_size: Money,
    ) -> Self {
        Self {
            anchor,
            start: anchor,
            direction,
            target,
            point_value,
            tick_size,
            max_steps: DEFAULT_MAX_LEVEL_STEPS,
        }
    }

    /// Start scanning from a price other than the anchor (e.g. the current close)
    pub fn with_start(mut self, start: Money) -> Self {
        self.start = start;
        self
    }

    /// Set the step cap
    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn solve(&self) -> Result<Money, RiskError> {
        if !self.tick_size.is_positive() {
            return Err(RiskError::InvalidInput("tick size must be positive"));
        }
        if !self.point_value.is_positive() {
            return Err(RiskError::InvalidInput("point value must be positive"));
        }
        if !self.target.amount().is_positive() {
            return Err(RiskError::InvalidInput("target amount must be positive"));
        }

        let step = self.tick_size * Money::from_i64(self.target.scan_sign(self.direction));
        let origin = round_to_tick(self.start, self.tick_size);

        for k in 0..=self.max_steps {
            let price = origin + step * Money::from_i64(i64::from(k));
            if !price.is_positive() {
                break;
            }
            let pnl = pnl_at(self.anchor, price, self.direction, self.point_value);
            if self.target.reached(pnl) {
                return Ok(price);
            }
        }

        Err(RiskError::UnreachableLevel {
            anchor: self.anchor,
            target: self.target.amount(),
            steps: self.max_steps,
        })
    }
}

/// Stop level at which a position anchored at `anchor` loses `amount`
pub fn stop_level_for_loss(
    anchor: Money,
    direction: Direction,
    amount: Money,
    point_value: Money,
    tick_size: Money,
) -> Result<Money, RiskError> {
    LevelSearch::new(anchor, direction, PnlTarget::Loss(amount), point_value, tick_size).solve()
}

/// Level at which a position anchored at `anchor` gains `amount`
pub fn target_level_for_gain(
    anchor: Money,
    direction: Direction,
    amount: Money,
    point_value: Money,
    tick_size: Money,
) -> Result<Money, RiskError> {
    LevelSearch::new(anchor, direction, PnlTarget::Gain(amount), point_value, tick_size).solve()
}

/// Stop placed `pct` percent away from `close` on the losing side, on the grid
pub fn percent_stop_level(close: Money, direction: Direction, pct: f64, tick_size: Money) -> Money {
    let distance = close * Money::from_f64(pct / 100.0);
    let raw = match direction {
        Direction::Long => close - distance,
        Direction::Short => close + distance,
    };
    round_to_tick(raw, tick_size)
}

/// Favorable move from `entry` to `close`, in percent of the entry price
///
/// Positive when the position is in profit, negative otherwise.
pub fn favorable_excursion_pct(entry: Money, close: Money, direction: Direction) -> f64 {
    if entry.is_zero() {
        return 0.0;
    }
    let change = (close - entry) / entry * Money::from_i64(100 * direction.sign());
    change.to_f64()
}

/// Breakeven stop: entry shifted `offset_ticks` into profit, on the grid
pub fn breakeven_level(
    entry: Money,
    direction: Direction,
    offset_ticks: u32,
    tick_size: Money,
) -> Money {
    let offset = tick_size * Money::from_i64(i64::from(offset_ticks));
    let raw = entry + offset * Money::from_i64(direction.sign());
    round_to_tick(raw, tick_size)
}
