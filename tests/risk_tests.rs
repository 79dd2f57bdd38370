//! Level calculator properties across a range of contracts

use approx::assert_relative_eq;
use rust_decimal_macros::dec;

use futures_strategies::risk::{
    breakeven_level, favorable_excursion_pct, is_on_tick, pnl_at, round_to_tick,
    stop_level_for_loss, target_level_for_gain, LevelSearch, PnlTarget,
};
use futures_strategies::{Direction, Money, RiskError};

fn m(value: rust_decimal::Decimal) -> Money {
    Money::from(value)
}

fn ticks() -> Vec<Money> {
    vec![m(dec!(0.25)), m(dec!(0.1)), m(dec!(1)), m(dec!(0.03125))]
}

fn anchors() -> Vec<Money> {
    vec![m(dec!(4000)), m(dec!(3999.9)), m(dec!(101.3)), m(dec!(0.57))]
}

// =============================================================================
// Tick Rounding
// =============================================================================

#[test]
fn test_round_to_tick_idempotent() {
    let prices = [
        m(dec!(3850.10)),
        m(dec!(3850.25)),
        m(dec!(0.01)),
        m(dec!(-12.34)),
        m(dec!(125.03125)),
    ];
    for tick in ticks() {
        for price in prices {
            let once = round_to_tick(price, tick);
            assert_eq!(round_to_tick(once, tick), once, "price {} tick {}", price, tick);
            assert!(is_on_tick(once, tick));
            assert!(once >= price);
            assert!(once - price < tick);
        }
    }
}

// =============================================================================
// Level Search
// =============================================================================

#[test]
fn test_stop_scenario_long_4000() {
    let level = stop_level_for_loss(
        m(dec!(4000)),
        Direction::Long,
        m(dec!(3000)),
        m(dec!(20)),
        m(dec!(0.25)),
    )
    .unwrap();
    assert_eq!(level, m(dec!(3850)));
}

#[test]
fn test_levels_are_tight() {
    let point_values = [m(dec!(20)), m(dec!(50)), m(dec!(12.5))];
    let amounts = [m(dec!(3000)), m(dec!(1250)), m(dec!(777))];

    for tick in ticks() {
        for anchor in anchors() {
            for point_value in point_values {
                for amount in amounts {
                    for direction in [Direction::Long, Direction::Short] {
                        let stop = stop_level_for_loss(anchor, direction, amount, point_value, tick);
                        check_tight(stop, anchor, direction, point_value, tick, |pnl| -pnl >= amount);

                        let target =
                            target_level_for_gain(anchor, direction, amount, point_value, tick);
                        check_tight(target, anchor, direction, point_value, tick, |pnl| pnl >= amount);
                    }
                }
            }
        }
    }
}

/// The level reaches the target and the level one tick back toward the anchor does not
fn check_tight<F>(
    result: Result<Money, RiskError>,
    anchor: Money,
    direction: Direction,
    point_value: Money,
    tick: Money,
    reached: F,
) where
    F: Fn(Money) -> bool,
{
    let level = match result {
        Ok(level) => level,
        Err(RiskError::UnreachableLevel { .. }) => return,
        Err(e) => panic!("unexpected error {}", e),
    };
    assert!(is_on_tick(level, tick));
    assert!(reached(pnl_at(anchor, level, direction, point_value)));

    let closer = if level > anchor { level - tick } else { level + tick };
    let origin = round_to_tick(anchor, tick);
    if (level > anchor && closer >= origin) || (level < anchor && closer <= origin) {
        assert!(
            !reached(pnl_at(anchor, closer, direction, point_value)),
            "level {} not tight for anchor {}",
            level,
            anchor
        );
    }
}

#[test]
fn test_unreachable_within_step_cap() {
    // 150 points of quarter ticks is 600 steps
    let search = LevelSearch::new(
        m(dec!(4000)),
        Direction::Long,
        PnlTarget::Loss(m(dec!(3000))),
        m(dec!(20)),
        m(dec!(0.25)),
    )
    .with_max_steps(10);
    assert!(matches!(
        search.solve(),
        Err(RiskError::UnreachableLevel { steps: 10, .. })
    ));
}

#[test]
fn test_stop_below_zero_unreachable() {
    let result = stop_level_for_loss(
        m(dec!(10)),
        Direction::Long,
        m(dec!(5000)),
        m(dec!(1)),
        m(dec!(0.25)),
    );
    assert!(matches!(result, Err(RiskError::UnreachableLevel { .. })));
}

// =============================================================================
// Breakeven
// =============================================================================

#[test]
fn test_breakeven_levels() {
    let tick = m(dec!(0.25));
    assert_eq!(breakeven_level(m(dec!(4000)), Direction::Long, 100, tick), m(dec!(4025)));
    assert_eq!(breakeven_level(m(dec!(4000)), Direction::Short, 100, tick), m(dec!(3975)));
    assert_eq!(breakeven_level(m(dec!(4000)), Direction::Long, 0, tick), m(dec!(4000)));
}

#[test]
fn test_favorable_excursion() {
    assert_relative_eq!(
        favorable_excursion_pct(m(dec!(4000)), m(dec!(4080)), Direction::Long),
        2.0,
        epsilon = 1e-12
    );
    assert_relative_eq!(
        favorable_excursion_pct(m(dec!(4000)), m(dec!(3920)), Direction::Short),
        2.0,
        epsilon = 1e-12
    );
    assert_relative_eq!(
        favorable_excursion_pct(m(dec!(4000)), m(dec!(3920)), Direction::Long),
        -2.0,
        epsilon = 1e-12
    );
}
