//! Property tests for the signal grammar.
//!
//! 1. Text without a signal marker is never a signal, and parsing is repeatable
//! 2. Take profit on the wrong side of entry is always rejected
//! 3. Leverage outside 1..=125 is always rejected, including negatives and
//!    values too wide for `u32`
//! 4. Rendering a valid signal and parsing it back gives the same signal

use common::models::{Direction, InvalidSignal, Signal, SignalDraft};
use proptest::prelude::*;
use rust_decimal::Decimal;
use signals::{SignalError, parse, render};

// ── Strategies ───────────────────────────────────────────────────────

fn arb_price() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000, 0u32..6).prop_map(|(mantissa, scale)| Decimal::new(mantissa, scale))
}

fn arb_symbol() -> impl Strategy<Value = String> {
    "[A-Z]{3,12}"
}

fn arb_direction() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::Long), Just(Direction::Short)]
}

fn signal_text(direction: &str, entry: Decimal, tp: Decimal, leverage: i64, margin: Decimal) -> String {
    format!(
        "{} SIGNAL - BTCUSDT\nEntry: {}\nTP: {}\nLeverage: {}x\nMargin: ${}",
        direction, entry, tp, leverage, margin
    )
}

// ── 1. Not a signal ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn text_without_marker_is_not_a_signal(text in "\\PC{0,200}") {
        prop_assume!(!text.to_lowercase().contains("signal"));

        let first = parse(&text);
        let second = parse(&text);
        prop_assert_eq!(&first, &Err(SignalError::NotASignal));
        prop_assert_eq!(first, second);
    }
}

// ── 2. Take profit direction ─────────────────────────────────────────

proptest! {
    #[test]
    fn long_take_profit_not_above_entry_is_invalid(
        entry in arb_price(),
        tp in arb_price(),
        margin in arb_price(),
    ) {
        prop_assume!(tp <= entry);
        let result = parse(&signal_text("🟢 LONG", entry, tp, 10, margin));
        let rejected_for_tp = matches!(
            result,
            Err(SignalError::Invalid(InvalidSignal::LongTakeProfitNotAboveEntry { .. }))
        );
        prop_assert!(rejected_for_tp);
    }

    #[test]
    fn short_take_profit_not_below_entry_is_invalid(
        entry in arb_price(),
        tp in arb_price(),
        margin in arb_price(),
    ) {
        prop_assume!(tp >= entry);
        let result = parse(&signal_text("🔴 SHORT", entry, tp, 10, margin));
        let rejected_for_tp = matches!(
            result,
            Err(SignalError::Invalid(InvalidSignal::ShortTakeProfitNotBelowEntry { .. }))
        );
        prop_assert!(rejected_for_tp);
    }
}

// ── 3. Leverage range ────────────────────────────────────────────────

proptest! {
    #[test]
    fn leverage_out_of_range_is_invalid(
        leverage in prop_oneof![
            Just(0i64),
            126i64..1_000_000,
            i64::MIN..0,
            (i64::from(u32::MAX) + 1)..=i64::MAX,
        ],
    ) {
        let result = parse(&signal_text(
            "🟢 LONG",
            Decimal::new(60_000, 0),
            Decimal::new(62_000, 0),
            leverage,
            Decimal::new(50, 0),
        ));
        prop_assert_eq!(
            result,
            Err(SignalError::Invalid(InvalidSignal::LeverageOutOfRange(leverage)))
        );
    }
}

// ── 4. Round trip ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn rendered_signal_parses_back_equal(
        direction in arb_direction(),
        symbol in arb_symbol(),
        a in arb_price(),
        b in arb_price(),
        stop_loss in proptest::option::of(arb_price()),
        leverage in 1u32..=125,
        margin in arb_price(),
    ) {
        prop_assume!(a != b);
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        let (entry, take_profit) = match direction {
            Direction::Long => (low, high),
            Direction::Short => (high, low),
        };

        let signal = Signal::try_from_draft(SignalDraft {
            direction,
            symbol,
            entry,
            take_profit,
            stop_loss,
            leverage: i64::from(leverage),
            margin,
        })
        .unwrap();

        let reparsed = parse(&render(&signal)).unwrap();
        prop_assert_eq!(reparsed, signal);
    }
}
