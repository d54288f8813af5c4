//! Integration tests for the execution simulator driven the way the
//! runner drives it: strategy decides at the close, the simulator fills
//! at the same bar's close.

use chrono::{Duration, TimeZone, Utc};

use barsweep_core::execution::{ExecutionSimulator, RejectReason, SubmitOutcome};
use barsweep_core::{Account, Bar, OrderIntent, Trade, TradeSide};

fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                symbol: "BTCUSDT".to_string(),
                timestamp: base + Duration::hours(i as i64),
                open,
                high: open.max(close) + 0.5,
                low: open.min(close) - 0.5,
                close,
                volume: 1_000.0,
            }
        })
        .collect()
}

fn submit(sim: &mut ExecutionSimulator, intent: OrderIntent, bar: &Bar) -> Option<Trade> {
    match sim.submit(&intent, bar) {
        SubmitOutcome::Filled(fill) => fill.closed_trade,
        SubmitOutcome::Rejected(reason) => panic!("unexpected rejection: {reason:?}"),
    }
}

#[test]
fn zero_commission_round_trip_pnl_is_exact() {
    let bars = bars_from_closes(&[100.0, 105.0, 110.0]);
    let mut sim = ExecutionSimulator::new(Account::new(10_000.0, 0.0));

    submit(&mut sim, OrderIntent::buy(50.0, 0, &bars[0]), &bars[0]);
    let trade = submit(&mut sim, OrderIntent::sell(50.0, 2, &bars[2]), &bars[2])
        .expect("full close emits a trade");

    // (110 - 100) * 50, no commission drag.
    assert_eq!(trade.gross_pnl, trade.net_pnl);
    assert!((trade.net_pnl - 500.0).abs() < 1e-9);
    assert!((sim.account().cash - 10_500.0).abs() < 1e-9);
    assert!(sim.position().is_flat());
}

#[test]
fn commissions_are_charged_on_both_sides() {
    let bars = bars_from_closes(&[100.0, 100.0]);
    let mut sim = ExecutionSimulator::new(Account::new(10_000.0, 0.001));

    submit(&mut sim, OrderIntent::buy(10.0, 0, &bars[0]), &bars[0]);
    let trade = submit(&mut sim, OrderIntent::sell(10.0, 1, &bars[1]), &bars[1])
        .expect("trade closed");

    assert_eq!(trade.gross_pnl, 0.0);
    assert!((trade.commission - 2.0).abs() < 1e-9);
    assert!((trade.net_pnl + 2.0).abs() < 1e-9);
    assert!((sim.account().cash - 9_998.0).abs() < 1e-9);
}

#[test]
fn pyramided_entries_close_into_single_trade() {
    let bars = bars_from_closes(&[100.0, 90.0, 80.0, 95.0]);
    let mut sim = ExecutionSimulator::new(Account::new(100_000.0, 0.0));

    submit(&mut sim, OrderIntent::buy(10.0, 0, &bars[0]), &bars[0]);
    submit(&mut sim, OrderIntent::buy(10.0, 1, &bars[1]), &bars[1]);
    submit(&mut sim, OrderIntent::buy(10.0, 2, &bars[2]), &bars[2]);
    // avg entry = (100 + 90 + 80) / 3 = 90
    assert!((sim.position().avg_entry_price - 90.0).abs() < 1e-9);

    let trade = submit(&mut sim, OrderIntent::sell(30.0, 3, &bars[3]), &bars[3])
        .expect("flat emits trade");
    assert_eq!(trade.side, TradeSide::Long);
    assert_eq!(trade.entry_bar, 0);
    assert_eq!(trade.exit_bar, 3);
    assert!((trade.gross_pnl - (95.0 - 90.0) * 30.0).abs() < 1e-9);
}

#[test]
fn cash_is_conserved_over_a_losing_round_trip() {
    let bars = bars_from_closes(&[100.0, 80.0]);
    let initial = 10_000.0;
    let mut sim = ExecutionSimulator::new(Account::new(initial, 0.0008));

    submit(&mut sim, OrderIntent::buy(20.0, 0, &bars[0]), &bars[0]);
    let trade = submit(&mut sim, OrderIntent::sell(20.0, 1, &bars[1]), &bars[1])
        .expect("trade closed");

    assert!(trade.net_pnl < 0.0);
    assert!((sim.account().cash - (initial + trade.net_pnl)).abs() < 1e-9);
}

#[test]
fn rejections_leave_state_untouched() {
    let bars = bars_from_closes(&[100.0, 100.0]);
    let mut sim = ExecutionSimulator::new(Account::new(1_000.0, 0.0));

    let before_cash = sim.account().cash;
    let outcome = sim.submit(&OrderIntent::buy(100.0, 0, &bars[0]), &bars[0]);
    assert!(matches!(
        outcome,
        SubmitOutcome::Rejected(RejectReason::InsufficientCash)
    ));
    assert_eq!(sim.account().cash, before_cash);
    assert!(sim.position().is_flat());

    // The rejection consumed this bar's slot.
    let outcome = sim.submit(&OrderIntent::buy(1.0, 0, &bars[0]), &bars[0]);
    assert!(matches!(
        outcome,
        SubmitOutcome::Rejected(RejectReason::OrderInFlight)
    ));
}

#[test]
fn short_leg_mirrors_long_accounting() {
    let bars = bars_from_closes(&[100.0, 110.0]);
    let mut sim = ExecutionSimulator::new(Account::new(10_000.0, 0.0)).with_short_selling();

    submit(&mut sim, OrderIntent::sell(10.0, 0, &bars[0]), &bars[0]);
    let trade = submit(&mut sim, OrderIntent::buy(10.0, 1, &bars[1]), &bars[1])
        .expect("cover emits trade");

    assert_eq!(trade.side, TradeSide::Short);
    assert!((trade.gross_pnl + 100.0).abs() < 1e-9);
    assert!((sim.account().cash - 9_900.0).abs() < 1e-9);
}
