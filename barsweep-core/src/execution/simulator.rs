//! Execution simulator: fills orders at the issuing bar's close.
//!
//! The simulator owns cash and position. It never fails fatally: every
//! submission resolves to a typed `SubmitOutcome` the caller branches
//! on. At most one submission is accepted per bar index; a second one on
//! the same bar is rejected as `OrderInFlight`.
//!
//! Cash can never go negative. An order whose notional plus commission
//! exceeds available cash is rejected, and a closing order larger than
//! the held quantity is rejected rather than flipping the position.

use crate::domain::{Account, Bar, OrderIntent, OrderSide, Position, Trade, TradeSide};

/// Relative headroom when comparing required cash against available cash,
/// so that all-in sizing computed from the same prices does not bounce
/// off the check over float rounding.
const CASH_EPSILON: f64 = 1e-9;

/// Outcome of submitting an order intent.
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    Filled(FillResult),
    Rejected(RejectReason),
}

impl SubmitOutcome {
    pub fn is_filled(&self) -> bool {
        matches!(self, SubmitOutcome::Filled(_))
    }
}

/// A fill, reported back to the runner.
#[derive(Debug, Clone)]
pub struct FillResult {
    pub side: OrderSide,
    pub price: f64,
    pub quantity: f64,
    pub commission: f64,
    /// Present when this fill brought the position back to exactly flat.
    pub closed_trade: Option<Trade>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Size was zero, negative, or not finite.
    InvalidSize,
    /// Notional plus commission exceeds available cash.
    InsufficientCash,
    /// Closing order larger than the held quantity, or a short was
    /// requested on a long-only simulator.
    OversizedClose,
    /// A submission was already accepted for this bar index.
    OrderInFlight,
}

/// Accumulator for the currently open round trip. Cleared when the
/// position returns to flat and the `Trade` is emitted.
#[derive(Debug, Clone)]
struct OpenLeg {
    side: TradeSide,
    entry_bar: usize,
    opened_at: chrono::DateTime<chrono::Utc>,
    commission_paid: f64,
    closed_quantity: f64,
    close_notional: f64,
    realized_gross: f64,
}

#[derive(Debug, Clone)]
pub struct ExecutionSimulator {
    account: Account,
    position: Position,
    allow_short: bool,
    last_submit_bar: Option<usize>,
    open_leg: Option<OpenLeg>,
}

impl ExecutionSimulator {
    pub fn new(account: Account) -> Self {
        Self {
            account,
            position: Position::default(),
            allow_short: false,
            last_submit_bar: None,
            open_leg: None,
        }
    }

    /// Permit sell-to-open. Short proceeds are held as collateral: an
    /// opening short still requires notional + commission <= cash.
    pub fn with_short_selling(mut self) -> Self {
        self.allow_short = true;
        self
    }

    pub fn account(&self) -> Account {
        self.account
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Mark-to-market equity at the given price.
    pub fn equity(&self, price: f64) -> f64 {
        self.account.cash + self.position.market_value(price)
    }

    /// Resolve an order intent against the issuing bar. Fill price is
    /// the bar's close.
    pub fn submit(&mut self, intent: &OrderIntent, bar: &Bar) -> SubmitOutcome {
        if self.last_submit_bar == Some(intent.bar_index) {
            return SubmitOutcome::Rejected(RejectReason::OrderInFlight);
        }
        self.last_submit_bar = Some(intent.bar_index);

        if !intent.size.is_finite() || intent.size <= 0.0 {
            return SubmitOutcome::Rejected(RejectReason::InvalidSize);
        }

        let price = bar.close;
        match intent.side {
            OrderSide::Buy => {
                if self.position.is_short() {
                    self.reduce(intent, bar, price)
                } else {
                    self.open_or_add(intent, bar, price, TradeSide::Long)
                }
            }
            OrderSide::Sell => {
                if self.position.is_long() {
                    self.reduce(intent, bar, price)
                } else if self.allow_short {
                    self.open_or_add(intent, bar, price, TradeSide::Short)
                } else {
                    SubmitOutcome::Rejected(RejectReason::OversizedClose)
                }
            }
        }
    }

    /// Open a new position or add to an existing one on the same side.
    fn open_or_add(
        &mut self,
        intent: &OrderIntent,
        bar: &Bar,
        price: f64,
        side: TradeSide,
    ) -> SubmitOutcome {
        let notional = intent.size * price;
        let commission = self.account.commission_on(notional);
        if notional + commission > self.account.cash * (1.0 + CASH_EPSILON) {
            return SubmitOutcome::Rejected(RejectReason::InsufficientCash);
        }

        match side {
            TradeSide::Long => self.account.cash -= notional + commission,
            // Short sale proceeds are credited; equity stays flat at
            // entry since the negative position offsets them.
            TradeSide::Short => self.account.cash += notional - commission,
        }

        let signed = match side {
            TradeSide::Long => intent.size,
            TradeSide::Short => -intent.size,
        };
        let prev_abs = self.position.quantity.abs();
        let new_abs = prev_abs + intent.size;
        self.position.avg_entry_price =
            (self.position.avg_entry_price * prev_abs + price * intent.size) / new_abs;
        self.position.quantity += signed;

        match &mut self.open_leg {
            Some(leg) => leg.commission_paid += commission,
            None => {
                self.open_leg = Some(OpenLeg {
                    side,
                    entry_bar: intent.bar_index,
                    opened_at: bar.timestamp,
                    commission_paid: commission,
                    closed_quantity: 0.0,
                    close_notional: 0.0,
                    realized_gross: 0.0,
                });
            }
        }

        SubmitOutcome::Filled(FillResult {
            side: intent.side,
            price,
            quantity: intent.size,
            commission,
            closed_trade: None,
        })
    }

    /// Reduce or close the open position. The closing side is the
    /// opposite of the open leg's side.
    fn reduce(&mut self, intent: &OrderIntent, bar: &Bar, price: f64) -> SubmitOutcome {
        let held = self.position.quantity.abs();
        if intent.size > held {
            return SubmitOutcome::Rejected(RejectReason::OversizedClose);
        }

        let notional = intent.size * price;
        let commission = self.account.commission_on(notional);
        let entry = self.position.avg_entry_price;

        let gross = if self.position.is_long() {
            self.account.cash += notional - commission;
            self.position.quantity -= intent.size;
            (price - entry) * intent.size
        } else {
            // Buy-to-cover pays the cover notional back out.
            self.account.cash -= notional + commission;
            self.position.quantity += intent.size;
            (entry - price) * intent.size
        };

        let mut closed_trade = None;
        if let Some(leg) = &mut self.open_leg {
            leg.commission_paid += commission;
            leg.closed_quantity += intent.size;
            leg.close_notional += notional;
            leg.realized_gross += gross;

            if self.position.quantity == 0.0 {
                let leg = self.open_leg.take().filter(|l| l.closed_quantity > 0.0);
                if let Some(leg) = leg {
                    closed_trade = Some(Trade {
                        symbol: bar.symbol.clone(),
                        side: leg.side,
                        entry_bar: leg.entry_bar,
                        opened_at: leg.opened_at,
                        entry_price: entry,
                        exit_bar: intent.bar_index,
                        closed_at: bar.timestamp,
                        exit_price: leg.close_notional / leg.closed_quantity,
                        quantity: leg.closed_quantity,
                        gross_pnl: leg.realized_gross,
                        commission: leg.commission_paid,
                        net_pnl: leg.realized_gross - leg.commission_paid,
                    });
                }
                self.position.avg_entry_price = 0.0;
            }
        }

        SubmitOutcome::Filled(FillResult {
            side: intent.side,
            price,
            quantity: intent.size,
            commission,
            closed_trade,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn bar_at(index: usize, close: f64) -> Bar {
        let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        Bar {
            symbol: "BTCUSDT".into(),
            timestamp: base + Duration::days(index as i64),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 100.0,
        }
    }

    fn sim(cash: f64, rate: f64) -> ExecutionSimulator {
        ExecutionSimulator::new(Account::new(cash, rate))
    }

    #[test]
    fn buy_fills_at_close_and_deducts_cash() {
        let mut sim = sim(10_000.0, 0.001);
        let bar = bar_at(0, 100.0);
        let outcome = sim.submit(&OrderIntent::buy(10.0, 0, &bar), &bar);
        match outcome {
            SubmitOutcome::Filled(fill) => {
                assert_eq!(fill.price, 100.0);
                assert_eq!(fill.quantity, 10.0);
                assert!((fill.commission - 1.0).abs() < 1e-12);
                assert!(fill.closed_trade.is_none());
            }
            other => panic!("expected fill, got {other:?}"),
        }
        assert!((sim.account().cash - (10_000.0 - 1_000.0 - 1.0)).abs() < 1e-9);
        assert_eq!(sim.position().quantity, 10.0);
        assert_eq!(sim.position().avg_entry_price, 100.0);
    }

    #[test]
    fn insufficient_cash_rejected() {
        let mut sim = sim(500.0, 0.0);
        let bar = bar_at(0, 100.0);
        let outcome = sim.submit(&OrderIntent::buy(10.0, 0, &bar), &bar);
        assert!(matches!(
            outcome,
            SubmitOutcome::Rejected(RejectReason::InsufficientCash)
        ));
        assert_eq!(sim.account().cash, 500.0);
        assert!(sim.position().is_flat());
    }

    #[test]
    fn nonpositive_size_rejected() {
        let mut sim = sim(10_000.0, 0.0);
        let bar = bar_at(0, 100.0);
        let outcome = sim.submit(&OrderIntent::buy(0.0, 0, &bar), &bar);
        assert!(matches!(
            outcome,
            SubmitOutcome::Rejected(RejectReason::InvalidSize)
        ));
    }

    #[test]
    fn second_submission_same_bar_rejected() {
        let mut sim = sim(10_000.0, 0.0);
        let bar = bar_at(0, 100.0);
        assert!(sim.submit(&OrderIntent::buy(1.0, 0, &bar), &bar).is_filled());
        let outcome = sim.submit(&OrderIntent::buy(1.0, 0, &bar), &bar);
        assert!(matches!(
            outcome,
            SubmitOutcome::Rejected(RejectReason::OrderInFlight)
        ));
        // Next bar is fine again.
        let bar1 = bar_at(1, 101.0);
        assert!(sim.submit(&OrderIntent::buy(1.0, 1, &bar1), &bar1).is_filled());
    }

    #[test]
    fn full_close_emits_trade() {
        let mut sim = sim(10_000.0, 0.001);
        let b0 = bar_at(0, 100.0);
        let b1 = bar_at(5, 110.0);
        sim.submit(&OrderIntent::buy(10.0, 0, &b0), &b0);
        let outcome = sim.submit(&OrderIntent::sell(10.0, 5, &b1), &b1);
        let fill = match outcome {
            SubmitOutcome::Filled(f) => f,
            other => panic!("expected fill, got {other:?}"),
        };
        let trade = fill.closed_trade.expect("closing fill emits a trade");
        assert_eq!(trade.side, TradeSide::Long);
        assert_eq!(trade.entry_bar, 0);
        assert_eq!(trade.exit_bar, 5);
        assert_eq!(trade.entry_price, 100.0);
        assert_eq!(trade.exit_price, 110.0);
        assert!((trade.gross_pnl - 100.0).abs() < 1e-9);
        // 1000 * 0.001 + 1100 * 0.001
        assert!((trade.commission - 2.1).abs() < 1e-9);
        assert!((trade.net_pnl - 97.9).abs() < 1e-9);
        assert!(sim.position().is_flat());
    }

    #[test]
    fn partial_add_recomputes_weighted_entry() {
        let mut sim = sim(100_000.0, 0.0);
        let b0 = bar_at(0, 100.0);
        let b1 = bar_at(1, 90.0);
        sim.submit(&OrderIntent::buy(10.0, 0, &b0), &b0);
        sim.submit(&OrderIntent::buy(10.0, 1, &b1), &b1);
        assert_eq!(sim.position().quantity, 20.0);
        assert!((sim.position().avg_entry_price - 95.0).abs() < 1e-12);
    }

    #[test]
    fn partial_exits_accumulate_into_one_trade() {
        let mut sim = sim(100_000.0, 0.0);
        let b0 = bar_at(0, 100.0);
        let b1 = bar_at(3, 120.0);
        let b2 = bar_at(4, 110.0);
        sim.submit(&OrderIntent::buy(10.0, 0, &b0), &b0);
        let first = sim.submit(&OrderIntent::sell(4.0, 3, &b1), &b1);
        match first {
            SubmitOutcome::Filled(f) => assert!(f.closed_trade.is_none()),
            other => panic!("expected fill, got {other:?}"),
        }
        let second = sim.submit(&OrderIntent::sell(6.0, 4, &b2), &b2);
        let trade = match second {
            SubmitOutcome::Filled(f) => f.closed_trade.expect("flat emits trade"),
            other => panic!("expected fill, got {other:?}"),
        };
        assert_eq!(trade.quantity, 10.0);
        // Weighted exit: (4*120 + 6*110) / 10 = 114
        assert!((trade.exit_price - 114.0).abs() < 1e-12);
        assert!((trade.gross_pnl - 140.0).abs() < 1e-9);
    }

    #[test]
    fn oversized_sell_rejected() {
        let mut sim = sim(10_000.0, 0.0);
        let b0 = bar_at(0, 100.0);
        let b1 = bar_at(1, 100.0);
        sim.submit(&OrderIntent::buy(5.0, 0, &b0), &b0);
        let outcome = sim.submit(&OrderIntent::sell(6.0, 1, &b1), &b1);
        assert!(matches!(
            outcome,
            SubmitOutcome::Rejected(RejectReason::OversizedClose)
        ));
        assert_eq!(sim.position().quantity, 5.0);
    }

    #[test]
    fn sell_while_flat_rejected_without_shorting() {
        let mut sim = sim(10_000.0, 0.0);
        let bar = bar_at(0, 100.0);
        let outcome = sim.submit(&OrderIntent::sell(1.0, 0, &bar), &bar);
        assert!(matches!(
            outcome,
            SubmitOutcome::Rejected(RejectReason::OversizedClose)
        ));
    }

    #[test]
    fn short_round_trip() {
        let mut sim = sim(10_000.0, 0.0).with_short_selling();
        let b0 = bar_at(0, 100.0);
        let b1 = bar_at(2, 90.0);
        assert!(sim.submit(&OrderIntent::sell(10.0, 0, &b0), &b0).is_filled());
        assert!(sim.position().is_short());
        assert_eq!(sim.position().quantity, -10.0);

        let outcome = sim.submit(&OrderIntent::buy(10.0, 2, &b1), &b1);
        let trade = match outcome {
            SubmitOutcome::Filled(f) => f.closed_trade.expect("flat emits trade"),
            other => panic!("expected fill, got {other:?}"),
        };
        assert_eq!(trade.side, TradeSide::Short);
        assert!((trade.gross_pnl - 100.0).abs() < 1e-9);
        assert!((sim.account().cash - 10_100.0).abs() < 1e-9);
        assert!(sim.position().is_flat());
    }

    #[test]
    fn equity_marks_position_to_market() {
        let mut sim = sim(10_000.0, 0.0);
        let bar = bar_at(0, 100.0);
        sim.submit(&OrderIntent::buy(10.0, 0, &bar), &bar);
        assert!((sim.equity(100.0) - 10_000.0).abs() < 1e-9);
        assert!((sim.equity(110.0) - 10_100.0).abs() < 1e-9);
    }

    #[test]
    fn all_in_sizing_survives_float_rounding() {
        let mut sim = sim(10_000.0, 0.0008);
        let bar = bar_at(0, 337.77);
        let size = 10_000.0 / (337.77 * 1.0008);
        let outcome = sim.submit(&OrderIntent::buy(size, 0, &bar), &bar);
        assert!(outcome.is_filled());
        assert!(sim.account().cash >= -1e-6);
    }
}
