//! Martingale position sizing behind a trend filter.
//!
//! Enters long with the initial stake when the close is above a moving
//! average. While long, adds to the position on drawdowns with a
//! geometric stake schedule (the k-th add-on stakes S * M^(k-1)), capped
//! by a maximum add-on count and a cash risk budget. Takes full profit
//! at a fixed percentage above the average entry, and a hard stop
//! liquidates everything at 70% of the average entry, overriding the
//! add-on rule.
//!
//! Sizing state advances only when the corresponding order is observed
//! filled; a rejected order leaves the schedule where it was.

use crate::domain::OrderIntent;
use crate::indicators::{Indicator, Sma};

use super::{Strategy, StrategyContext};

/// Liquidate everything when the close falls to this fraction of the
/// average entry price.
const HARD_STOP_FRACTION: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Enter,
    AddOn,
    Exit,
}

#[derive(Debug, Clone)]
pub struct Martingale {
    initial_stake: f64,
    multiplier: f64,
    take_profit_pct: f64,
    max_levels: usize,
    risk_pct: f64,
    ma_name: String,
    ma_period: usize,

    addon_count: usize,
    pending: Option<Pending>,
}

impl Martingale {
    pub fn new(
        initial_stake: f64,
        multiplier: f64,
        take_profit_pct: f64,
        max_levels: usize,
        risk_pct: f64,
        ma_period: usize,
    ) -> Self {
        assert!(initial_stake > 0.0, "initial stake must be > 0");
        assert!(multiplier >= 1.0, "multiplier must be >= 1");
        assert!(take_profit_pct > 0.0, "take profit must be > 0");
        assert!(
            (0.0..=1.0).contains(&risk_pct),
            "risk fraction must be in [0, 1]"
        );
        Self {
            initial_stake,
            multiplier,
            take_profit_pct,
            max_levels,
            risk_pct,
            ma_name: Sma::series_name(ma_period),
            ma_period,
            addon_count: 0,
            pending: None,
        }
    }

    pub fn addon_count(&self) -> usize {
        self.addon_count
    }

    /// Notional for the next add-on: S * M^addon_count.
    fn next_addon_stake(&self) -> f64 {
        self.initial_stake * self.multiplier.powi(self.addon_count as i32)
    }

    fn commit_last(&mut self, ctx: &StrategyContext) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        let filled = ctx.last_resolution.is_some_and(|r| r.is_filled());
        if !filled {
            return;
        }
        match pending {
            Pending::Enter => {}
            Pending::AddOn => self.addon_count += 1,
            Pending::Exit => self.addon_count = 0,
        }
    }
}

impl Strategy for Martingale {
    fn name(&self) -> &str {
        "martingale"
    }

    fn indicators(&self) -> Vec<Box<dyn Indicator>> {
        vec![Box::new(Sma::new(self.ma_period))]
    }

    fn warmup_bars(&self) -> usize {
        self.ma_period - 1
    }

    fn on_bar(&mut self, ctx: &StrategyContext) -> Option<OrderIntent> {
        self.commit_last(ctx);

        let bar = ctx.bar();
        let close = bar.close;

        if ctx.position.is_flat() {
            let ma = ctx.indicator(&self.ma_name)?;
            if close > ma {
                self.pending = Some(Pending::Enter);
                return Some(OrderIntent::buy(
                    self.initial_stake / close,
                    ctx.bar_index,
                    bar,
                ));
            }
            return None;
        }

        let entry = ctx.position.avg_entry_price;
        if close >= entry * (1.0 + self.take_profit_pct) {
            self.pending = Some(Pending::Exit);
            return Some(OrderIntent::sell(ctx.position.quantity, ctx.bar_index, bar));
        }
        if close <= entry * HARD_STOP_FRACTION {
            self.pending = Some(Pending::Exit);
            return Some(OrderIntent::sell(ctx.position.quantity, ctx.bar_index, bar));
        }

        if close < entry && self.addon_count < self.max_levels {
            let stake = self.next_addon_stake();
            if stake <= ctx.account.cash * self.risk_pct {
                self.pending = Some(Pending::AddOn);
                return Some(OrderIntent::buy(stake / close, ctx.bar_index, bar));
            }
        }
        None
    }
}
