//! Channel-breakout trend following with ATR unit pyramiding.
//!
//! Enters long when the close exceeds the prior bar's rolling
//! entry-period high. The unit size is fixed at entry as
//! cash * risk_per_trade / ATR, and one unit is added each time the
//! close advances at least 0.5 * ATR above the last entry price, up to
//! max_units. The whole position exits when the close falls below the
//! prior bar's rolling exit-period low or below
//! last_entry_price - 2 * ATR.
//!
//! Channel comparisons use the previous bar's value, so a bar never
//! breaks out against its own high or low. Unit state advances only on
//! observed fills.

use crate::domain::OrderIntent;
use crate::indicators::{Atr, Indicator, RollingHigh, RollingLow};

use super::{Strategy, StrategyContext};

const ADD_UNIT_ATR_STEP: f64 = 0.5;
const TRAILING_STOP_ATR: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Pending {
    Enter { unit_size: f64, price: f64 },
    AddUnit { price: f64 },
    Exit,
}

#[derive(Debug, Clone)]
pub struct Turtle {
    entry_period: usize,
    exit_period: usize,
    atr_period: usize,
    risk_per_trade: f64,
    max_units: usize,
    entry_high_name: String,
    exit_low_name: String,
    atr_name: String,

    units: usize,
    unit_size: f64,
    last_entry_price: f64,
    pending: Option<Pending>,
}

impl Turtle {
    pub fn new(
        entry_period: usize,
        exit_period: usize,
        atr_period: usize,
        risk_per_trade: f64,
        max_units: usize,
    ) -> Self {
        assert!(entry_period >= 1, "entry period must be >= 1");
        assert!(exit_period >= 1, "exit period must be >= 1");
        assert!(
            (0.0..=1.0).contains(&risk_per_trade),
            "risk per trade must be in [0, 1]"
        );
        assert!(max_units >= 1, "max units must be >= 1");
        Self {
            entry_period,
            exit_period,
            atr_period,
            risk_per_trade,
            max_units,
            entry_high_name: RollingHigh::series_name(entry_period),
            exit_low_name: RollingLow::series_name(exit_period),
            atr_name: Atr::series_name(atr_period),
            units: 0,
            unit_size: 0.0,
            last_entry_price: 0.0,
            pending: None,
        }
    }

    pub fn units(&self) -> usize {
        self.units
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
            Pending::Enter { unit_size, price } => {
                self.units = 1;
                self.unit_size = unit_size;
                self.last_entry_price = price;
            }
            Pending::AddUnit { price } => {
                self.units += 1;
                self.last_entry_price = price;
            }
            Pending::Exit => {
                self.units = 0;
                self.unit_size = 0.0;
                self.last_entry_price = 0.0;
            }
        }
    }
}

impl Strategy for Turtle {
    fn name(&self) -> &str {
        "turtle"
    }

    fn indicators(&self) -> Vec<Box<dyn Indicator>> {
        vec![
            Box::new(RollingHigh::new(self.entry_period)),
            Box::new(RollingLow::new(self.exit_period)),
            Box::new(Atr::new(self.atr_period)),
        ]
    }

    fn warmup_bars(&self) -> usize {
        // Channels are read at the previous bar.
        self.entry_period.max(self.exit_period).max(self.atr_period)
    }

    fn on_bar(&mut self, ctx: &StrategyContext) -> Option<OrderIntent> {
        self.commit_last(ctx);

        let atr = ctx.indicator(&self.atr_name)?;
        let bar = ctx.bar();
        let close = bar.close;

        if ctx.position.is_flat() {
            let entry_high = ctx.prev_indicator(&self.entry_high_name)?;
            if close > entry_high && atr > 0.0 {
                let unit_size = ctx.account.cash * self.risk_per_trade / atr;
                self.pending = Some(Pending::Enter {
                    unit_size,
                    price: close,
                });
                return Some(OrderIntent::buy(unit_size, ctx.bar_index, bar));
            }
            return None;
        }

        let exit_low = ctx.prev_indicator(&self.exit_low_name)?;
        let trailing_stop = self.last_entry_price - TRAILING_STOP_ATR * atr;
        if close < exit_low || close < trailing_stop {
            self.pending = Some(Pending::Exit);
            return Some(OrderIntent::sell(ctx.position.quantity, ctx.bar_index, bar));
        }

        if self.units < self.max_units && close >= self.last_entry_price + ADD_UNIT_ATR_STEP * atr {
            self.pending = Some(Pending::AddUnit { price: close });
            return Some(OrderIntent::buy(self.unit_size, ctx.bar_index, bar));
        }
        None
    }
}
