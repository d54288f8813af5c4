//! Strategy state machines.
//!
//! A strategy consumes one bar at a time plus its own internal state and
//! emits at most one order intent per bar. The runner delivers the
//! previous order's resolution in the next `StrategyContext`, so
//! strategies that track sizing state (martingale levels, turtle units)
//! commit transitions only after observing the fill.
//!
//! Any bar inside an indicator's warm-up window produces no order.

pub mod band_breakout;
pub mod crossover;
pub mod martingale;
pub mod pair_arbitrage;
pub mod turtle;

pub use band_breakout::BandBreakout;
pub use crossover::Crossover;
pub use martingale::Martingale;
pub use pair_arbitrage::PairArbitrage;
pub use turtle::Turtle;

use crate::domain::{Account, Bar, OrderIntent, Position};
use crate::execution::SubmitOutcome;
use crate::indicators::{Indicator, IndicatorValues};

/// How the simulator resolved the strategy's last order intent.
#[derive(Debug, Clone)]
pub struct OrderResolution {
    pub intent: OrderIntent,
    pub outcome: SubmitOutcome,
}

impl OrderResolution {
    pub fn is_filled(&self) -> bool {
        self.outcome.is_filled()
    }
}

/// Read-only view of the world handed to a strategy on each bar.
#[derive(Debug)]
pub struct StrategyContext<'a> {
    pub bars: &'a [Bar],
    pub bar_index: usize,
    pub indicators: &'a IndicatorValues,
    pub position: Position,
    pub account: Account,
    /// Resolution of the order issued on the previous bar, if any.
    pub last_resolution: Option<&'a OrderResolution>,
}

impl StrategyContext<'_> {
    pub fn bar(&self) -> &Bar {
        &self.bars[self.bar_index]
    }

    /// Indicator value at the current bar; `None` during warm-up.
    pub fn indicator(&self, name: &str) -> Option<f64> {
        self.indicators.get_valid(name, self.bar_index)
    }

    /// Indicator value at the previous bar; `None` on the first bar or
    /// during warm-up.
    pub fn prev_indicator(&self, name: &str) -> Option<f64> {
        let prev = self.bar_index.checked_sub(1)?;
        self.indicators.get_valid(name, prev)
    }
}

pub trait Strategy: Send {
    fn name(&self) -> &str;

    /// Indicators to precompute before the bar loop.
    fn indicators(&self) -> Vec<Box<dyn Indicator>>;

    /// Bars the driver skips before invoking `on_bar`: no indicator the
    /// strategy declares is valid earlier than this.
    fn warmup_bars(&self) -> usize;

    /// Whether the simulator should permit sell-to-open for this family.
    fn allow_short(&self) -> bool {
        false
    }

    /// Consume one bar, emit zero or one order intent.
    fn on_bar(&mut self, ctx: &StrategyContext) -> Option<OrderIntent>;
}

/// All-in position size: the whole cash balance at the close, leaving
/// room for commission.
pub(crate) fn all_in_size(account: &Account, close: f64) -> f64 {
    account.cash / (close * (1.0 + account.commission_rate))
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;
    use crate::execution::ExecutionSimulator;

    /// Drive a strategy and simulator over a bar series the way the
    /// runner does, returning the final simulator state.
    pub fn drive(strategy: &mut dyn Strategy, bars: &[Bar], account: Account) -> ExecutionSimulator {
        let mut sim = ExecutionSimulator::new(account);
        if strategy.allow_short() {
            sim = sim.with_short_selling();
        }
        let indicators = IndicatorValues::precompute(&strategy.indicators(), bars);
        let warmup = strategy.warmup_bars();
        let mut last_resolution: Option<OrderResolution> = None;
        for (i, bar) in bars.iter().enumerate().skip(warmup) {
            let ctx = StrategyContext {
                bars,
                bar_index: i,
                indicators: &indicators,
                position: sim.position(),
                account: sim.account(),
                last_resolution: last_resolution.as_ref(),
            };
            let intent = strategy.on_bar(&ctx);
            last_resolution = intent.map(|intent| {
                let outcome = sim.submit(&intent, bar);
                OrderResolution { intent, outcome }
            });
        }
        sim
    }
}
