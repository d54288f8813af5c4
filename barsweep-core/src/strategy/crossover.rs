//! Moving-average crossover.
//!
//! Long when the fast SMA crosses above the slow SMA, flat when it
//! crosses back below. The trigger is a sign change of (fast - slow)
//! between consecutive bars, not a plain inequality, so an established
//! trend does not re-trigger every bar.

use crate::domain::OrderIntent;
use crate::indicators::{Indicator, Sma};

use super::{all_in_size, Strategy, StrategyContext};

#[derive(Debug, Clone)]
pub struct Crossover {
    fast: usize,
    slow: usize,
    fast_name: String,
    slow_name: String,
}

impl Crossover {
    pub fn new(fast: usize, slow: usize) -> Self {
        assert!(fast >= 1, "fast period must be >= 1");
        assert!(fast < slow, "fast period must be < slow period");
        Self {
            fast,
            slow,
            fast_name: Sma::series_name(fast),
            slow_name: Sma::series_name(slow),
        }
    }
}

impl Strategy for Crossover {
    fn name(&self) -> &str {
        "crossover"
    }

    fn indicators(&self) -> Vec<Box<dyn Indicator>> {
        vec![Box::new(Sma::new(self.fast)), Box::new(Sma::new(self.slow))]
    }

    fn warmup_bars(&self) -> usize {
        self.slow - 1
    }

    fn on_bar(&mut self, ctx: &StrategyContext) -> Option<OrderIntent> {
        let diff = ctx.indicator(&self.fast_name)? - ctx.indicator(&self.slow_name)?;
        // At the first valid bar there is no previous diff; treating it
        // as zero lets a series already trending at the end of warm-up
        // register its initial cross.
        let prev_diff = match (
            ctx.prev_indicator(&self.fast_name),
            ctx.prev_indicator(&self.slow_name),
        ) {
            (Some(fast), Some(slow)) => fast - slow,
            _ => 0.0,
        };

        let bar = ctx.bar();
        if ctx.position.is_flat() && prev_diff <= 0.0 && diff > 0.0 {
            let size = all_in_size(&ctx.account, bar.close);
            return Some(OrderIntent::buy(size, ctx.bar_index, bar));
        }
        if ctx.position.is_long() && prev_diff >= 0.0 && diff < 0.0 {
            return Some(OrderIntent::sell(ctx.position.quantity, ctx.bar_index, bar));
        }
        None
    }
}
