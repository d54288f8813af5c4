//! Paired-market rate arbitrage.
//!
//! Stateless: on each synchronized bar pair, if the absolute spread
//! between the two legs' rate series exceeds the threshold, sell the
//! rich leg and buy the cheap one with equal size. Position carry lives
//! entirely in the two per-leg execution simulators.

use crate::domain::{Bar, OrderIntent};

#[derive(Debug, Clone)]
pub struct PairArbitrage {
    threshold: f64,
    order_size: f64,
}

impl PairArbitrage {
    pub fn new(threshold: f64, order_size: f64) -> Self {
        assert!(threshold > 0.0, "spread threshold must be > 0");
        assert!(order_size > 0.0, "order size must be > 0");
        Self {
            threshold,
            order_size,
        }
    }

    /// Decide on one synchronized bar pair. Returns intents for
    /// (leg a, leg b) when the spread is wide enough.
    pub fn on_bar_pair(
        &self,
        bar_a: &Bar,
        bar_b: &Bar,
        bar_index: usize,
    ) -> Option<(OrderIntent, OrderIntent)> {
        let spread = bar_a.close - bar_b.close;
        if spread.abs() <= self.threshold {
            return None;
        }
        if spread > 0.0 {
            Some((
                OrderIntent::sell(self.order_size, bar_index, bar_a),
                OrderIntent::buy(self.order_size, bar_index, bar_b),
            ))
        } else {
            Some((
                OrderIntent::buy(self.order_size, bar_index, bar_a),
                OrderIntent::sell(self.order_size, bar_index, bar_b),
            ))
        }
    }
}
