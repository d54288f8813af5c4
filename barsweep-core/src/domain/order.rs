//! Order intents — what a strategy asks the simulator to do.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

/// A strategy-issued order, consumed exactly once by the execution
/// simulator at the issuing bar's close (same-bar execution).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderIntent {
    pub side: OrderSide,
    /// Quantity of the instrument, in base units. Must be > 0 to fill.
    pub size: f64,
    /// Index of the bar on which the order was issued.
    pub bar_index: usize,
    pub issued_at: DateTime<Utc>,
}

impl OrderIntent {
    pub fn buy(size: f64, bar_index: usize, bar: &Bar) -> Self {
        Self {
            side: OrderSide::Buy,
            size,
            bar_index,
            issued_at: bar.timestamp,
        }
    }

    pub fn sell(size: f64, bar_index: usize, bar: &Bar) -> Self {
        Self {
            side: OrderSide::Sell,
            size,
            bar_index,
            issued_at: bar.timestamp,
        }
    }
}
