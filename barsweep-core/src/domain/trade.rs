//! Trade — a completed round trip, entry to flat.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeSide {
    Long,
    Short,
}

/// A complete round-trip trade record.
///
/// Created by the execution simulator the moment a position returns to
/// exactly zero, then appended to the runner-owned trade log. Immutable
/// afterwards. Partial exits accumulate into the single record: the exit
/// price is the size-weighted average of the closing fills.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub symbol: String,
    pub side: TradeSide,

    pub entry_bar: usize,
    pub opened_at: DateTime<Utc>,
    pub entry_price: f64,

    pub exit_bar: usize,
    pub closed_at: DateTime<Utc>,
    pub exit_price: f64,

    /// Total quantity closed over the round trip.
    pub quantity: f64,

    pub gross_pnl: f64,
    pub commission: f64,
    pub net_pnl: f64,
}

impl Trade {
    pub fn is_winner(&self) -> bool {
        self.net_pnl > 0.0
    }

    pub fn bars_held(&self) -> usize {
        self.exit_bar.saturating_sub(self.entry_bar)
    }
}
