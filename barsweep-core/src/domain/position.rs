use serde::{Deserialize, Serialize};

/// Position tracking. Owned exclusively by the execution simulator;
/// strategies read a copy and influence it only through orders.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Position {
    /// Signed quantity: positive = long, negative = short, zero = flat.
    pub quantity: f64,
    pub avg_entry_price: f64,
}

impl Position {
    pub fn is_flat(&self) -> bool {
        self.quantity == 0.0
    }

    pub fn is_long(&self) -> bool {
        self.quantity > 0.0
    }

    pub fn is_short(&self) -> bool {
        self.quantity < 0.0
    }

    pub fn market_value(&self, current_price: f64) -> f64 {
        self.quantity * current_price
    }

    pub fn unrealized_pnl(&self, current_price: f64) -> f64 {
        self.quantity * (current_price - self.avg_entry_price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_flat() {
        let pos = Position::default();
        assert!(pos.is_flat());
        assert!(!pos.is_long());
        assert!(!pos.is_short());
    }

    #[test]
    fn long_market_value_and_pnl() {
        let pos = Position {
            quantity: 2.0,
            avg_entry_price: 100.0,
        };
        assert!(pos.is_long());
        assert_eq!(pos.market_value(110.0), 220.0);
        assert_eq!(pos.unrealized_pnl(110.0), 20.0);
    }

    #[test]
    fn short_pnl_gains_on_drop() {
        let pos = Position {
            quantity: -1.5,
            avg_entry_price: 100.0,
        };
        assert!(pos.is_short());
        assert_eq!(pos.unrealized_pnl(90.0), 15.0);
        assert_eq!(pos.unrealized_pnl(110.0), -15.0);
    }
}
