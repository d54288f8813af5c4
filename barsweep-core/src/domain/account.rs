use serde::{Deserialize, Serialize};

/// Cash account with a proportional commission schedule.
///
/// Cash can never go negative: the simulator rejects any order whose
/// notional plus commission exceeds what is available.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Account {
    pub cash: f64,
    /// Commission as a fraction of traded notional (e.g. 0.0008 = 8 bps).
    pub commission_rate: f64,
}

impl Account {
    pub fn new(cash: f64, commission_rate: f64) -> Self {
        assert!(cash >= 0.0, "initial cash must be >= 0");
        assert!(
            (0.0..1.0).contains(&commission_rate),
            "commission rate must be in [0, 1)"
        );
        Self {
            cash,
            commission_rate,
        }
    }

    pub fn commission_on(&self, notional: f64) -> f64 {
        notional * self.commission_rate
    }
}
