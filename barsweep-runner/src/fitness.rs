//! Fitness metric selector for ranking sweep results.

use serde::{Deserialize, Serialize};

use crate::metrics::MetricsRecord;

/// Which metric to optimize by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitnessMetric {
    #[default]
    Sharpe,
    AnnualizedReturn,
    TotalReturn,
    AverageReturn,
    MaxDrawdown,
    WinRate,
}

impl FitnessMetric {
    /// Extract the metric value from a record. `None` means the metric
    /// is undefined for that run and the run is skipped in ranking.
    pub fn extract(&self, record: &MetricsRecord) -> Option<f64> {
        match self {
            Self::Sharpe => record.sharpe,
            Self::AnnualizedReturn => record.annualized_return,
            Self::TotalReturn => Some(record.total_return),
            Self::AverageReturn => Some(record.average_return),
            Self::MaxDrawdown => Some(record.max_drawdown),
            Self::WinRate => Some(record.win_rate),
        }
    }

    /// Whether higher values are better. Drawdown is a positive loss
    /// fraction, so smaller is better there.
    pub fn is_higher_better(&self) -> bool {
        !matches!(self, Self::MaxDrawdown)
    }

    /// True if `a` beats `b` for this metric.
    pub fn is_better(&self, a: f64, b: f64) -> bool {
        if self.is_higher_better() {
            a > b
        } else {
            a < b
        }
    }
}
