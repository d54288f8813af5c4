//! Average True Range (ATR).
//!
//! True range per bar:
//! TR = max(high - low, |high - prev_close|, |low - prev_close|).
//! The first bar has no previous close, so its TR is undefined and the
//! smoothing seed starts at bar 1. ATR is the Wilder-smoothed TR.
//! Lookback: period.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            name: format!("atr_{period}"),
        }
    }

    pub fn series_name(period: usize) -> String {
        format!("atr_{period}")
    }
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];
        if n < self.period + 1 {
            return result;
        }

        // Seed: mean of the first `period` true ranges (bars 1..=period).
        let mut atr = (1..=self.period)
            .map(|i| true_range(&bars[i], bars[i - 1].close))
            .sum::<f64>()
            / self.period as f64;
        result[self.period] = atr;

        let alpha = 1.0 / self.period as f64;
        for i in (self.period + 1)..n {
            let tr = true_range(&bars[i], bars[i - 1].close);
            atr = alpha * tr + (1.0 - alpha) * atr;
            result[i] = atr;
        }

        result
    }
}

fn true_range(bar: &Bar, prev_close: f64) -> f64 {
    let hl = bar.high - bar.low;
    let hc = (bar.high - prev_close).abs();
    let lc = (bar.low - prev_close).abs();
    hl.max(hc).max(lc)
}
