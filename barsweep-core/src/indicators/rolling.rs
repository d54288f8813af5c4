//! Rolling extrema over bar highs and lows.
//!
//! `RollingHigh` is the maximum of `bar.high` over the trailing window,
//! `RollingLow` the minimum of `bar.low`. Both include the current bar,
//! so breakout strategies compare against the value at the previous bar
//! index to avoid a bar triggering on its own extreme.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct RollingHigh {
    period: usize,
    name: String,
}

impl RollingHigh {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "rolling period must be >= 1");
        Self {
            period,
            name: format!("rolling_high_{period}"),
        }
    }

    pub fn series_name(period: usize) -> String {
        format!("rolling_high_{period}")
    }
}

impl Indicator for RollingHigh {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        rolling_extreme(bars, self.period, |b| b.high, f64::max)
    }
}

#[derive(Debug, Clone)]
pub struct RollingLow {
    period: usize,
    name: String,
}

impl RollingLow {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "rolling period must be >= 1");
        Self {
            period,
            name: format!("rolling_low_{period}"),
        }
    }

    pub fn series_name(period: usize) -> String {
        format!("rolling_low_{period}")
    }
}

impl Indicator for RollingLow {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        rolling_extreme(bars, self.period, |b| b.low, f64::min)
    }
}

fn rolling_extreme(
    bars: &[Bar],
    period: usize,
    field: impl Fn(&Bar) -> f64,
    fold: impl Fn(f64, f64) -> f64,
) -> Vec<f64> {
    let n = bars.len();
    let mut result = vec![f64::NAN; n];
    for i in (period - 1)..n {
        result[i] = bars[(i + 1 - period)..=i]
            .iter()
            .map(&field)
            .fold(f64::NAN, |acc, v| if acc.is_nan() { v } else { fold(acc, v) });
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn rolling_high_tracks_max_high() {
        let bars = make_bars(&[10.0, 12.0, 11.0, 15.0, 13.0]);
        // highs: 11, 13, 13, 16, 16
        let result = RollingHigh::new(3).compute(&bars);
        assert!(result[1].is_nan());
        assert_approx(result[2], 13.0, DEFAULT_EPSILON);
        assert_approx(result[3], 16.0, DEFAULT_EPSILON);
        assert_approx(result[4], 16.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rolling_low_tracks_min_low() {
        let bars = make_bars(&[10.0, 12.0, 11.0, 15.0, 13.0]);
        // lows: 9, 9, 10, 10, 12
        let result = RollingLow::new(3).compute(&bars);
        assert_approx(result[2], 9.0, DEFAULT_EPSILON);
        assert_approx(result[3], 9.0, DEFAULT_EPSILON);
        assert_approx(result[4], 10.0, DEFAULT_EPSILON);
    }

    #[test]
    fn period_one_is_identity() {
        let bars = make_bars(&[10.0, 12.0, 11.0]);
        let highs = RollingHigh::new(1).compute(&bars);
        for (i, bar) in bars.iter().enumerate() {
            assert_approx(highs[i], bar.high, DEFAULT_EPSILON);
        }
    }

    #[test]
    fn names_and_lookback() {
        assert_eq!(RollingHigh::new(20).name(), "rolling_high_20");
        assert_eq!(RollingLow::new(10).name(), "rolling_low_10");
        assert_eq!(RollingHigh::new(20).lookback(), 19);
        assert_eq!(RollingLow::series_name(10), "rolling_low_10");
    }
}
