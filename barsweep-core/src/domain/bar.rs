//! Bar — the fundamental market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// OHLCV bar for a single symbol over one interval.
///
/// Bars arrive from an external data collaborator as a strictly
/// time-ordered sequence with no duplicate timestamps; the loader
/// enforces both before the core ever sees them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Base-asset volume. Fractional for crypto instruments.
    pub volume: f64,
}

impl Bar {
    /// Basic OHLCV sanity check: finite prices, high >= low, OHLC inside the range.
    pub fn is_sane(&self) -> bool {
        let finite = self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite();
        finite
            && self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
    }
}

/// Bar interval, named by the data source's kline labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "30m")]
    M30,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "12h")]
    H12,
    #[serde(rename = "1d")]
    D1,
}

impl Interval {
    pub fn label(&self) -> &'static str {
        match self {
            Interval::M15 => "15m",
            Interval::M30 => "30m",
            Interval::H1 => "1h",
            Interval::H4 => "4h",
            Interval::H12 => "12h",
            Interval::D1 => "1d",
        }
    }

    /// Bars per calendar year for this interval. Crypto markets trade
    /// around the clock, so a year is 365 full days.
    pub fn bars_per_year(&self) -> f64 {
        match self {
            Interval::M15 => 365.0 * 96.0,
            Interval::M30 => 365.0 * 48.0,
            Interval::H1 => 365.0 * 24.0,
            Interval::H4 => 365.0 * 6.0,
            Interval::H12 => 365.0 * 2.0,
            Interval::D1 => 365.0,
        }
    }

    /// Interval length in seconds.
    pub fn seconds(&self) -> i64 {
        match self {
            Interval::M15 => 15 * 60,
            Interval::M30 => 30 * 60,
            Interval::H1 => 3600,
            Interval::H4 => 4 * 3600,
            Interval::H12 => 12 * 3600,
            Interval::D1 => 24 * 3600,
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Interval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "15m" => Ok(Interval::M15),
            "30m" => Ok(Interval::M30),
            "1h" => Ok(Interval::H1),
            "4h" => Ok(Interval::H4),
            "12h" => Ok(Interval::H12),
            "1d" => Ok(Interval::D1),
            other => Err(format!("unknown interval label '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_bar() -> Bar {
        Bar {
            symbol: "BTCUSDT".into(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
            open: 100.0,
            high: 105.0,
            low: 98.0,
            close: 103.0,
            volume: 50_000.0,
        }
    }

    #[test]
    fn bar_is_sane() {
        assert!(sample_bar().is_sane());
    }

    #[test]
    fn bar_detects_insane_high_low() {
        let mut bar = sample_bar();
        bar.high = 97.0; // below low
        assert!(!bar.is_sane());
    }

    #[test]
    fn bar_detects_nan() {
        let mut bar = sample_bar();
        bar.close = f64::NAN;
        assert!(!bar.is_sane());
    }

    #[test]
    fn bar_serialization_roundtrip() {
        let bar = sample_bar();
        let json = serde_json::to_string(&bar).unwrap();
        let deser: Bar = serde_json::from_str(&json).unwrap();
        assert_eq!(bar.symbol, deser.symbol);
        assert_eq!(bar.timestamp, deser.timestamp);
        assert_eq!(bar.close, deser.close);
    }

    #[test]
    fn interval_labels_roundtrip() {
        for iv in [
            Interval::M15,
            Interval::M30,
            Interval::H1,
            Interval::H4,
            Interval::H12,
            Interval::D1,
        ] {
            assert_eq!(iv.label().parse::<Interval>().unwrap(), iv);
        }
    }

    #[test]
    fn interval_serde_uses_labels() {
        let json = serde_json::to_string(&Interval::H12).unwrap();
        assert_eq!(json, "\"12h\"");
        let deser: Interval = serde_json::from_str("\"15m\"").unwrap();
        assert_eq!(deser, Interval::M15);
    }

    #[test]
    fn interval_bars_per_year_consistent_with_seconds() {
        for iv in [Interval::M15, Interval::H1, Interval::D1] {
            let from_seconds = 365.0 * 24.0 * 3600.0 / iv.seconds() as f64;
            assert!((iv.bars_per_year() - from_seconds).abs() < 1e-9);
        }
    }

    #[test]
    fn unknown_interval_rejected() {
        assert!("3d".parse::<Interval>().is_err());
    }
}
