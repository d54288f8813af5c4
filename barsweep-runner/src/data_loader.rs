//! Bar series ingest: CSV klines and a synthetic fallback.
//!
//! Market-data retrieval itself is an external concern; this module
//! only turns an already-downloaded kline CSV (epoch-millisecond
//! timestamps, OHLCV columns) into a validated `Bar` series, and
//! provides a seeded random-walk generator for demos and benchmarks.
//!
//! The loader enforces what every downstream component assumes: strict
//! timestamp ordering, no duplicates, and sane OHLC relations.

use std::path::Path;

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use thiserror::Error;

use barsweep_core::{Bar, Interval};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("csv parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("row {index}: timestamp {timestamp_ms} is not a valid epoch millisecond value")]
    BadTimestamp { index: usize, timestamp_ms: i64 },

    #[error("row {index}: timestamps out of order or duplicated")]
    OutOfOrder { index: usize },

    #[error("row {index}: inconsistent OHLC values")]
    InsaneBar { index: usize },
}

/// Raw CSV row: epoch-millisecond open time plus OHLCV.
#[derive(Debug, Deserialize)]
struct KlineRow {
    timestamp_ms: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Load a kline CSV into a validated bar series.
pub fn load_csv(path: impl AsRef<Path>, symbol: &str) -> Result<Vec<Bar>, LoadError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let mut reader = csv::Reader::from_reader(file);

    let mut bars: Vec<Bar> = Vec::new();
    for (index, row) in reader.deserialize::<KlineRow>().enumerate() {
        let row = row?;
        let timestamp = parse_epoch_ms(row.timestamp_ms).ok_or(LoadError::BadTimestamp {
            index,
            timestamp_ms: row.timestamp_ms,
        })?;

        if let Some(last) = bars.last() {
            if timestamp <= last.timestamp {
                return Err(LoadError::OutOfOrder { index });
            }
        }

        let bar = Bar {
            symbol: symbol.to_string(),
            timestamp,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        };
        if !bar.is_sane() {
            return Err(LoadError::InsaneBar { index });
        }
        bars.push(bar);
    }
    Ok(bars)
}

fn parse_epoch_ms(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

/// Seeded geometric random walk. Same seed, same series.
pub fn synthetic_walk(
    symbol: &str,
    interval: Interval,
    bars: usize,
    start_price: f64,
    seed: u64,
) -> Vec<Bar> {
    let mut rng = StdRng::seed_from_u64(seed);
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let step = Duration::seconds(interval.seconds());

    let mut close = start_price;
    (0..bars)
        .map(|i| {
            let open = close;
            let ret: f64 = rng.gen_range(-0.02..0.0205);
            close = (open * (1.0 + ret)).max(0.01);
            let wick_up: f64 = rng.gen_range(0.0..0.005);
            let wick_down: f64 = rng.gen_range(0.0..0.005);
            Bar {
                symbol: symbol.to_string(),
                timestamp: base + step * i as i32,
                open,
                high: open.max(close) * (1.0 + wick_up),
                low: open.min(close) * (1.0 - wick_down),
                close,
                volume: rng.gen_range(100.0..10_000.0),
            }
        })
        .collect()
}
