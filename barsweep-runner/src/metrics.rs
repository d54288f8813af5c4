//! Performance metrics — pure functions over the equity curve and trade log.
//!
//! Every metric is a pure function: equity curve and/or trade list in,
//! value out. A metric whose denominator is zero or undefined (no
//! trades, zero-variance returns) yields `None`, never NaN or a panic.
//!
//! Annualized return uses a fixed 365 calendar-day exponent over the
//! bar count regardless of bar interval, so intraday intervals are
//! treated as whole days there. The Sharpe ratio, by contrast, is
//! annualized by the square root of the interval's bars per year.

use serde::{Deserialize, Serialize};

use barsweep_core::{Interval, Trade};

/// Aggregate performance metrics for a single backtest run.
///
/// `None` marks a metric that is undefined for this run; the sweep
/// optimizer excludes those runs from best-by-metric selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub total_return: f64,
    pub annualized_return: Option<f64>,
    pub average_return: f64,
    pub max_drawdown: f64,
    pub sharpe: Option<f64>,
    pub trade_count: usize,
    pub win_rate: f64,
}

impl MetricsRecord {
    /// Compute all metrics from an equity curve and trade log.
    pub fn compute(equity_curve: &[f64], trades: &[Trade], interval: Interval) -> Self {
        Self {
            total_return: total_return(equity_curve),
            annualized_return: annualized_return(equity_curve),
            average_return: average_return(equity_curve),
            max_drawdown: max_drawdown(equity_curve),
            sharpe: sharpe_ratio(equity_curve, interval),
            trade_count: trades.len(),
            win_rate: win_rate(trades),
        }
    }
}

/// Total return as a fraction: final / initial - 1.
pub fn total_return(equity_curve: &[f64]) -> f64 {
    if equity_curve.len() < 2 {
        return 0.0;
    }
    let initial = equity_curve[0];
    let final_eq = equity_curve[equity_curve.len() - 1];
    if initial <= 0.0 {
        return 0.0;
    }
    final_eq / initial - 1.0
}

/// Annualized return: (final / initial)^(365 / bars) - 1.
///
/// Calendar-day normalization; each bar counts as one day regardless of
/// the interval. `None` when the curve is too short or non-positive.
pub fn annualized_return(equity_curve: &[f64]) -> Option<f64> {
    if equity_curve.len() < 2 {
        return None;
    }
    let initial = equity_curve[0];
    let final_eq = equity_curve[equity_curve.len() - 1];
    if initial <= 0.0 || final_eq <= 0.0 {
        return None;
    }
    let exponent = 365.0 / equity_curve.len() as f64;
    Some((final_eq / initial).powf(exponent) - 1.0)
}

/// Arithmetic mean of per-bar returns.
pub fn average_return(equity_curve: &[f64]) -> f64 {
    let returns = bar_returns(equity_curve);
    mean(&returns)
}

/// Largest peak-to-trough decline as a positive fraction of the peak.
///
/// Pure and idempotent; 0.0 for flat or monotonically rising curves.
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    if equity_curve.len() < 2 {
        return 0.0;
    }
    let mut peak = equity_curve[0];
    let mut max_dd = 0.0_f64;
    for &eq in equity_curve {
        if eq > peak {
            peak = eq;
        }
        if peak > 0.0 {
            let dd = (peak - eq) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

/// Annualized Sharpe ratio from per-bar returns.
///
/// Sharpe = mean(returns) / std(returns) * sqrt(bars per year).
/// `None` when fewer than two returns exist or the variance is zero.
pub fn sharpe_ratio(equity_curve: &[f64], interval: Interval) -> Option<f64> {
    let returns = bar_returns(equity_curve);
    if returns.len() < 2 {
        return None;
    }
    let m = mean(&returns);
    let sd = std_dev(&returns);
    if sd < 1e-15 {
        return None;
    }
    Some(m / sd * interval.bars_per_year().sqrt())
}

/// Fraction of closed trades with positive net pnl; 0.0 with no trades.
pub fn win_rate(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / trades.len() as f64
}

/// Per-bar simple returns from an equity curve.
pub fn bar_returns(equity_curve: &[f64]) -> Vec<f64> {
    if equity_curve.len() < 2 {
        return Vec::new();
    }
    equity_curve
        .windows(2)
        .map(|w| if w[0] > 0.0 { w[1] / w[0] - 1.0 } else { 0.0 })
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
