//! Backtest runner: wires bars, strategy, simulator, and metrics for
//! one parameter configuration.
//!
//! Every run builds fresh state: a new strategy instance, a new
//! simulator, an empty trade log. Rejected orders are counted and
//! debug-logged; they never abort the run.

use thiserror::Error;
use tracing::debug;

use barsweep_core::execution::{ExecutionSimulator, SubmitOutcome};
use barsweep_core::strategy::{OrderResolution, StrategyContext};
use barsweep_core::{Account, Bar, IndicatorValues, Trade};

use crate::config::{ConfigError, RunConfig};
use crate::metrics::MetricsRecord;

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("bar series is empty")]
    EmptyBars,

    #[error("paired series lengths differ: {left} vs {right}")]
    MismatchedPair { left: usize, right: usize },
}

/// Full output of one backtest run.
#[derive(Debug, Clone)]
pub struct BacktestReport {
    pub config: RunConfig,
    pub metrics: MetricsRecord,
    pub equity_curve: Vec<f64>,
    pub trades: Vec<Trade>,
    pub rejected_orders: usize,
}

/// Run a single-series strategy over a bar series.
pub fn run_backtest(config: &RunConfig, bars: &[Bar]) -> Result<BacktestReport, RunError> {
    config.validate()?;
    if bars.is_empty() {
        return Err(RunError::EmptyBars);
    }

    let mut strategy = config.params.build()?;
    let mut sim = ExecutionSimulator::new(Account::new(config.initial_cash, config.commission_rate));
    if strategy.allow_short() {
        sim = sim.with_short_selling();
    }

    let indicators = IndicatorValues::precompute(&strategy.indicators(), bars);
    let warmup = strategy.warmup_bars();

    let mut equity_curve = Vec::with_capacity(bars.len());
    let mut trades = Vec::new();
    let mut rejected_orders = 0;
    let mut last_resolution: Option<OrderResolution> = None;

    for (bar_index, bar) in bars.iter().enumerate() {
        // Warm-up bars are marked to market but never fed to the strategy.
        if bar_index >= warmup {
            let ctx = StrategyContext {
                bars,
                bar_index,
                indicators: &indicators,
                position: sim.position(),
                account: sim.account(),
                last_resolution: last_resolution.as_ref(),
            };
            let intent = strategy.on_bar(&ctx);

            last_resolution = intent.map(|intent| {
                let outcome = sim.submit(&intent, bar);
                match &outcome {
                    SubmitOutcome::Filled(fill) => {
                        if let Some(trade) = &fill.closed_trade {
                            trades.push(trade.clone());
                        }
                    }
                    SubmitOutcome::Rejected(reason) => {
                        rejected_orders += 1;
                        debug!(
                            family = config.params.family(),
                            bar_index,
                            ?reason,
                            "order rejected"
                        );
                    }
                }
                OrderResolution { intent, outcome }
            });
        }

        equity_curve.push(sim.equity(bar.close));
    }

    let metrics = MetricsRecord::compute(&equity_curve, &trades, config.interval);
    Ok(BacktestReport {
        config: config.clone(),
        metrics,
        equity_curve,
        trades,
        rejected_orders,
    })
}

/// Run the pair-arbitrage rule over two synchronized bar series.
///
/// Each leg gets its own simulator (shorting enabled) funded with the
/// configured initial cash; the reported equity curve is the sum of
/// both legs and trades from both legs share one log.
pub fn run_pair_backtest(
    config: &RunConfig,
    bars_a: &[Bar],
    bars_b: &[Bar],
) -> Result<BacktestReport, RunError> {
    config.validate()?;
    if bars_a.is_empty() || bars_b.is_empty() {
        return Err(RunError::EmptyBars);
    }
    if bars_a.len() != bars_b.len() {
        return Err(RunError::MismatchedPair {
            left: bars_a.len(),
            right: bars_b.len(),
        });
    }

    let rule = config.params.build_pair()?;
    let account = Account::new(config.initial_cash, config.commission_rate);
    let mut sim_a = ExecutionSimulator::new(account).with_short_selling();
    let mut sim_b = ExecutionSimulator::new(account).with_short_selling();

    let mut equity_curve = Vec::with_capacity(bars_a.len());
    let mut trades = Vec::new();
    let mut rejected_orders = 0;

    for (bar_index, (bar_a, bar_b)) in bars_a.iter().zip(bars_b).enumerate() {
        if let Some((intent_a, intent_b)) = rule.on_bar_pair(bar_a, bar_b, bar_index) {
            for (sim, intent, bar) in [
                (&mut sim_a, intent_a, bar_a),
                (&mut sim_b, intent_b, bar_b),
            ] {
                match sim.submit(&intent, bar) {
                    SubmitOutcome::Filled(fill) => {
                        if let Some(trade) = fill.closed_trade {
                            trades.push(trade);
                        }
                    }
                    SubmitOutcome::Rejected(reason) => {
                        rejected_orders += 1;
                        debug!(bar_index, ?reason, "pair leg order rejected");
                    }
                }
            }
        }
        equity_curve.push(sim_a.equity(bar_a.close) + sim_b.equity(bar_b.close));
    }

    let metrics = MetricsRecord::compute(&equity_curve, &trades, config.interval);
    Ok(BacktestReport {
        config: config.clone(),
        metrics,
        equity_curve,
        trades,
        rejected_orders,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StrategyParams;
    use barsweep_core::Interval;
    use chrono::{Duration, TimeZone, Utc};

    fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
        let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                let open = if i == 0 { close } else { closes[i - 1] };
                Bar {
                    symbol: "BTCUSDT".to_string(),
                    timestamp: base + Duration::hours(4 * i as i64),
                    open,
                    high: open.max(close) + 0.5,
                    low: open.min(close) - 0.5,
                    close,
                    volume: 1_000.0,
                }
            })
            .collect()
    }

    fn crossover_config() -> RunConfig {
        RunConfig {
            interval: Interval::H4,
            initial_cash: 10_000.0,
            commission_rate: 0.0,
            params: StrategyParams::Crossover { fast: 3, slow: 10 },
        }
    }

    #[test]
    fn empty_bars_is_an_error() {
        let err = run_backtest(&crossover_config(), &[]).unwrap_err();
        assert!(matches!(err, RunError::EmptyBars));
    }

    #[test]
    fn equity_curve_has_one_point_per_bar() {
        let bars = bars_from_closes(&vec![100.0; 25]);
        let report = run_backtest(&crossover_config(), &bars).unwrap();
        assert_eq!(report.equity_curve.len(), 25);
        assert!(report.trades.is_empty());
        assert_eq!(report.rejected_orders, 0);
    }

    #[test]
    fn series_inside_warmup_window_stays_flat() {
        // 5 bars against a slow period of 10: the strategy is never
        // invoked, but every bar is still marked to market.
        let bars = bars_from_closes(&[100.0, 101.0, 102.0, 103.0, 104.0]);
        let report = run_backtest(&crossover_config(), &bars).unwrap();
        assert_eq!(report.equity_curve.len(), 5);
        assert!(report.trades.is_empty());
        assert_eq!(report.metrics.total_return, 0.0);
    }

    #[test]
    fn invalid_config_fails_before_running() {
        let mut config = crossover_config();
        config.params = StrategyParams::Crossover { fast: 10, slow: 3 };
        let bars = bars_from_closes(&vec![100.0; 25]);
        assert!(run_backtest(&config, &bars).is_err());
    }

    #[test]
    fn pair_run_requires_aligned_series() {
        let config = RunConfig {
            interval: Interval::H1,
            initial_cash: 10_000.0,
            commission_rate: 0.0,
            params: StrategyParams::PairArbitrage {
                threshold: 0.5,
                order_size: 1.0,
            },
        };
        let a = bars_from_closes(&[100.0, 101.0, 102.0]);
        let b = bars_from_closes(&[100.0, 100.2]);
        let err = run_pair_backtest(&config, &a, &b).unwrap_err();
        assert!(matches!(err, RunError::MismatchedPair { left: 3, right: 2 }));
    }
}
