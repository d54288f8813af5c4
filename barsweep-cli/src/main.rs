//! barsweep CLI — run a single backtest or sweep a parameter grid.
//!
//! Commands:
//! - `run` — execute one backtest from a TOML run config
//! - `sweep` — enumerate a TOML sweep spec and report the best results
//!
//! Bars come from a kline CSV (`--data`) or, with `--synthetic`, from a
//! seeded random walk.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use barsweep_core::{Bar, Interval};
use barsweep_runner::data_loader::{load_csv, synthetic_walk};
use barsweep_runner::{
    run_backtest, run_pair_backtest, BacktestReport, FitnessMetric, ParamSweep, RunConfig,
    StrategyParams, SweepRecord, SweepSpec,
};

#[derive(Parser)]
#[command(name = "barsweep", about = "Bar-series backtesting and parameter sweeps")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute one backtest from a TOML run config.
    Run {
        /// Path to a TOML run config (interval, cash, strategy family).
        #[arg(long)]
        config: PathBuf,

        /// Kline CSV for the (first) instrument.
        #[arg(long)]
        data: Option<PathBuf>,

        /// Kline CSV for the second leg (pair-arbitrage family only).
        #[arg(long)]
        data_second: Option<PathBuf>,

        /// Use a seeded synthetic random walk instead of CSV data.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Bars to generate with --synthetic.
        #[arg(long, default_value_t = 2000)]
        synthetic_bars: usize,

        /// RNG seed for --synthetic.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Symbol label for loaded bars.
        #[arg(long, default_value = "BTCUSDT")]
        symbol: String,

        /// Write the full report as JSON to this path.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Enumerate a TOML sweep spec and report the best results. The
    /// whole sweep runs against one bar series, so the spec must name
    /// exactly one interval.
    Sweep {
        /// Path to a TOML sweep spec (one interval, account, family grids).
        #[arg(long)]
        spec: PathBuf,

        /// Kline CSV with the bar series to sweep over.
        #[arg(long)]
        data: Option<PathBuf>,

        /// Use a seeded synthetic random walk instead of CSV data.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Bars to generate with --synthetic.
        #[arg(long, default_value_t = 2000)]
        synthetic_bars: usize,

        /// RNG seed for --synthetic.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Symbol label for loaded bars.
        #[arg(long, default_value = "BTCUSDT")]
        symbol: String,

        /// Run combinations sequentially instead of in parallel.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        /// How many top records to print per metric.
        #[arg(long, default_value_t = 5)]
        top: usize,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            config,
            data,
            data_second,
            synthetic,
            synthetic_bars,
            seed,
            symbol,
            output,
        } => cmd_run(
            config, data, data_second, synthetic, synthetic_bars, seed, &symbol, output,
        ),
        Commands::Sweep {
            spec,
            data,
            synthetic,
            synthetic_bars,
            seed,
            symbol,
            sequential,
            top,
        } => cmd_sweep(spec, data, synthetic, synthetic_bars, seed, &symbol, sequential, top),
    }
}

/// One bar series carries one interval; metric annualization depends on
/// it, so a multi-interval spec cannot run against a single series.
fn sweep_interval(spec: &SweepSpec) -> Result<Interval> {
    match spec.intervals.as_slice() {
        [interval] => Ok(*interval),
        [] => bail!("sweep spec lists no intervals"),
        _ => bail!("sweep spec lists multiple intervals; run one sweep per bar series"),
    }
}

fn load_bars(
    data: Option<&PathBuf>,
    synthetic: bool,
    synthetic_bars: usize,
    seed: u64,
    symbol: &str,
    interval: Interval,
) -> Result<Vec<Bar>> {
    match (data, synthetic) {
        (Some(path), false) => load_csv(path, symbol)
            .with_context(|| format!("loading bars from {}", path.display())),
        (None, true) => Ok(synthetic_walk(symbol, interval, synthetic_bars, 100.0, seed)),
        (Some(_), true) => bail!("--data and --synthetic are mutually exclusive"),
        (None, false) => bail!("one of --data or --synthetic is required"),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_run(
    config_path: PathBuf,
    data: Option<PathBuf>,
    data_second: Option<PathBuf>,
    synthetic: bool,
    synthetic_bars: usize,
    seed: u64,
    symbol: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    let text = std::fs::read_to_string(&config_path)
        .with_context(|| format!("reading {}", config_path.display()))?;
    let config: RunConfig = toml::from_str(&text)
        .with_context(|| format!("parsing {}", config_path.display()))?;

    let bars = load_bars(
        data.as_ref(),
        synthetic,
        synthetic_bars,
        seed,
        symbol,
        config.interval,
    )?;

    let report = if matches!(config.params, StrategyParams::PairArbitrage { .. }) {
        let second = match (&data_second, synthetic) {
            (Some(path), _) => load_csv(path, &format!("{symbol}.B"))
                .with_context(|| format!("loading bars from {}", path.display()))?,
            (None, true) => synthetic_walk(
                &format!("{symbol}.B"),
                config.interval,
                bars.len(),
                100.0,
                seed.wrapping_add(1),
            ),
            (None, false) => bail!("pair-arbitrage runs need --data-second or --synthetic"),
        };
        run_pair_backtest(&config, &bars, &second)?
    } else {
        run_backtest(&config, &bars)?
    };
    info!(
        family = report.config.params.family(),
        bars = report.equity_curve.len(),
        trades = report.metrics.trade_count,
        rejected = report.rejected_orders,
        "backtest complete"
    );

    print_report(&report);

    if let Some(path) = output {
        let json = serde_json::json!({
            "config": report.config,
            "metrics": report.metrics,
            "trades": report.trades,
            "rejected_orders": report.rejected_orders,
        });
        std::fs::write(&path, serde_json::to_string_pretty(&json)?)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("Report saved to: {}", path.display());
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_sweep(
    spec_path: PathBuf,
    data: Option<PathBuf>,
    synthetic: bool,
    synthetic_bars: usize,
    seed: u64,
    symbol: &str,
    sequential: bool,
    top: usize,
) -> Result<()> {
    let text = std::fs::read_to_string(&spec_path)
        .with_context(|| format!("reading {}", spec_path.display()))?;
    let spec: SweepSpec = toml::from_str(&text)
        .with_context(|| format!("parsing {}", spec_path.display()))?;

    let interval = sweep_interval(&spec)?;
    let bars = load_bars(data.as_ref(), synthetic, synthetic_bars, seed, symbol, interval)?;

    let sweep = ParamSweep::new().with_parallelism(!sequential);
    let results = sweep.sweep(&spec, &bars)?;
    info!(
        combinations = results.len(),
        skipped = results.skipped(),
        bars = bars.len(),
        "sweep complete"
    );

    println!(
        "Swept {} combinations over {} bars ({} invalid points skipped)",
        results.len(),
        bars.len(),
        results.skipped()
    );

    for metric in [FitnessMetric::AnnualizedReturn, FitnessMetric::Sharpe] {
        println!();
        println!("--- Top {top} by {metric:?} ---");
        for record in results.sorted_by(metric).into_iter().take(top) {
            print_record(record, metric);
        }
        if results.best_by(metric).is_none() {
            println!("(no run has this metric defined)");
        }
    }

    Ok(())
}

fn print_record(record: &SweepRecord, metric: FitnessMetric) {
    let value = metric
        .extract(&record.metrics)
        .map(|v| format!("{v:.4}"))
        .unwrap_or_else(|| "undefined".to_string());
    println!(
        "{value:>12}  {:>4}  {}  trades={} win_rate={:.2} mdd={:.3}",
        record.config.interval.label(),
        describe_params(&record.config.params),
        record.metrics.trade_count,
        record.metrics.win_rate,
        record.metrics.max_drawdown,
    );
}

fn describe_params(params: &StrategyParams) -> String {
    match params {
        StrategyParams::Crossover { fast, slow } => {
            format!("crossover fast={fast} slow={slow}")
        }
        StrategyParams::BandBreakout {
            band_period,
            band_dev,
            rsi_period,
            oversold,
            overbought,
        } => format!(
            "band_breakout period={band_period} dev={band_dev} rsi={rsi_period} os={oversold} ob={overbought}"
        ),
        StrategyParams::Martingale {
            initial_stake,
            multiplier,
            take_profit_pct,
            max_levels,
            risk_pct,
            ma_period,
        } => format!(
            "martingale stake={initial_stake} mult={multiplier} tp={take_profit_pct} levels={max_levels} risk={risk_pct} ma={ma_period}"
        ),
        StrategyParams::Turtle {
            entry_period,
            exit_period,
            atr_period,
            risk_per_trade,
            max_units,
        } => format!(
            "turtle entry={entry_period} exit={exit_period} atr={atr_period} risk={risk_per_trade} units={max_units}"
        ),
        StrategyParams::PairArbitrage {
            threshold,
            order_size,
        } => format!("pair_arbitrage threshold={threshold} size={order_size}"),
    }
}

fn print_report(report: &BacktestReport) {
    let m = &report.metrics;
    println!();
    println!("=== Backtest Report ===");
    println!("Strategy:          {}", describe_params(&report.config.params));
    println!("Interval:          {}", report.config.interval.label());
    println!("Bars:              {}", report.equity_curve.len());
    println!("Trades:            {}", m.trade_count);
    println!("Rejected orders:   {}", report.rejected_orders);
    println!();
    println!("--- Performance ---");
    println!("Total Return:      {:.2}%", m.total_return * 100.0);
    match m.annualized_return {
        Some(v) => println!("Annualized Return: {:.2}%", v * 100.0),
        None => println!("Annualized Return: undefined"),
    }
    println!("Average Return:    {:.4}%", m.average_return * 100.0);
    println!("Max Drawdown:      {:.2}%", m.max_drawdown * 100.0);
    match m.sharpe {
        Some(v) => println!("Sharpe:            {v:.3}"),
        None => println!("Sharpe:            undefined"),
    }
    println!("Win Rate:          {:.1}%", m.win_rate * 100.0);
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec_with(intervals: Vec<Interval>) -> SweepSpec {
        SweepSpec {
            intervals,
            initial_cash: 10_000.0,
            commission_rate: 0.0,
            crossover: None,
            band_breakout: None,
            martingale: None,
            turtle: None,
        }
    }

    #[test]
    fn sweep_requires_exactly_one_interval() {
        assert_eq!(
            sweep_interval(&spec_with(vec![Interval::H4])).unwrap(),
            Interval::H4
        );
        assert!(sweep_interval(&spec_with(vec![])).is_err());
        assert!(sweep_interval(&spec_with(vec![Interval::H1, Interval::H4])).is_err());
    }
}
