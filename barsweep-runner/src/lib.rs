//! barsweep-runner: backtest orchestration, metrics, and parameter sweeps.

pub mod config;
pub mod data_loader;
pub mod fitness;
pub mod metrics;
pub mod runner;
pub mod sweep;

pub use config::{ConfigError, RunConfig, StrategyParams};
pub use fitness::FitnessMetric;
pub use metrics::MetricsRecord;
pub use runner::{run_backtest, run_pair_backtest, BacktestReport, RunError};
pub use sweep::{ParamSweep, SweepRecord, SweepResults, SweepSpec};
