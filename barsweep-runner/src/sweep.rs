//! Parameter sweep: enumerate a Cartesian grid, run every combination,
//! keep the best by metric.
//!
//! Sweep axes are explicit and every family grid goes through the same
//! `cartesian` combinator. Structurally invalid combinations (fast >=
//! slow and the like) are skipped and counted before any simulation
//! runs; a skipped point never produces a record and never aborts the
//! sweep.

use anyhow::Result;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use barsweep_core::{Bar, Interval};

use crate::config::{RunConfig, StrategyParams};
use crate::fitness::FitnessMetric;
use crate::metrics::MetricsRecord;
use crate::runner::run_backtest;

/// One sweep dimension: a name plus the values it takes on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamAxis {
    pub name: String,
    pub values: Vec<f64>,
}

impl ParamAxis {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn from_usize(name: impl Into<String>, values: &[usize]) -> Self {
        Self::new(name, values.iter().map(|&v| v as f64).collect())
    }
}

/// All combinations of the axes, row-major in axis order. An empty axis
/// yields no combinations.
pub fn cartesian(axes: &[ParamAxis]) -> Vec<Vec<f64>> {
    let mut combos: Vec<Vec<f64>> = vec![Vec::new()];
    for axis in axes {
        let mut next = Vec::with_capacity(combos.len() * axis.values.len());
        for combo in &combos {
            for &value in &axis.values {
                let mut extended = combo.clone();
                extended.push(value);
                next.push(extended);
            }
        }
        combos = next;
    }
    combos
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CrossoverGrid {
    pub fast: Vec<usize>,
    pub slow: Vec<usize>,
}

impl CrossoverGrid {
    fn candidates(&self) -> Vec<StrategyParams> {
        let axes = [
            ParamAxis::from_usize("fast", &self.fast),
            ParamAxis::from_usize("slow", &self.slow),
        ];
        cartesian(&axes)
            .into_iter()
            .map(|c| StrategyParams::Crossover {
                fast: c[0] as usize,
                slow: c[1] as usize,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BandBreakoutGrid {
    pub band_period: Vec<usize>,
    pub band_dev: Vec<f64>,
    pub rsi_period: Vec<usize>,
    pub oversold: Vec<f64>,
    pub overbought: Vec<f64>,
}

impl BandBreakoutGrid {
    fn candidates(&self) -> Vec<StrategyParams> {
        let axes = [
            ParamAxis::from_usize("band_period", &self.band_period),
            ParamAxis::new("band_dev", self.band_dev.clone()),
            ParamAxis::from_usize("rsi_period", &self.rsi_period),
            ParamAxis::new("oversold", self.oversold.clone()),
            ParamAxis::new("overbought", self.overbought.clone()),
        ];
        cartesian(&axes)
            .into_iter()
            .map(|c| StrategyParams::BandBreakout {
                band_period: c[0] as usize,
                band_dev: c[1],
                rsi_period: c[2] as usize,
                oversold: c[3],
                overbought: c[4],
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MartingaleGrid {
    pub initial_stake: Vec<f64>,
    pub multiplier: Vec<f64>,
    pub take_profit_pct: Vec<f64>,
    pub max_levels: Vec<usize>,
    pub risk_pct: Vec<f64>,
    pub ma_period: Vec<usize>,
}

impl MartingaleGrid {
    fn candidates(&self) -> Vec<StrategyParams> {
        let axes = [
            ParamAxis::new("initial_stake", self.initial_stake.clone()),
            ParamAxis::new("multiplier", self.multiplier.clone()),
            ParamAxis::new("take_profit_pct", self.take_profit_pct.clone()),
            ParamAxis::from_usize("max_levels", &self.max_levels),
            ParamAxis::new("risk_pct", self.risk_pct.clone()),
            ParamAxis::from_usize("ma_period", &self.ma_period),
        ];
        cartesian(&axes)
            .into_iter()
            .map(|c| StrategyParams::Martingale {
                initial_stake: c[0],
                multiplier: c[1],
                take_profit_pct: c[2],
                max_levels: c[3] as usize,
                risk_pct: c[4],
                ma_period: c[5] as usize,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TurtleGrid {
    pub entry_period: Vec<usize>,
    pub exit_period: Vec<usize>,
    pub atr_period: Vec<usize>,
    pub risk_per_trade: Vec<f64>,
    pub max_units: Vec<usize>,
}

impl TurtleGrid {
    fn candidates(&self) -> Vec<StrategyParams> {
        let axes = [
            ParamAxis::from_usize("entry_period", &self.entry_period),
            ParamAxis::from_usize("exit_period", &self.exit_period),
            ParamAxis::from_usize("atr_period", &self.atr_period),
            ParamAxis::new("risk_per_trade", self.risk_per_trade.clone()),
            ParamAxis::from_usize("max_units", &self.max_units),
        ];
        cartesian(&axes)
            .into_iter()
            .map(|c| StrategyParams::Turtle {
                entry_period: c[0] as usize,
                exit_period: c[1] as usize,
                atr_period: c[2] as usize,
                risk_per_trade: c[3],
                max_units: c[4] as usize,
            })
            .collect()
    }
}

/// Sweep specification, deserializable from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepSpec {
    pub intervals: Vec<Interval>,
    pub initial_cash: f64,
    pub commission_rate: f64,

    #[serde(default)]
    pub crossover: Option<CrossoverGrid>,
    #[serde(default)]
    pub band_breakout: Option<BandBreakoutGrid>,
    #[serde(default)]
    pub martingale: Option<MartingaleGrid>,
    #[serde(default)]
    pub turtle: Option<TurtleGrid>,
}

impl SweepSpec {
    /// Candidate configs before validation, in enumeration order.
    fn candidate_configs(&self) -> Vec<RunConfig> {
        let mut params = Vec::new();
        if let Some(grid) = &self.crossover {
            params.extend(grid.candidates());
        }
        if let Some(grid) = &self.band_breakout {
            params.extend(grid.candidates());
        }
        if let Some(grid) = &self.martingale {
            params.extend(grid.candidates());
        }
        if let Some(grid) = &self.turtle {
            params.extend(grid.candidates());
        }

        let mut configs = Vec::with_capacity(self.intervals.len() * params.len());
        for &interval in &self.intervals {
            for p in &params {
                configs.push(RunConfig {
                    interval,
                    initial_cash: self.initial_cash,
                    commission_rate: self.commission_rate,
                    params: p.clone(),
                });
            }
        }
        configs
    }
}

/// One retained sweep result: the parameter tuple plus its metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepRecord {
    pub config: RunConfig,
    pub metrics: MetricsRecord,
    pub rejected_orders: usize,
}

/// Parameter sweep executor.
pub struct ParamSweep {
    parallel: bool,
}

impl Default for ParamSweep {
    fn default() -> Self {
        Self::new()
    }
}

impl ParamSweep {
    pub fn new() -> Self {
        Self { parallel: true }
    }

    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Run every valid combination in the spec against the bar series.
    pub fn sweep(&self, spec: &SweepSpec, bars: &[Bar]) -> Result<SweepResults> {
        let candidates = spec.candidate_configs();
        let mut configs = Vec::with_capacity(candidates.len());
        let mut skipped = 0;
        for config in candidates {
            match config.validate() {
                Ok(()) => configs.push(config),
                Err(err) => {
                    skipped += 1;
                    debug!(family = config.params.family(), %err, "skipping invalid combination");
                }
            }
        }

        let records: Vec<SweepRecord> = if self.parallel {
            configs
                .par_iter()
                .map(|config| {
                    let report = run_backtest(config, bars)?;
                    Ok(SweepRecord {
                        config: config.clone(),
                        metrics: report.metrics,
                        rejected_orders: report.rejected_orders,
                    })
                })
                .collect::<Result<Vec<_>>>()?
        } else {
            configs
                .iter()
                .map(|config| {
                    let report = run_backtest(config, bars)?;
                    Ok(SweepRecord {
                        config: config.clone(),
                        metrics: report.metrics,
                        rejected_orders: report.rejected_orders,
                    })
                })
                .collect::<Result<Vec<_>>>()?
        };

        Ok(SweepResults { records, skipped })
    }
}

/// Results from a parameter sweep, in enumeration order.
#[derive(Debug)]
pub struct SweepResults {
    records: Vec<SweepRecord>,
    skipped: usize,
}

impl SweepResults {
    pub fn all(&self) -> &[SweepRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Combinations skipped for structural invalidity.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Best record by the given metric. Runs where the metric is
    /// undefined are excluded; ties keep the first-seen record.
    pub fn best_by(&self, metric: FitnessMetric) -> Option<&SweepRecord> {
        let mut best: Option<(&SweepRecord, f64)> = None;
        for record in &self.records {
            let Some(value) = metric.extract(&record.metrics) else {
                continue;
            };
            match &best {
                Some((_, best_value)) if !metric.is_better(value, *best_value) => {}
                _ => best = Some((record, value)),
            }
        }
        best.map(|(record, _)| record)
    }

    /// Records sorted best-first by the given metric; undefined last.
    pub fn sorted_by(&self, metric: FitnessMetric) -> Vec<&SweepRecord> {
        let mut sorted: Vec<&SweepRecord> = self.records.iter().collect();
        sorted.sort_by(|a, b| {
            match (metric.extract(&a.metrics), metric.extract(&b.metrics)) {
                (Some(va), Some(vb)) => {
                    if metric.is_better(va, vb) {
                        std::cmp::Ordering::Less
                    } else if metric.is_better(vb, va) {
                        std::cmp::Ordering::Greater
                    } else {
                        std::cmp::Ordering::Equal
                    }
                }
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            }
        });
        sorted
    }
}
