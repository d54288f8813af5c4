//! Criterion benchmarks for single runs and small sweeps over a
//! deterministic synthetic series.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use barsweep_core::Interval;
use barsweep_runner::data_loader::synthetic_walk;
use barsweep_runner::sweep::{CrossoverGrid, SweepSpec, TurtleGrid};
use barsweep_runner::{run_backtest, ParamSweep, RunConfig, StrategyParams};

fn bench_single_run(c: &mut Criterion) {
    let bars = synthetic_walk("BENCH", Interval::H1, 5_000, 100.0, 7);
    let config = RunConfig {
        interval: Interval::H1,
        initial_cash: 10_000.0,
        commission_rate: 0.0008,
        params: StrategyParams::Crossover { fast: 10, slow: 50 },
    };

    c.bench_function("run_backtest_crossover_5k_bars", |b| {
        b.iter(|| run_backtest(black_box(&config), black_box(&bars)).unwrap())
    });
}

fn bench_sweep(c: &mut Criterion) {
    let bars = synthetic_walk("BENCH", Interval::H1, 2_000, 100.0, 7);
    let spec = SweepSpec {
        intervals: vec![Interval::H1],
        initial_cash: 10_000.0,
        commission_rate: 0.0008,
        crossover: Some(CrossoverGrid {
            fast: vec![5, 10, 20],
            slow: vec![20, 50, 100],
        }),
        band_breakout: None,
        martingale: None,
        turtle: Some(TurtleGrid {
            entry_period: vec![20, 55],
            exit_period: vec![10, 20],
            atr_period: vec![14],
            risk_per_trade: vec![0.01, 0.02],
            max_units: vec![4],
        }),
    };

    let sequential = ParamSweep::new().with_parallelism(false);
    let parallel = ParamSweep::new();

    c.bench_function("sweep_sequential_2k_bars", |b| {
        b.iter(|| sequential.sweep(black_box(&spec), black_box(&bars)).unwrap())
    });
    c.bench_function("sweep_parallel_2k_bars", |b| {
        b.iter(|| parallel.sweep(black_box(&spec), black_box(&bars)).unwrap())
    });
}

criterion_group!(benches, bench_single_run, bench_sweep);
criterion_main!(benches);
