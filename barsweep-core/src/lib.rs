//! barsweep-core: event-driven backtest engine.
//!
//! Domain types, precomputed indicators, an execution simulator that
//! fills strategy orders at bar closes, and the strategy state machines
//! themselves. Running backtests and sweeping parameter grids lives in
//! `barsweep-runner`.

pub mod domain;
pub mod execution;
pub mod indicators;
pub mod strategy;

pub use domain::{Account, Bar, Interval, OrderIntent, OrderSide, Position, Trade, TradeSide};
pub use execution::{ExecutionSimulator, FillResult, RejectReason, SubmitOutcome};
pub use indicators::{Indicator, IndicatorValues};
pub use strategy::{OrderResolution, Strategy, StrategyContext};

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn core_types_are_send_sync() {
        assert_send_sync::<Bar>();
        assert_send_sync::<ExecutionSimulator>();
        assert_send_sync::<IndicatorValues>();
        assert_send_sync::<strategy::Crossover>();
        assert_send_sync::<strategy::Martingale>();
        assert_send_sync::<strategy::Turtle>();
    }
}
