//! Run configuration: one parameter tuple for one backtest.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use barsweep_core::strategy::{BandBreakout, Crossover, Martingale, PairArbitrage, Turtle};
use barsweep_core::{Interval, Strategy};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("fast period {fast} must be below slow period {slow}")]
    InvalidPeriods { fast: usize, slow: usize },

    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    #[error("the pair-arbitrage family runs through run_pair_backtest, not a single-series strategy")]
    PairFamily,
}

/// Strategy family plus its parameter tuple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum StrategyParams {
    Crossover {
        fast: usize,
        slow: usize,
    },
    BandBreakout {
        band_period: usize,
        band_dev: f64,
        rsi_period: usize,
        oversold: f64,
        overbought: f64,
    },
    Martingale {
        initial_stake: f64,
        multiplier: f64,
        take_profit_pct: f64,
        max_levels: usize,
        risk_pct: f64,
        ma_period: usize,
    },
    Turtle {
        entry_period: usize,
        exit_period: usize,
        atr_period: usize,
        risk_per_trade: f64,
        max_units: usize,
    },
    PairArbitrage {
        threshold: f64,
        order_size: f64,
    },
}

impl StrategyParams {
    /// Structural validation, applied before a sweep point is run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            Self::Crossover { fast, slow } => {
                if fast == 0 {
                    return Err(ConfigError::InvalidParam("fast period must be >= 1".into()));
                }
                if fast >= slow {
                    return Err(ConfigError::InvalidPeriods { fast, slow });
                }
            }
            Self::BandBreakout {
                band_period,
                band_dev,
                rsi_period,
                oversold,
                overbought,
            } => {
                if band_period < 2 {
                    return Err(ConfigError::InvalidParam("band period must be >= 2".into()));
                }
                if band_dev <= 0.0 {
                    return Err(ConfigError::InvalidParam("band deviation must be > 0".into()));
                }
                if rsi_period == 0 {
                    return Err(ConfigError::InvalidParam("rsi period must be >= 1".into()));
                }
                if oversold >= overbought {
                    return Err(ConfigError::InvalidParam(format!(
                        "oversold {oversold} must be below overbought {overbought}"
                    )));
                }
            }
            Self::Martingale {
                initial_stake,
                multiplier,
                take_profit_pct,
                risk_pct,
                ma_period,
                ..
            } => {
                if initial_stake <= 0.0 {
                    return Err(ConfigError::InvalidParam("initial stake must be > 0".into()));
                }
                if multiplier < 1.0 {
                    return Err(ConfigError::InvalidParam("multiplier must be >= 1".into()));
                }
                if take_profit_pct <= 0.0 {
                    return Err(ConfigError::InvalidParam("take profit must be > 0".into()));
                }
                if !(0.0..=1.0).contains(&risk_pct) {
                    return Err(ConfigError::InvalidParam(
                        "risk fraction must be in [0, 1]".into(),
                    ));
                }
                if ma_period == 0 {
                    return Err(ConfigError::InvalidParam("ma period must be >= 1".into()));
                }
            }
            Self::Turtle {
                entry_period,
                exit_period,
                atr_period,
                risk_per_trade,
                max_units,
            } => {
                if entry_period == 0 || exit_period == 0 || atr_period == 0 {
                    return Err(ConfigError::InvalidParam(
                        "turtle periods must be >= 1".into(),
                    ));
                }
                if !(0.0..=1.0).contains(&risk_per_trade) {
                    return Err(ConfigError::InvalidParam(
                        "risk per trade must be in [0, 1]".into(),
                    ));
                }
                if max_units == 0 {
                    return Err(ConfigError::InvalidParam("max units must be >= 1".into()));
                }
            }
            Self::PairArbitrage {
                threshold,
                order_size,
            } => {
                if threshold <= 0.0 {
                    return Err(ConfigError::InvalidParam("threshold must be > 0".into()));
                }
                if order_size <= 0.0 {
                    return Err(ConfigError::InvalidParam("order size must be > 0".into()));
                }
            }
        }
        Ok(())
    }

    /// Instantiate the single-series strategy for this tuple.
    pub fn build(&self) -> Result<Box<dyn Strategy>, ConfigError> {
        self.validate()?;
        match *self {
            Self::Crossover { fast, slow } => Ok(Box::new(Crossover::new(fast, slow))),
            Self::BandBreakout {
                band_period,
                band_dev,
                rsi_period,
                oversold,
                overbought,
            } => Ok(Box::new(BandBreakout::new(
                band_period,
                band_dev,
                rsi_period,
                oversold,
                overbought,
            ))),
            Self::Martingale {
                initial_stake,
                multiplier,
                take_profit_pct,
                max_levels,
                risk_pct,
                ma_period,
            } => Ok(Box::new(Martingale::new(
                initial_stake,
                multiplier,
                take_profit_pct,
                max_levels,
                risk_pct,
                ma_period,
            ))),
            Self::Turtle {
                entry_period,
                exit_period,
                atr_period,
                risk_per_trade,
                max_units,
            } => Ok(Box::new(Turtle::new(
                entry_period,
                exit_period,
                atr_period,
                risk_per_trade,
                max_units,
            ))),
            Self::PairArbitrage { .. } => Err(ConfigError::PairFamily),
        }
    }

    /// The pair decision rule, for the two-leg runner.
    pub fn build_pair(&self) -> Result<PairArbitrage, ConfigError> {
        self.validate()?;
        match *self {
            Self::PairArbitrage {
                threshold,
                order_size,
            } => Ok(PairArbitrage::new(threshold, order_size)),
            _ => Err(ConfigError::InvalidParam(
                "not a pair-arbitrage parameter tuple".into(),
            )),
        }
    }

    pub fn family(&self) -> &'static str {
        match self {
            Self::Crossover { .. } => "crossover",
            Self::BandBreakout { .. } => "band_breakout",
            Self::Martingale { .. } => "martingale",
            Self::Turtle { .. } => "turtle",
            Self::PairArbitrage { .. } => "pair_arbitrage",
        }
    }
}

/// Everything one backtest run needs besides the bars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub interval: Interval,
    pub initial_cash: f64,
    pub commission_rate: f64,
    pub params: StrategyParams,
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_cash <= 0.0 {
            return Err(ConfigError::InvalidParam("initial cash must be > 0".into()));
        }
        if !(0.0..1.0).contains(&self.commission_rate) {
            return Err(ConfigError::InvalidParam(
                "commission rate must be in [0, 1)".into(),
            ));
        }
        self.params.validate()
    }
}
