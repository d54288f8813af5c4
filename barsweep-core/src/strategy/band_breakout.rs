//! Volatility-band breakout with a momentum reversal filter.
//!
//! Long when the close breaks above the upper Bollinger band while RSI
//! still reads oversold, short on the mirror condition at the lower
//! band. Either open state exits when the close reverts to the middle
//! band. Reversing direction always goes through flat first: closing
//! and re-opening are separate orders on separate bars.

use crate::domain::{OrderIntent, OrderSide};
use crate::indicators::{Bollinger, BollingerBand, Indicator, Rsi};

use super::{all_in_size, Strategy, StrategyContext};

#[derive(Debug, Clone)]
pub struct BandBreakout {
    band_period: usize,
    band_dev: f64,
    rsi_period: usize,
    oversold: f64,
    overbought: f64,
    upper_name: String,
    middle_name: String,
    lower_name: String,
    rsi_name: String,
}

impl BandBreakout {
    pub fn new(
        band_period: usize,
        band_dev: f64,
        rsi_period: usize,
        oversold: f64,
        overbought: f64,
    ) -> Self {
        assert!(band_period >= 2, "band period must be >= 2");
        assert!(band_dev > 0.0, "band deviation must be > 0");
        assert!(
            oversold < overbought,
            "oversold threshold must be below overbought"
        );
        Self {
            band_period,
            band_dev,
            rsi_period,
            oversold,
            overbought,
            upper_name: Bollinger::series_name(band_period, band_dev, BollingerBand::Upper),
            middle_name: Bollinger::series_name(band_period, band_dev, BollingerBand::Middle),
            lower_name: Bollinger::series_name(band_period, band_dev, BollingerBand::Lower),
            rsi_name: Rsi::series_name(rsi_period),
        }
    }
}

impl Strategy for BandBreakout {
    fn name(&self) -> &str {
        "band_breakout"
    }

    fn indicators(&self) -> Vec<Box<dyn Indicator>> {
        vec![
            Box::new(Bollinger::upper(self.band_period, self.band_dev)),
            Box::new(Bollinger::middle(self.band_period, self.band_dev)),
            Box::new(Bollinger::lower(self.band_period, self.band_dev)),
            Box::new(Rsi::new(self.rsi_period)),
        ]
    }

    fn warmup_bars(&self) -> usize {
        (self.band_period - 1).max(self.rsi_period)
    }

    fn allow_short(&self) -> bool {
        true
    }

    fn on_bar(&mut self, ctx: &StrategyContext) -> Option<OrderIntent> {
        let upper = ctx.indicator(&self.upper_name)?;
        let middle = ctx.indicator(&self.middle_name)?;
        let lower = ctx.indicator(&self.lower_name)?;
        let rsi = ctx.indicator(&self.rsi_name)?;

        let bar = ctx.bar();
        let close = bar.close;

        if ctx.position.is_flat() {
            if close > upper && rsi < self.oversold {
                let size = all_in_size(&ctx.account, close);
                return Some(OrderIntent::buy(size, ctx.bar_index, bar));
            }
            if close < lower && rsi > self.overbought {
                let size = all_in_size(&ctx.account, close);
                return Some(OrderIntent::sell(size, ctx.bar_index, bar));
            }
            return None;
        }

        // Mid-band reversion closes whichever side is open.
        if ctx.position.is_long() && close <= middle {
            return Some(OrderIntent::sell(ctx.position.quantity, ctx.bar_index, bar));
        }
        if ctx.position.is_short() && close >= middle {
            return Some(OrderIntent::buy(-ctx.position.quantity, ctx.bar_index, bar));
        }
        None
    }
}
