//! Stochastic Oscillator indicator.

use super::{sma_series, smooth_defined};
use crate::services::signals::{Column, Indicator, Series};
use crate::types::{IndicatorCategory, OhlcPoint};

/// Stochastic Oscillator.
///
/// Compares closing price to price range over a period:
/// %K = (Current Close - Lowest Low) / (Highest High - Lowest Low) * 100
/// %D = SMA of %K
///
/// Signals:
/// - Below 20: Oversold (bullish)
/// - Above 80: Overbought (bearish)
pub struct Stochastic {
    k_period: usize,
    d_period: usize,
}

impl Default for Stochastic {
    fn default() -> Self {
        Self {
            k_period: 14,
            d_period: 3,
        }
    }
}

impl Stochastic {
    pub fn new(k_period: usize, d_period: usize) -> Self {
        Self { k_period, d_period }
    }

    fn percent_k(candles: &[OhlcPoint], period: usize) -> Series {
        let mut out = vec![None; candles.len()];
        if period == 0 || candles.len() < period {
            return out;
        }

        for i in (period - 1)..candles.len() {
            let window = &candles[i + 1 - period..=i];
            let lowest = window.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
            let highest = window.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
            let range = highest - lowest;

            // flat window
            out[i] = Some(if range == 0.0 {
                50.0
            } else {
                (candles[i].close - lowest) / range * 100.0
            });
        }
        out
    }
}

impl Indicator for Stochastic {
    fn id(&self) -> &str {
        "stochastic"
    }

    fn name(&self) -> String {
        format!("Stochastic ({}, {})", self.k_period, self.d_period)
    }

    fn category(&self) -> IndicatorCategory {
        IndicatorCategory::Momentum
    }

    fn min_periods(&self) -> usize {
        self.k_period + self.d_period.max(1) - 1
    }

    fn columns(&self) -> &'static [Column] {
        &[Column::StochK, Column::StochD]
    }

    fn series(&self, candles: &[OhlcPoint]) -> Vec<(Column, Series)> {
        let k = Self::percent_k(candles, self.k_period);
        let d = smooth_defined(&k, self.d_period, sma_series);
        vec![(Column::StochK, k), (Column::StochD, d)]
    }
}
