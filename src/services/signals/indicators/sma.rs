//! Simple Moving Average (SMA) indicator.

use super::sma_series;
use crate::services::signals::{Column, Indicator, Series};
use crate::types::{IndicatorCategory, OhlcPoint};

/// SMA (Simple Moving Average) of closing prices.
///
/// The crossover rule compares the latest close against it; the vote counts
/// a close above it as bullish.
pub struct Sma {
    period: usize,
}

impl Default for Sma {
    fn default() -> Self {
        Self { period: 20 }
    }
}

impl Sma {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl Indicator for Sma {
    fn id(&self) -> &str {
        "sma"
    }

    fn name(&self) -> String {
        format!("SMA ({})", self.period)
    }

    fn category(&self) -> IndicatorCategory {
        IndicatorCategory::Trend
    }

    fn min_periods(&self) -> usize {
        self.period
    }

    fn columns(&self) -> &'static [Column] {
        &[Column::Sma]
    }

    fn series(&self, candles: &[OhlcPoint]) -> Vec<(Column, Series)> {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        vec![(Column::Sma, sma_series(&closes, self.period))]
    }
}
