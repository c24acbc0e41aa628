//! Exponential Moving Average (EMA) indicator.

use super::ema_series;
use crate::services::signals::{Column, Indicator, Series};
use crate::types::{IndicatorCategory, OhlcPoint};

/// EMA (Exponential Moving Average).
///
/// Multiplier `2 / (period + 1)`, seeded with the SMA of the first `period`
/// closes.
pub struct Ema {
    period: usize,
}

impl Default for Ema {
    fn default() -> Self {
        Self { period: 20 }
    }
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl Indicator for Ema {
    fn id(&self) -> &str {
        "ema"
    }

    fn name(&self) -> String {
        format!("EMA ({})", self.period)
    }

    fn category(&self) -> IndicatorCategory {
        IndicatorCategory::Trend
    }

    fn min_periods(&self) -> usize {
        self.period
    }

    fn columns(&self) -> &'static [Column] {
        &[Column::Ema]
    }

    fn series(&self, candles: &[OhlcPoint]) -> Vec<(Column, Series)> {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        vec![(Column::Ema, ema_series(&closes, self.period))]
    }
}
