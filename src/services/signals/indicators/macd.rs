//! MACD (Moving Average Convergence Divergence) indicator.

use super::{ema_series, smooth_defined, zip_defined};
use crate::services::signals::{Column, Indicator, Series};
use crate::types::{IndicatorCategory, OhlcPoint};

/// MACD indicator.
///
/// Shows the relationship between two EMAs:
/// - MACD Line = EMA(12) - EMA(26)
/// - Signal Line = EMA(9) of MACD Line
/// - Histogram = MACD Line - Signal Line
///
/// The vote counts the MACD line above its signal line as bullish.
pub struct Macd {
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
}

impl Default for Macd {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
        }
    }
}

impl Macd {
    pub fn new(fast_period: usize, slow_period: usize, signal_period: usize) -> Self {
        Self {
            fast_period,
            slow_period,
            signal_period,
        }
    }
}

impl Indicator for Macd {
    fn id(&self) -> &str {
        "macd"
    }

    fn name(&self) -> String {
        format!(
            "MACD ({}, {}, {})",
            self.fast_period, self.slow_period, self.signal_period
        )
    }

    fn category(&self) -> IndicatorCategory {
        IndicatorCategory::Trend
    }

    fn min_periods(&self) -> usize {
        self.fast_period.max(self.slow_period) + self.signal_period.max(1) - 1
    }

    fn columns(&self) -> &'static [Column] {
        &[Column::Macd, Column::MacdSignal, Column::MacdHistogram]
    }

    fn series(&self, candles: &[OhlcPoint]) -> Vec<(Column, Series)> {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();

        let fast = ema_series(&closes, self.fast_period);
        let slow = ema_series(&closes, self.slow_period);
        let macd = zip_defined(&fast, &slow, |f, s| f - s);
        let signal = smooth_defined(&macd, self.signal_period, ema_series);
        let histogram = zip_defined(&macd, &signal, |m, s| m - s);

        vec![
            (Column::Macd, macd),
            (Column::MacdSignal, signal),
            (Column::MacdHistogram, histogram),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_uptrend_candles(count: usize) -> Vec<OhlcPoint> {
        (0..count)
            .map(|i| {
                let base = 100.0 * (1.0 + i as f64 * 0.01);
                OhlcPoint {
                    time: 1000000 + i as i64 * 60000,
                    open: base,
                    high: base * 1.01,
                    low: base * 0.995,
                    close: base,
                    volume: Some(1000.0),
                }
            })
            .collect()
    }

    fn column(output: &[(Column, Series)], column: Column) -> Series {
        output
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, s)| s.clone())
            .unwrap()
    }

    #[test]
    fn test_macd_id_and_name() {
        let macd = Macd::default();
        assert_eq!(macd.id(), "macd");
        assert_eq!(macd.name(), "MACD (12, 26, 9)");
        assert_eq!(macd.category(), IndicatorCategory::Trend);
    }

    #[test]
    fn test_macd_min_periods() {
        assert_eq!(Macd::default().min_periods(), 34);
    }

    #[test]
    fn test_macd_warmup_boundaries() {
        let output = Macd::default().series(&create_uptrend_candles(40));
        let macd = column(&output, Column::Macd);
        let signal = column(&output, Column::MacdSignal);
        let histogram = column(&output, Column::MacdHistogram);

        assert!(macd[24].is_none());
        assert!(macd[25].is_some());
        assert!(signal[32].is_none());
        assert!(signal[33].is_some());
        assert!(histogram[32].is_none());
        assert!(histogram[33].is_some());
    }

    #[test]
    fn test_macd_positive_in_uptrend() {
        let output = Macd::default().series(&create_uptrend_candles(60));
        let macd = column(&output, Column::Macd);
        assert!(macd[59].unwrap() > 0.0);
    }

    #[test]
    fn test_macd_flat_series_is_zero() {
        let candles: Vec<OhlcPoint> = (0..40).map(|i| OhlcPoint::from_close(i, 10.0, None)).collect();
        let output = Macd::default().series(&candles);
        assert_eq!(column(&output, Column::Macd)[39], Some(0.0));
        assert_eq!(column(&output, Column::MacdHistogram)[39], Some(0.0));
    }

    #[test]
    fn test_macd_insufficient_data() {
        let output = Macd::default().series(&create_uptrend_candles(20));
        assert!(output.iter().all(|(_, s)| s.iter().all(Option::is_none)));
    }
}
