//! Commodity Channel Index (CCI) indicator.

use crate::services::signals::{Column, Indicator, Series};
use crate::types::{IndicatorCategory, OhlcPoint};

/// CCI (Commodity Channel Index).
///
/// CCI = (Typical Price - SMA(TP)) / (0.015 * Mean Deviation)
/// where Typical Price = (High + Low + Close) / 3.
///
/// Values below -100 are oversold. A window with zero mean deviation reads 0.
pub struct Cci {
    period: usize,
}

impl Default for Cci {
    fn default() -> Self {
        Self { period: 20 }
    }
}

impl Cci {
    const CONSTANT: f64 = 0.015;

    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl Indicator for Cci {
    fn id(&self) -> &str {
        "cci"
    }

    fn name(&self) -> String {
        format!("CCI ({})", self.period)
    }

    fn category(&self) -> IndicatorCategory {
        IndicatorCategory::Momentum
    }

    fn min_periods(&self) -> usize {
        self.period
    }

    fn columns(&self) -> &'static [Column] {
        &[Column::Cci]
    }

    fn series(&self, candles: &[OhlcPoint]) -> Vec<(Column, Series)> {
        let mut out = vec![None; candles.len()];
        if self.period == 0 || candles.len() < self.period {
            return vec![(Column::Cci, out)];
        }

        let typical: Vec<f64> = candles
            .iter()
            .map(|c| (c.high + c.low + c.close) / 3.0)
            .collect();
        let n = self.period as f64;

        for i in (self.period - 1)..typical.len() {
            let window = &typical[i + 1 - self.period..=i];
            let mean = window.iter().sum::<f64>() / n;
            let mean_deviation = window.iter().map(|tp| (tp - mean).abs()).sum::<f64>() / n;

            out[i] = Some(if mean_deviation == 0.0 {
                0.0
            } else {
                (typical[i] - mean) / (Self::CONSTANT * mean_deviation)
            });
        }

        vec![(Column::Cci, out)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_trend_candles(count: usize, step: f64) -> Vec<OhlcPoint> {
        (0..count)
            .map(|i| {
                let base = 100.0 + i as f64 * step;
                OhlcPoint {
                    time: 1000000 + i as i64 * 60000,
                    open: base,
                    high: base + 1.0,
                    low: base - 1.0,
                    close: base,
                    volume: Some(1000.0),
                }
            })
            .collect()
    }

    #[test]
    fn test_cci_id_and_name() {
        let cci = Cci::default();
        assert_eq!(cci.id(), "cci");
        assert_eq!(cci.name(), "CCI (20)");
        assert_eq!(cci.min_periods(), 20);
    }

    #[test]
    fn test_cci_uptrend_positive() {
        let series = &Cci::default().series(&create_trend_candles(30, 1.0))[0].1;
        assert!(series[18].is_none());
        assert!(series[29].unwrap() > 100.0);
    }

    #[test]
    fn test_cci_downtrend_negative() {
        let series = &Cci::default().series(&create_trend_candles(30, -1.0))[0].1;
        assert!(series[29].unwrap() < -100.0);
    }

    #[test]
    fn test_cci_flat_is_zero() {
        let series = &Cci::default().series(&create_trend_candles(25, 0.0))[0].1;
        assert_eq!(series[24], Some(0.0));
    }
}
