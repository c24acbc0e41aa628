//! Bollinger Bands indicator.

use crate::services::signals::{Column, Indicator, Series};
use crate::types::{IndicatorCategory, OhlcPoint};

/// Bollinger Bands indicator.
///
/// Consists of:
/// - Middle band: SMA(20)
/// - Upper band: SMA + 2 * StdDev
/// - Lower band: SMA - 2 * StdDev
///
/// StdDev is the population standard deviation of the window. A close below
/// the lower band counts as an oversold vote.
pub struct BollingerBands {
    period: usize,
    std_dev_multiplier: f64,
}

impl Default for BollingerBands {
    fn default() -> Self {
        Self {
            period: 20,
            std_dev_multiplier: 2.0,
        }
    }
}

impl BollingerBands {
    pub fn new(period: usize, std_dev_multiplier: f64) -> Self {
        Self {
            period,
            std_dev_multiplier,
        }
    }
}

impl Indicator for BollingerBands {
    fn id(&self) -> &str {
        "bollinger"
    }

    fn name(&self) -> String {
        format!("Bollinger Bands ({}, {})", self.period, self.std_dev_multiplier)
    }

    fn category(&self) -> IndicatorCategory {
        IndicatorCategory::Volatility
    }

    fn min_periods(&self) -> usize {
        self.period
    }

    fn columns(&self) -> &'static [Column] {
        &[Column::BbHigh, Column::BbMid, Column::BbLow]
    }

    fn series(&self, candles: &[OhlcPoint]) -> Vec<(Column, Series)> {
        let len = candles.len();
        let mut high = vec![None; len];
        let mut mid = vec![None; len];
        let mut low = vec![None; len];

        if self.period > 0 && len >= self.period {
            let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
            let n = self.period as f64;

            for i in (self.period - 1)..len {
                let window = &closes[i + 1 - self.period..=i];
                let mean = window.iter().sum::<f64>() / n;
                let variance = window.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / n;
                let band = variance.sqrt() * self.std_dev_multiplier;

                high[i] = Some(mean + band);
                mid[i] = Some(mean);
                low[i] = Some(mean - band);
            }
        }

        vec![
            (Column::BbHigh, high),
            (Column::BbMid, mid),
            (Column::BbLow, low),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_candles(closes: &[f64]) -> Vec<OhlcPoint> {
        closes
            .iter()
            .enumerate()
            .map(|(i, c)| OhlcPoint::from_close(1000000 + i as i64 * 60000, *c, Some(1000.0)))
            .collect()
    }

    #[test]
    fn test_bollinger_id_and_category() {
        let bb = BollingerBands::default();
        assert_eq!(bb.id(), "bollinger");
        assert_eq!(bb.category(), IndicatorCategory::Volatility);
        assert_eq!(bb.min_periods(), 20);
    }

    #[test]
    fn test_bollinger_constant_series_collapses() {
        let output = BollingerBands::default().series(&create_candles(&[50.0; 20]));
        assert_eq!(output[0].1[19], Some(50.0));
        assert_eq!(output[1].1[19], Some(50.0));
        assert_eq!(output[2].1[19], Some(50.0));
        assert!(output[1].1[18].is_none());
    }

    #[test]
    fn test_bollinger_population_std_dev() {
        // mean 5, population std 2
        let closes = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let output = BollingerBands::new(8, 2.0).series(&create_candles(&closes));
        assert_eq!(output[0].1[7], Some(9.0));
        assert_eq!(output[1].1[7], Some(5.0));
        assert_eq!(output[2].1[7], Some(1.0));
    }

    #[test]
    fn test_bollinger_bands_ordered() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0).collect();
        let output = BollingerBands::default().series(&create_candles(&closes));
        for i in 19..30 {
            let (h, m, l) = (
                output[0].1[i].unwrap(),
                output[1].1[i].unwrap(),
                output[2].1[i].unwrap(),
            );
            assert!(h >= m && m >= l);
        }
    }
}
