//! On-Balance Volume (OBV) indicator.

use crate::services::signals::{Column, Indicator, Series};
use crate::types::{IndicatorCategory, OhlcPoint};

/// OBV (On-Balance Volume) indicator.
///
/// Cumulative volume indicator:
/// - If close > previous close: OBV += volume
/// - If close < previous close: OBV -= volume
///
/// Candles without volume count as volume 1, so close-only feeds still get
/// a direction count.
pub struct Obv;

impl Indicator for Obv {
    fn id(&self) -> &str {
        "obv"
    }

    fn name(&self) -> String {
        "OBV".to_string()
    }

    fn category(&self) -> IndicatorCategory {
        IndicatorCategory::Volume
    }

    fn min_periods(&self) -> usize {
        1
    }

    fn columns(&self) -> &'static [Column] {
        &[Column::Obv]
    }

    fn series(&self, candles: &[OhlcPoint]) -> Vec<(Column, Series)> {
        let mut out = Vec::with_capacity(candles.len());
        let mut obv = 0.0;

        for (i, candle) in candles.iter().enumerate() {
            if i > 0 {
                let volume = candle.volume.unwrap_or(1.0);
                let prev = candles[i - 1].close;
                if candle.close > prev {
                    obv += volume;
                } else if candle.close < prev {
                    obv -= volume;
                }
            }
            out.push(Some(obv));
        }

        vec![(Column::Obv, out)]
    }
}
