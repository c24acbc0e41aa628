//! Relative Strength Index (RSI) indicator.

use crate::services::signals::{Column, Indicator, Series};
use crate::types::{IndicatorCategory, OhlcPoint};

/// RSI (Relative Strength Index) indicator.
///
/// Measures momentum by comparing the magnitude of recent gains to recent losses.
/// Values range from 0-100:
/// - Below 30: Oversold (potential buy signal)
/// - Above 70: Overbought (potential sell signal)
///
/// Uses Wilder smoothing seeded with the mean of the first `period` changes,
/// so the first value lands on index `period`. A window without any price
/// movement reads 50.
pub struct Rsi {
    period: usize,
}

impl Default for Rsi {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    fn from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
        if avg_loss == 0.0 {
            return if avg_gain == 0.0 { 50.0 } else { 100.0 };
        }

        let rs = avg_gain / avg_loss;
        100.0 - (100.0 / (1.0 + rs))
    }

    /// RSI for a close-price sequence.
    pub fn calculate(closes: &[f64], period: usize) -> Series {
        let mut out = vec![None; closes.len()];
        if period == 0 || closes.len() < period + 1 {
            return out;
        }

        let mut gains = Vec::with_capacity(closes.len() - 1);
        let mut losses = Vec::with_capacity(closes.len() - 1);
        for pair in closes.windows(2) {
            let change = pair[1] - pair[0];
            gains.push(change.max(0.0));
            losses.push((-change).max(0.0));
        }

        let mut avg_gain = gains[..period].iter().sum::<f64>() / period as f64;
        let mut avg_loss = losses[..period].iter().sum::<f64>() / period as f64;
        out[period] = Some(Self::from_averages(avg_gain, avg_loss));

        // change i is the move into close i + 1
        for i in period..gains.len() {
            avg_gain = (avg_gain * (period - 1) as f64 + gains[i]) / period as f64;
            avg_loss = (avg_loss * (period - 1) as f64 + losses[i]) / period as f64;
            out[i + 1] = Some(Self::from_averages(avg_gain, avg_loss));
        }

        out
    }
}

impl Indicator for Rsi {
    fn id(&self) -> &str {
        "rsi"
    }

    fn name(&self) -> String {
        format!("RSI ({})", self.period)
    }

    fn category(&self) -> IndicatorCategory {
        IndicatorCategory::Momentum
    }

    fn min_periods(&self) -> usize {
        self.period + 1
    }

    fn columns(&self) -> &'static [Column] {
        &[Column::Rsi]
    }

    fn series(&self, candles: &[OhlcPoint]) -> Vec<(Column, Series)> {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        vec![(Column::Rsi, Self::calculate(&closes, self.period))]
    }
}
