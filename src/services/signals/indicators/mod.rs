//! Technical indicator implementations.
//!
//! Every indicator produces full-length series aligned with the input
//! candles; rows inside the warm-up window are `None`.

pub mod bollinger;
pub mod cci;
pub mod ema;
pub mod macd;
pub mod obv;
pub mod rsi;
pub mod sma;
pub mod stochastic;

pub use bollinger::BollingerBands;
pub use cci::Cci;
pub use ema::Ema;
pub use macd::Macd;
pub use obv::Obv;
pub use rsi::Rsi;
pub use sma::Sma;
pub use stochastic::Stochastic;

use super::{Indicator, IndicatorParams, Series};

/// Build the indicator set for the given parameters.
pub fn all_indicators(params: &IndicatorParams) -> Vec<Box<dyn Indicator>> {
    vec![
        // Trend indicators
        Box::new(Sma::new(params.sma_period)),
        Box::new(Ema::new(params.ema_period)),
        Box::new(Macd::new(params.macd_fast, params.macd_slow, params.macd_signal)),
        // Momentum indicators
        Box::new(Rsi::new(params.rsi_period)),
        Box::new(Stochastic::new(params.stoch_k, params.stoch_d)),
        Box::new(Cci::new(params.cci_period)),
        // Volatility indicators
        Box::new(BollingerBands::new(params.bb_period, params.bb_std_dev)),
        // Volume indicators
        Box::new(Obv),
    ]
}

/// Simple moving average over `period` values, defined from index `period - 1`.
pub fn sma_series(values: &[f64], period: usize) -> Series {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    for i in (period - 1)..values.len() {
        let window = &values[i + 1 - period..=i];
        out[i] = Some(window.iter().sum::<f64>() / period as f64);
    }
    out
}

/// Exponential moving average seeded with the SMA of the first `period` values.
pub fn ema_series(values: &[f64], period: usize) -> Series {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    let multiplier = 2.0 / (period as f64 + 1.0);
    let mut ema = values[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = Some(ema);

    for i in period..values.len() {
        ema = (values[i] - ema) * multiplier + ema;
        out[i] = Some(ema);
    }
    out
}

/// Run `smooth` over the defined tail of `series`, keeping the result aligned.
///
/// The defined part of `series` must be contiguous, which holds for every
/// series built in this module.
pub fn smooth_defined(series: &Series, period: usize, smooth: fn(&[f64], usize) -> Series) -> Series {
    let Some(start) = series.iter().position(Option::is_some) else {
        return vec![None; series.len()];
    };

    let tail: Vec<f64> = series[start..].iter().flatten().copied().collect();
    let mut out = vec![None; start];
    out.extend(smooth(&tail, period));
    out
}

/// Combine two aligned series element-wise where both are defined.
pub fn zip_defined(a: &Series, b: &Series, f: impl Fn(f64, f64) -> f64) -> Series {
    a.iter()
        .zip(b)
        .map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) => Some(f(*x, *y)),
            _ => None,
        })
        .collect()
}
