//! Forward validation of historical BUY signals.
//!
//! For every BUY the backtester looks at the next `holding_days` closes and
//! checks whether the maximum reached the profit target. Windows near the end
//! of the series are truncated; a BUY on the last sample has no window and is
//! reported but not scored.

use tracing::debug;

use crate::error::Result;
use crate::types::{BacktestConfig, BacktestRecord, BacktestSummary, PriceSample};

pub struct Backtester {
    config: BacktestConfig,
}

impl Backtester {
    pub fn new(config: BacktestConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Validate every BUY in `buys` against `samples`.
    ///
    /// Only the common prefix of the two slices is considered.
    pub fn run(&self, samples: &[PriceSample], buys: &[bool]) -> BacktestSummary {
        let len = samples.len().min(buys.len());
        let samples = &samples[..len];

        let records: Vec<BacktestRecord> = buys[..len]
            .iter()
            .enumerate()
            .filter(|(_, is_buy)| **is_buy)
            .map(|(i, _)| self.evaluate(samples, i))
            .collect();

        let scored = records.iter().filter(|r| r.is_scored()).count();
        let hits = records.iter().filter(|r| r.target_reached).count();
        let hit_rate = if scored == 0 {
            0.0
        } else {
            hits as f64 / scored as f64 * 100.0
        };

        debug!(
            "Backtest: {} signals, {} scored, {} hits ({:.2}%)",
            records.len(),
            scored,
            hits,
            hit_rate
        );

        BacktestSummary {
            signals: records.len(),
            scored,
            unscored: records.len() - scored,
            hits,
            hit_rate,
            records,
        }
    }

    fn evaluate(&self, samples: &[PriceSample], index: usize) -> BacktestRecord {
        let buy = samples[index];
        let end = (index + self.config.holding_days).min(samples.len() - 1);

        let max_price = samples[index + 1..=end]
            .iter()
            .map(|s| s.close)
            .fold(None, |acc: Option<f64>, c| Some(acc.map_or(c, |m| m.max(c))));

        let target = buy.close * (1.0 + self.config.profit_threshold / 100.0);

        BacktestRecord {
            buy_timestamp: buy.timestamp,
            buy_time: buy.datetime(),
            buy_price: buy.close,
            max_price_in_window: max_price,
            target_reached: max_price.is_some_and(|m| m >= target),
            realized_gain_pct: max_price.map(|m| round2((m / buy.close - 1.0) * 100.0)),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
