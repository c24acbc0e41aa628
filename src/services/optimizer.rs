//! Grid search over vote thresholds.
//!
//! Every combination of the grid axes is scored against the same frame and
//! backtested; the best hit-rate wins. Ties keep the combination seen first,
//! in `min_votes`, then RSI, then CCI order.

use tracing::{debug, info};

use crate::error::{AppError, Result};
use crate::services::backtester::Backtester;
use crate::services::signals::{IndicatorFrame, SignalScorer};
use crate::types::{OptimizationResult, PriceSample, SignalLabel, VoteConfig};

/// Axes of the search.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterGrid {
    pub min_votes: Vec<u32>,
    pub rsi_buy_thresholds: Vec<f64>,
    pub cci_buy_thresholds: Vec<f64>,
}

impl Default for ParameterGrid {
    fn default() -> Self {
        Self {
            min_votes: vec![2, 3, 4, 5],
            rsi_buy_thresholds: (0..=10).map(|i| 30.0 + i as f64 * 2.0).collect(),
            cci_buy_thresholds: (0..=10).map(|i| -150.0 + i as f64 * 10.0).collect(),
        }
    }
}

impl ParameterGrid {
    pub fn len(&self) -> usize {
        self.min_votes.len() * self.rsi_buy_thresholds.len() * self.cci_buy_thresholds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cartesian product in evaluation order.
    pub fn combinations(&self) -> impl Iterator<Item = VoteConfig> + '_ {
        self.min_votes.iter().flat_map(move |&min_votes| {
            self.rsi_buy_thresholds.iter().flat_map(move |&rsi| {
                self.cci_buy_thresholds
                    .iter()
                    .map(move |&cci| VoteConfig::new(min_votes, rsi, cci))
            })
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(AppError::InvalidConfig(
                "parameter grid has no combinations".to_string(),
            ));
        }
        if self.min_votes.contains(&0) {
            return Err(AppError::InvalidConfig(
                "parameter grid contains min_votes = 0".to_string(),
            ));
        }
        Ok(())
    }
}

pub struct GridSearch {
    grid: ParameterGrid,
    backtester: Backtester,
}

impl GridSearch {
    pub fn new(grid: ParameterGrid, backtester: Backtester) -> Result<Self> {
        grid.validate()?;
        Ok(Self { grid, backtester })
    }

    pub fn backtester(&self) -> &Backtester {
        &self.backtester
    }

    pub fn run(&self, frame: &IndicatorFrame, samples: &[PriceSample]) -> Result<OptimizationResult> {
        let mut best: Option<(VoteConfig, f64, usize)> = None;
        let mut evaluated = 0;

        for config in self.grid.combinations() {
            let buys = SignalScorer::vote(config).buy_mask(frame);
            let summary = self.backtester.run(samples, &buys);
            evaluated += 1;

            let improves = best
                .as_ref()
                .map_or(true, |(_, hit_rate, _)| summary.hit_rate > *hit_rate);
            if improves {
                debug!(
                    "New best: min_votes={} rsi<{} cci<{} -> {:.2}% over {} signals",
                    config.min_votes,
                    config.rsi_buy_threshold,
                    config.cci_buy_threshold,
                    summary.hit_rate,
                    summary.signals
                );
                best = Some((config, summary.hit_rate, summary.signals));
            }
        }

        let (best_config, best_hit_rate, best_signal_count) = best.ok_or_else(|| {
            AppError::InvalidConfig("parameter grid has no combinations".to_string())
        })?;

        let current_signal = SignalScorer::vote(best_config)
            .latest(frame)
            .unwrap_or(SignalLabel::NoBuy);

        info!(
            "Grid search evaluated {} combinations, best hit rate {:.2}%",
            evaluated, best_hit_rate
        );

        Ok(OptimizationResult {
            best_config,
            best_hit_rate,
            best_signal_count,
            combinations_evaluated: evaluated,
            current_signal,
        })
    }
}
