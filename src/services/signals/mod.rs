//! Technical indicator bank and signal scoring.
//!
//! The bank turns a candle history into an [`IndicatorFrame`]; the scorer
//! turns frame rows into discrete labels.

pub mod indicators;
pub mod scorer;

pub use scorer::{CrossoverRule, ScoringRule, SignalScorer, VoteScorer};

use std::collections::HashMap;

use serde::Serialize;

use crate::types::{IndicatorCategory, IndicatorInfo, OhlcPoint};

/// One value per candle, `None` during warm-up.
pub type Series = Vec<Option<f64>>;

/// Named output column of the indicator bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Sma,
    Ema,
    Rsi,
    Macd,
    MacdSignal,
    MacdHistogram,
    StochK,
    StochD,
    BbHigh,
    BbMid,
    BbLow,
    Obv,
    Cci,
}

impl Column {
    /// Column name as shown to users.
    pub fn name(&self) -> &'static str {
        match self {
            Column::Sma => "sma20",
            Column::Ema => "ema20",
            Column::Rsi => "rsi14",
            Column::Macd => "macd",
            Column::MacdSignal => "macd_signal",
            Column::MacdHistogram => "macd_histogram",
            Column::StochK => "stoch_k",
            Column::StochD => "stoch_d",
            Column::BbHigh => "bb_high",
            Column::BbMid => "bb_mid",
            Column::BbLow => "bb_low",
            Column::Obv => "obv",
            Column::Cci => "cci",
        }
    }
}

/// Trait for implementing technical indicators.
pub trait Indicator: Send + Sync {
    /// Unique identifier for this indicator.
    fn id(&self) -> &str;

    /// Human-readable name.
    fn name(&self) -> String;

    /// Category this indicator belongs to.
    fn category(&self) -> IndicatorCategory;

    /// Number of candles needed before every column has a defined last row.
    fn min_periods(&self) -> usize;

    /// Columns this indicator writes.
    fn columns(&self) -> &'static [Column];

    /// Compute full-length series for each column.
    fn series(&self, candles: &[OhlcPoint]) -> Vec<(Column, Series)>;
}

/// Lookback parameters for the bank.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorParams {
    pub sma_period: usize,
    pub ema_period: usize,
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub stoch_k: usize,
    pub stoch_d: usize,
    pub bb_period: usize,
    pub bb_std_dev: f64,
    pub cci_period: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            sma_period: 20,
            ema_period: 20,
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            stoch_k: 14,
            stoch_d: 3,
            bb_period: 20,
            bb_std_dev: 2.0,
            cci_period: 20,
        }
    }
}

/// Computes every indicator over a candle history.
pub struct IndicatorBank {
    indicators: Vec<Box<dyn Indicator>>,
}

impl Default for IndicatorBank {
    fn default() -> Self {
        Self::new(&IndicatorParams::default())
    }
}

impl IndicatorBank {
    pub fn new(params: &IndicatorParams) -> Self {
        Self {
            indicators: indicators::all_indicators(params),
        }
    }

    /// Metadata of every indicator, in bank order.
    pub fn describe(&self) -> Vec<IndicatorInfo> {
        self.indicators
            .iter()
            .map(|ind| IndicatorInfo {
                id: ind.id().to_string(),
                name: ind.name(),
                category: ind.category(),
                min_periods: ind.min_periods(),
                columns: ind.columns().iter().map(|c| c.name().to_string()).collect(),
            })
            .collect()
    }

    /// Longest warm-up among the indicators that write any of `columns`.
    pub fn required_samples(&self, columns: &[Column]) -> usize {
        self.indicators
            .iter()
            .filter(|ind| ind.columns().iter().any(|c| columns.contains(c)))
            .map(|ind| ind.min_periods())
            .max()
            .unwrap_or(1)
    }

    pub fn compute(&self, candles: &[OhlcPoint]) -> IndicatorFrame {
        let mut columns = HashMap::new();
        for indicator in &self.indicators {
            for (column, series) in indicator.series(candles) {
                columns.insert(column, series);
            }
        }

        IndicatorFrame {
            closes: candles.iter().map(|c| c.close).collect(),
            columns,
        }
    }
}

/// Indicator values for every candle, in candle order.
#[derive(Debug, Clone)]
pub struct IndicatorFrame {
    closes: Vec<f64>,
    columns: HashMap<Column, Series>,
}

impl IndicatorFrame {
    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    pub fn column(&self, column: Column) -> Option<&Series> {
        self.columns.get(&column)
    }

    pub fn row(&self, index: usize) -> Option<FrameRow<'_>> {
        (index < self.len()).then_some(FrameRow { frame: self, index })
    }

    pub fn last_row(&self) -> Option<FrameRow<'_>> {
        self.len().checked_sub(1).and_then(|i| self.row(i))
    }

    pub fn rows(&self) -> impl Iterator<Item = FrameRow<'_>> {
        (0..self.len()).map(move |index| FrameRow { frame: self, index })
    }
}

/// A single row of an [`IndicatorFrame`].
#[derive(Debug, Clone, Copy)]
pub struct FrameRow<'a> {
    frame: &'a IndicatorFrame,
    index: usize,
}

impl FrameRow<'_> {
    pub fn close(&self) -> f64 {
        self.frame.closes[self.index]
    }

    pub fn get(&self, column: Column) -> Option<f64> {
        self.frame
            .columns
            .get(&column)
            .and_then(|series| series.get(self.index).copied().flatten())
    }
}
