//! Turns indicator rows into discrete signals.

use super::{Column, FrameRow, IndicatorBank, IndicatorFrame};
use crate::types::{CrossoverSignal, RuleVote, SignalLabel, VoteBreakdown, VoteConfig, VoteRule};

/// Price/SMA crossover filtered by RSI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossoverRule {
    pub overbought: f64,
    pub oversold: f64,
    pub confidence_scale: f64,
}

impl Default for CrossoverRule {
    fn default() -> Self {
        Self {
            overbought: 70.0,
            oversold: 30.0,
            confidence_scale: 1.4,
        }
    }
}

impl CrossoverRule {
    pub const COLUMNS: &'static [Column] = &[Column::Sma, Column::Rsi];

    pub fn evaluate(&self, close: f64, sma: f64, rsi: f64) -> CrossoverSignal {
        let (label, distance) = if close > sma && rsi < self.overbought {
            (SignalLabel::Buy, self.overbought - rsi)
        } else if close < sma && rsi > self.oversold {
            (SignalLabel::Sell, rsi - self.oversold)
        } else {
            (SignalLabel::Hold, 0.0)
        };

        let confidence = (distance * self.confidence_scale).round().clamp(0.0, 100.0) as u8;

        CrossoverSignal {
            label,
            confidence,
            close,
            sma,
            rsi,
        }
    }

    /// `None` while SMA or RSI is still warming up.
    pub fn evaluate_row(&self, row: &FrameRow<'_>) -> Option<CrossoverSignal> {
        let sma = row.get(Column::Sma)?;
        let rsi = row.get(Column::Rsi)?;
        Some(self.evaluate(row.close(), sma, rsi))
    }
}

/// Seven-indicator majority vote.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoteScorer {
    config: VoteConfig,
}

impl VoteScorer {
    pub const COLUMNS: &'static [Column] = &[
        Column::Sma,
        Column::Ema,
        Column::Macd,
        Column::MacdSignal,
        Column::Rsi,
        Column::StochK,
        Column::StochD,
        Column::BbLow,
        Column::Cci,
    ];

    pub fn new(config: VoteConfig) -> Self {
        Self { config }
    }

    /// Rule outcomes in [`VoteRule::ALL`] order, `None` if any input is undefined.
    fn outcomes(&self, row: &FrameRow<'_>) -> Option<[bool; 7]> {
        let close = row.close();
        let sma = row.get(Column::Sma)?;
        let ema = row.get(Column::Ema)?;
        let macd = row.get(Column::Macd)?;
        let macd_signal = row.get(Column::MacdSignal)?;
        let rsi = row.get(Column::Rsi)?;
        let stoch_k = row.get(Column::StochK)?;
        let stoch_d = row.get(Column::StochD)?;
        let bb_low = row.get(Column::BbLow)?;
        let cci = row.get(Column::Cci)?;

        Some(VoteRule::ALL.map(|rule| match rule {
            VoteRule::CloseAboveSma => close > sma,
            VoteRule::CloseAboveEma => close > ema,
            VoteRule::MacdAboveSignal => macd > macd_signal,
            VoteRule::RsiBelowThreshold => rsi < self.config.rsi_buy_threshold,
            VoteRule::StochOversoldCross => {
                stoch_k < self.config.stoch_oversold && stoch_k > stoch_d
            }
            VoteRule::CloseBelowLowerBand => close < bb_low,
            VoteRule::CciBelowThreshold => cci < self.config.cci_buy_threshold,
        }))
    }

    fn label_for(&self, votes: u32) -> SignalLabel {
        if votes >= self.config.min_votes {
            SignalLabel::Buy
        } else {
            SignalLabel::NoBuy
        }
    }

    /// Number of rules that pass, `None` if any input is undefined.
    pub fn votes(&self, row: &FrameRow<'_>) -> Option<u32> {
        self.outcomes(row)
            .map(|outcomes| outcomes.iter().filter(|passed| **passed).count() as u32)
    }

    /// Per-rule outcome for a row, `None` if any input is undefined.
    pub fn breakdown(&self, row: &FrameRow<'_>) -> Option<VoteBreakdown> {
        let outcomes = self.outcomes(row)?;
        let rules: Vec<RuleVote> = VoteRule::ALL
            .iter()
            .zip(outcomes)
            .map(|(rule, passed)| RuleVote {
                rule: *rule,
                description: rule.description().to_string(),
                passed,
            })
            .collect();

        let votes = outcomes.iter().filter(|passed| **passed).count() as u32;

        Some(VoteBreakdown {
            rules,
            votes,
            min_votes: self.config.min_votes,
            label: self.label_for(votes),
        })
    }

    /// Label without building the breakdown; used for every row of a backtest.
    pub fn label(&self, row: &FrameRow<'_>) -> SignalLabel {
        self.votes(row)
            .map_or(SignalLabel::NoBuy, |votes| self.label_for(votes))
    }
}

/// Which rule a [`SignalScorer`] applies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoringRule {
    Crossover(CrossoverRule),
    Vote(VoteConfig),
}

impl ScoringRule {
    pub fn columns(&self) -> &'static [Column] {
        match self {
            ScoringRule::Crossover(_) => CrossoverRule::COLUMNS,
            ScoringRule::Vote(_) => VoteScorer::COLUMNS,
        }
    }

    /// Samples needed before the last row can carry a label.
    pub fn required_samples(&self, bank: &IndicatorBank) -> usize {
        bank.required_samples(self.columns())
    }
}

/// Labels every row of a frame under one rule.
#[derive(Debug, Clone, Copy)]
pub struct SignalScorer {
    rule: ScoringRule,
}

impl SignalScorer {
    pub fn new(rule: ScoringRule) -> Self {
        Self { rule }
    }

    pub fn crossover() -> Self {
        Self::new(ScoringRule::Crossover(CrossoverRule::default()))
    }

    pub fn vote(config: VoteConfig) -> Self {
        Self::new(ScoringRule::Vote(config))
    }

    /// Label for one row.
    ///
    /// Crossover rows without SMA/RSI have no label; vote rows with any
    /// undefined input are `NoBuy`.
    pub fn label_row(&self, row: &FrameRow<'_>) -> Option<SignalLabel> {
        match &self.rule {
            ScoringRule::Crossover(rule) => rule.evaluate_row(row).map(|s| s.label),
            ScoringRule::Vote(config) => Some(VoteScorer::new(*config).label(row)),
        }
    }

    pub fn score(&self, frame: &IndicatorFrame) -> Vec<Option<SignalLabel>> {
        frame.rows().map(|row| self.label_row(&row)).collect()
    }

    pub fn buy_mask(&self, frame: &IndicatorFrame) -> Vec<bool> {
        frame
            .rows()
            .map(|row| self.label_row(&row).is_some_and(|l| l.is_buy()))
            .collect()
    }

    pub fn latest(&self, frame: &IndicatorFrame) -> Option<SignalLabel> {
        frame.last_row().and_then(|row| self.label_row(&row))
    }
}
