use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Granularity, PriceSample, ProviderKind};
use crate::error::{AppError, Result};

/// Category of a technical indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorCategory {
    Trend,
    Momentum,
    Volatility,
    Volume,
}

/// One indicator of the bank as listed in reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorInfo {
    pub id: String,
    pub name: String,
    pub category: IndicatorCategory,
    /// Samples before the indicator's last row is defined.
    pub min_periods: usize,
    /// Frame columns it writes, e.g. `macd_signal`.
    pub columns: Vec<String>,
}

/// Discrete signal attached to a row.
///
/// The crossover rule emits `Buy`/`Sell`/`Hold`, the vote rule `Buy`/`NoBuy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalLabel {
    Buy,
    Sell,
    Hold,
    NoBuy,
}

impl SignalLabel {
    pub fn is_buy(&self) -> bool {
        matches!(self, SignalLabel::Buy)
    }

    /// Display text.
    pub fn label(&self) -> &'static str {
        match self {
            SignalLabel::Buy => "BUY",
            SignalLabel::Sell => "SELL",
            SignalLabel::Hold => "HOLD",
            SignalLabel::NoBuy => "NO BUY",
        }
    }
}

/// Output of the two-indicator crossover rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossoverSignal {
    pub label: SignalLabel,
    /// 0-100, zero for HOLD.
    pub confidence: u8,
    pub close: f64,
    pub sma: f64,
    pub rsi: f64,
}

/// Thresholds for the seven-indicator vote.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteConfig {
    pub min_votes: u32,
    pub rsi_buy_threshold: f64,
    pub cci_buy_threshold: f64,
    pub stoch_oversold: f64,
}

impl Default for VoteConfig {
    fn default() -> Self {
        Self {
            min_votes: 4,
            rsi_buy_threshold: 35.0,
            cci_buy_threshold: -100.0,
            stoch_oversold: 20.0,
        }
    }
}

impl VoteConfig {
    pub fn new(min_votes: u32, rsi_buy_threshold: f64, cci_buy_threshold: f64) -> Self {
        Self {
            min_votes,
            rsi_buy_threshold,
            cci_buy_threshold,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_votes == 0 {
            return Err(AppError::InvalidConfig(
                "min_votes must be at least 1".to_string(),
            ));
        }
        if !self.rsi_buy_threshold.is_finite()
            || !self.cci_buy_threshold.is_finite()
            || !self.stoch_oversold.is_finite()
        {
            return Err(AppError::InvalidConfig(
                "vote thresholds must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

/// One of the seven vote rules, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteRule {
    CloseAboveSma,
    CloseAboveEma,
    MacdAboveSignal,
    RsiBelowThreshold,
    StochOversoldCross,
    CloseBelowLowerBand,
    CciBelowThreshold,
}

impl VoteRule {
    pub const ALL: [VoteRule; 7] = [
        VoteRule::CloseAboveSma,
        VoteRule::CloseAboveEma,
        VoteRule::MacdAboveSignal,
        VoteRule::RsiBelowThreshold,
        VoteRule::StochOversoldCross,
        VoteRule::CloseBelowLowerBand,
        VoteRule::CciBelowThreshold,
    ];

    pub fn description(&self) -> &'static str {
        match self {
            VoteRule::CloseAboveSma => "Close above SMA(20)",
            VoteRule::CloseAboveEma => "Close above EMA(20)",
            VoteRule::MacdAboveSignal => "MACD above signal line",
            VoteRule::RsiBelowThreshold => "RSI(14) below buy threshold",
            VoteRule::StochOversoldCross => "Stochastic %K oversold and above %D",
            VoteRule::CloseBelowLowerBand => "Close below lower Bollinger band",
            VoteRule::CciBelowThreshold => "CCI(20) below buy threshold",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleVote {
    pub rule: VoteRule,
    pub description: String,
    pub passed: bool,
}

/// Which rules fired on a single row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteBreakdown {
    pub rules: Vec<RuleVote>,
    pub votes: u32,
    pub min_votes: u32,
    pub label: SignalLabel,
}

/// Forward validation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestConfig {
    /// Required gain in percent.
    pub profit_threshold: f64,
    /// Number of subsequent samples to look at.
    pub holding_days: usize,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            profit_threshold: 5.0,
            holding_days: 30,
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<()> {
        if self.holding_days == 0 {
            return Err(AppError::InvalidConfig(
                "holding_days must be at least 1".to_string(),
            ));
        }
        if !self.profit_threshold.is_finite() || self.profit_threshold < 0.0 {
            return Err(AppError::InvalidConfig(format!(
                "profit_threshold must be a non-negative number, got {}",
                self.profit_threshold
            )));
        }
        Ok(())
    }
}

/// Outcome of one historical BUY.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestRecord {
    pub buy_timestamp: i64,
    pub buy_time: Option<DateTime<Utc>>,
    pub buy_price: f64,
    /// Absent when the BUY sits on the last sample.
    pub max_price_in_window: Option<f64>,
    pub target_reached: bool,
    pub realized_gain_pct: Option<f64>,
}

impl BacktestRecord {
    pub fn is_scored(&self) -> bool {
        self.max_price_in_window.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestSummary {
    pub records: Vec<BacktestRecord>,
    pub signals: usize,
    pub scored: usize,
    pub unscored: usize,
    pub hits: usize,
    /// Percent of scored signals that reached the target, 0 when none were scored.
    pub hit_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationResult {
    pub best_config: VoteConfig,
    pub best_hit_rate: f64,
    pub best_signal_count: usize,
    pub combinations_evaluated: usize,
    pub current_signal: SignalLabel,
}

/// Response of the crossover refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossoverReport {
    pub symbol: String,
    pub quote: String,
    pub provider: ProviderKind,
    pub granularity: Granularity,
    pub signal: CrossoverSignal,
    pub sample_count: usize,
    pub prices: Vec<PriceSample>,
    pub generated_at: DateTime<Utc>,
}

/// Response of the vote refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteReport {
    pub symbol: String,
    pub quote: String,
    pub provider: ProviderKind,
    pub granularity: Granularity,
    pub config: VoteConfig,
    pub backtest_config: BacktestConfig,
    pub signal: SignalLabel,
    pub breakdown: VoteBreakdown,
    pub backtest: BacktestSummary,
    /// Indicators the vote was computed from.
    pub indicators: Vec<IndicatorInfo>,
    pub generated_at: DateTime<Utc>,
}

/// Response of the grid search refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationReport {
    pub symbol: String,
    pub quote: String,
    pub provider: ProviderKind,
    pub granularity: Granularity,
    pub backtest_config: BacktestConfig,
    pub result: OptimizationResult,
    pub backtest: BacktestSummary,
    pub generated_at: DateTime<Utc>,
}
