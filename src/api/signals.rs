//! Refresh endpoints: crossover signal, indicator vote and threshold search.

use std::fmt::Display;
use std::ops::RangeInclusive;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::config::RequestDefaults;
use crate::error::{AppError, Result};
use crate::services::ParameterGrid;
use crate::types::{
    BacktestConfig, CrossoverReport, Granularity, OptimizationReport, PriceRequest, VoteConfig,
    VoteReport,
};
use crate::AppState;

pub const MIN_VOTES_RANGE: RangeInclusive<u32> = 2..=7;
pub const RSI_BUY_RANGE: RangeInclusive<f64> = 20.0..=50.0;
pub const CCI_BUY_RANGE: RangeInclusive<f64> = -200.0..=0.0;
pub const PROFIT_THRESHOLD_RANGE: RangeInclusive<f64> = 1.0..=30.0;
pub const HOLDING_DAYS_RANGE: RangeInclusive<usize> = 5..=90;
pub const LOOKBACK_RANGE: RangeInclusive<usize> = 1..=2000;

/// Result of a refresh. Too little history is a normal outcome, not an error.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RefreshResponse<T> {
    Ok {
        data: T,
    },
    InsufficientData {
        message: String,
        available: usize,
        required: usize,
    },
}

impl<T> RefreshResponse<T> {
    fn from_result(result: Result<T>) -> Result<Self> {
        match result {
            Ok(data) => Ok(Self::Ok { data }),
            Err(AppError::InsufficientData {
                available,
                required,
            }) => Ok(Self::InsufficientData {
                message: AppError::InsufficientData {
                    available,
                    required,
                }
                .to_string(),
                available,
                required,
            }),
            Err(err) => Err(err),
        }
    }
}

/// Query parameters shared by the refresh endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct RefreshQuery {
    pub symbol: Option<String>,
    pub quote: Option<String>,
    /// `1h` or `1d`
    pub granularity: Option<String>,
    pub lookback: Option<usize>,
    pub min_votes: Option<u32>,
    pub rsi_buy: Option<f64>,
    pub cci_buy: Option<f64>,
    /// Percent.
    pub profit_threshold: Option<f64>,
    pub holding_days: Option<usize>,
}

fn check_range<T>(name: &str, value: T, range: &RangeInclusive<T>) -> Result<T>
where
    T: PartialOrd + Display + Copy,
{
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(AppError::BadRequest(format!(
            "{} must be between {} and {}, got {}",
            name,
            range.start(),
            range.end(),
            value
        )))
    }
}

fn check_ticker(name: &str, value: &str) -> Result<()> {
    let valid = !value.is_empty()
        && value.len() <= 15
        && value.chars().all(|c| c.is_ascii_alphanumeric());
    if valid {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("invalid {}: '{}'", name, value)))
    }
}

impl RefreshQuery {
    pub fn price_request(&self, defaults: &RequestDefaults) -> Result<PriceRequest> {
        let symbol = self.symbol.as_deref().unwrap_or(&defaults.symbol).trim();
        let quote = self.quote.as_deref().unwrap_or(&defaults.quote).trim();
        check_ticker("symbol", symbol)?;
        check_ticker("quote", quote)?;

        let granularity = match self.granularity.as_deref() {
            Some(value) => Granularity::from_str(value).ok_or_else(|| {
                AppError::BadRequest(format!("unknown granularity '{}', use 1h or 1d", value))
            })?,
            None => defaults.granularity,
        };

        let lookback = check_range(
            "lookback",
            self.lookback.unwrap_or(defaults.lookback),
            &LOOKBACK_RANGE,
        )?;

        Ok(PriceRequest::new(symbol, quote, granularity, lookback))
    }

    pub fn vote_config(&self) -> Result<VoteConfig> {
        let defaults = VoteConfig::default();
        Ok(VoteConfig::new(
            check_range(
                "min_votes",
                self.min_votes.unwrap_or(defaults.min_votes),
                &MIN_VOTES_RANGE,
            )?,
            check_range(
                "rsi_buy",
                self.rsi_buy.unwrap_or(defaults.rsi_buy_threshold),
                &RSI_BUY_RANGE,
            )?,
            check_range(
                "cci_buy",
                self.cci_buy.unwrap_or(defaults.cci_buy_threshold),
                &CCI_BUY_RANGE,
            )?,
        ))
    }

    pub fn backtest_config(&self) -> Result<BacktestConfig> {
        let defaults = BacktestConfig::default();
        Ok(BacktestConfig {
            profit_threshold: check_range(
                "profit_threshold",
                self.profit_threshold.unwrap_or(defaults.profit_threshold),
                &PROFIT_THRESHOLD_RANGE,
            )?,
            holding_days: check_range(
                "holding_days",
                self.holding_days.unwrap_or(defaults.holding_days),
                &HOLDING_DAYS_RANGE,
            )?,
        })
    }
}

/// Create the refresh router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signal", get(get_signal))
        .route("/vote", get(get_vote))
        .route("/optimize", get(get_optimize))
}

/// Price/SMA crossover signal with the close series for charting.
async fn get_signal(
    State(state): State<AppState>,
    Query(query): Query<RefreshQuery>,
) -> Result<Json<RefreshResponse<CrossoverReport>>> {
    let request = query.price_request(&state.config.defaults)?;
    let result = state.signals.crossover(&request).await;
    Ok(Json(RefreshResponse::from_result(result)?))
}

/// Seven-indicator vote and its historical hit rate.
async fn get_vote(
    State(state): State<AppState>,
    Query(query): Query<RefreshQuery>,
) -> Result<Json<RefreshResponse<VoteReport>>> {
    let request = query.price_request(&state.config.defaults)?;
    let config = query.vote_config()?;
    let backtest = query.backtest_config()?;

    let result = state.signals.vote(&request, config, backtest).await;
    Ok(Json(RefreshResponse::from_result(result)?))
}

/// Best vote thresholds over the default grid.
async fn get_optimize(
    State(state): State<AppState>,
    Query(query): Query<RefreshQuery>,
) -> Result<Json<RefreshResponse<OptimizationReport>>> {
    let request = query.price_request(&state.config.defaults)?;
    let backtest = query.backtest_config()?;

    let result = state
        .signals
        .optimize(&request, backtest, ParameterGrid::default())
        .await;
    Ok(Json(RefreshResponse::from_result(result)?))
}
