//! One refresh: fetch (through the cache), compute indicators, score, validate.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::error::{AppError, Result};
use crate::services::backtester::Backtester;
use crate::services::cache::FetchCache;
use crate::services::optimizer::{GridSearch, ParameterGrid};
use crate::services::signals::{
    CrossoverRule, IndicatorBank, IndicatorFrame, ScoringRule, SignalScorer, VoteScorer,
};
use crate::sources::PriceProvider;
use crate::types::{
    BacktestConfig, CrossoverReport, OptimizationReport, PriceRequest, PriceSeries, ProviderKind,
    VoteConfig, VoteReport,
};

/// Runs the signal pipelines against a price provider.
pub struct SignalService {
    provider: Arc<dyn PriceProvider>,
    cache: Arc<dyn FetchCache<Arc<PriceSeries>>>,
    bank: IndicatorBank,
}

impl SignalService {
    pub fn new(
        provider: Arc<dyn PriceProvider>,
        cache: Arc<dyn FetchCache<Arc<PriceSeries>>>,
    ) -> Self {
        Self {
            provider,
            cache,
            bank: IndicatorBank::default(),
        }
    }

    pub fn provider_kind(&self) -> ProviderKind {
        self.provider.kind()
    }

    pub fn cache(&self) -> &Arc<dyn FetchCache<Arc<PriceSeries>>> {
        &self.cache
    }

    /// Normalized price history for a request, reused while cached.
    pub async fn price_series(&self, request: &PriceRequest) -> Result<Arc<PriceSeries>> {
        let key = request.cache_key(self.provider.kind());

        self.cache
            .get_or_fetch(
                &key,
                Box::pin(async move {
                    let raw = self.provider.fetch_candles(request).await?;
                    let series = PriceSeries::from_candles(
                        &request.symbol,
                        &request.quote,
                        request.granularity,
                        raw,
                        request.lookback,
                    );
                    info!(
                        "Fetched {} {} candles for {}/{} from {}",
                        series.len(),
                        request.granularity.as_str(),
                        request.symbol,
                        request.quote,
                        self.provider.kind()
                    );
                    Ok(Arc::new(series))
                }),
            )
            .await
    }

    /// Fetch and compute the frame, stopping early when the series is too short for `rule`.
    async fn frame_for(
        &self,
        request: &PriceRequest,
        rule: &ScoringRule,
    ) -> Result<(Arc<PriceSeries>, IndicatorFrame)> {
        let series = self.price_series(request).await?;
        let required = rule.required_samples(&self.bank);
        if series.len() < required {
            return Err(AppError::InsufficientData {
                available: series.len(),
                required,
            });
        }

        let frame = self.bank.compute(&series.candles);
        Ok((series, frame))
    }

    /// Latest price/SMA crossover signal.
    pub async fn crossover(&self, request: &PriceRequest) -> Result<CrossoverReport> {
        let rule = CrossoverRule::default();
        let (series, frame) = self.frame_for(request, &ScoringRule::Crossover(rule)).await?;

        let signal = frame
            .last_row()
            .and_then(|row| rule.evaluate_row(&row))
            .ok_or_else(|| AppError::InsufficientData {
                available: series.len(),
                required: ScoringRule::Crossover(rule).required_samples(&self.bank),
            })?;

        info!(
            "{}/{} crossover: {} ({}%)",
            series.symbol,
            series.quote,
            signal.label.label(),
            signal.confidence
        );

        Ok(CrossoverReport {
            symbol: series.symbol.clone(),
            quote: series.quote.clone(),
            provider: self.provider.kind(),
            granularity: series.granularity,
            signal,
            sample_count: series.len(),
            prices: series.samples(),
            generated_at: Utc::now(),
        })
    }

    /// Latest vote with its breakdown, plus a backtest of every historical BUY.
    pub async fn vote(
        &self,
        request: &PriceRequest,
        config: VoteConfig,
        backtest: BacktestConfig,
    ) -> Result<VoteReport> {
        config.validate()?;
        let backtester = Backtester::new(backtest)?;

        let rule = ScoringRule::Vote(config);
        let (series, frame) = self.frame_for(request, &rule).await?;

        let breakdown = frame
            .last_row()
            .and_then(|row| VoteScorer::new(config).breakdown(&row))
            .ok_or_else(|| AppError::InsufficientData {
                available: series.len(),
                required: rule.required_samples(&self.bank),
            })?;

        let buys = SignalScorer::new(rule).buy_mask(&frame);
        let summary = backtester.run(&series.samples(), &buys);

        info!(
            "{}/{} vote: {} ({}/{} votes), hit rate {:.2}% over {} signals",
            series.symbol,
            series.quote,
            breakdown.label.label(),
            breakdown.votes,
            config.min_votes,
            summary.hit_rate,
            summary.signals
        );

        Ok(VoteReport {
            symbol: series.symbol.clone(),
            quote: series.quote.clone(),
            provider: self.provider.kind(),
            granularity: series.granularity,
            config,
            backtest_config: backtest,
            signal: breakdown.label,
            breakdown,
            backtest: summary,
            indicators: self.bank.describe(),
            generated_at: Utc::now(),
        })
    }

    /// Grid search over vote thresholds, reporting the best one and its backtest.
    pub async fn optimize(
        &self,
        request: &PriceRequest,
        backtest: BacktestConfig,
        grid: ParameterGrid,
    ) -> Result<OptimizationReport> {
        let search = GridSearch::new(grid, Backtester::new(backtest)?)?;

        let (series, frame) = self
            .frame_for(request, &ScoringRule::Vote(VoteConfig::default()))
            .await?;
        let samples = series.samples();

        // CPU-bound; keep it off the async workers. The search itself stays sequential.
        let (result, summary) = tokio::task::spawn_blocking(move || -> Result<_> {
            let result = search.run(&frame, &samples)?;
            let buys = SignalScorer::vote(result.best_config).buy_mask(&frame);
            let summary = search.backtester().run(&samples, &buys);
            Ok((result, summary))
        })
        .await
        .map_err(|e| AppError::Internal(format!("grid search task failed: {}", e)))??;

        Ok(OptimizationReport {
            symbol: series.symbol.clone(),
            quote: series.quote.clone(),
            provider: self.provider.kind(),
            granularity: series.granularity,
            backtest_config: backtest,
            result,
            backtest: summary,
            generated_at: Utc::now(),
        })
    }
}
