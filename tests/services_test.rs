//! SignalService against an in-process provider.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use wraith::error::{AppError, Result};
use wraith::services::{Cache, FetchCache, ParameterGrid, SignalService};
use wraith::sources::PriceProvider;
use wraith::types::{
    BacktestConfig, Granularity, OhlcPoint, PriceRequest, PriceSeries, ProviderKind, SignalLabel,
    VoteConfig,
};

struct StubProvider {
    closes: Vec<f64>,
    calls: AtomicUsize,
    fail: bool,
}

impl StubProvider {
    fn new(closes: Vec<f64>) -> Arc<Self> {
        Arc::new(Self {
            closes,
            calls: AtomicUsize::new(0),
            fail: false,
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            closes: vec![],
            calls: AtomicUsize::new(0),
            fail: true,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[axum::async_trait]
impl PriceProvider for StubProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::CryptoCompare
    }

    async fn fetch_candles(&self, _request: &PriceRequest) -> Result<Vec<OhlcPoint>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AppError::Provider("missing Data".to_string()));
        }

        // newest first, like some feeds
        Ok(self
            .closes
            .iter()
            .enumerate()
            .rev()
            .map(|(i, c)| OhlcPoint::from_close(1_700_000_000_000 + i as i64 * 3_600_000, *c, None))
            .collect())
    }
}

fn wave_closes(count: usize) -> Vec<f64> {
    (0..count)
        .map(|i| 100.0 + (i as f64 * 0.25).sin() * 10.0 + i as f64 * 0.02)
        .collect()
}

fn service(provider: Arc<StubProvider>, ttl: Duration) -> SignalService {
    let cache: Arc<dyn FetchCache<Arc<PriceSeries>>> = Arc::new(Cache::<Arc<PriceSeries>>::new(ttl));
    SignalService::new(provider, cache)
}

fn request(lookback: usize) -> PriceRequest {
    PriceRequest::new("ETH", "USDT", Granularity::OneHour, lookback)
}

#[test]
fn test_series_is_normalized_and_cached() {
    let provider = StubProvider::new(wave_closes(120));
    let service = service(provider.clone(), Duration::from_secs(60));

    tokio_test::block_on(async {
        let first = service.price_series(&request(100)).await.unwrap();
        let second = service.price_series(&request(100)).await.unwrap();

        assert_eq!(first.len(), 100);
        assert!(first.candles.windows(2).all(|w| w[0].time < w[1].time));
        assert!(Arc::ptr_eq(&first, &second));
    });

    assert_eq!(provider.calls(), 1);
}

#[test]
fn test_different_requests_fetch_separately() {
    let provider = StubProvider::new(wave_closes(120));
    let service = service(provider.clone(), Duration::from_secs(60));

    tokio_test::block_on(async {
        service.price_series(&request(100)).await.unwrap();
        service.price_series(&request(50)).await.unwrap();
    });

    assert_eq!(provider.calls(), 2);
}

#[test]
fn test_expired_entries_refetch() {
    let provider = StubProvider::new(wave_closes(60));
    let service = service(provider.clone(), Duration::from_millis(10));

    tokio_test::block_on(async {
        service.price_series(&request(60)).await.unwrap();
        std::thread::sleep(Duration::from_millis(20));
        service.cache().evict_expired();
        service.price_series(&request(60)).await.unwrap();
    });

    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn test_crossover_report() {
    let service = service(StubProvider::new(wave_closes(100)), Duration::from_secs(60));
    let report = service.crossover(&request(100)).await.unwrap();

    assert_eq!(report.symbol, "ETH");
    assert_eq!(report.provider, ProviderKind::CryptoCompare);
    assert_eq!(report.sample_count, 100);
    assert_eq!(report.prices.len(), 100);
    assert!(report.signal.confidence <= 100);
    if report.signal.label == SignalLabel::Hold {
        assert_eq!(report.signal.confidence, 0);
    }
}

#[tokio::test]
async fn test_crossover_insufficient_data() {
    let service = service(StubProvider::new(wave_closes(19)), Duration::from_secs(60));
    let err = service.crossover(&request(100)).await.unwrap_err();

    assert!(matches!(
        err,
        AppError::InsufficientData {
            available: 19,
            required: 20
        }
    ));
}

#[tokio::test]
async fn test_vote_insufficient_data_needs_macd_signal() {
    let service = service(StubProvider::new(wave_closes(33)), Duration::from_secs(60));
    let err = service
        .vote(&request(100), VoteConfig::default(), BacktestConfig::default())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AppError::InsufficientData {
            available: 33,
            required: 34
        }
    ));
}

#[tokio::test]
async fn test_vote_report() {
    let service = service(StubProvider::new(wave_closes(200)), Duration::from_secs(60));
    let config = VoteConfig::new(3, 45.0, -50.0);
    let report = service
        .vote(&request(200), config, BacktestConfig::default())
        .await
        .unwrap();

    assert_eq!(report.config, config);
    assert_eq!(report.breakdown.rules.len(), 7);
    assert_eq!(report.signal, report.breakdown.label);
    assert_eq!(
        report.breakdown.votes as usize,
        report.breakdown.rules.iter().filter(|r| r.passed).count()
    );
    assert!((0.0..=100.0).contains(&report.backtest.hit_rate));
    assert_eq!(report.backtest.records.len(), report.backtest.signals);

    assert_eq!(report.indicators.len(), 8);
    let warmup = report.indicators.iter().map(|i| i.min_periods).max();
    assert_eq!(warmup, Some(34));
}

#[tokio::test]
async fn test_vote_rejects_invalid_config_before_fetching() {
    let provider = StubProvider::new(wave_closes(200));
    let service = service(provider.clone(), Duration::from_secs(60));

    let err = service
        .vote(
            &request(200),
            VoteConfig::default(),
            BacktestConfig {
                profit_threshold: 5.0,
                holding_days: 0,
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InvalidConfig(_)));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_optimize_report() {
    let service = service(StubProvider::new(wave_closes(200)), Duration::from_secs(60));
    let report = service
        .optimize(&request(200), BacktestConfig::default(), ParameterGrid::default())
        .await
        .unwrap();

    assert_eq!(report.result.combinations_evaluated, 484);
    assert_eq!(report.backtest.hit_rate, report.result.best_hit_rate);
    assert_eq!(report.backtest.signals, report.result.best_signal_count);
}

#[tokio::test(flavor = "current_thread")]
async fn test_optimize_leaves_runtime_free() {
    let service = service(StubProvider::new(wave_closes(500)), Duration::from_secs(60));
    let order = AtomicUsize::new(0);

    let (optimize_done, other_done) = tokio::join!(
        async {
            let report = service
                .optimize(&request(500), BacktestConfig::default(), ParameterGrid::default())
                .await
                .unwrap();
            assert_eq!(report.result.combinations_evaluated, 484);
            order.fetch_add(1, Ordering::SeqCst)
        },
        async { order.fetch_add(1, Ordering::SeqCst) }
    );

    // the single runtime thread served the second future while the search ran
    assert_eq!(other_done, 0);
    assert_eq!(optimize_done, 1);
}

#[tokio::test]
async fn test_provider_errors_propagate_and_are_not_cached() {
    let provider = StubProvider::failing();
    let service = service(provider.clone(), Duration::from_secs(60));

    for _ in 0..2 {
        let err = service.crossover(&request(100)).await.unwrap_err();
        assert!(matches!(err, AppError::Provider(_)));
    }
    assert_eq!(provider.calls(), 2);
}
