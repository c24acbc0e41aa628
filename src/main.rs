use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wraith::config::Config;
use wraith::services::{Cache, FetchCache, SignalService};
use wraith::sources::build_provider;
use wraith::types::PriceSeries;
use wraith::AppState;

/// How often expired fetch cache entries are dropped.
const CACHE_EVICTION_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wraith=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(Config::from_env());
    info!("Starting Wraith server on {}:{}", config.host, config.port);
    info!(
        "Defaults: {}/{} {} x{}, fetch cache TTL {}s",
        config.defaults.symbol,
        config.defaults.quote,
        config.defaults.granularity.as_str(),
        config.defaults.lookback,
        config.fetch_cache_ttl.as_secs()
    );

    let provider = build_provider(&config);
    let cache: Arc<dyn FetchCache<Arc<PriceSeries>>> =
        Arc::new(Cache::<Arc<PriceSeries>>::new(config.fetch_cache_ttl));

    // Evict expired series periodically
    {
        let cache = cache.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(CACHE_EVICTION_INTERVAL);
            loop {
                interval.tick().await;
                cache.evict_expired();
            }
        });
    }

    let state = AppState {
        config: config.clone(),
        signals: Arc::new(SignalService::new(provider, cache)),
    };

    let app = wraith::app(state);

    // Start the server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Wraith server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
