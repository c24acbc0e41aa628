//! Price history providers.
//!
//! Each provider turns a [`PriceRequest`] into raw candles. Response parsing
//! lives in plain functions so it can be tested against captured payloads.

pub mod binance;
pub mod coingecko;
pub mod cryptocompare;

pub use binance::BinanceClient;
pub use coingecko::CoinGeckoClient;
pub use cryptocompare::CryptoCompareClient;

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::types::{OhlcPoint, PriceRequest, ProviderKind};

/// Source of historical candles.
#[axum::async_trait]
pub trait PriceProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Candles for the request, in any order. An empty but well-formed
    /// response is `Ok(vec![])`.
    async fn fetch_candles(&self, request: &PriceRequest) -> Result<Vec<OhlcPoint>>;
}

/// Shared HTTP client for all providers.
pub fn http_client(timeout: Duration) -> Client {
    Client::builder()
        .user_agent("Wraith/0.1 (Crypto Signal Backtester)")
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Provider selected by configuration.
pub fn build_provider(config: &Config) -> Arc<dyn PriceProvider> {
    let client = http_client(config.http_timeout);
    info!("Using {} as price provider", config.provider);

    match config.provider {
        ProviderKind::Binance => Arc::new(BinanceClient::new(client, &config.binance_api_url)),
        ProviderKind::CoinGecko => Arc::new(CoinGeckoClient::new(
            client,
            config.coingecko_base_url(),
            config.coingecko_api_key.clone(),
        )),
        ProviderKind::CryptoCompare => Arc::new(CryptoCompareClient::new(
            client,
            &config.cryptocompare_api_url,
            config.cryptocompare_api_key.clone(),
        )),
    }
}

/// Send a request and decode the JSON body.
///
/// Non-success statuses become [`AppError::Provider`], using `error_message`
/// to pull the provider's own explanation out of the body when possible.
pub(crate) async fn get_json(
    provider: ProviderKind,
    request: RequestBuilder,
    error_message: fn(&Value) -> Option<String>,
) -> Result<Value> {
    let response = request.header("Accept", "application/json").send().await?;
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        warn!(
            "{} API returned {}: {}",
            provider,
            status,
            text.chars().take(200).collect::<String>()
        );
        let detail = serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|body| error_message(&body))
            .unwrap_or_else(|| status.to_string());
        return Err(AppError::Provider(format!("{} API error: {}", provider, detail)));
    }

    serde_json::from_str(&text)
        .map_err(|e| AppError::Provider(format!("{} returned invalid JSON: {}", provider, e)))
}

/// Number from either a JSON number or a numeric string.
pub(crate) fn json_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_f64() {
        assert_eq!(json_f64(&json!(1.5)), Some(1.5));
        assert_eq!(json_f64(&json!("2500.10")), Some(2500.10));
        assert_eq!(json_f64(&json!("abc")), None);
        assert_eq!(json_f64(&json!(null)), None);
    }

    #[test]
    fn test_build_provider_follows_config() {
        let mut config = Config::default();
        assert_eq!(build_provider(&config).kind(), ProviderKind::Binance);

        config.provider = ProviderKind::CoinGecko;
        assert_eq!(build_provider(&config).kind(), ProviderKind::CoinGecko);

        config.provider = ProviderKind::CryptoCompare;
        assert_eq!(build_provider(&config).kind(), ProviderKind::CryptoCompare);
    }
}
