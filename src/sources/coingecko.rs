use std::collections::HashMap;

use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::{get_json, json_f64, PriceProvider};
use crate::error::{AppError, Result};
use crate::types::{Granularity, OhlcPoint, PriceRequest, ProviderKind};

/// Symbol to CoinGecko ID mapping.
pub const SYMBOL_TO_ID: &[(&str, &str)] = &[
    ("btc", "bitcoin"),
    ("eth", "ethereum"),
    ("bnb", "binancecoin"),
    ("sol", "solana"),
    ("xrp", "ripple"),
    ("doge", "dogecoin"),
    ("ada", "cardano"),
    ("avax", "avalanche-2"),
    ("dot", "polkadot"),
    ("link", "chainlink"),
    ("matic", "matic-network"),
    ("ltc", "litecoin"),
    ("trx", "tron"),
    ("atom", "cosmos"),
    ("uni", "uniswap"),
    ("xlm", "stellar"),
    ("bch", "bitcoin-cash"),
    ("near", "near"),
];

/// CoinGecko coin id for a ticker symbol, falling back to the lowercase symbol.
pub fn coin_id(symbol: &str) -> String {
    let lower = symbol.to_lowercase();
    SYMBOL_TO_ID
        .iter()
        .find(|(s, _)| *s == lower)
        .map(|(_, id)| id.to_string())
        .unwrap_or(lower)
}

/// CoinGecko quotes fiat; dollar stablecoins map to `usd`.
pub fn vs_currency(quote: &str) -> String {
    match quote.to_uppercase().as_str() {
        "USDT" | "USDC" | "BUSD" | "USD" => "usd".to_string(),
        other => other.to_lowercase(),
    }
}

/// Days of history covering `lookback` candles.
///
/// One day of history comes back in 5-minute resolution, so hourly requests
/// ask for at least two.
pub fn days_for(granularity: Granularity, lookback: usize) -> u64 {
    let seconds = granularity.seconds() as u64 * lookback.max(1) as u64;
    let days = seconds.div_ceil(86_400);
    match granularity {
        Granularity::OneHour => days.max(2),
        Granularity::OneDay => days.max(1),
    }
}

/// CoinGecko `market_chart` client.
#[derive(Clone)]
pub struct CoinGeckoClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl CoinGeckoClient {
    pub fn new(client: Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn market_chart_url(&self, request: &PriceRequest) -> String {
        let mut url = format!(
            "{}/coins/{}/market_chart?vs_currency={}&days={}",
            self.base_url,
            coin_id(&request.symbol),
            vs_currency(&request.quote),
            days_for(request.granularity, request.lookback)
        );

        if request.granularity == Granularity::OneDay {
            url.push_str("&interval=daily");
        }

        if let Some(ref key) = self.api_key {
            url.push_str(&format!("&x_cg_pro_api_key={}", key));
        }

        url
    }
}

#[axum::async_trait]
impl PriceProvider for CoinGeckoClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::CoinGecko
    }

    async fn fetch_candles(&self, request: &PriceRequest) -> Result<Vec<OhlcPoint>> {
        let url = self.market_chart_url(request);
        debug!(
            "Fetching CoinGecko market chart for {} ({} days)",
            coin_id(&request.symbol),
            days_for(request.granularity, request.lookback)
        );

        let body = get_json(ProviderKind::CoinGecko, self.client.get(&url), error_message).await?;
        parse_market_chart(&body)
    }
}

/// `{"error": "coin not found"}` or `{"status": {"error_message": "..."}}`
fn error_message(body: &Value) -> Option<String> {
    if let Some(err) = body.get("error").and_then(Value::as_str) {
        return Some(err.to_string());
    }
    body.get("status")
        .and_then(|s| s.get("error_message"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Parse a `market_chart` payload.
///
/// `prices` is required; `total_volumes` is joined on timestamp when present.
/// The endpoint has close prices only, so open/high/low equal the close.
pub fn parse_market_chart(body: &Value) -> Result<Vec<OhlcPoint>> {
    if let Some(message) = error_message(body) {
        return Err(AppError::Provider(format!("CoinGecko: {}", message)));
    }

    let prices = body
        .get("prices")
        .and_then(Value::as_array)
        .ok_or_else(|| AppError::Provider("CoinGecko: response has no prices".to_string()))?;

    let volumes: HashMap<i64, f64> = body
        .get("total_volumes")
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .filter_map(|row| {
                    let pair = row.as_array()?;
                    Some((pair.first()?.as_f64()? as i64, json_f64(pair.get(1)?)?))
                })
                .collect()
        })
        .unwrap_or_default();

    prices
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let pair = row.as_array().filter(|p| p.len() >= 2).ok_or_else(|| {
                AppError::Provider(format!("CoinGecko: malformed price at index {}", i))
            })?;
            let time = pair[0].as_f64().map(|t| t as i64);
            let close = json_f64(&pair[1]);

            match (time, close) {
                (Some(time), Some(close)) => Ok(OhlcPoint::from_close(
                    time,
                    close,
                    volumes.get(&time).copied(),
                )),
                _ => Err(AppError::Provider(format!(
                    "CoinGecko: invalid price at index {}",
                    i
                ))),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coin_id_lookup() {
        assert_eq!(coin_id("ETH"), "ethereum");
        assert_eq!(coin_id("avax"), "avalanche-2");
        assert_eq!(coin_id("PEPE"), "pepe");
    }

    #[test]
    fn test_vs_currency() {
        assert_eq!(vs_currency("USDT"), "usd");
        assert_eq!(vs_currency("usd"), "usd");
        assert_eq!(vs_currency("EUR"), "eur");
    }

    #[test]
    fn test_days_for() {
        assert_eq!(days_for(Granularity::OneHour, 100), 5);
        assert_eq!(days_for(Granularity::OneHour, 10), 2);
        assert_eq!(days_for(Granularity::OneDay, 100), 100);
        assert_eq!(days_for(Granularity::OneDay, 0), 1);
    }

    #[test]
    fn test_market_chart_url() {
        let client = CoinGeckoClient::new(Client::new(), "https://api.coingecko.com/api/v3", None);
        let request = PriceRequest::new("ETH", "USDT", Granularity::OneDay, 90);
        assert_eq!(
            client.market_chart_url(&request),
            "https://api.coingecko.com/api/v3/coins/ethereum/market_chart?vs_currency=usd&days=90&interval=daily"
        );

        let pro = CoinGeckoClient::new(Client::new(), "https://pro", Some("k".to_string()));
        let hourly = PriceRequest::new("BTC", "EUR", Granularity::OneHour, 48);
        assert_eq!(
            pro.market_chart_url(&hourly),
            "https://pro/coins/bitcoin/market_chart?vs_currency=eur&days=2&x_cg_pro_api_key=k"
        );
    }

    #[test]
    fn test_parse_market_chart() {
        let body = json!({
            "prices": [[1700000000000i64, 2000.5], [1700003600000i64, 2010.25]],
            "market_caps": [[1700000000000i64, 1.0e11], [1700003600000i64, 1.1e11]],
            "total_volumes": [[1700000000000i64, 5.0e9], [1700003600000i64, 6.0e9]]
        });

        let candles = parse_market_chart(&body).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].time, 1_700_000_000_000);
        assert_eq!(candles[0].close, 2000.5);
        assert_eq!(candles[0].open, 2000.5);
        assert_eq!(candles[1].volume, Some(6.0e9));
    }

    #[test]
    fn test_parse_market_chart_without_volumes() {
        let body = json!({"prices": [[1700000000000i64, 1.0]]});
        let candles = parse_market_chart(&body).unwrap();
        assert_eq!(candles[0].volume, None);
    }

    #[test]
    fn test_parse_market_chart_empty() {
        assert!(parse_market_chart(&json!({"prices": []})).unwrap().is_empty());
    }

    #[test]
    fn test_parse_market_chart_errors() {
        assert!(matches!(
            parse_market_chart(&json!({"market_caps": []})),
            Err(AppError::Provider(_))
        ));
        assert!(matches!(
            parse_market_chart(&json!({"error": "coin not found"})),
            Err(AppError::Provider(ref m)) if m.contains("coin not found")
        ));
        assert!(matches!(
            parse_market_chart(&json!({"status": {"error_code": 429, "error_message": "rate limited"}})),
            Err(AppError::Provider(ref m)) if m.contains("rate limited")
        ));
        assert!(matches!(
            parse_market_chart(&json!({"prices": [[1700000000000i64]]})),
            Err(AppError::Provider(_))
        ));
    }
}
