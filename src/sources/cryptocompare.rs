use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{get_json, PriceProvider};
use crate::error::{AppError, Result};
use crate::types::{Granularity, OhlcPoint, PriceRequest, ProviderKind};

/// Maximum `limit` accepted by the histo endpoints.
const MAX_LIMIT: usize = 2000;

#[derive(Debug, Deserialize)]
struct HistoResponse {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Data")]
    data: Option<HistoData>,
}

#[derive(Debug, Deserialize)]
struct HistoData {
    #[serde(rename = "Data")]
    data: Vec<HistoRow>,
}

#[derive(Debug, Deserialize)]
struct HistoRow {
    time: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volumefrom: Option<f64>,
}

/// CryptoCompare historical OHLCV client.
#[derive(Clone)]
pub struct CryptoCompareClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl CryptoCompareClient {
    pub fn new(client: Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn histo_url(&self, request: &PriceRequest) -> String {
        let endpoint = match request.granularity {
            Granularity::OneHour => "histohour",
            Granularity::OneDay => "histoday",
        };

        // the endpoint returns limit + 1 rows
        let limit = request.lookback.saturating_sub(1).min(MAX_LIMIT);

        format!(
            "{}/data/v2/{}?fsym={}&tsym={}&limit={}",
            self.base_url, endpoint, request.symbol, request.quote, limit
        )
    }
}

#[axum::async_trait]
impl PriceProvider for CryptoCompareClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::CryptoCompare
    }

    async fn fetch_candles(&self, request: &PriceRequest) -> Result<Vec<OhlcPoint>> {
        let url = self.histo_url(request);
        debug!("Fetching CryptoCompare history: {}", url);

        let mut builder = self.client.get(&url);
        if let Some(ref key) = self.api_key {
            builder = builder.header("Authorization", format!("Apikey {}", key));
        }

        let body = get_json(ProviderKind::CryptoCompare, builder, error_message).await?;
        parse_histo(&body)
    }
}

fn error_message(body: &Value) -> Option<String> {
    if body.get("Response").and_then(Value::as_str) == Some("Error") {
        return body
            .get("Message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| Some("unknown error".to_string()));
    }
    None
}

/// Parse a `histohour`/`histoday` payload.
///
/// Rows before a coin was listed come back as zeros and are dropped. Times
/// are converted from seconds to milliseconds.
pub fn parse_histo(body: &Value) -> Result<Vec<OhlcPoint>> {
    if let Some(message) = error_message(body) {
        return Err(AppError::Provider(format!("CryptoCompare: {}", message)));
    }

    let response = HistoResponse::deserialize(body)
        .map_err(|e| AppError::Provider(format!("CryptoCompare: unexpected response: {}", e)))?;

    if response.response != "Success" {
        return Err(AppError::Provider(format!(
            "CryptoCompare: unexpected Response '{}'",
            response.response
        )));
    }

    let data = response
        .data
        .ok_or_else(|| AppError::Provider("CryptoCompare: response has no Data".to_string()))?;

    Ok(data
        .data
        .into_iter()
        .filter(|row| row.close > 0.0)
        .map(|row| OhlcPoint {
            time: row.time * 1000,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volumefrom,
        })
        .collect())
}
