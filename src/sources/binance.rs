use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::{get_json, json_f64, PriceProvider};
use crate::error::{AppError, Result};
use crate::types::{Granularity, OhlcPoint, PriceRequest, ProviderKind};

/// Maximum klines per request.
const MAX_LIMIT: usize = 1000;

/// Binance public klines client.
#[derive(Clone)]
pub struct BinanceClient {
    client: Client,
    base_url: String,
}

impl BinanceClient {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn interval(granularity: Granularity) -> &'static str {
        match granularity {
            Granularity::OneHour => "1h",
            Granularity::OneDay => "1d",
        }
    }

    /// One page of klines, newest first when `end_time` is unset.
    pub fn klines_url(&self, request: &PriceRequest, limit: usize, end_time: Option<i64>) -> String {
        let mut url = format!(
            "{}/api/v3/klines?symbol={}{}&interval={}&limit={}",
            self.base_url,
            request.symbol,
            request.quote,
            Self::interval(request.granularity),
            limit.clamp(1, MAX_LIMIT)
        );
        if let Some(end_time) = end_time {
            url.push_str(&format!("&endTime={}", end_time));
        }
        url
    }
}

#[axum::async_trait]
impl PriceProvider for BinanceClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Binance
    }

    /// Pages backwards with `endTime` until `lookback` klines are collected
    /// or the pair's history runs out.
    async fn fetch_candles(&self, request: &PriceRequest) -> Result<Vec<OhlcPoint>> {
        let mut candles: Vec<OhlcPoint> = Vec::with_capacity(request.lookback);
        let mut end_time = None;

        while candles.len() < request.lookback {
            let limit = (request.lookback - candles.len()).min(MAX_LIMIT);
            let url = self.klines_url(request, limit, end_time);
            debug!("Fetching Binance klines: {}", url);

            let body = get_json(ProviderKind::Binance, self.client.get(&url), error_message).await?;
            let page = parse_klines(&body)?;
            let exhausted = page.len() < limit;

            end_time = page.iter().map(|c| c.time).min().map(|oldest| oldest - 1);
            candles.extend(page);

            if exhausted || end_time.is_none() {
                break;
            }
        }

        Ok(candles)
    }
}

/// `{"code": -1121, "msg": "Invalid symbol."}`
fn error_message(body: &Value) -> Option<String> {
    let msg = body.get("msg")?.as_str()?;
    Some(match body.get("code").and_then(Value::as_i64) {
        Some(code) => format!("{} (code {})", msg, code),
        None => msg.to_string(),
    })
}

/// Parse a klines payload: an array of
/// `[open_time, open, high, low, close, volume, close_time, ...]` rows with
/// prices encoded as strings.
pub fn parse_klines(body: &Value) -> Result<Vec<OhlcPoint>> {
    if let Some(message) = error_message(body) {
        return Err(AppError::Provider(format!("Binance: {}", message)));
    }

    let rows = body
        .as_array()
        .ok_or_else(|| AppError::Provider("Binance: expected an array of klines".to_string()))?;

    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let fields = row.as_array().filter(|f| f.len() >= 6).ok_or_else(|| {
                AppError::Provider(format!("Binance: malformed kline at index {}", i))
            })?;

            let field = |idx: usize, name: &str| {
                json_f64(&fields[idx]).ok_or_else(|| {
                    AppError::Provider(format!("Binance: invalid {} in kline {}", name, i))
                })
            };

            Ok(OhlcPoint {
                time: fields[0].as_i64().ok_or_else(|| {
                    AppError::Provider(format!("Binance: invalid open time in kline {}", i))
                })?,
                open: field(1, "open")?,
                high: field(2, "high")?,
                low: field(3, "low")?,
                close: field(4, "close")?,
                volume: json_f64(&fields[5]),
            })
        })
        .collect()
}
