use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Candle granularity requested from a price provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Granularity {
    #[serde(rename = "1h")]
    #[default]
    OneHour,
    #[serde(rename = "1d")]
    OneDay,
}

impl Granularity {
    /// Get the granularity from a string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "1h" | "hour" | "hourly" => Some(Granularity::OneHour),
            "1d" | "day" | "daily" => Some(Granularity::OneDay),
            _ => None,
        }
    }

    /// Short form used in query strings and cache keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::OneHour => "1h",
            Granularity::OneDay => "1d",
        }
    }

    /// Length of one candle in seconds.
    pub fn seconds(&self) -> i64 {
        match self {
            Granularity::OneHour => 3600,
            Granularity::OneDay => 86400,
        }
    }
}

/// OHLC (Open, High, Low, Close) data point.
///
/// `time` is the candle open time in Unix milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcPoint {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

impl OhlcPoint {
    /// Build a point from a close-only source.
    pub fn from_close(time: i64, close: f64, volume: Option<f64>) -> Self {
        Self {
            time,
            open: close,
            high: close,
            low: close,
            close,
            volume,
        }
    }
}

/// A single (timestamp, close) observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    /// Unix milliseconds.
    pub timestamp: i64,
    pub close: f64,
}

impl PriceSample {
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}

/// Normalized price history for one symbol/quote pair.
///
/// Candles are ordered by strictly increasing `time`; duplicates keep the
/// last observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSeries {
    pub symbol: String,
    pub quote: String,
    pub granularity: Granularity,
    pub candles: Vec<OhlcPoint>,
}

impl PriceSeries {
    /// Sort, de-duplicate and trim raw provider candles to the last `limit` points.
    pub fn from_candles(
        symbol: &str,
        quote: &str,
        granularity: Granularity,
        mut raw: Vec<OhlcPoint>,
        limit: usize,
    ) -> Self {
        raw.sort_by_key(|c| c.time);

        let mut candles: Vec<OhlcPoint> = Vec::with_capacity(raw.len());
        for candle in raw {
            match candles.last_mut() {
                Some(last) if last.time == candle.time => *last = candle,
                _ => candles.push(candle),
            }
        }

        if candles.len() > limit {
            candles.drain(..candles.len() - limit);
        }

        Self {
            symbol: symbol.to_uppercase(),
            quote: quote.to_uppercase(),
            granularity,
            candles,
        }
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn samples(&self) -> Vec<PriceSample> {
        self.candles
            .iter()
            .map(|c| PriceSample {
                timestamp: c.time,
                close: c.close,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_granularity_parsing() {
        assert_eq!(Granularity::from_str("1h"), Some(Granularity::OneHour));
        assert_eq!(Granularity::from_str("daily"), Some(Granularity::OneDay));
        assert_eq!(Granularity::from_str("5m"), None);
        assert_eq!(Granularity::OneDay.as_str(), "1d");
        assert_eq!(Granularity::OneHour.seconds(), 3600);
    }

    #[test]
    fn test_series_sorts_and_dedups() {
        let raw = vec![
            OhlcPoint::from_close(3000, 3.0, None),
            OhlcPoint::from_close(1000, 1.0, None),
            OhlcPoint::from_close(2000, 2.0, None),
            OhlcPoint::from_close(2000, 2.5, None),
        ];
        let series = PriceSeries::from_candles("eth", "usdt", Granularity::OneHour, raw, 10);

        assert_eq!(series.symbol, "ETH");
        assert_eq!(series.quote, "USDT");
        let samples = series.samples();
        let closes: Vec<f64> = samples.iter().map(|s| s.close).collect();
        let times: Vec<i64> = samples.iter().map(|s| s.timestamp).collect();
        assert_eq!(closes, vec![1.0, 2.5, 3.0]);
        assert_eq!(times, vec![1000, 2000, 3000]);
    }

    #[test]
    fn test_series_keeps_most_recent_points() {
        let raw = (0..10)
            .map(|i| OhlcPoint::from_close(i * 1000, i as f64, None))
            .collect();
        let series = PriceSeries::from_candles("btc", "usd", Granularity::OneDay, raw, 4);
        let closes: Vec<f64> = series.candles.iter().map(|c| c.close).collect();
        assert_eq!(closes, vec![6.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_sample_datetime() {
        let sample = PriceSample {
            timestamp: 1_700_000_000_000,
            close: 1.0,
        };
        assert_eq!(sample.datetime().map(|d| d.timestamp()), Some(1_700_000_000));
    }
}
