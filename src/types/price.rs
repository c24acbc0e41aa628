use serde::{Deserialize, Serialize};
use std::fmt;

use super::Granularity;

/// Price history provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Binance,
    CoinGecko,
    CryptoCompare,
}

impl ProviderKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "binance" => Some(ProviderKind::Binance),
            "coingecko" | "gecko" => Some(ProviderKind::CoinGecko),
            "cryptocompare" | "cc" => Some(ProviderKind::CryptoCompare),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::Binance => "binance",
            ProviderKind::CoinGecko => "coingecko",
            ProviderKind::CryptoCompare => "cryptocompare",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// What to fetch for one refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRequest {
    pub symbol: String,
    pub quote: String,
    pub granularity: Granularity,
    pub lookback: usize,
}

impl PriceRequest {
    pub fn new(symbol: &str, quote: &str, granularity: Granularity, lookback: usize) -> Self {
        Self {
            symbol: symbol.trim().to_uppercase(),
            quote: quote.trim().to_uppercase(),
            granularity,
            lookback,
        }
    }

    /// Key under which the fetched series is cached.
    pub fn cache_key(&self, provider: ProviderKind) -> String {
        format!(
            "{}:{}:{}:{}:{}",
            provider.name(),
            self.symbol,
            self.quote,
            self.granularity.as_str(),
            self.lookback
        )
    }
}
