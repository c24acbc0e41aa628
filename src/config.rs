use std::env;
use std::time::Duration;

use tracing::warn;

use crate::types::{Granularity, ProviderKind};

pub const BINANCE_API_URL: &str = "https://api.binance.com";
pub const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";
pub const COINGECKO_PRO_API_URL: &str = "https://pro-api.coingecko.com/api/v3";
pub const CRYPTOCOMPARE_API_URL: &str = "https://min-api.cryptocompare.com";

/// Request values used when a query leaves them out.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDefaults {
    pub symbol: String,
    pub quote: String,
    pub granularity: Granularity,
    /// Number of samples to fetch.
    pub lookback: usize,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            symbol: "ETH".to_string(),
            quote: "USDT".to_string(),
            granularity: Granularity::OneHour,
            lookback: 100,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Which provider serves price history.
    pub provider: ProviderKind,
    /// CoinGecko API key (optional, switches to the pro endpoint).
    pub coingecko_api_key: Option<String>,
    /// CryptoCompare API key (optional).
    pub cryptocompare_api_key: Option<String>,
    pub binance_api_url: String,
    /// Overrides the public/pro CoinGecko URL when set.
    pub coingecko_api_url: Option<String>,
    pub cryptocompare_api_url: String,
    /// How long a fetched series is reused.
    pub fetch_cache_ttl: Duration,
    pub http_timeout: Duration,
    pub defaults: RequestDefaults,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let provider = match lookup("PRICE_PROVIDER") {
            Some(name) => ProviderKind::from_str(&name).unwrap_or_else(|| {
                warn!("Unknown PRICE_PROVIDER '{}', falling back to binance", name);
                ProviderKind::Binance
            }),
            None => ProviderKind::Binance,
        };

        let defaults = RequestDefaults::default();
        let granularity = match lookup("DEFAULT_GRANULARITY") {
            Some(value) => Granularity::from_str(&value).unwrap_or_else(|| {
                warn!("Unknown DEFAULT_GRANULARITY '{}', using 1h", value);
                Granularity::OneHour
            }),
            None => defaults.granularity,
        };

        Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(3001),
            provider,
            coingecko_api_key: lookup("COINGECKO_API_KEY").filter(|k| !k.is_empty()),
            cryptocompare_api_key: lookup("CRYPTOCOMPARE_API_KEY").filter(|k| !k.is_empty()),
            binance_api_url: lookup("BINANCE_API_URL")
                .unwrap_or_else(|| BINANCE_API_URL.to_string()),
            coingecko_api_url: lookup("COINGECKO_API_URL"),
            cryptocompare_api_url: lookup("CRYPTOCOMPARE_API_URL")
                .unwrap_or_else(|| CRYPTOCOMPARE_API_URL.to_string()),
            fetch_cache_ttl: Duration::from_secs(
                lookup("FETCH_CACHE_TTL_SECS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(60),
            ),
            http_timeout: Duration::from_secs(
                lookup("HTTP_TIMEOUT_SECS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(10),
            ),
            defaults: RequestDefaults {
                symbol: lookup("DEFAULT_SYMBOL")
                    .map(|s| s.to_uppercase())
                    .unwrap_or(defaults.symbol),
                quote: lookup("DEFAULT_QUOTE")
                    .map(|s| s.to_uppercase())
                    .unwrap_or(defaults.quote),
                granularity,
                lookback: lookup("DEFAULT_LOOKBACK")
                    .and_then(|v| v.parse().ok())
                    .filter(|n: &usize| *n > 0)
                    .unwrap_or(defaults.lookback),
            },
        }
    }

    /// CoinGecko base URL: explicit override, else pro when a key is set.
    pub fn coingecko_base_url(&self) -> &str {
        match (&self.coingecko_api_url, &self.coingecko_api_key) {
            (Some(url), _) => url.as_str(),
            (None, Some(_)) => COINGECKO_PRO_API_URL,
            (None, None) => COINGECKO_API_URL,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_config_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3001);
        assert_eq!(config.provider, ProviderKind::Binance);
        assert_eq!(config.binance_api_url, BINANCE_API_URL);
        assert_eq!(config.fetch_cache_ttl, Duration::from_secs(60));
        assert_eq!(config.http_timeout, Duration::from_secs(10));
        assert_eq!(config.defaults, RequestDefaults::default());
        assert_eq!(config.defaults.symbol, "ETH");
    }

    #[test]
    fn test_config_from_values() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("PRICE_PROVIDER", "coingecko"),
            ("FETCH_CACHE_TTL_SECS", "300"),
            ("DEFAULT_SYMBOL", "btc"),
            ("DEFAULT_QUOTE", "usd"),
            ("DEFAULT_GRANULARITY", "1d"),
            ("DEFAULT_LOOKBACK", "365"),
        ]);

        assert_eq!(config.port, 8080);
        assert_eq!(config.provider, ProviderKind::CoinGecko);
        assert_eq!(config.fetch_cache_ttl, Duration::from_secs(300));
        assert_eq!(config.defaults.symbol, "BTC");
        assert_eq!(config.defaults.quote, "USD");
        assert_eq!(config.defaults.granularity, Granularity::OneDay);
        assert_eq!(config.defaults.lookback, 365);
    }

    #[test]
    fn test_config_invalid_values_fall_back() {
        let config = config_from(&[
            ("PORT", "not-a-port"),
            ("PRICE_PROVIDER", "kraken"),
            ("DEFAULT_GRANULARITY", "5m"),
            ("DEFAULT_LOOKBACK", "0"),
        ]);

        assert_eq!(config.port, 3001);
        assert_eq!(config.provider, ProviderKind::Binance);
        assert_eq!(config.defaults.granularity, Granularity::OneHour);
        assert_eq!(config.defaults.lookback, 100);
    }

    #[test]
    fn test_coingecko_base_url() {
        assert_eq!(Config::default().coingecko_base_url(), COINGECKO_API_URL);

        let pro = config_from(&[("COINGECKO_API_KEY", "gecko-key")]);
        assert_eq!(pro.coingecko_base_url(), COINGECKO_PRO_API_URL);

        let overridden = config_from(&[
            ("COINGECKO_API_KEY", "gecko-key"),
            ("COINGECKO_API_URL", "http://localhost:9000"),
        ]);
        assert_eq!(overridden.coingecko_base_url(), "http://localhost:9000");
    }

    #[test]
    fn test_empty_api_keys_ignored() {
        let config = config_from(&[("CRYPTOCOMPARE_API_KEY", "")]);
        assert!(config.cryptocompare_api_key.is_none());
    }
}
