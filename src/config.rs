//! Runtime configuration: API keys, endpoints, timeouts, and cache TTLs

use chrono::Duration;
use std::time::Duration as StdDuration;

use crate::cache::{GOVERNANCE_TTL, MARKET_TTL};

/// User agent sent with every request; GitHub rejects requests without one
pub const USER_AGENT: &str = concat!("l1chat/", env!("CARGO_PKG_VERSION"));

/// Default HTTP timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Optional API credentials, one per upstream service
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    pub coingecko: Option<String>,
    pub etherscan: Option<String>,
    pub bscscan: Option<String>,
    pub blocknative: Option<String>,
    pub trongrid: Option<String>,
    pub github: Option<String>,
}

/// Base URLs of the upstream APIs
///
/// Overridable so tests can point clients at a local mock server.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub coingecko: String,
    pub etherscan: String,
    pub bscscan: String,
    pub blocknative: String,
    pub trongrid: String,
    pub blockchair: String,
    pub github: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            coingecko: "https://api.coingecko.com/api/v3".to_string(),
            etherscan: "https://api.etherscan.io/api".to_string(),
            bscscan: "https://api.bscscan.com/api".to_string(),
            blocknative: "https://api.blocknative.com".to_string(),
            trongrid: "https://api.trongrid.io".to_string(),
            blockchair: "https://api.blockchair.com".to_string(),
            github: "https://api.github.com".to_string(),
        }
    }
}

impl Endpoints {
    /// Points every endpoint at one base URL (mock servers in tests)
    pub fn all_at(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            coingecko: base.to_string(),
            etherscan: format!("{}/etherscan", base),
            bscscan: format!("{}/bscscan", base),
            blocknative: base.to_string(),
            trongrid: base.to_string(),
            blockchair: base.to_string(),
            github: base.to_string(),
        }
    }
}

/// Complete runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub keys: ApiKeys,
    pub endpoints: Endpoints,
    /// Per-request HTTP timeout
    pub timeout: StdDuration,
    /// TTL for prices and network fees
    pub market_ttl: Duration,
    /// TTL for governance data
    pub governance_ttl: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            keys: ApiKeys::default(),
            endpoints: Endpoints::default(),
            timeout: StdDuration::from_secs(DEFAULT_TIMEOUT_SECS),
            market_ttl: MARKET_TTL,
            governance_ttl: GOVERNANCE_TTL,
        }
    }
}

impl Config {
    /// Configuration with every endpoint on one base URL and no API keys
    pub fn for_base_url(base: &str) -> Self {
        Self {
            endpoints: Endpoints::all_at(base),
            ..Self::default()
        }
    }
}

/// Treats empty or whitespace-only keys as absent
pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.timeout, StdDuration::from_secs(10));
        assert_eq!(config.market_ttl, Duration::minutes(5));
        assert_eq!(config.governance_ttl, Duration::hours(1));
        assert!(config.keys.etherscan.is_none());
        assert!(config.endpoints.coingecko.contains("coingecko.com"));
        assert!(config.endpoints.github.contains("api.github.com"));
    }

    #[test]
    fn test_all_at_trims_trailing_slash() {
        let endpoints = Endpoints::all_at("http://127.0.0.1:9000/");
        assert_eq!(endpoints.coingecko, "http://127.0.0.1:9000");
        assert_eq!(endpoints.etherscan, "http://127.0.0.1:9000/etherscan");
        assert_eq!(endpoints.bscscan, "http://127.0.0.1:9000/bscscan");
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("  key ".to_string())), Some("key".to_string()));
        assert_eq!(non_empty(Some("   ".to_string())), None);
        assert_eq!(non_empty(None), None);
    }

    #[test]
    fn test_user_agent_names_crate() {
        assert!(USER_AGENT.starts_with("l1chat/"));
    }
}
