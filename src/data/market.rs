//! CoinGecko market data client
//!
//! Fetches USD price, market cap, 24h volume, and 24h change for every
//! supported coin in a single `/simple/price` call.

use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;

use super::http::fetch_json;
use super::{all_protocols, FetchError, MarketData};
use crate::config::Config;

/// Header carrying a CoinGecko demo API key
const COINGECKO_KEY_HEADER: &str = "x-cg-demo-api-key";

/// One coin's entry in the `/simple/price` response
#[derive(Debug, Deserialize)]
struct SimplePrice {
    usd: Option<f64>,
    usd_market_cap: Option<f64>,
    usd_24h_vol: Option<f64>,
    usd_24h_change: Option<f64>,
}

/// Client for fetching market data from CoinGecko
#[derive(Debug, Clone)]
pub struct MarketClient {
    http_client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl MarketClient {
    pub fn new(http_client: Client, config: &Config) -> Self {
        Self {
            http_client,
            base_url: config.endpoints.coingecko.clone(),
            api_key: config.keys.coingecko.clone(),
        }
    }

    /// CoinGecko ids of every supported protocol's fee token, deduplicated
    pub fn coin_ids() -> Vec<&'static str> {
        let mut ids: Vec<&'static str> = Vec::new();
        for info in all_protocols() {
            if !ids.contains(&info.coingecko_id) {
                ids.push(info.coingecko_id);
            }
        }
        ids
    }

    /// Fetches market data for the given CoinGecko ids
    ///
    /// # Returns
    /// * `Ok(Some(map))` - data keyed by coin id; coins with no usable price are left out
    /// * `Ok(None)` - the response held no usable prices at all
    /// * `Err(FetchError)` - if the request or parsing fails
    pub async fn fetch_prices(
        &self,
        ids: &[&str],
    ) -> Result<Option<HashMap<String, MarketData>>, FetchError> {
        let url = format!("{}/simple/price", self.base_url);
        let mut request = self.http_client.get(&url).query(&[
            ("ids", ids.join(",").as_str()),
            ("vs_currencies", "usd"),
            ("include_market_cap", "true"),
            ("include_24hr_vol", "true"),
            ("include_24hr_change", "true"),
        ]);
        if let Some(ref key) = self.api_key {
            request = request.header(COINGECKO_KEY_HEADER, key);
        }

        let response: HashMap<String, SimplePrice> = fetch_json(request).await?;
        let prices = parse_prices(response);

        Ok(if prices.is_empty() { None } else { Some(prices) })
    }
}

/// Keeps coins with a positive price and fills missing figures with zero
fn parse_prices(response: HashMap<String, SimplePrice>) -> HashMap<String, MarketData> {
    response
        .into_iter()
        .filter_map(|(id, price)| {
            let price_usd = price.usd.filter(|p| *p > 0.0)?;
            Some((
                id,
                MarketData {
                    price_usd,
                    market_cap_usd: price.usd_market_cap.unwrap_or(0.0),
                    volume_24h_usd: price.usd_24h_vol.unwrap_or(0.0),
                    change_24h_pct: price.usd_24h_change.unwrap_or(0.0),
                },
            ))
        })
        .collect()
}

/// Static market data used when CoinGecko is unavailable
pub fn default_market_data(coin_id: &str) -> MarketData {
    let (price_usd, market_cap_usd, volume_24h_usd, change_24h_pct) = match coin_id {
        "bitcoin" => (30_000.0, 580_000_000_000.0, 12_000_000_000.0, 1.8),
        "binancecoin" => (220.0, 45_000_000_000.0, 1_500_000_000.0, -1.2),
        "tron" => (0.08, 12_000_000_000.0, 800_000_000.0, 3.1),
        // ethereum, and anything priced in ETH
        _ => (2_000.0, 240_000_000_000.0, 8_000_000_000.0, 2.5),
    };
    MarketData {
        price_usd,
        market_cap_usd,
        volume_24h_usd,
        change_24h_pct,
    }
}
