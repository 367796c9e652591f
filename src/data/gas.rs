//! Gas oracle and network fee clients
//!
//! Each chain prices transfers in its own unit, so each provider returns the
//! raw rate and `FeeRate` turns it into a USD cost.

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use super::http::{fetch_json, require_key};
use super::{FeeRate, FetchError, GasOracle, Protocol};
use crate::config::{ApiKeys, Config, Endpoints};

/// Chain parameter holding Tron's bandwidth price
const TRON_FEE_PARAMETER: &str = "getTransactionFee";

/// Blocknative confidence level treated as the standard price
const BLOCKNATIVE_STANDARD_CONFIDENCE: u8 = 70;

/// Envelope shared by Etherscan and BscScan
#[derive(Debug, Deserialize)]
struct ScanResponse {
    status: String,
    #[serde(default)]
    message: String,
    /// An object on success, an error string otherwise
    result: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ScanGasOracle {
    safe_gas_price: String,
    propose_gas_price: String,
    fast_gas_price: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockPricesResponse {
    #[serde(default)]
    block_prices: Vec<BlockPrice>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockPrice {
    #[serde(default)]
    estimated_prices: Vec<EstimatedPrice>,
}

#[derive(Debug, Deserialize)]
struct EstimatedPrice {
    confidence: u8,
    price: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChainParametersResponse {
    #[serde(default)]
    chain_parameter: Vec<ChainParameter>,
}

#[derive(Debug, Deserialize)]
struct ChainParameter {
    key: String,
    value: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct BlockchairStatsResponse {
    data: BlockchairStats,
}

#[derive(Debug, Deserialize)]
struct BlockchairStats {
    suggested_transaction_fee_per_byte_sat: Option<f64>,
}

/// Client for the per-chain fee oracles
#[derive(Debug, Clone)]
pub struct GasClient {
    http_client: Client,
    endpoints: Endpoints,
    keys: ApiKeys,
}

impl GasClient {
    pub fn new(http_client: Client, config: &Config) -> Self {
        Self {
            http_client,
            endpoints: config.endpoints.clone(),
            keys: config.keys.clone(),
        }
    }

    /// Ethereum gas prices from the Etherscan gas tracker
    pub async fn etherscan_oracle(&self) -> Result<Option<GasOracle>, FetchError> {
        let key = require_key(self.keys.etherscan.as_deref(), "Etherscan")?;
        self.scan_oracle(&self.endpoints.etherscan, key).await
    }

    /// BNB Smart Chain gas prices from the BscScan gas tracker
    pub async fn bscscan_oracle(&self) -> Result<Option<GasOracle>, FetchError> {
        let key = require_key(self.keys.bscscan.as_deref(), "BscScan")?;
        self.scan_oracle(&self.endpoints.bscscan, key).await
    }

    async fn scan_oracle(
        &self,
        base_url: &str,
        key: &str,
    ) -> Result<Option<GasOracle>, FetchError> {
        let request = self.http_client.get(base_url).query(&[
            ("module", "gastracker"),
            ("action", "gasoracle"),
            ("apikey", key),
        ]);
        let response: ScanResponse = fetch_json(request).await?;
        parse_scan_oracle(response)
    }

    /// Ethereum gas prices from Blocknative's block price estimates
    pub async fn blocknative_oracle(&self) -> Result<Option<GasOracle>, FetchError> {
        let key = require_key(self.keys.blocknative.as_deref(), "Blocknative")?;
        let url = format!("{}/gasprices/blockprices", self.endpoints.blocknative);
        let request = self.http_client.get(&url).header("Authorization", key);
        let response: BlockPricesResponse = fetch_json(request).await?;

        Ok(response
            .block_prices
            .into_iter()
            .next()
            .and_then(|block| oracle_from_estimates(&block.estimated_prices)))
    }

    /// Tron bandwidth price in sun per byte
    ///
    /// TronGrid answers without a key at a lower rate limit, so the key is
    /// optional here.
    pub async fn tron_bandwidth_price(&self) -> Result<Option<u64>, FetchError> {
        let url = format!("{}/wallet/getchainparameters", self.endpoints.trongrid);
        let mut request = self.http_client.post(&url);
        if let Some(ref key) = self.keys.trongrid {
            request = request.header("TRON-PRO-API-KEY", key);
        }
        let response: ChainParametersResponse = fetch_json(request).await?;

        Ok(response
            .chain_parameter
            .into_iter()
            .find(|p| p.key == TRON_FEE_PARAMETER)
            .and_then(|p| p.value)
            .filter(|v| *v > 0)
            .map(|v| v as u64))
    }

    /// Suggested Bitcoin fee rate in sat per vbyte from Blockchair
    pub async fn bitcoin_fee_rate(&self) -> Result<Option<f64>, FetchError> {
        let url = format!("{}/bitcoin/stats", self.endpoints.blockchair);
        let response: BlockchairStatsResponse = fetch_json(self.http_client.get(&url)).await?;

        Ok(response
            .data
            .suggested_transaction_fee_per_byte_sat
            .filter(|sat| *sat > 0.0))
    }
}

fn parse_scan_oracle(response: ScanResponse) -> Result<Option<GasOracle>, FetchError> {
    if response.status != "1" {
        let detail = match response.result {
            Value::String(s) if !s.is_empty() => s,
            _ => response.message,
        };
        return Err(FetchError::Upstream(detail));
    }

    let oracle: ScanGasOracle = serde_json::from_value(response.result)?;
    let parse = |field: &str, value: &str| {
        value
            .trim()
            .parse::<f64>()
            .map_err(|_| FetchError::MissingField(field.to_string()))
    };

    let gas = GasOracle {
        safe: parse("SafeGasPrice", &oracle.safe_gas_price)?,
        standard: parse("ProposeGasPrice", &oracle.propose_gas_price)?,
        fast: parse("FastGasPrice", &oracle.fast_gas_price)?,
    };

    Ok(if gas.standard > 0.0 { Some(gas) } else { None })
}

/// Lowest confidence as safe, 70% (or the first estimate) as standard,
/// highest confidence as fast
fn oracle_from_estimates(estimates: &[EstimatedPrice]) -> Option<GasOracle> {
    let first = estimates.first()?;
    let standard = estimates
        .iter()
        .find(|e| e.confidence == BLOCKNATIVE_STANDARD_CONFIDENCE)
        .unwrap_or(first);
    let safe = estimates.iter().min_by_key(|e| e.confidence).unwrap_or(first);
    let fast = estimates.iter().max_by_key(|e| e.confidence).unwrap_or(first);

    Some(GasOracle {
        safe: safe.price,
        standard: standard.price,
        fast: fast.price,
    })
}

/// Static fee rates used when every provider fails
pub fn default_rate(protocol: Protocol) -> FeeRate {
    match protocol {
        Protocol::Ethereum => FeeRate::Gwei(GasOracle {
            safe: 8.4,
            standard: 12.0,
            fast: 21.6,
        }),
        Protocol::BnbChain => FeeRate::Gwei(GasOracle {
            safe: 3.0,
            standard: 5.0,
            fast: 7.0,
        }),
        Protocol::Tron => FeeRate::SunPerByte { sun: 1000 },
        Protocol::Bitcoin => FeeRate::SatPerByte { sat: 20.0 },
        Protocol::Base => FeeRate::FlatUsd { usd: 0.15 },
    }
}
