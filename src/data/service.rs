//! Metrics service
//!
//! Composes the API clients with one shared cache. Every public method goes
//! through a `FallbackChain` or `resolve_batch`, so it always produces a value.

use chrono::{Duration, Utc};
use futures::future::join_all;
use futures::TryFutureExt;
use std::collections::HashMap;

use super::gas::default_rate;
use super::market::default_market_data;
use super::{
    build_client, FeeRate, GasClient, GovernanceClient, GovernanceData, MarketClient, MarketData,
    NetworkFees, Protocol,
};
use crate::cache::{resolve_batch, CacheManager, FallbackChain, Source, Sourced};
use crate::config::Config;

/// Cache prefix for per-coin market entries, e.g. `market:tron`
const MARKET_PREFIX: &str = "market";

/// Entry point for all protocol metrics
#[derive(Debug, Clone)]
pub struct MetricsService {
    cache: CacheManager,
    market: MarketClient,
    gas: GasClient,
    governance: GovernanceClient,
    market_ttl: Duration,
    governance_ttl: Duration,
}

impl MetricsService {
    /// Creates a service with its own HTTP client and an empty cache
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        Ok(Self::with_cache(config, CacheManager::new(), build_client(config)?))
    }

    /// Creates a service over an existing cache and HTTP client
    pub fn with_cache(
        config: &Config,
        cache: CacheManager,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            cache,
            market: MarketClient::new(http_client.clone(), config),
            gas: GasClient::new(http_client.clone(), config),
            governance: GovernanceClient::new(http_client, config),
            market_ttl: config.market_ttl,
            governance_ttl: config.governance_ttl,
        }
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    /// Market data for every protocol, from one batched CoinGecko call
    ///
    /// Each coin carries its own source. Coins missing from a live response
    /// get their static default and are retried on the next call.
    pub async fn market_overview(&self) -> HashMap<Protocol, Sourced<MarketData>> {
        let by_coin = self.market_coins(&MarketClient::coin_ids()).await;
        Protocol::ALL
            .iter()
            .map(|protocol| {
                let coin = protocol.info().coingecko_id;
                let market = by_coin
                    .get(&coin)
                    .cloned()
                    .unwrap_or_else(|| fallback_market(coin));
                (*protocol, market)
            })
            .collect()
    }

    /// Market data for one protocol
    pub async fn market(&self, protocol: Protocol) -> Sourced<MarketData> {
        let coin = protocol.info().coingecko_id;
        self.market_coins(&[coin])
            .await
            .remove(&coin)
            .unwrap_or_else(|| fallback_market(coin))
    }

    async fn market_coins(
        &self,
        ids: &[&'static str],
    ) -> HashMap<&'static str, Sourced<MarketData>> {
        resolve_batch(
            &self.cache,
            MARKET_PREFIX,
            ids,
            self.market_ttl,
            "CoinGecko",
            |missing| async move { self.market.fetch_prices(&missing).await },
            default_market_data,
        )
        .await
    }

    /// Raw fee rate for one protocol, in the chain's own unit
    pub async fn fee_rate(&self, protocol: Protocol) -> Sourced<FeeRate> {
        let key = format!("gas:{}", protocol.id());
        let chain = FallbackChain::new(&self.cache, key, self.market_ttl);

        let chain = match protocol {
            Protocol::Ethereum => chain
                .provider(
                    "Etherscan",
                    self.gas.etherscan_oracle().map_ok(|g| g.map(FeeRate::Gwei)),
                )
                .provider(
                    "Blocknative",
                    self.gas.blocknative_oracle().map_ok(|g| g.map(FeeRate::Gwei)),
                ),
            Protocol::BnbChain => chain.provider(
                "BscScan",
                self.gas.bscscan_oracle().map_ok(|g| g.map(FeeRate::Gwei)),
            ),
            Protocol::Tron => chain.provider(
                "TronGrid",
                self.gas
                    .tron_bandwidth_price()
                    .map_ok(|sun| sun.map(|sun| FeeRate::SunPerByte { sun })),
            ),
            Protocol::Bitcoin => chain.provider(
                "Blockchair",
                self.gas
                    .bitcoin_fee_rate()
                    .map_ok(|sat| sat.map(|sat| FeeRate::SatPerByte { sat })),
            ),
            // No public fee oracle; the network profile figure is used
            Protocol::Base => chain,
        };

        chain.resolve(default_rate(protocol)).await
    }

    /// Transfer cost on one protocol
    pub async fn network_fees(&self, protocol: Protocol) -> Sourced<NetworkFees> {
        let (market, rate) = futures::join!(self.market(protocol), self.fee_rate(protocol));
        combine_fees(protocol, rate, &market)
    }

    /// Transfer cost on every protocol, in registry order
    ///
    /// Prices come from a single market overview; fee rates are fetched
    /// concurrently.
    pub async fn all_network_fees(&self) -> Vec<Sourced<NetworkFees>> {
        let overview = self.market_overview().await;
        let rates = join_all(Protocol::ALL.iter().map(|p| self.fee_rate(*p))).await;

        Protocol::ALL
            .iter()
            .zip(rates)
            .map(|(protocol, rate)| match overview.get(protocol) {
                Some(market) => combine_fees(*protocol, rate, market),
                None => combine_fees(
                    *protocol,
                    rate,
                    &fallback_market(protocol.info().coingecko_id),
                ),
            })
            .collect()
    }

    /// Proposal repository activity for one protocol
    pub async fn governance(&self, protocol: Protocol) -> Sourced<GovernanceData> {
        let info = protocol.info();
        FallbackChain::new(
            &self.cache,
            format!("governance:{}", info.id),
            self.governance_ttl,
        )
        .provider("GitHub", self.governance.fetch_governance(info))
        .resolve_with(|| GovernanceData::fallback(info.governance_repo))
        .await
    }

    /// Proposal repository activity for every protocol, in registry order
    pub async fn all_governance(&self) -> Vec<(Protocol, Sourced<GovernanceData>)> {
        let results = join_all(Protocol::ALL.iter().map(|p| self.governance(*p))).await;
        Protocol::ALL.into_iter().zip(results).collect()
    }
}

fn fallback_market(coin: &str) -> Sourced<MarketData> {
    Sourced {
        value: default_market_data(coin),
        source: Source::Fallback,
        fetched_at: Utc::now(),
    }
}

/// Prices a fee rate. The row counts as an estimate if either the rate or the
/// price it was converted with is one.
fn combine_fees(
    protocol: Protocol,
    rate: Sourced<FeeRate>,
    market: &Sourced<MarketData>,
) -> Sourced<NetworkFees> {
    let price_usd = market.value.price_usd;
    let mut fees = rate.map(|rate| NetworkFees::from_rate(protocol, rate, price_usd));
    if market.source.is_fallback() && !matches!(fees.value.rate, FeeRate::FlatUsd { .. }) {
        fees.source = Source::Fallback;
    }
    fees
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiKeys;
    use crate::format;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service_for(server: &MockServer, keys: ApiKeys) -> MetricsService {
        let mut config = Config::for_base_url(&server.uri());
        config.keys = keys;
        MetricsService::with_cache(&config, CacheManager::new(), reqwest::Client::new())
    }

    async fn mount_prices(server: &MockServer, expected_calls: u64) {
        Mock::given(method("GET"))
            .and(path("/simple/price"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ethereum": {"usd": 2500.0, "usd_market_cap": 3.0e11, "usd_24h_vol": 1.0e10, "usd_24h_change": 1.0},
                "bitcoin": {"usd": 60000.0, "usd_market_cap": 1.2e12, "usd_24h_vol": 3.0e10, "usd_24h_change": 2.0},
                "binancecoin": {"usd": 600.0, "usd_market_cap": 9.0e10, "usd_24h_vol": 2.0e9, "usd_24h_change": -1.0},
                "tron": {"usd": 0.2, "usd_market_cap": 1.7e10, "usd_24h_vol": 5.0e8, "usd_24h_change": 0.5}
            })))
            .expect(expected_calls)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_market_overview_live_then_cached() {
        let server = MockServer::start().await;
        mount_prices(&server, 1).await;
        let service = service_for(&server, ApiKeys::default());

        let first = service.market_overview().await;
        assert_eq!(first[&Protocol::Bitcoin].source, Source::Live("CoinGecko"));
        assert_eq!(first[&Protocol::Bitcoin].value.price_usd, 60000.0);
        // Base is priced in ETH
        assert_eq!(first[&Protocol::Base].value.price_usd, 2500.0);
        assert!(service.cache().get_fresh::<MarketData>("market:tron").is_some());

        let second = service.market(Protocol::Tron).await;
        assert_eq!(second.source, Source::Cache);
        assert_eq!(second.value.price_usd, 0.2);
    }

    #[tokio::test]
    async fn test_partial_price_response_flags_missing_coins() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/simple/price"))
            .and(query_param("ids", "ethereum,bitcoin,binancecoin,tron"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ethereum": {"usd": 2500.0, "usd_market_cap": 3.0e11, "usd_24h_vol": 1.0e10, "usd_24h_change": 1.0}
            })))
            .expect(1)
            .mount(&server)
            .await;
        // Only the coins that were missing are asked for again
        Mock::given(method("GET"))
            .and(path("/simple/price"))
            .and(query_param("ids", "bitcoin,binancecoin,tron"))
            .respond_with(ResponseTemplate::new(503))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/wallet/getchainparameters"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "chainParameter": [{"key": "getTransactionFee", "value": 1000}]
            })))
            .mount(&server)
            .await;
        let service = service_for(&server, ApiKeys::default());

        let overview = service.market_overview().await;
        assert_eq!(overview[&Protocol::Ethereum].source, Source::Live("CoinGecko"));
        assert_eq!(overview[&Protocol::Base].source, Source::Live("CoinGecko"));
        assert!(overview[&Protocol::Tron].source.is_fallback());
        assert_eq!(overview[&Protocol::Tron].value.price_usd, 0.08);
        assert!(overview[&Protocol::Bitcoin].source.is_fallback());
        assert!(service.cache().read::<MarketData>("market:tron").is_none());
        assert!(service.cache().read::<MarketData>("market:bitcoin").is_none());

        let table = format::market_table(&overview, &[]);
        assert!(table.contains("Static estimates"), "{}", table);
        assert!(table.contains("CoinGecko"), "{}", table);

        // Live TronGrid rate, but priced with a default TRX price
        let fees = service.all_network_fees().await;
        let tron = &fees[3];
        assert_eq!(tron.value.protocol, Protocol::Tron);
        assert!(tron.source.is_fallback());

        let again = service.market_overview().await;
        assert_eq!(again[&Protocol::Ethereum].source, Source::Cache);
        assert!(again[&Protocol::Tron].source.is_fallback());
    }

    #[tokio::test]
    async fn test_everything_down_uses_defaults_and_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/simple/price"))
            .respond_with(ResponseTemplate::new(503))
            .expect(2)
            .mount(&server)
            .await;
        let service = service_for(&server, ApiKeys::default());

        let first = service.market(Protocol::Ethereum).await;
        assert!(first.source.is_fallback());
        assert_eq!(first.value.price_usd, 2000.0);

        let second = service.market(Protocol::Ethereum).await;
        assert!(second.source.is_fallback(), "defaults must not be cached");
    }

    #[tokio::test]
    async fn test_ethereum_fees_without_keys_fall_back() {
        let server = MockServer::start().await;
        mount_prices(&server, 1).await;
        let service = service_for(&server, ApiKeys::default());

        let fees = service.network_fees(Protocol::Ethereum).await;
        assert_eq!(fees.source, Source::Fallback);
        assert_eq!(fees.value.rate, default_rate(Protocol::Ethereum));
        // 12 gwei * 21000 at $2500
        assert!((fees.value.avg_fee_usd - 0.63).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_tron_fees_live() {
        let server = MockServer::start().await;
        mount_prices(&server, 1).await;
        Mock::given(method("POST"))
            .and(path("/wallet/getchainparameters"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "chainParameter": [{"key": "getTransactionFee", "value": 1000}]
            })))
            .expect(1)
            .mount(&server)
            .await;
        let service = service_for(&server, ApiKeys::default());

        let fees = service.network_fees(Protocol::Tron).await;
        assert_eq!(fees.source, Source::Live("TronGrid"));
        // 268 bytes * 1000 sun = 0.268 TRX at $0.20
        assert!((fees.value.avg_fee_usd - 0.0536).abs() < 1e-9);

        let again = service.network_fees(Protocol::Tron).await;
        assert_eq!(again.source, Source::Cache);
    }

    #[tokio::test]
    async fn test_fees_priced_with_default_market_are_estimates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bitcoin/stats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"suggested_transaction_fee_per_byte_sat": 10}
            })))
            .mount(&server)
            .await;
        let service = service_for(&server, ApiKeys::default());

        let fees = service.network_fees(Protocol::Bitcoin).await;
        assert!(fees.source.is_fallback());
        // Rate is live even though the price is not
        assert_eq!(fees.value.rate, FeeRate::SatPerByte { sat: 10.0 });
    }

    #[tokio::test]
    async fn test_all_network_fees_batches_market_call() {
        let server = MockServer::start().await;
        mount_prices(&server, 1).await;
        let service = service_for(&server, ApiKeys::default());

        let fees = service.all_network_fees().await;
        let protocols: Vec<_> = fees.iter().map(|f| f.value.protocol).collect();
        assert_eq!(protocols, Protocol::ALL.to_vec());

        let base = &fees[4];
        assert_eq!(base.value.avg_fee_usd, 0.15);
        assert!(base.source.is_fallback());
    }

    #[tokio::test]
    async fn test_bsc_fees_with_key() {
        let server = MockServer::start().await;
        mount_prices(&server, 1).await;
        Mock::given(method("GET"))
            .and(path("/bscscan"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "1",
                "message": "OK",
                "result": {"SafeGasPrice": "1", "ProposeGasPrice": "1", "FastGasPrice": "3"}
            })))
            .mount(&server)
            .await;
        let keys = ApiKeys {
            bscscan: Some("k".to_string()),
            ..ApiKeys::default()
        };
        let service = service_for(&server, keys);

        let fees = service.network_fees(Protocol::BnbChain).await;
        assert_eq!(fees.source, Source::Live("BscScan"));
        // 1 gwei * 21000 at $600
        assert!((fees.value.avg_fee_usd - 0.0126).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_governance_falls_back_per_protocol() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/ethereum/EIPs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "stargazers_count": 12000,
                "forks_count": 5000,
                "subscribers_count": 500,
                "open_issues_count": 100
            })))
            .mount(&server)
            .await;
        let service = service_for(&server, ApiKeys::default());

        let all = service.all_governance().await;
        assert_eq!(all.len(), 5);

        let (protocol, eth) = &all[0];
        assert_eq!(*protocol, Protocol::Ethereum);
        assert_eq!(eth.source, Source::Live("GitHub"));
        assert_eq!(eth.value.stars, 12000);

        let (_, btc) = &all[1];
        assert!(btc.source.is_fallback());
        assert_eq!(btc.value, GovernanceData::fallback("bitcoin/bips"));

        assert!(service.cache().get_fresh::<GovernanceData>("governance:ethereum").is_some());
        assert!(service.cache().get_fresh::<GovernanceData>("governance:bitcoin").is_none());
    }
}
