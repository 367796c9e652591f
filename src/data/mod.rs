//! Core data models for L1 Chat
//!
//! This module contains the protocol registry, the upstream API clients, and
//! the data types passed from the clients through the cache to the
//! Markdown formatter.

pub mod gas;
pub mod governance;
mod http;
pub mod market;
pub mod protocol;
pub mod service;

pub use gas::GasClient;
pub use governance::GovernanceClient;
pub use http::build_client;
pub use market::MarketClient;
pub use protocol::{all_protocols, Layer, Protocol, ProtocolInfo};
pub use service::MetricsService;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when calling an upstream API
///
/// These never reach the chat user: the fallback chain logs them and moves
/// on to the next provider or the static default.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// The API reported an error in its response body
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Missing expected field in response
    #[error("Missing expected field in response: {0}")]
    MissingField(String),

    /// The provider needs an API key that was not configured
    #[error("No API key configured for {0}")]
    MissingApiKey(&'static str),
}

/// Market data for one coin, in USD
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketData {
    pub price_usd: f64,
    pub market_cap_usd: f64,
    pub volume_24h_usd: f64,
    /// Price change over 24 hours, in percent
    pub change_24h_pct: f64,
}

/// Recommended gas prices in gwei
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GasOracle {
    pub safe: f64,
    pub standard: f64,
    pub fast: f64,
}

/// Network fee rate in the chain's native pricing unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "unit", rename_all = "snake_case")]
pub enum FeeRate {
    /// EVM gas price levels
    Gwei(GasOracle),
    /// Tron bandwidth price
    SunPerByte { sun: u64 },
    /// Bitcoin fee rate
    SatPerByte { sat: f64 },
    /// Chains without a fee oracle, quoted directly in USD
    FlatUsd { usd: f64 },
}

/// Gas units for a plain value transfer on EVM chains
pub const EVM_TRANSFER_GAS: f64 = 21_000.0;

/// Bandwidth bytes consumed by a TRX transfer
pub const TRON_TRANSFER_BYTES: f64 = 268.0;

/// Virtual size of a typical Bitcoin transaction
pub const BITCOIN_TX_VBYTES: f64 = 250.0;

impl FeeRate {
    /// Cost of a simple transfer in USD, given the native token price
    pub fn transfer_cost_usd(&self, native_price_usd: f64) -> f64 {
        match self {
            FeeRate::Gwei(oracle) => oracle.standard * EVM_TRANSFER_GAS * native_price_usd / 1e9,
            FeeRate::SunPerByte { sun } => {
                *sun as f64 * TRON_TRANSFER_BYTES / 1e6 * native_price_usd
            }
            FeeRate::SatPerByte { sat } => sat * BITCOIN_TX_VBYTES / 1e8 * native_price_usd,
            FeeRate::FlatUsd { usd } => *usd,
        }
    }

    pub fn gas_oracle(&self) -> Option<&GasOracle> {
        match self {
            FeeRate::Gwei(oracle) => Some(oracle),
            _ => None,
        }
    }
}

/// Network congestion derived from the standard gas price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Congestion {
    Low,
    Medium,
    High,
}

impl Congestion {
    pub fn from_gwei(standard: f64) -> Self {
        if standard > 50.0 {
            Congestion::High
        } else if standard > 20.0 {
            Congestion::Medium
        } else {
            Congestion::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Congestion::Low => "Low",
            Congestion::Medium => "Medium",
            Congestion::High => "High",
        }
    }
}

/// Current transfer cost on one protocol
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkFees {
    pub protocol: Protocol,
    pub rate: FeeRate,
    pub avg_fee_usd: f64,
    pub congestion: Option<Congestion>,
}

impl NetworkFees {
    pub fn from_rate(protocol: Protocol, rate: FeeRate, native_price_usd: f64) -> Self {
        Self {
            protocol,
            rate,
            avg_fee_usd: rate.transfer_cost_usd(native_price_usd),
            congestion: rate.gas_oracle().map(|g| Congestion::from_gwei(g.standard)),
        }
    }
}

/// Development activity of a protocol's improvement-proposal repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernanceData {
    /// GitHub repository, `owner/name`
    pub repo: String,
    pub stars: u64,
    pub forks: u64,
    pub watchers: u64,
    pub open_issues: u64,
    pub commits_30d: Option<u64>,
    pub proposal_commits_30d: Option<u64>,
    pub contributors_30d: Option<u64>,
    pub total_contributors: Option<u64>,
    pub total_contributions: Option<u64>,
    /// Newest proposal commits first
    #[serde(default)]
    pub recent_proposals: Vec<ProposalCommit>,
    /// Largest contributors first
    #[serde(default)]
    pub top_contributors: Vec<Contributor>,
}

/// A recent commit touching improvement proposals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalCommit {
    /// First line of the commit message
    pub title: String,
    pub author: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub sha: String,
}

impl ProposalCommit {
    /// Link to the commit on GitHub
    pub fn url(&self, repo: &str) -> String {
        format!("https://github.com/{}/commit/{}", repo, self.sha)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    pub login: String,
    pub contributions: u64,
}

/// Coarse development activity bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityLevel {
    High,
    Medium,
    Low,
    Unknown,
}

impl ActivityLevel {
    pub fn label(&self) -> &'static str {
        match self {
            ActivityLevel::High => "High",
            ActivityLevel::Medium => "Medium",
            ActivityLevel::Low => "Low",
            ActivityLevel::Unknown => "Unknown",
        }
    }
}

impl GovernanceData {
    /// Conservative placeholder used when GitHub is unreachable
    pub fn fallback(repo: &str) -> Self {
        Self {
            repo: repo.to_string(),
            stars: 1000,
            forks: 500,
            watchers: 100,
            open_issues: 50,
            commits_30d: None,
            proposal_commits_30d: None,
            contributors_30d: None,
            total_contributors: None,
            total_contributions: None,
            recent_proposals: Vec::new(),
            top_contributors: Vec::new(),
        }
    }

    /// Recent commits, with proposal-related commits weighted double, capped at 100
    pub fn activity_score(&self) -> Option<u8> {
        let commits = self.commits_30d?;
        let proposals = self.proposal_commits_30d.unwrap_or(0);
        Some(commits.saturating_add(proposals.saturating_mul(2)).min(100) as u8)
    }

    pub fn activity_level(&self) -> ActivityLevel {
        match self.activity_score() {
            Some(score) if score > 50 => ActivityLevel::High,
            Some(score) if score > 20 => ActivityLevel::Medium,
            Some(_) => ActivityLevel::Low,
            None => ActivityLevel::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn governance(commits: Option<u64>, proposals: Option<u64>) -> GovernanceData {
        GovernanceData {
            commits_30d: commits,
            proposal_commits_30d: proposals,
            ..GovernanceData::fallback("ethereum/EIPs")
        }
    }

    #[test]
    fn test_evm_transfer_cost() {
        let rate = FeeRate::Gwei(GasOracle {
            safe: 8.0,
            standard: 10.0,
            fast: 15.0,
        });
        // 10 gwei * 21000 gas = 0.00021 ETH at $2000
        assert!((rate.transfer_cost_usd(2000.0) - 0.42).abs() < 1e-9);
    }

    #[test]
    fn test_tron_transfer_cost() {
        let rate = FeeRate::SunPerByte { sun: 1000 };
        // 268 bytes * 1000 sun = 0.268 TRX at $0.10
        assert!((rate.transfer_cost_usd(0.10) - 0.0268).abs() < 1e-9);
    }

    #[test]
    fn test_bitcoin_transfer_cost() {
        let rate = FeeRate::SatPerByte { sat: 20.0 };
        // 250 vbytes * 20 sat = 5000 sat at $30000
        assert!((rate.transfer_cost_usd(30_000.0) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_flat_fee_ignores_price() {
        let rate = FeeRate::FlatUsd { usd: 0.15 };
        assert_eq!(rate.transfer_cost_usd(123_456.0), 0.15);
    }

    #[test]
    fn test_proposal_commit_url() {
        let commit = ProposalCommit {
            title: "Add EIP-7702".to_string(),
            author: None,
            date: None,
            sha: "abc123".to_string(),
        };
        assert_eq!(
            commit.url("ethereum/EIPs"),
            "https://github.com/ethereum/EIPs/commit/abc123"
        );
    }

    #[test]
    fn test_governance_cached_before_proposal_lists_still_loads() {
        let json = serde_json::json!({
            "repo": "bitcoin/bips",
            "stars": 1, "forks": 2, "watchers": 3, "open_issues": 4,
            "commits_30d": null, "proposal_commits_30d": null, "contributors_30d": null,
            "total_contributors": null, "total_contributions": null
        });
        let data: GovernanceData = serde_json::from_value(json).unwrap();
        assert!(data.recent_proposals.is_empty());
        assert!(data.top_contributors.is_empty());
    }

    #[test]
    fn test_congestion_thresholds() {
        assert_eq!(Congestion::from_gwei(5.0), Congestion::Low);
        assert_eq!(Congestion::from_gwei(20.0), Congestion::Low);
        assert_eq!(Congestion::from_gwei(20.5), Congestion::Medium);
        assert_eq!(Congestion::from_gwei(50.0), Congestion::Medium);
        assert_eq!(Congestion::from_gwei(51.0), Congestion::High);
    }

    #[test]
    fn test_network_fees_congestion_only_for_gas_chains() {
        let evm = NetworkFees::from_rate(
            Protocol::Ethereum,
            FeeRate::Gwei(GasOracle {
                safe: 50.0,
                standard: 60.0,
                fast: 80.0,
            }),
            2000.0,
        );
        assert_eq!(evm.congestion, Some(Congestion::High));

        let tron = NetworkFees::from_rate(Protocol::Tron, FeeRate::SunPerByte { sun: 1000 }, 0.1);
        assert!(tron.congestion.is_none());
    }

    #[test]
    fn test_fee_rate_serialization_is_tagged() {
        let json = serde_json::to_string(&FeeRate::SunPerByte { sun: 1000 }).unwrap();
        assert!(json.contains("\"unit\":\"sun_per_byte\""));

        let rate: FeeRate =
            serde_json::from_str(r#"{"unit":"gwei","safe":1.0,"standard":2.0,"fast":3.0}"#)
                .unwrap();
        assert_eq!(rate.gas_oracle().map(|g| g.standard), Some(2.0));
    }

    #[test]
    fn test_activity_score_weights_proposals() {
        assert_eq!(governance(Some(10), Some(5)).activity_score(), Some(20));
        assert_eq!(governance(Some(90), Some(30)).activity_score(), Some(100));
        assert_eq!(governance(Some(10), None).activity_score(), Some(10));
        assert_eq!(governance(None, Some(5)).activity_score(), None);
    }

    #[test]
    fn test_activity_levels() {
        assert_eq!(governance(Some(60), Some(0)).activity_level(), ActivityLevel::High);
        assert_eq!(governance(Some(30), Some(0)).activity_level(), ActivityLevel::Medium);
        assert_eq!(governance(Some(20), Some(0)).activity_level(), ActivityLevel::Low);
        assert_eq!(governance(None, None).activity_level(), ActivityLevel::Unknown);
    }

    #[test]
    fn test_governance_fallback_values() {
        let data = GovernanceData::fallback("bitcoin/bips");
        assert_eq!(data.repo, "bitcoin/bips");
        assert_eq!(data.stars, 1000);
        assert_eq!(data.forks, 500);
        assert!(data.activity_score().is_none());
    }
}
