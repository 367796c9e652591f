//! Static registry of the supported protocols
//!
//! Holds per-protocol constants that do not come from any API: display
//! names, CoinGecko ids, network profile figures, and the GitHub repository
//! where each protocol's improvement proposals live.

use serde::{Deserialize, Serialize};

/// The five supported protocols
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    Ethereum,
    Bitcoin,
    BnbChain,
    Tron,
    Base,
}

/// Base layer or rollup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    L1,
    L2,
}

impl Layer {
    pub fn label(&self) -> &'static str {
        match self {
            Layer::L1 => "L1",
            Layer::L2 => "L2",
        }
    }
}

/// Static facts about a protocol
#[derive(Debug, Clone, Copy)]
pub struct ProtocolInfo {
    pub protocol: Protocol,
    /// Stable identifier used in cache keys
    pub id: &'static str,
    /// Human-readable name
    pub name: &'static str,
    /// Short name used in table rows
    pub short_name: &'static str,
    /// Ticker of the token used to pay fees
    pub symbol: &'static str,
    /// CoinGecko coin id of the fee token
    pub coingecko_id: &'static str,
    pub layer: Layer,
    pub consensus: &'static str,
    /// Time to practical finality, in seconds
    pub finality_secs: f64,
    /// Sustained throughput ceiling, in transactions per second
    pub max_tps: u32,
    /// Security rating out of 100
    pub security_score: u8,
    pub best_use_case: &'static str,
    /// Improvement-proposal repository on GitHub, `owner/name`
    pub governance_repo: &'static str,
    /// Proposal series name (EIP, BIP, ...)
    pub proposal_prefix: &'static str,
    /// Lower-case words that refer to this protocol in chat input
    pub aliases: &'static [&'static str],
}

/// Static array of all supported protocols, in display order
pub static PROTOCOLS: [ProtocolInfo; 5] = [
    ProtocolInfo {
        protocol: Protocol::Ethereum,
        id: "ethereum",
        name: "Ethereum",
        short_name: "Ethereum",
        symbol: "ETH",
        coingecko_id: "ethereum",
        layer: Layer::L1,
        consensus: "Proof of Stake",
        finality_secs: 768.0,
        max_tps: 15,
        security_score: 98,
        best_use_case: "Smart Contracts",
        governance_repo: "ethereum/EIPs",
        proposal_prefix: "EIP",
        aliases: &["ethereum", "eth", "ether"],
    },
    ProtocolInfo {
        protocol: Protocol::Bitcoin,
        id: "bitcoin",
        name: "Bitcoin",
        short_name: "Bitcoin",
        symbol: "BTC",
        coingecko_id: "bitcoin",
        layer: Layer::L1,
        consensus: "Proof of Work",
        finality_secs: 3600.0,
        max_tps: 7,
        security_score: 100,
        best_use_case: "Store of Value",
        governance_repo: "bitcoin/bips",
        proposal_prefix: "BIP",
        aliases: &["bitcoin", "btc"],
    },
    ProtocolInfo {
        protocol: Protocol::BnbChain,
        id: "bnb",
        name: "BNB Smart Chain",
        short_name: "BSC",
        symbol: "BNB",
        coingecko_id: "binancecoin",
        layer: Layer::L1,
        consensus: "Proof of Staked Authority",
        finality_secs: 3.0,
        max_tps: 2100,
        security_score: 82,
        best_use_case: "High Volume Apps",
        governance_repo: "bnb-chain/BEPs",
        proposal_prefix: "BEP",
        aliases: &["bnb", "bsc", "binance", "smart chain"],
    },
    ProtocolInfo {
        protocol: Protocol::Tron,
        id: "tron",
        name: "Tron",
        short_name: "Tron",
        symbol: "TRX",
        coingecko_id: "tron",
        layer: Layer::L1,
        consensus: "Delegated Proof of Stake",
        finality_secs: 3.0,
        max_tps: 2000,
        security_score: 78,
        best_use_case: "Microtransactions",
        governance_repo: "tronprotocol/tips",
        proposal_prefix: "TIP",
        aliases: &["tron", "trx"],
    },
    ProtocolInfo {
        protocol: Protocol::Base,
        id: "base",
        name: "Base",
        short_name: "Base",
        symbol: "ETH",
        coingecko_id: "ethereum",
        layer: Layer::L2,
        consensus: "Optimistic Rollup",
        finality_secs: 2.0,
        max_tps: 350,
        security_score: 92,
        best_use_case: "Consumer Apps",
        governance_repo: "ethereum-optimism/SUPs",
        proposal_prefix: "SUP",
        aliases: &["base"],
    },
];

/// Get all supported protocols in display order
pub fn all_protocols() -> &'static [ProtocolInfo] {
    &PROTOCOLS
}

impl Protocol {
    pub const ALL: [Protocol; 5] = [
        Protocol::Ethereum,
        Protocol::Bitcoin,
        Protocol::BnbChain,
        Protocol::Tron,
        Protocol::Base,
    ];

    /// Static facts for this protocol
    pub fn info(&self) -> &'static ProtocolInfo {
        match self {
            Protocol::Ethereum => &PROTOCOLS[0],
            Protocol::Bitcoin => &PROTOCOLS[1],
            Protocol::BnbChain => &PROTOCOLS[2],
            Protocol::Tron => &PROTOCOLS[3],
            Protocol::Base => &PROTOCOLS[4],
        }
    }

    pub fn id(&self) -> &'static str {
        self.info().id
    }

    /// Table label such as "Tron (TRX)"
    pub fn label(&self) -> String {
        let info = self.info();
        format!("{} ({})", info.short_name, info.symbol)
    }

    /// Looks up a protocol by id, name, ticker, or alias (case-insensitive)
    pub fn from_alias(s: &str) -> Option<Protocol> {
        let needle = s.trim().to_lowercase();
        PROTOCOLS
            .iter()
            .find(|info| {
                info.id == needle
                    || info.name.to_lowercase() == needle
                    || info.aliases.contains(&needle.as_str())
            })
            .map(|info| info.protocol)
    }

    /// Protocols mentioned anywhere in free text, in registry order
    pub fn mentioned_in(text: &str) -> Vec<Protocol> {
        let lower = text.to_lowercase();
        PROTOCOLS
            .iter()
            .filter(|info| info.aliases.iter().any(|alias| contains_word(&lower, alias)))
            .map(|info| info.protocol)
            .collect()
    }
}

/// True if `needle` occurs in `haystack` with no letters or digits directly
/// around it. Both arguments are expected to be lower-case.
pub fn contains_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        !before.is_some_and(|c| c.is_alphanumeric()) && !after.is_some_and(|c| c.is_alphanumeric())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_order_matches_all() {
        for (info, protocol) in all_protocols().iter().zip(Protocol::ALL) {
            assert_eq!(info.protocol, protocol);
            assert_eq!(protocol.info().id, info.id);
        }
    }

    #[test]
    fn test_ids_are_unique() {
        let mut ids: Vec<_> = all_protocols().iter().map(|p| p.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), all_protocols().len());
    }

    #[test]
    fn test_base_is_priced_in_eth() {
        let base = Protocol::Base.info();
        assert_eq!(base.layer, Layer::L2);
        assert_eq!(base.symbol, "ETH");
        assert_eq!(base.coingecko_id, Protocol::Ethereum.info().coingecko_id);
    }

    #[test]
    fn test_from_alias() {
        assert_eq!(Protocol::from_alias("ETH"), Some(Protocol::Ethereum));
        assert_eq!(Protocol::from_alias("Bitcoin"), Some(Protocol::Bitcoin));
        assert_eq!(Protocol::from_alias("bsc"), Some(Protocol::BnbChain));
        assert_eq!(Protocol::from_alias("binance"), Some(Protocol::BnbChain));
        assert_eq!(Protocol::from_alias("BNB Smart Chain"), Some(Protocol::BnbChain));
        assert_eq!(Protocol::from_alias(" trx "), Some(Protocol::Tron));
        assert_eq!(Protocol::from_alias("base"), Some(Protocol::Base));
        assert_eq!(Protocol::from_alias("solana"), None);
    }

    #[test]
    fn test_mentioned_in_uses_word_boundaries() {
        assert_eq!(
            Protocol::mentioned_in("Compare Tron vs ETH fees"),
            vec![Protocol::Ethereum, Protocol::Tron]
        );
        // "database" contains "base" and "method" contains "eth"
        assert!(Protocol::mentioned_in("which database method").is_empty());
        assert_eq!(Protocol::mentioned_in("bitcoin?"), vec![Protocol::Bitcoin]);
    }

    #[test]
    fn test_label() {
        assert_eq!(Protocol::BnbChain.label(), "BSC (BNB)");
        assert_eq!(Protocol::Base.label(), "Base (ETH)");
    }

    #[test]
    fn test_contains_word() {
        assert!(contains_word("gas on eth", "eth"));
        assert!(contains_word("eth-usd", "eth"));
        assert!(!contains_word("ethereal", "eth"));
        assert!(!contains_word("anything", ""));
    }
}
