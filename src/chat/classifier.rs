//! Keyword-based query classification
//!
//! Questions are matched against fixed keyword groups in precedence order;
//! the first group with a hit decides the intent. A governance question that
//! also asks for recent items becomes `LatestProposals`.

use crate::data::Protocol;

/// Audience-specific questions answered from a template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UseCase {
    Gaming,
    Payments,
    Enterprise,
}

/// What the user is asking for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    UseCase(UseCase),
    Governance,
    /// Newest proposal commits per repository
    LatestProposals,
    Gas,
    Fees,
    /// Throughput ranking from the protocol profiles
    Performance,
    Market,
    ProtocolDetail,
    Help,
}

/// A classified question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub intent: Intent,
    /// Protocols named in the question, in registry order. For governance
    /// questions a proposal prefix such as `BIP` also names its protocol.
    pub protocols: Vec<Protocol>,
}

/// How a keyword is matched against the lower-cased input
#[derive(Debug, Clone, Copy)]
enum Keyword {
    /// Anywhere in the text
    Sub(&'static str),
    /// As a whole word; a plural `s` or trailing digits are allowed
    Word(&'static str),
}

impl Keyword {
    fn matches(&self, text: &str) -> bool {
        match self {
            Keyword::Sub(k) => text.contains(k),
            Keyword::Word(k) => contains_word_prefix(text, k),
        }
    }
}

use Keyword::{Sub, Word};

const GAMING: &[Keyword] = &[Sub("gaming"), Sub("game"), Sub("nft")];
const PAYMENTS: &[Keyword] = &[Sub("payment"), Sub("transfer"), Sub("send"), Sub("money")];
const ENTERPRISE: &[Keyword] = &[
    Sub("enterprise"),
    Sub("business"),
    Sub("institutional"),
    Sub("company"),
];
const GOVERNANCE: &[Keyword] = &[
    Sub("governance"),
    Sub("proposal"),
    Word("eip"),
    Word("bip"),
    Word("bep"),
    Word("tip"),
    Word("sup"),
    Sub("github"),
    Sub("commit"),
    Sub("contributor"),
    Sub("development"),
];
const GAS: &[Keyword] = &[Word("gas"), Sub("gwei")];
const FEES: &[Keyword] = &[Sub("fee"), Sub("cheap"), Sub("cost"), Sub("lowest")];
const PERFORMANCE: &[Keyword] = &[
    Word("tps"),
    Sub("throughput"),
    Sub("fastest"),
    Sub("speed"),
    Sub("performance"),
    Sub("scalab"),
];
const MARKET: &[Keyword] = &[
    Sub("price"),
    Sub("market"),
    Word("cap"),
    Sub("volume"),
    Sub("worth"),
];

/// Turns a governance question into `LatestProposals`
const RECENCY: &[Keyword] = &[Sub("latest"), Sub("newest"), Sub("recent"), Word("new")];

/// Keyword groups in precedence order
const RULES: [(&[Keyword], Intent); 8] = [
    (GAMING, Intent::UseCase(UseCase::Gaming)),
    (PAYMENTS, Intent::UseCase(UseCase::Payments)),
    (ENTERPRISE, Intent::UseCase(UseCase::Enterprise)),
    (GOVERNANCE, Intent::Governance),
    (GAS, Intent::Gas),
    (FEES, Intent::Fees),
    (PERFORMANCE, Intent::Performance),
    (MARKET, Intent::Market),
];

/// Word match that still accepts `eips` and `eip1559` for `eip`
fn contains_word_prefix(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let rest = &haystack[start + needle.len()..];
        let after = rest.strip_prefix('s').unwrap_or(rest).chars().next();
        !before.is_some_and(|c| c.is_alphanumeric()) && !after.is_some_and(|c| c.is_alphabetic())
    })
}

fn matches_any(keywords: &[Keyword], text: &str) -> bool {
    keywords.iter().any(|k| k.matches(text))
}

/// Protocols whose proposal prefix (`eip`, `bip`, ...) appears in the text
fn proposal_protocols(text: &str) -> Vec<Protocol> {
    Protocol::ALL
        .into_iter()
        .filter(|p| contains_word_prefix(text, &p.info().proposal_prefix.to_lowercase()))
        .collect()
}

/// Classifies a chat message
pub fn classify(input: &str) -> Query {
    let text = input.trim().to_lowercase();
    let mut protocols = Protocol::mentioned_in(&text);

    let mut intent = RULES
        .iter()
        .find(|(keywords, _)| matches_any(keywords, &text))
        .map(|(_, intent)| *intent)
        .unwrap_or(if protocols.is_empty() {
            Intent::Help
        } else {
            Intent::ProtocolDetail
        });

    if intent == Intent::Governance {
        if matches_any(RECENCY, &text) {
            intent = Intent::LatestProposals;
        }
        if protocols.is_empty() {
            protocols = proposal_protocols(&text);
        }
    }

    Query { intent, protocols }
}
