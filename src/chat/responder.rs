//! Turns a chat message into a Markdown answer

use futures::future::join_all;

use super::classifier::{classify, Intent};
use crate::cache::Sourced;
use crate::data::{GovernanceData, MetricsService, Protocol};
use crate::format;

/// An answer ready to show in the transcript
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub intent: Intent,
    pub markdown: String,
}

/// Answers questions using the metrics service
///
/// Never fails: every data source behind it falls back to a static value.
#[derive(Debug, Clone)]
pub struct ChatAgent {
    metrics: MetricsService,
}

impl ChatAgent {
    pub fn new(metrics: MetricsService) -> Self {
        Self { metrics }
    }

    pub fn metrics(&self) -> &MetricsService {
        &self.metrics
    }

    pub async fn respond(&self, input: &str) -> Reply {
        let query = classify(input);
        tracing::info!(intent = ?query.intent, protocols = ?query.protocols, "answering question");

        let markdown = match query.intent {
            Intent::UseCase(use_case) => format::use_case_template(use_case).to_string(),
            Intent::Help => format::help_text().to_string(),
            Intent::Fees => {
                let fees = self.metrics.all_network_fees().await;
                format::fee_comparison(&fees, &query.protocols)
            }
            Intent::Gas => {
                let fees = self.metrics.all_network_fees().await;
                format::gas_table(&fees, &query.protocols)
            }
            Intent::Market => {
                let overview = self.metrics.market_overview().await;
                format::market_table(&overview, &query.protocols)
            }
            Intent::Governance => {
                format::governance_table(&self.governance_entries(&query.protocols).await)
            }
            Intent::LatestProposals => {
                format::latest_proposals(&self.governance_entries(&query.protocols).await)
            }
            Intent::Performance => format::tps_ranking(&query.protocols),
            Intent::ProtocolDetail => {
                let cards = join_all(query.protocols.iter().map(|p| self.protocol_card(*p))).await;
                cards.join("\n\n---\n\n")
            }
        };

        Reply {
            intent: query.intent,
            markdown,
        }
    }

    /// Governance for the named protocols, or all of them when none are named
    async fn governance_entries(
        &self,
        protocols: &[Protocol],
    ) -> Vec<(Protocol, Sourced<GovernanceData>)> {
        if protocols.is_empty() {
            return self.metrics.all_governance().await;
        }
        let results = join_all(protocols.iter().map(|p| self.metrics.governance(*p))).await;
        protocols.iter().copied().zip(results).collect()
    }

    async fn protocol_card(&self, protocol: Protocol) -> String {
        let (market, fees, governance) = futures::join!(
            self.metrics.market(protocol),
            self.metrics.network_fees(protocol),
            self.metrics.governance(protocol)
        );
        format::protocol_detail(protocol, &market, &fees, &governance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheManager;
    use crate::chat::UseCase;
    use crate::config::Config;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Agent pointed at a mock server with nothing mounted, so every
    /// upstream call fails and static defaults are used
    async fn offline_agent() -> (MockServer, ChatAgent) {
        let server = MockServer::start().await;
        let config = Config::for_base_url(&server.uri());
        let metrics =
            MetricsService::with_cache(&config, CacheManager::new(), reqwest::Client::new());
        (server, ChatAgent::new(metrics))
    }

    #[tokio::test]
    async fn test_use_case_reply_needs_no_data() {
        let (server, agent) = offline_agent().await;
        let reply = agent.respond("best chain for gaming").await;

        assert_eq!(reply.intent, Intent::UseCase(UseCase::Gaming));
        assert!(reply.markdown.contains("Gaming"));
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn test_fee_reply_with_everything_down() {
        let (_server, agent) = offline_agent().await;
        let reply = agent.respond("which chain has the lowest fees?").await;

        assert_eq!(reply.intent, Intent::Fees);
        assert!(reply.markdown.contains("Transaction Fee Comparison"));
        // Tron default: 1000 sun * 268 bytes at $0.08
        assert!(reply.markdown.contains("| 🥇 | **Tron (TRX)** | **$0.021**"));
        assert!(reply.markdown.contains("_Data: static estimates only._"));
    }

    #[tokio::test]
    async fn test_governance_reply_for_named_protocol() {
        let (_server, agent) = offline_agent().await;
        let reply = agent.respond("BIP activity for bitcoin").await;

        assert_eq!(reply.intent, Intent::Governance);
        assert!(reply.markdown.contains("Bitcoin (BTC)"));
        assert!(!reply.markdown.contains("Ethereum (ETH)"));
    }

    #[tokio::test]
    async fn test_latest_proposals_reply_lists_commits() {
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
        Mock::given(method("GET"))
            .and(path("/repos/ethereum/EIPs/commits"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "sha": "1234567890",
                    "commit": {
                        "message": "Update EIP-7702: Move to Final\n\nDetails",
                        "author": {"name": "Alice", "date": "2024-05-01T12:00:00Z"}
                    },
                    "author": {"login": "alice"}
                },
                {
                    "sha": "abcdef0000",
                    "commit": {"message": "CI: bump action", "author": {"name": "Bot"}},
                    "author": null
                }
            ])))
            .mount(&server)
            .await;
        let config = Config::for_base_url(&server.uri());
        let metrics =
            MetricsService::with_cache(&config, CacheManager::new(), reqwest::Client::new());
        let agent = ChatAgent::new(metrics);

        let reply = agent.respond("latest EIPs").await;

        assert_eq!(reply.intent, Intent::LatestProposals);
        assert!(reply.markdown.contains(
            "- **Update EIP-7702: Move to Final** by alice on 2024-05-01 \
             ([1234567](https://github.com/ethereum/EIPs/commit/1234567890))"
        ));
        assert!(!reply.markdown.contains("bump action"));
        assert!(!reply.markdown.contains("Bitcoin"));
    }

    #[tokio::test]
    async fn test_latest_proposals_offline() {
        let (_server, agent) = offline_agent().await;
        let reply = agent.respond("recent BIPs for bitcoin").await;

        assert_eq!(reply.intent, Intent::LatestProposals);
        assert!(reply.markdown.contains("[BIPs](https://github.com/bitcoin/bips)"));
        assert!(reply.markdown.contains("Commit history unavailable right now."));
        assert!(reply.markdown.contains("_Data: static estimates only._"));
    }

    #[tokio::test]
    async fn test_performance_reply_needs_no_network() {
        let (server, agent) = offline_agent().await;
        let reply = agent.respond("which chain has the highest tps?").await;

        assert_eq!(reply.intent, Intent::Performance);
        assert!(reply.markdown.contains("Throughput Ranking"));
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn test_protocol_detail_cards() {
        let (_server, agent) = offline_agent().await;
        let reply = agent.respond("tell me about eth and base").await;

        assert_eq!(reply.intent, Intent::ProtocolDetail);
        assert!(reply.markdown.contains("## 🔎 Ethereum (ETH)"));
        assert!(reply.markdown.contains("## 🔎 Base (ETH)"));
        assert!(reply.markdown.contains("\n---\n"));
    }

    #[tokio::test]
    async fn test_unknown_question_gets_help() {
        let (_server, agent) = offline_agent().await;
        let reply = agent.respond("hello there").await;

        assert_eq!(reply.intent, Intent::Help);
        assert_eq!(reply.markdown, format::help_text());
    }
}
