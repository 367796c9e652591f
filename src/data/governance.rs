//! GitHub client for improvement-proposal repository activity

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use std::collections::HashSet;

use super::http::fetch_json;
use super::{Contributor, FetchError, GovernanceData, ProposalCommit, ProtocolInfo};
use crate::config::Config;

/// Window for "recent" development activity
const ACTIVITY_WINDOW_DAYS: i64 = 30;

/// GitHub's maximum page size
const PAGE_SIZE: &str = "100";

/// Words in a commit message that mark it as proposal work
const PROPOSAL_KEYWORDS: [&str; 3] = ["proposal", "draft", "final"];

/// Proposal commits kept for listing
const RECENT_PROPOSALS_LIMIT: usize = 10;

/// Contributors kept for listing
const TOP_CONTRIBUTORS_LIMIT: usize = 10;

#[derive(Debug, Deserialize)]
struct RepoResponse {
    stargazers_count: u64,
    forks_count: u64,
    #[serde(default)]
    subscribers_count: u64,
    open_issues_count: u64,
}

#[derive(Debug, Deserialize)]
struct CommitItem {
    #[serde(default)]
    sha: String,
    commit: CommitDetail,
    author: Option<GitHubUser>,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    message: String,
    author: Option<CommitAuthor>,
}

#[derive(Debug, Deserialize)]
struct CommitAuthor {
    name: Option<String>,
    date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct GitHubUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct ContributorItem {
    // Anonymous contributors have no login
    login: Option<String>,
    contributions: u64,
}

/// Summary of the last 30 days of commits
///
/// GitHub lists commits newest first, so `recent_proposals` keeps that order.
#[derive(Debug, Clone, PartialEq)]
struct CommitActivity {
    commits: u64,
    proposal_commits: u64,
    authors: u64,
    recent_proposals: Vec<ProposalCommit>,
}

/// Contributor totals over the repository's lifetime
#[derive(Debug, Clone, PartialEq, Eq)]
struct ContributorStats {
    count: u64,
    contributions: u64,
    top: Vec<Contributor>,
}

/// Client for fetching repository statistics from GitHub
#[derive(Debug, Clone)]
pub struct GovernanceClient {
    http_client: Client,
    base_url: String,
    token: Option<String>,
}

impl GovernanceClient {
    pub fn new(http_client: Client, config: &Config) -> Self {
        Self {
            http_client,
            base_url: config.endpoints.github.clone(),
            token: config.keys.github.clone(),
        }
    }

    fn get(&self, url: &str) -> RequestBuilder {
        let request = self
            .http_client
            .get(url)
            .header("X-GitHub-Api-Version", "2022-11-28");
        match self.token {
            Some(ref token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Fetches governance activity for a protocol's proposal repository
    ///
    /// The repository call must succeed; commit and contributor statistics
    /// are best effort and stay `None` when GitHub refuses them.
    pub async fn fetch_governance(
        &self,
        info: &ProtocolInfo,
    ) -> Result<Option<GovernanceData>, FetchError> {
        let repo = info.governance_repo;
        let url = format!("{}/repos/{}", self.base_url, repo);
        let stats: RepoResponse = fetch_json(self.get(&url)).await?;

        let (activity, contributors) = futures::join!(
            self.commit_activity(repo, info.proposal_prefix),
            self.contributor_totals(repo)
        );

        let activity = activity
            .map_err(|e| tracing::debug!(repo, error = %e, "commit history unavailable"))
            .ok();
        let contributors = contributors
            .map_err(|e| tracing::debug!(repo, error = %e, "contributor list unavailable"))
            .ok();

        Ok(Some(GovernanceData {
            repo: repo.to_string(),
            stars: stats.stargazers_count,
            forks: stats.forks_count,
            watchers: stats.subscribers_count,
            open_issues: stats.open_issues_count,
            commits_30d: activity.as_ref().map(|a| a.commits),
            proposal_commits_30d: activity.as_ref().map(|a| a.proposal_commits),
            contributors_30d: activity.as_ref().map(|a| a.authors),
            total_contributors: contributors.as_ref().map(|c| c.count),
            total_contributions: contributors.as_ref().map(|c| c.contributions),
            recent_proposals: activity.map(|a| a.recent_proposals).unwrap_or_default(),
            top_contributors: contributors.map(|c| c.top).unwrap_or_default(),
        }))
    }

    async fn commit_activity(
        &self,
        repo: &str,
        prefix: &str,
    ) -> Result<CommitActivity, FetchError> {
        let since = (Utc::now() - Duration::days(ACTIVITY_WINDOW_DAYS))
            .to_rfc3339_opts(SecondsFormat::Secs, true);
        let url = format!("{}/repos/{}/commits", self.base_url, repo);
        let request = self
            .get(&url)
            .query(&[("since", since.as_str()), ("per_page", PAGE_SIZE)]);
        let commits: Vec<CommitItem> = fetch_json(request).await?;
        Ok(summarize_commits(&commits, prefix))
    }

    async fn contributor_totals(&self, repo: &str) -> Result<ContributorStats, FetchError> {
        let url = format!("{}/repos/{}/contributors", self.base_url, repo);
        let request = self.get(&url).query(&[("per_page", PAGE_SIZE)]);
        let contributors: Vec<ContributorItem> = fetch_json(request).await?;
        Ok(summarize_contributors(contributors))
    }
}

fn summarize_contributors(contributors: Vec<ContributorItem>) -> ContributorStats {
    let count = contributors.len() as u64;
    let contributions = contributors.iter().map(|c| c.contributions).sum();

    let mut top: Vec<Contributor> = contributors
        .into_iter()
        .filter_map(|c| {
            Some(Contributor {
                login: c.login?,
                contributions: c.contributions,
            })
        })
        .collect();
    top.sort_by(|a, b| b.contributions.cmp(&a.contributions));
    top.truncate(TOP_CONTRIBUTORS_LIMIT);

    ContributorStats {
        count,
        contributions,
        top,
    }
}

fn summarize_commits(commits: &[CommitItem], prefix: &str) -> CommitActivity {
    let prefix = prefix.to_lowercase();
    let mut authors = HashSet::new();
    let mut proposal_commits = 0;
    let mut recent_proposals = Vec::new();

    for item in commits {
        let author = item
            .author
            .as_ref()
            .map(|u| u.login.clone())
            .or_else(|| item.commit.author.as_ref().and_then(|a| a.name.clone()));

        let message = item.commit.message.to_lowercase();
        if message.contains(&prefix) || PROPOSAL_KEYWORDS.iter().any(|k| message.contains(k)) {
            proposal_commits += 1;
            if recent_proposals.len() < RECENT_PROPOSALS_LIMIT {
                recent_proposals.push(ProposalCommit {
                    title: first_line(&item.commit.message),
                    author: author.clone(),
                    date: item.commit.author.as_ref().and_then(|a| a.date),
                    sha: item.sha.clone(),
                });
            }
        }

        if let Some(author) = author {
            authors.insert(author);
        }
    }

    CommitActivity {
        commits: commits.len() as u64,
        proposal_commits,
        authors: authors.len() as u64,
        recent_proposals,
    }
}

fn first_line(message: &str) -> String {
    message.lines().next().unwrap_or_default().trim().to_string()
}
