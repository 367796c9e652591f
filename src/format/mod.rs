//! Markdown response builders
//!
//! Turns metrics into the Markdown tables shown in the chat transcript.
//! Ranked tables use medal markers for the top three rows.

mod templates;

pub use templates::{help_text, use_case_template};

use std::collections::{BTreeSet, HashMap};

use crate::cache::{Source, Sourced};
use crate::data::{
    all_protocols, Contributor, FeeRate, GovernanceData, MarketData, NetworkFees, Protocol,
    ProtocolInfo,
};

const RANK_MARKERS: [&str; 5] = ["🥇", "🥈", "🥉", "4️⃣", "5️⃣"];

/// Proposal commits listed per repository
const PROPOSALS_SHOWN: usize = 5;

/// Contributors named per repository
const CONTRIBUTORS_SHOWN: usize = 3;

const PROPOSAL_TITLE_WIDTH: usize = 72;

/// Throughput above which a chain counts as high performance
const HIGH_TPS: u32 = 1000;

/// Rank marker for a zero-based position
pub fn rank_marker(index: usize) -> String {
    RANK_MARKERS
        .get(index)
        .map(|m| m.to_string())
        .unwrap_or_else(|| format!("{}.", index + 1))
}

/// Fee in USD: three decimals below a dollar, two above
pub fn format_usd_fee(usd: f64) -> String {
    if usd < 1.0 {
        format!("${:.3}", usd)
    } else {
        format!("${:.2}", usd)
    }
}

/// Large USD amounts with a T/B/M/K suffix
pub fn format_usd_compact(usd: f64) -> String {
    let abs = usd.abs();
    if abs >= 1e12 {
        format!("${:.2}T", usd / 1e12)
    } else if abs >= 1e9 {
        format!("${:.2}B", usd / 1e9)
    } else if abs >= 1e6 {
        format!("${:.2}M", usd / 1e6)
    } else if abs >= 1e3 {
        format!("${:.2}K", usd / 1e3)
    } else {
        format!("${:.2}", usd)
    }
}

/// Token price: thousands separators above a dollar, four decimals below
pub fn format_usd_price(usd: f64) -> String {
    if usd >= 1.0 {
        let cents = (usd * 100.0).round() as u64;
        format!("${}.{:02}", format_count(cents / 100), cents % 100)
    } else {
        format!("${:.4}", usd)
    }
}

/// Integer with thousands separators
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Signed percentage with two decimals
pub fn format_percent(pct: f64) -> String {
    format!("{:+.2}%", pct)
}

/// Finality time as milliseconds, seconds, minutes, or hours
pub fn format_finality(secs: f64) -> String {
    if secs < 1.0 {
        format!("{:.0}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{:.0}s", secs)
    } else if secs < 3600.0 {
        format!("{}m", (secs / 60.0).floor() as u64)
    } else {
        format!("{}h", (secs / 3600.0).floor() as u64)
    }
}

/// Shortens text to `max` characters, ending in an ellipsis when cut
fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", kept.trim_end())
    }
}

fn format_contributors(contributors: &[Contributor]) -> String {
    contributors
        .iter()
        .take(CONTRIBUTORS_SHOWN)
        .map(|c| format!("{} ({})", c.login, format_count(c.contributions)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_optional(value: Option<u64>) -> String {
    value.map(format_count).unwrap_or_else(|| "n/a".to_string())
}

/// Native fee rate in the chain's own unit
pub fn format_rate(rate: &FeeRate) -> String {
    match rate {
        FeeRate::Gwei(gas) => format!("{:.1} gwei", gas.standard),
        FeeRate::SunPerByte { sun } => format!("{} sun/byte", format_count(*sun)),
        FeeRate::SatPerByte { sat } => format!("{:.1} sat/vB", sat),
        FeeRate::FlatUsd { usd } => format!("{} flat", format_usd_fee(*usd)),
    }
}

/// How much cheaper a fee is than the Ethereum baseline
fn savings_vs(fee: f64, baseline: f64) -> String {
    if fee <= 0.0 || baseline <= 0.0 {
        "n/a".to_string()
    } else if fee >= baseline {
        let ratio = fee / baseline;
        if ratio < 1.05 {
            "baseline".to_string()
        } else {
            format!("{:.1}x pricier", ratio)
        }
    } else {
        let ratio = baseline / fee;
        if ratio >= 10.0 {
            format!("{}x cheaper", format_count(ratio.round() as u64))
        } else {
            format!("{:.1}x cheaper", ratio)
        }
    }
}

/// Footer naming the live providers and flagging rows built from static estimates
pub fn sources_footer<'a>(rows: impl IntoIterator<Item = (Protocol, &'a Source)>) -> String {
    let mut live = BTreeSet::new();
    let mut cached = false;
    let mut estimated = Vec::new();

    for (protocol, source) in rows {
        match source {
            Source::Live(name) => {
                live.insert(*name);
            }
            Source::Cache => cached = true,
            Source::Fallback => {
                let name = protocol.info().short_name;
                if !estimated.contains(&name) {
                    estimated.push(name);
                }
            }
        }
    }

    let mut parts = Vec::new();
    if !live.is_empty() {
        parts.push(format!("live from {}", live.into_iter().collect::<Vec<_>>().join(", ")));
    }
    if cached {
        parts.push("recent cache".to_string());
    }
    let mut footer = if parts.is_empty() {
        "_Data: static estimates only._".to_string()
    } else {
        format!("_Data: {}._", parts.join("; "))
    };
    if !estimated.is_empty() {
        footer.push_str(&format!(
            "\n_⚠️ Static estimates (upstream unavailable): {}._",
            estimated.join(", ")
        ));
    }
    footer
}

fn in_focus(protocol: Protocol, focus: &[Protocol]) -> bool {
    focus.is_empty() || focus.contains(&protocol)
}

/// Fee comparison ranked cheapest first
///
/// Savings are measured against Ethereum even when it is filtered out by
/// `focus`.
pub fn fee_comparison(fees: &[Sourced<NetworkFees>], focus: &[Protocol]) -> String {
    let baseline = fees
        .iter()
        .find(|f| f.value.protocol == Protocol::Ethereum)
        .map(|f| f.value.avg_fee_usd)
        .unwrap_or(0.0);

    let mut rows: Vec<&Sourced<NetworkFees>> = fees
        .iter()
        .filter(|f| in_focus(f.value.protocol, focus))
        .collect();
    rows.sort_by(|a, b| a.value.avg_fee_usd.total_cmp(&b.value.avg_fee_usd));

    let mut out = String::from("## 💸 Transaction Fee Comparison\n\n");
    out.push_str("| Rank | Protocol | Avg Fee | Fee Rate | Max TPS | Finality | Security | Type | Best For | vs Ethereum |\n");
    out.push_str("|------|----------|---------|----------|---------|----------|----------|------|----------|-------------|\n");

    for (i, row) in rows.iter().enumerate() {
        let entry = &row.value;
        let info = entry.protocol.info();
        let use_case = match entry.congestion {
            Some(c) => format!("{} ({} congestion)", info.best_use_case, c.label()),
            None => info.best_use_case.to_string(),
        };
        out.push_str(&format!(
            "| {} | **{}** | **{}** | {} | {} | {} | {}/100 | {} | {} | {} |\n",
            rank_marker(i),
            entry.protocol.label(),
            format_usd_fee(entry.avg_fee_usd),
            format_rate(&entry.rate),
            format_count(info.max_tps as u64),
            format_finality(info.finality_secs),
            info.security_score,
            info.layer.label(),
            use_case,
            if entry.protocol == Protocol::Ethereum {
                "baseline".to_string()
            } else {
                savings_vs(entry.avg_fee_usd, baseline)
            },
        ));
    }

    if let Some(cheapest) = rows.first() {
        out.push_str(&format!(
            "\n**Cheapest right now:** {} at {} per transfer.\n",
            cheapest.value.protocol.label(),
            format_usd_fee(cheapest.value.avg_fee_usd)
        ));
    }

    out.push('\n');
    out.push_str(&sources_footer(rows.iter().map(|r| (r.value.protocol, &r.source))));
    out
}

/// Market table ranked by market cap
///
/// Protocols sharing a fee token (Base and Ethereum) share one row. The
/// footer reports each row's own source.
pub fn market_table(
    overview: &HashMap<Protocol, Sourced<MarketData>>,
    focus: &[Protocol],
) -> String {
    let mut seen = Vec::new();
    let mut rows: Vec<(Protocol, &Sourced<MarketData>)> = Vec::new();
    for protocol in Protocol::ALL {
        if !in_focus(protocol, focus) {
            continue;
        }
        let coin = protocol.info().coingecko_id;
        if seen.contains(&coin) {
            continue;
        }
        if let Some(market) = overview.get(&protocol) {
            seen.push(coin);
            rows.push((protocol, market));
        }
    }
    rows.sort_by(|a, b| {
        b.1.value
            .market_cap_usd
            .total_cmp(&a.1.value.market_cap_usd)
    });

    let mut out = String::from("## 📈 Market Overview\n\n");
    out.push_str("| Rank | Asset | Price | 24h | Market Cap | 24h Volume |\n");
    out.push_str("|------|-------|-------|-----|------------|------------|\n");
    for (i, (protocol, market)) in rows.iter().enumerate() {
        let data = &market.value;
        let trend = if data.change_24h_pct >= 0.0 { "🟢" } else { "🔴" };
        out.push_str(&format!(
            "| {} | **{}** | {} | {} {} | {} | {} |\n",
            rank_marker(i),
            protocol.label(),
            format_usd_price(data.price_usd),
            trend,
            format_percent(data.change_24h_pct),
            format_usd_compact(data.market_cap_usd),
            format_usd_compact(data.volume_24h_usd),
        ));
    }

    if in_focus(Protocol::Base, focus) {
        out.push_str("\nBase has no token of its own; its fees are paid in ETH.\n");
    }

    out.push('\n');
    out.push_str(&sources_footer(rows.iter().map(|(p, m)| (*p, &m.source))));
    out
}

/// Gas oracle levels for EVM chains, plus the native rate of the others
pub fn gas_table(fees: &[Sourced<NetworkFees>], focus: &[Protocol]) -> String {
    let rows: Vec<&Sourced<NetworkFees>> = fees
        .iter()
        .filter(|f| in_focus(f.value.protocol, focus))
        .collect();

    let mut out = String::from("## ⛽ Gas Tracker\n\n");
    let gas_rows: Vec<_> = rows
        .iter()
        .filter_map(|r| r.value.rate.gas_oracle().map(|g| (*r, g)))
        .collect();

    if !gas_rows.is_empty() {
        out.push_str("| Protocol | Safe | Standard | Fast | Congestion | Transfer Cost |\n");
        out.push_str("|----------|------|----------|------|------------|---------------|\n");
        for (row, gas) in &gas_rows {
            out.push_str(&format!(
                "| **{}** | {:.1} gwei | {:.1} gwei | {:.1} gwei | {} | {} |\n",
                row.value.protocol.label(),
                gas.safe,
                gas.standard,
                gas.fast,
                row.value.congestion.map(|c| c.label()).unwrap_or("n/a"),
                format_usd_fee(row.value.avg_fee_usd),
            ));
        }
    }

    let other: Vec<_> = rows
        .iter()
        .filter(|r| r.value.rate.gas_oracle().is_none())
        .collect();
    if !other.is_empty() {
        out.push_str("\n**Other fee markets**\n");
        for row in other {
            out.push_str(&format!(
                "- **{}**: {} ({} per transfer)\n",
                row.value.protocol.label(),
                format_rate(&row.value.rate),
                format_usd_fee(row.value.avg_fee_usd),
            ));
        }
    }

    out.push('\n');
    out.push_str(&sources_footer(rows.iter().map(|r| (r.value.protocol, &r.source))));
    out
}

/// Proposal repository activity ranked by activity score
pub fn governance_table(entries: &[(Protocol, Sourced<GovernanceData>)]) -> String {
    let mut rows: Vec<&(Protocol, Sourced<GovernanceData>)> = entries.iter().collect();
    // Stable sort keeps registry order among equal or unknown scores
    rows.sort_by(|a, b| b.1.value.activity_score().cmp(&a.1.value.activity_score()));

    let mut out = String::from("## 🏛️ Governance & Development Activity (last 30 days)\n\n");
    out.push_str("| Rank | Protocol | Proposals | Activity | Commits | Proposal Commits | Authors | Contributors | Stars | Open Issues |\n");
    out.push_str("|------|----------|-----------|----------|---------|------------------|---------|--------------|-------|-------------|\n");
    for (i, (protocol, data)) in rows.iter().enumerate() {
        let gov = &data.value;
        let activity = match gov.activity_score() {
            Some(score) => format!("{} ({}/100)", gov.activity_level().label(), score),
            None => gov.activity_level().label().to_string(),
        };
        out.push_str(&format!(
            "| {} | **{}** | [{}s](https://github.com/{}) | {} | {} | {} | {} | {} | {} | {} |\n",
            rank_marker(i),
            protocol.label(),
            protocol.info().proposal_prefix,
            gov.repo,
            activity,
            format_optional(gov.commits_30d),
            format_optional(gov.proposal_commits_30d),
            format_optional(gov.contributors_30d),
            format_optional(gov.total_contributors),
            format_count(gov.stars),
            format_count(gov.open_issues),
        ));
    }

    out.push_str("\nActivity score: recent commits plus double weight for proposal commits, capped at 100.\n\n");
    out.push_str(&sources_footer(rows.iter().map(|(p, d)| (*p, &d.source))));
    out
}

/// Newest proposal commits for each repository, in the given order
pub fn latest_proposals(entries: &[(Protocol, Sourced<GovernanceData>)]) -> String {
    let mut out = String::from("## 📜 Latest Proposal Activity\n");
    for (protocol, data) in entries {
        let gov = &data.value;
        out.push_str(&format!(
            "\n**{}** · [{}s](https://github.com/{})\n",
            protocol.label(),
            protocol.info().proposal_prefix,
            gov.repo
        ));

        if gov.recent_proposals.is_empty() {
            let note = if gov.commits_30d.is_some() {
                "No proposal commits in the last 30 days."
            } else {
                "Commit history unavailable right now."
            };
            out.push_str(&format!("- {}\n", note));
        }
        for commit in gov.recent_proposals.iter().take(PROPOSALS_SHOWN) {
            let mut line = format!(
                "- **{}**",
                truncate_chars(&commit.title, PROPOSAL_TITLE_WIDTH)
            );
            if let Some(ref author) = commit.author {
                line.push_str(&format!(" by {}", author));
            }
            if let Some(date) = commit.date {
                line.push_str(&format!(" on {}", date.format("%Y-%m-%d")));
            }
            if !commit.sha.is_empty() {
                let short: String = commit.sha.chars().take(7).collect();
                line.push_str(&format!(" ([{}]({}))", short, commit.url(&gov.repo)));
            }
            out.push_str(&line);
            out.push('\n');
        }

        if !gov.top_contributors.is_empty() {
            out.push_str(&format!(
                "_Top contributors: {}._\n",
                format_contributors(&gov.top_contributors)
            ));
        }
    }

    out.push('\n');
    out.push_str(&sources_footer(entries.iter().map(|(p, d)| (*p, &d.source))));
    out
}

/// Protocols ranked by published maximum throughput
///
/// Ties go to the chain with faster finality.
pub fn tps_ranking(focus: &[Protocol]) -> String {
    let mut rows: Vec<&ProtocolInfo> = all_protocols()
        .iter()
        .filter(|info| in_focus(info.protocol, focus))
        .collect();
    rows.sort_by(|a, b| {
        b.max_tps
            .cmp(&a.max_tps)
            .then(a.finality_secs.total_cmp(&b.finality_secs))
    });

    let mut out = String::from("## 🚀 Throughput Ranking\n\n");
    out.push_str("| Rank | Protocol | Max TPS | Finality | Consensus | Layer |\n");
    out.push_str("|------|----------|---------|----------|-----------|-------|\n");
    for (i, info) in rows.iter().enumerate() {
        out.push_str(&format!(
            "| {} | **{}** | {} | {} | {} | {} |\n",
            rank_marker(i),
            info.protocol.label(),
            format_count(info.max_tps as u64),
            format_finality(info.finality_secs),
            info.consensus,
            info.layer.label(),
        ));
    }

    if let Some(top) = rows.first() {
        out.push_str(&format!(
            "\n**Highest throughput:** {} at {} TPS.\n",
            top.protocol.label(),
            format_count(top.max_tps as u64)
        ));
    }
    let fast: Vec<String> = rows
        .iter()
        .filter(|info| info.max_tps > HIGH_TPS)
        .map(|info| info.protocol.label())
        .collect();
    if !fast.is_empty() {
        out.push_str(&format!(
            "High performance (over {} TPS): {}.\n",
            format_count(HIGH_TPS as u64),
            fast.join(", ")
        ));
    }

    out.push_str("\n_Data: published network capacity, not live measurements._");
    out
}

/// Everything known about one protocol
pub fn protocol_detail(
    protocol: Protocol,
    market: &Sourced<MarketData>,
    fees: &Sourced<NetworkFees>,
    governance: &Sourced<GovernanceData>,
) -> String {
    let info = protocol.info();
    let mut out = format!("## 🔎 {}\n\n", protocol.label());
    out.push_str("| Metric | Value |\n|--------|-------|\n");

    let mut row = |label: &str, value: String| {
        out.push_str(&format!("| {} | {} |\n", label, value));
    };

    row("Name", info.name.to_string());
    row("Layer", info.layer.label().to_string());
    row("Consensus", info.consensus.to_string());
    row(
        &format!("{} Price", info.symbol),
        format!(
            "{} ({} 24h)",
            format_usd_price(market.value.price_usd),
            format_percent(market.value.change_24h_pct)
        ),
    );
    row("Market Cap", format_usd_compact(market.value.market_cap_usd));
    row("24h Volume", format_usd_compact(market.value.volume_24h_usd));
    row("Avg Transfer Fee", format!("**{}**", format_usd_fee(fees.value.avg_fee_usd)));
    match fees.value.rate.gas_oracle() {
        Some(gas) => row(
            "Gas (safe / standard / fast)",
            format!("{:.1} / {:.1} / {:.1} gwei", gas.safe, gas.standard, gas.fast),
        ),
        None => row("Fee Rate", format_rate(&fees.value.rate)),
    }
    if let Some(congestion) = fees.value.congestion {
        row("Congestion", congestion.label().to_string());
    }
    row("Finality", format_finality(info.finality_secs));
    row("Max TPS", format_count(info.max_tps as u64));
    row("Security", format!("{}/100", info.security_score));
    row("Best For", info.best_use_case.to_string());
    row(
        "Governance",
        format!(
            "[{}s](https://github.com/{}): {} activity, {} stars",
            info.proposal_prefix,
            governance.value.repo,
            governance.value.activity_level().label(),
            format_count(governance.value.stars)
        ),
    );
    if !governance.value.top_contributors.is_empty() {
        row(
            "Top Contributors",
            format_contributors(&governance.value.top_contributors),
        );
    }

    out.push('\n');
    out.push_str(&sources_footer([
        (protocol, &market.source),
        (protocol, &fees.source),
        (protocol, &governance.source),
    ]));
    out
}
