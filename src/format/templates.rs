//! Pre-written answers for use-case questions and the help screen

use crate::chat::UseCase;

const GAMING: &str = "\
## 🎮 Best Protocols for Gaming

| Rank | Protocol | Max TPS | Finality | Typical Fee | NFT Support | Why |
|------|----------|---------|----------|-------------|-------------|-----|
| 🥇 | **Tron (TRX)** | 2,000 | 3s | $0.001 to $0.03 | TRC-721 | Cheap enough for per-action transactions |
| 🥈 | **BSC (BNB)** | 2,100 | 3s | $0.03 to $0.30 | ERC-721 compatible | Large GameFi ecosystem, EVM tooling |
| 🥉 | **Base (ETH)** | 350 | 2s | ~$0.15 | ERC-721 | Fast confirmations, consumer onboarding |
| 4️⃣ | **Ethereum (ETH)** | 15 | 12m | $1 to $5 | ERC-721 | Largest NFT market, highest security |
| ❌ | **Bitcoin (BTC)** | 7 | 1h | $1 to $10 | none | No general smart contracts |

**Recommendations**
- **Casual and social games** with many small actions: **Tron**
- **Play-to-earn economies** that need EVM contracts: **BSC**
- **Consumer games** targeting mainstream users: **Base**
- **Premium NFT collections** where provenance matters most: **Ethereum**

Ask \"what are the fees right now?\" for live transfer costs.";

const PAYMENTS: &str = "\
## 💰 Best Protocols for Payments

| Rank | Protocol | Typical Fee | Finality | Max TPS | Best For |
|------|----------|-------------|----------|---------|----------|
| 🥇 | **Tron (TRX)** | $0.001 to $0.03 | 3s | 2,000 | Stablecoin transfers, micropayments |
| 🥈 | **Base (ETH)** | ~$0.15 | 2s | 350 | Consumer checkout |
| 🥉 | **BSC (BNB)** | $0.03 to $0.30 | 3s | 2,100 | Business payments |
| 4️⃣ | **Bitcoin (BTC)** | $1 to $10 | 1h | 7 | Large settlements |
| 5️⃣ | **Ethereum (ETH)** | $1 to $5 | 12m | 15 | High-value transfers |

**By payment size**
- **Under $10**: Tron, where the fee stays a fraction of a percent
- **$10 to $1,000**: Base or BSC for fast, cheap confirmation
- **Above $10,000**: Bitcoin or Ethereum, where security outweighs the fee

Ask \"which chain is cheapest?\" for a live fee ranking.";

const ENTERPRISE: &str = "\
## 🏢 Enterprise Protocol Comparison

| Rank | Protocol | Security | Governance | Strength |
|------|----------|----------|------------|----------|
| 🥇 | **Bitcoin (BTC)** | 100/100 | BIP process | Treasury reserves, regulatory clarity |
| 🥈 | **Ethereum (ETH)** | 98/100 | EIP process | Most mature smart contract ecosystem |
| 🥉 | **Base (ETH)** | 92/100 | Coinbase-led, Superchain SUPs | Compliance expertise, consumer reach |
| 4️⃣ | **BSC (BNB)** | 82/100 | BEP process, validator set | High throughput at low cost |
| 5️⃣ | **Tron (TRX)** | 78/100 | TIP process, Super Representatives | Payment rails in Asian markets |

**Decision guide**
- **Treasury**: Bitcoin
- **Smart contract applications**: Ethereum
- **Consumer products**: Base
- **High-volume operations** (over 1M tx/month): BSC or Tron

Ask \"show governance activity\" to see how actively each protocol is developed.";

const HELP: &str = "\
## 🔗 L1 Chat

I answer questions about **Ethereum**, **Bitcoin**, **BNB Smart Chain**, **Tron**, and **Base** using live market, gas, and GitHub data.

| Topic | Example |
|-------|---------|
| 💸 Fees | \"Which chain has the lowest fees?\" |
| ⛽ Gas | \"What is the gas price on Ethereum?\" |
| 📈 Market | \"Show market caps\" |
| 🏛️ Governance | \"How active is EIP development?\" |
| 📜 Proposals | \"Latest EIPs\" |
| 🚀 Throughput | \"Which chain is fastest?\" |
| 🔎 One protocol | \"Tell me about Tron\" |
| 🎮 Gaming | \"Best blockchain for gaming\" |
| 💰 Payments | \"Best chain to send money\" |
| 🏢 Enterprise | \"Enterprise blockchain comparison\" |

Prices and fees refresh every 5 minutes; governance data every hour.";

/// Canned answer for a use-case question
pub fn use_case_template(use_case: UseCase) -> &'static str {
    match use_case {
        UseCase::Gaming => GAMING,
        UseCase::Payments => PAYMENTS,
        UseCase::Enterprise => ENTERPRISE,
    }
}

/// Answer for questions that match nothing else
pub fn help_text() -> &'static str {
    HELP
}
