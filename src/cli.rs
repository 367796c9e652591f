//! Command-line interface parsing for L1 Chat
//!
//! Flags and API keys are parsed with clap. Every key can also come from the
//! environment or a `.env` file, which `main` loads before parsing.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::config::{non_empty, ApiKeys, Config, DEFAULT_TIMEOUT_SECS};

/// Error types for CLI argument validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    /// The HTTP timeout must be positive
    #[error("Invalid timeout: --timeout-secs must be at least 1")]
    InvalidTimeout,

    /// `--ask` was given an empty question
    #[error("Invalid question: --ask needs a non-empty question")]
    EmptyQuestion,
}

/// L1 Chat - Ask about fees, gas, prices, and governance of five blockchains
#[derive(Parser, Debug)]
#[command(name = "l1chat")]
#[command(about = "Chat about Ethereum, Bitcoin, BNB Smart Chain, Tron, and Base using live data")]
#[command(version)]
pub struct Cli {
    /// Answer one question, print the Markdown reply, and exit
    ///
    /// Examples:
    ///   l1chat --ask "which chain has the lowest fees?"
    ///   l1chat --ask "gas price on ethereum"
    #[arg(long, short = 'a', value_name = "QUESTION")]
    pub ask: Option<String>,

    /// CoinGecko demo API key (optional)
    #[arg(long, env = "COINGECKO_API_KEY", hide_env_values = true)]
    pub coingecko_api_key: Option<String>,

    /// Etherscan API key for the Ethereum gas oracle
    #[arg(long, env = "ETHERSCAN_API_KEY", hide_env_values = true)]
    pub etherscan_api_key: Option<String>,

    /// BscScan API key for the BNB Smart Chain gas oracle
    #[arg(long, env = "BSCSCAN_API_KEY", hide_env_values = true)]
    pub bscscan_api_key: Option<String>,

    /// Blocknative API key, the Ethereum gas fallback
    #[arg(long, env = "BLOCKNATIVE_API_KEY", hide_env_values = true)]
    pub blocknative_api_key: Option<String>,

    /// TronGrid API key (optional, raises rate limits)
    #[arg(long, env = "TRONGRID_API_KEY", hide_env_values = true)]
    pub trongrid_api_key: Option<String>,

    /// GitHub token for governance statistics (optional, raises rate limits)
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Timeout for each upstream HTTP request, in seconds
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Log at debug level (RUST_LOG overrides)
    #[arg(long, short)]
    pub verbose: bool,

    /// Directory for l1chat.log instead of the platform data directory
    #[arg(long, env = "L1CHAT_LOG_DIR", value_name = "DIR")]
    pub log_dir: Option<PathBuf>,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone)]
pub struct StartupConfig {
    /// Runtime configuration for the metrics service
    pub config: Config,
    /// One-shot question; `None` starts the TUI
    pub ask: Option<String>,
    pub verbose: bool,
    /// Log directory override; `None` uses the platform data directory
    pub log_dir: Option<PathBuf>,
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// Blank API keys are treated as missing.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with appropriate settings
    /// * `Err(CliError)` if the timeout is zero or the question is blank
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        if cli.timeout_secs == 0 {
            return Err(CliError::InvalidTimeout);
        }

        let ask = match &cli.ask {
            None => None,
            Some(q) if q.trim().is_empty() => return Err(CliError::EmptyQuestion),
            Some(q) => Some(q.trim().to_string()),
        };

        let keys = ApiKeys {
            coingecko: non_empty(cli.coingecko_api_key.clone()),
            etherscan: non_empty(cli.etherscan_api_key.clone()),
            bscscan: non_empty(cli.bscscan_api_key.clone()),
            blocknative: non_empty(cli.blocknative_api_key.clone()),
            trongrid: non_empty(cli.trongrid_api_key.clone()),
            github: non_empty(cli.github_token.clone()),
        };

        Ok(StartupConfig {
            config: Config {
                keys,
                timeout: Duration::from_secs(cli.timeout_secs),
                ..Config::default()
            },
            ask,
            verbose: cli.verbose,
            log_dir: cli.log_dir.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_no_args() {
        let cli = Cli::parse_from(["l1chat"]);
        assert!(cli.ask.is_none());
        assert_eq!(cli.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_cli_parse_ask() {
        let cli = Cli::parse_from(["l1chat", "--ask", "lowest fees?"]);
        assert_eq!(cli.ask.as_deref(), Some("lowest fees?"));

        let cli = Cli::parse_from(["l1chat", "-a", "gas"]);
        assert_eq!(cli.ask.as_deref(), Some("gas"));
    }

    #[test]
    fn test_startup_config_from_cli_defaults() {
        let cli = Cli::parse_from(["l1chat"]);
        let startup = StartupConfig::from_cli(&cli).unwrap();
        assert!(startup.ask.is_none());
        assert_eq!(startup.config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_startup_config_keys_from_flags() {
        let cli = Cli::parse_from([
            "l1chat",
            "--etherscan-api-key",
            "abc",
            "--github-token",
            "  ",
            "--timeout-secs",
            "3",
            "--verbose",
        ]);
        let startup = StartupConfig::from_cli(&cli).unwrap();
        assert_eq!(startup.config.keys.etherscan.as_deref(), Some("abc"));
        assert!(startup.config.keys.github.is_none(), "blank token is ignored");
        assert_eq!(startup.config.timeout, Duration::from_secs(3));
        assert!(startup.verbose);
    }

    #[test]
    fn test_startup_config_log_dir() {
        let cli = Cli::parse_from(["l1chat", "--log-dir", "/tmp/l1chat-logs"]);
        let startup = StartupConfig::from_cli(&cli).unwrap();
        assert_eq!(startup.log_dir, Some(PathBuf::from("/tmp/l1chat-logs")));
    }

    #[test]
    fn test_startup_config_trims_question() {
        let cli = Cli::parse_from(["l1chat", "--ask", "  tell me about tron "]);
        let startup = StartupConfig::from_cli(&cli).unwrap();
        assert_eq!(startup.ask.as_deref(), Some("tell me about tron"));
    }

    #[test]
    fn test_startup_config_zero_timeout() {
        let cli = Cli::parse_from(["l1chat", "--timeout-secs", "0"]);
        let err = StartupConfig::from_cli(&cli).unwrap_err();
        assert_eq!(err, CliError::InvalidTimeout);
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn test_startup_config_blank_question() {
        let cli = Cli::parse_from(["l1chat", "--ask", "   "]);
        assert_eq!(StartupConfig::from_cli(&cli).unwrap_err(), CliError::EmptyQuestion);
    }
}
