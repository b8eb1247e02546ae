//! Command-line and environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::builder::BoolishValueParser;
use clap::Parser;
use reqwest::Url;
use thiserror::Error;

/// Configuration errors, fatal at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("key directory must not be empty")]
    EmptyTempdir,

    #[error("invalid GraphQL URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
}

/// keysync - keeps a directory of user GPG keys in sync with the user directory
#[derive(Parser, Debug, Clone)]
#[command(name = "keysync", version, about)]
pub struct Args {
    /// Directory holding one public key file per user
    #[arg(long, env = "KEYSYNC_TEMPDIR", default_value = "/tmp/keysync")]
    pub tempdir: PathBuf,

    /// GraphQL endpoint of the user directory
    #[arg(
        long,
        env = "KEYSYNC_GRAPHQL_URL",
        default_value = "http://localhost:4000/graphql"
    )]
    pub graphql_url: String,

    /// Authorization header value sent to the GraphQL endpoint
    #[arg(long, env = "KEYSYNC_GRAPHQL_TOKEN", hide_env_values = true)]
    pub graphql_token: Option<String>,

    /// GraphQL request timeout in seconds
    #[arg(long, env = "KEYSYNC_GRAPHQL_TIMEOUT", default_value = "60")]
    pub graphql_timeout: u64,

    /// Only log what would change
    #[arg(long, env = "KEYSYNC_DRY_RUN", value_parser = BoolishValueParser::new())]
    pub dry_run: bool,

    /// Run a single cycle and exit
    #[arg(long, env = "KEYSYNC_RUN_ONCE", value_parser = BoolishValueParser::new())]
    pub run_once: bool,

    /// Seconds to sleep between cycles
    #[arg(long, env = "KEYSYNC_INTERVAL", default_value = "600")]
    pub interval: u64,
}

/// GraphQL client settings.
#[derive(Debug, Clone)]
pub struct GraphqlConfig {
    pub url: Url,
    pub token: Option<String>,
    pub timeout: Duration,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub tempdir: PathBuf,
    pub graphql: GraphqlConfig,
    pub dry_run: bool,
    pub run_once: bool,
    pub interval: Duration,
}

impl Config {
    /// Parse flags and environment, exiting on usage errors.
    pub fn from_env() -> crate::Result<Self> {
        Ok(Self::try_from(Args::parse())?)
    }
}

impl TryFrom<Args> for Config {
    type Error = ConfigError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        if args.tempdir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyTempdir);
        }

        let url = Url::parse(&args.graphql_url).map_err(|e| ConfigError::InvalidUrl {
            url: args.graphql_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl {
                url: args.graphql_url,
                reason: format!("unsupported scheme {}", url.scheme()),
            });
        }

        if args.graphql_timeout == 0 {
            return Err(ConfigError::ZeroDuration("graphql-timeout"));
        }
        if args.interval == 0 && !args.run_once {
            return Err(ConfigError::ZeroDuration("interval"));
        }

        // An empty token from the environment means "no token".
        let token = args.graphql_token.filter(|t| !t.is_empty());

        Ok(Config {
            tempdir: args.tempdir,
            graphql: GraphqlConfig {
                url,
                token,
                timeout: Duration::from_secs(args.graphql_timeout),
            },
            dry_run: args.dry_run,
            run_once: args.run_once,
            interval: Duration::from_secs(args.interval),
        })
    }
}
