//! Client configuration
//!
//! `Configuration` is built once and never mutated; changing something
//! (for instance swapping in a scoped API key) produces a new value.
//! It can be assembled in code with the `with_*` setters or loaded from
//! environment variables with [`Configuration::from_env`].

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::error::Error;
use crate::node::{Node, SelectionStrategy, TlsPolicy};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_HEALTHCHECK_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_HEALTHCHECK_TIMEOUT: Duration = Duration::from_secs(2);

/// Everything the dispatcher needs to talk to a cluster
#[derive(Debug, Clone)]
pub struct Configuration {
    /// Node URLs, `scheme://host:port[/path]`
    pub nodes: Vec<String>,

    pub api_key: String,

    /// Per-request timeout
    pub timeout: Duration,

    /// Total attempts per call, the first one included
    pub retries: u32,

    /// Pause between attempts
    pub retry_interval: Duration,

    /// Period of the quarantine sweep and of per-node re-probes
    pub healthcheck_interval: Duration,

    /// Timeout of a single health probe
    pub healthcheck_timeout: Duration,

    /// Certificate policy for nodes that do not carry their own
    pub tls: Option<TlsPolicy>,

    pub strategy: SelectionStrategy,

    /// Extra headers sent with every request
    pub headers: Vec<(String, String)>,
}

impl Configuration {
    pub fn new<I, S>(nodes: I, api_key: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            nodes: nodes.into_iter().map(Into::into).collect(),
            api_key: api_key.into(),
            timeout: DEFAULT_TIMEOUT,
            retries: DEFAULT_RETRIES,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            healthcheck_interval: DEFAULT_HEALTHCHECK_INTERVAL,
            healthcheck_timeout: DEFAULT_HEALTHCHECK_TIMEOUT,
            tls: None,
            strategy: SelectionStrategy::default(),
            headers: Vec::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    pub fn with_healthcheck_interval(mut self, interval: Duration) -> Self {
        self.healthcheck_interval = interval;
        self
    }

    pub fn with_healthcheck_timeout(mut self, timeout: Duration) -> Self {
        self.healthcheck_timeout = timeout;
        self
    }

    pub fn with_tls(mut self, policy: TlsPolicy) -> Self {
        self.tls = Some(policy);
        self
    }

    pub fn with_strategy(mut self, strategy: SelectionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Same configuration, different key (e.g. a scoped search key)
    pub fn with_api_key(&self, api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..self.clone()
        }
    }

    /// Check the values a client cannot run without
    pub fn validate(&self) -> std::result::Result<(), Error> {
        if self.nodes.is_empty() {
            return Err(Error::Config("at least one node URL is required".into()));
        }
        if self.api_key.is_empty() {
            return Err(Error::Config("api key must not be empty".into()));
        }
        if self.retries == 0 {
            return Err(Error::Config("retries must be > 0".into()));
        }
        if self.timeout.is_zero() {
            return Err(Error::Config("timeout must be > 0".into()));
        }
        if self.healthcheck_interval.is_zero() {
            return Err(Error::Config("healthcheck interval must be > 0".into()));
        }
        for url in &self.nodes {
            Node::parse(url)?;
        }
        Ok(())
    }

    /// Load configuration from environment variables (and `.env`)
    ///
    /// - `TYPESENSE_NODES`: comma-separated node URLs (required)
    /// - `TYPESENSE_API_KEY`: API key (required)
    /// - `TYPESENSE_TIMEOUT_SECS`, `TYPESENSE_RETRIES`,
    ///   `TYPESENSE_RETRY_INTERVAL_MS`, `TYPESENSE_HEALTHCHECK_INTERVAL_SECS`,
    ///   `TYPESENSE_HEALTHCHECK_TIMEOUT_MS`, `TYPESENSE_STRATEGY`
    /// - `TYPESENSE_CA_FILE`: PEM bundle to trust
    /// - `TYPESENSE_TLS_INSECURE`: `true` to skip certificate checks
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let nodes = env::var("TYPESENSE_NODES").context("TYPESENSE_NODES is not set")?;
        let api_key = env::var("TYPESENSE_API_KEY").context("TYPESENSE_API_KEY is not set")?;

        let mut config = Self::new(split_nodes(&nodes), api_key)
            .with_timeout(Duration::from_secs(
                env_or_default("TYPESENSE_TIMEOUT_SECS", "5")
                    .parse()
                    .context("Invalid TYPESENSE_TIMEOUT_SECS value")?,
            ))
            .with_retries(
                env_or_default("TYPESENSE_RETRIES", "3")
                    .parse()
                    .context("Invalid TYPESENSE_RETRIES value")?,
            )
            .with_retry_interval(Duration::from_millis(
                env_or_default("TYPESENSE_RETRY_INTERVAL_MS", "1000")
                    .parse()
                    .context("Invalid TYPESENSE_RETRY_INTERVAL_MS value")?,
            ))
            .with_healthcheck_interval(Duration::from_secs(
                env_or_default("TYPESENSE_HEALTHCHECK_INTERVAL_SECS", "60")
                    .parse()
                    .context("Invalid TYPESENSE_HEALTHCHECK_INTERVAL_SECS value")?,
            ))
            .with_healthcheck_timeout(Duration::from_millis(
                env_or_default("TYPESENSE_HEALTHCHECK_TIMEOUT_MS", "2000")
                    .parse()
                    .context("Invalid TYPESENSE_HEALTHCHECK_TIMEOUT_MS value")?,
            ))
            .with_strategy(
                env_or_default("TYPESENSE_STRATEGY", "round_robin")
                    .parse()
                    .context("Invalid TYPESENSE_STRATEGY value")?,
            );

        let insecure: bool = env_or_default("TYPESENSE_TLS_INSECURE", "false")
            .parse()
            .unwrap_or(false);
        if insecure {
            config = config.with_tls(TlsPolicy::Disabled);
        } else if let Ok(path) = env::var("TYPESENSE_CA_FILE") {
            config = config.with_tls(TlsPolicy::CaFile(PathBuf::from(path)));
        }

        config.validate()?;

        Ok(config)
    }
}

fn split_nodes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Helper function to get environment variable with default
fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
