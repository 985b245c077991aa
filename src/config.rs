//! Configuration management for Gatekeeper.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use crate::error::{GatekeeperError, Result};
use crate::http::DEFAULT_SHUTDOWN_TIMEOUT;
use crate::ratelimit::{with_duration, with_limit, LimiterOption};

/// Prefix for environment variable overrides, e.g. `GATEKEEPER__SERVER__HTTP_ADDR`.
const ENV_PREFIX: &str = "GATEKEEPER";
const ENV_SEPARATOR: &str = "__";

/// Main configuration for the Gatekeeper service and its load client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatekeeperConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limiting: RateLimitingConfig,

    /// Load client configuration
    #[serde(default)]
    pub client: ClientConfig,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen address
    #[serde(default = "default_http_addr")]
    pub http_addr: SocketAddr,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Use the sharded limiter instead of the single-lock one
    #[serde(default)]
    pub sharded: bool,

    /// Grace period in milliseconds for open connections after a shutdown signal
    #[serde(default = "default_shutdown_timeout_ms")]
    pub shutdown_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            log_format: LogFormat::default(),
            sharded: false,
            shutdown_timeout_ms: default_shutdown_timeout_ms(),
        }
    }
}

fn default_http_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_shutdown_timeout_ms() -> u64 {
    DEFAULT_SHUTDOWN_TIMEOUT.as_millis() as u64
}

/// Rate limiting configuration.
///
/// Values here are overrides; they go through the same validation as
/// [`with_limit`] and [`with_duration`] and are ignored when invalid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitingConfig {
    /// Maximum requests per window
    #[serde(default = "default_limit")]
    pub limit: i64,

    /// Window width in milliseconds
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
}

impl Default for RateLimitingConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            window_ms: default_window_ms(),
        }
    }
}

fn default_limit() -> i64 {
    200
}

fn default_window_ms() -> u64 {
    5000
}

impl RateLimitingConfig {
    /// Convert these settings into limiter overrides.
    pub fn limiter_options(&self) -> Vec<LimiterOption> {
        vec![
            with_limit(self.limit),
            with_duration(Duration::from_millis(self.window_ms)),
        ]
    }
}

/// Load client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Per-request timeout in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Upper bound (exclusive) of the random pause between requests
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Number of distinct client ids
    #[serde(default = "default_num_clients")]
    pub num_clients: usize,

    /// Workers per client id
    #[serde(default = "default_num_workers")]
    pub num_workers: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
            max_delay_ms: default_max_delay_ms(),
            num_clients: default_num_clients(),
            num_workers: default_num_workers(),
        }
    }
}

fn default_request_timeout_ms() -> u64 {
    5000
}

fn default_max_delay_ms() -> u64 {
    1000
}

fn default_num_clients() -> usize {
    2
}

fn default_num_workers() -> usize {
    4
}

impl GatekeeperConfig {
    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| GatekeeperError::Config(e.to_string()))
    }

    /// Load configuration from an optional YAML file, then apply
    /// `GATEKEEPER__<SECTION>__<KEY>` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env_prefix(path, ENV_PREFIX)
    }

    fn load_with_env_prefix(path: Option<&Path>, env_prefix: &str) -> Result<Self> {
        let mut builder = ::config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(
                ::config::File::from(path).format(::config::FileFormat::Yaml),
            );
        }

        let config = builder
            .add_source(
                ::config::Environment::with_prefix(env_prefix)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }
}
