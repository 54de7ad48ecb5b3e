//! Configuration management for the `TigerTix` server.
//!
//! Loads configuration from environment variables with sensible defaults.
//! A `.env` file in the working directory is read first by the binary.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Storage configuration
    pub database: DatabaseConfig,
    /// HTTP and metrics listeners
    pub server: ServerConfig,
    /// Purchase retry behavior
    pub purchase: PurchaseConfig,
    /// Language model used by the booking assistant
    pub llm: LlmConfig,
}

/// Storage configuration.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// `postgres://...` or `sqlite:...`
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Connection acquire timeout in seconds
    pub connect_timeout: u64,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Metrics server host (for Prometheus scraping)
    pub metrics_host: String,
    /// Metrics server port
    pub metrics_port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout: u64,
}

/// Retry configuration for transient storage errors during a purchase.
#[derive(Debug, Clone)]
pub struct PurchaseConfig {
    /// Retries after the first attempt
    pub max_retries: usize,
    /// Delay before the first retry, in milliseconds
    pub retry_initial_delay_ms: u64,
}

/// Language model configuration.
#[derive(Clone)]
pub struct LlmConfig {
    /// API key; the assistant is disabled without one
    pub api_key: Option<String>,
    /// Model override
    pub model: Option<String>,
    /// Base URL override
    pub api_url: Option<String>,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Missing or unparsable values fall back to their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());

        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        Self {
            database: DatabaseConfig {
                url: lookup("DATABASE_URL").unwrap_or_else(|| "sqlite:tigertix.db".to_string()),
                max_connections: parsed(&lookup, "DATABASE_MAX_CONNECTIONS").unwrap_or(10),
                connect_timeout: parsed(&lookup, "DATABASE_CONNECT_TIMEOUT").unwrap_or(30),
            },
            server: ServerConfig {
                metrics_host: lookup("METRICS_HOST").unwrap_or_else(|| host.clone()),
                host,
                port: parsed(&lookup, "PORT").unwrap_or(8080),
                metrics_port: parsed(&lookup, "METRICS_PORT").unwrap_or(9090),
                shutdown_timeout: parsed(&lookup, "SHUTDOWN_TIMEOUT").unwrap_or(30),
            },
            purchase: PurchaseConfig {
                max_retries: parsed(&lookup, "PURCHASE_MAX_RETRIES").unwrap_or(2),
                retry_initial_delay_ms: parsed(&lookup, "PURCHASE_RETRY_INITIAL_DELAY_MS").unwrap_or(25),
            },
            llm: LlmConfig {
                api_key: non_empty("ANTHROPIC_API_KEY"),
                model: non_empty("LLM_MODEL"),
                api_url: non_empty("LLM_API_URL"),
            },
        }
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|s| s.trim().parse().ok())
}

impl DatabaseConfig {
    /// Pool acquire timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }
}

impl ServerConfig {
    /// `host:port` of the HTTP listener.
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// `host:port` of the metrics listener.
    #[must_use]
    pub fn metrics_addr(&self) -> String {
        format!("{}:{}", self.metrics_host, self.metrics_port)
    }

    /// How long in-flight requests get to finish after a shutdown signal.
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout)
    }
}

impl PurchaseConfig {
    /// Delay before the first retry.
    #[must_use]
    pub const fn retry_initial_delay(&self) -> Duration {
        Duration::from_millis(self.retry_initial_delay_ms)
    }
}
