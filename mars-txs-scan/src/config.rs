//! Runtime configuration loaded from `config.toml`.
//!
//! Covers the indexer endpoint, page size, timeouts and the retry policy.
//! What a task matches is fixed in [`crate::tasks`] and cannot be
//! configured. When no config file is present the defaults are used.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Public FCD endpoint for Terra Classic.
pub const DEFAULT_API_URL: &str = "https://fcd.terra.dev";

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the FCD indexer (without `/v1/txs`).
    pub api_url: String,
    /// Transactions requested per page.
    pub page_limit: u32,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Pause between consecutive pages in milliseconds.
    pub page_delay_ms: u64,
    /// Retry policy for transient indexer failures.
    pub retry: RetryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            page_limit: 100,
            request_timeout_secs: 30,
            page_delay_ms: 0,
            retry: RetryPolicy::default(),
        }
    }
}

/// Linear backoff: attempt `n` waits `delay + n * increment`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first failure before giving up.
    pub max_retries: u32,
    /// Wait before the first retry, in seconds.
    pub delay_secs: u64,
    /// Added to the wait on every further retry, in seconds.
    pub increment_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            delay_secs: 30,
            increment_secs: 30,
        }
    }
}

impl RetryPolicy {
    /// Policy that retries `max_retries` times without waiting.
    #[must_use]
    pub const fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            delay_secs: 0,
            increment_secs: 0,
        }
    }

    /// Wait before retry number `attempt` (zero-based).
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_secs(
            self.delay_secs
                .saturating_add(self.increment_secs.saturating_mul(u64::from(attempt))),
        )
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// Returns [`Config::default`] if the file does not exist,
    /// allowing the binary to work without any config.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text =
            std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Pause between pages.
    #[must_use]
    pub const fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }
}
