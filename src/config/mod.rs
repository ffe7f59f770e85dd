//! Configuration module for the Hack Hour client.
//!
//! Holds the user identity (Slack ID), the API key, and the knobs of the
//! request queues. A configuration is built once and shared read-only by
//! every service of a client, so several clients with different users can
//! live in the same process.

use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use url::Url;

use crate::auth::key_hint;
use crate::errors::{HackHourError, HackHourResult};

/// Default base URL for the Hack Hour API.
pub const DEFAULT_BASE_URL: &str = "https://hackhour.hackclub.com";

/// Default request timeout (30 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Initial budget of the read (GET) queue before the server reports one.
pub const DEFAULT_READ_BUDGET: u32 = 10;

/// Initial budget of the write (POST) queue before the server reports one.
pub const DEFAULT_WRITE_BUDGET: u32 = 16;

/// Default cap on retries of a throttled request.
pub const DEFAULT_MAX_RETRIES: u32 = 10;

/// Default pause before a throttled request is queued again.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(250);

/// Budget reset window used when the server never reports one.
pub const DEFAULT_FALLBACK_RESET: Duration = Duration::from_secs(60);

/// Configuration for the Hack Hour client.
#[derive(Clone)]
pub struct HackHourConfig {
    pub(crate) slack_id: String,
    pub(crate) api_key: SecretString,
    /// Base URL for API requests.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Initial budget of the read queue.
    pub read_budget: u32,
    /// Initial budget of the write queue.
    pub write_budget: u32,
    /// Maximum retries of a throttled request; `None` retries forever.
    pub max_retries: Option<u32>,
    /// Pause before a throttled request is queued again.
    pub retry_delay: Duration,
    /// Budget reset window used when responses carry no rate-limit headers.
    pub fallback_reset: Duration,
}

impl HackHourConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> HackHourConfigBuilder {
        HackHourConfigBuilder::new()
    }

    /// Slack ID of the user this client acts for.
    pub fn slack_id(&self) -> &str {
        &self.slack_id
    }

    /// Returns the API key (exposing the secret).
    pub(crate) fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    /// Returns the API key hint (last 4 characters) for debugging.
    pub fn api_key_hint(&self) -> String {
        key_hint(self.api_key.expose_secret())
    }

    /// Copy of this configuration addressing another user.
    pub(crate) fn for_user(&self, slack_id: impl Into<String>) -> Self {
        Self {
            slack_id: slack_id.into(),
            ..self.clone()
        }
    }
}

impl std::fmt::Debug for HackHourConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HackHourConfig")
            .field("slack_id", &self.slack_id)
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("read_budget", &self.read_budget)
            .field("write_budget", &self.write_budget)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

/// Builder for `HackHourConfig`.
#[derive(Debug, Default)]
pub struct HackHourConfigBuilder {
    slack_id: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    timeout: Option<Duration>,
    read_budget: Option<u32>,
    write_budget: Option<u32>,
    max_retries: Option<Option<u32>>,
    retry_delay: Option<Duration>,
    fallback_reset: Option<Duration>,
}

impl HackHourConfigBuilder {
    /// Creates a new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the Slack ID of the user.
    pub fn slack_id(mut self, slack_id: impl Into<String>) -> Self {
        self.slack_id = Some(slack_id.into());
        self
    }

    /// Sets the API key.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the initial read budget.
    pub fn read_budget(mut self, budget: u32) -> Self {
        self.read_budget = Some(budget);
        self
    }

    /// Sets the initial write budget.
    pub fn write_budget(mut self, budget: u32) -> Self {
        self.write_budget = Some(budget);
        self
    }

    /// Sets the maximum retries of a throttled request.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(Some(retries));
        self
    }

    /// Retries throttled requests until they go through.
    pub fn unlimited_retries(mut self) -> Self {
        self.max_retries = Some(None);
        self
    }

    /// Sets the pause before a throttled request is queued again.
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = Some(delay);
        self
    }

    /// Sets the fallback budget reset window.
    pub fn fallback_reset(mut self, window: Duration) -> Self {
        self.fallback_reset = Some(window);
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> HackHourResult<HackHourConfig> {
        let slack_id = self
            .slack_id
            .ok_or_else(|| HackHourError::configuration("Slack ID is required"))?;
        if slack_id.trim().is_empty() {
            return Err(HackHourError::configuration("Slack ID cannot be empty"));
        }
        if !is_valid_slack_id(&slack_id) {
            return Err(HackHourError::configuration(
                "Slack ID may only contain letters, digits, '-' and '_'",
            ));
        }

        let api_key = self
            .api_key
            .ok_or_else(|| HackHourError::configuration("API key is required"))?;
        if api_key.trim().is_empty() {
            return Err(HackHourError::configuration("API key cannot be empty"));
        }

        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        validate_base_url(&base_url)?;

        let read_budget = self.read_budget.unwrap_or(DEFAULT_READ_BUDGET);
        let write_budget = self.write_budget.unwrap_or(DEFAULT_WRITE_BUDGET);
        if read_budget == 0 || write_budget == 0 {
            return Err(HackHourError::configuration(
                "Queue budgets must be positive",
            ));
        }

        Ok(HackHourConfig {
            slack_id,
            api_key: SecretString::new(api_key),
            base_url,
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            read_budget,
            write_budget,
            max_retries: self.max_retries.unwrap_or(Some(DEFAULT_MAX_RETRIES)),
            retry_delay: self.retry_delay.unwrap_or(DEFAULT_RETRY_DELAY),
            fallback_reset: self.fallback_reset.unwrap_or(DEFAULT_FALLBACK_RESET),
        })
    }
}

/// Slack IDs end up as a URL path segment, so only `[A-Za-z0-9_-]` is accepted.
pub(crate) fn is_valid_slack_id(slack_id: &str) -> bool {
    !slack_id.is_empty()
        && slack_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Only HTTPS is accepted, except plain HTTP on loopback hosts.
fn validate_base_url(base_url: &str) -> HackHourResult<()> {
    let url = Url::parse(base_url)?;
    let loopback = matches!(
        url.host_str(),
        Some("localhost" | "127.0.0.1" | "[::1]")
    );

    match url.scheme() {
        "https" => Ok(()),
        "http" if loopback => Ok(()),
        _ => Err(HackHourError::configuration("Base URL must use HTTPS")),
    }
}
