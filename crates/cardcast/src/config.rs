//! Client and job timing configuration with sensible defaults.
//!
//! [`ClientConfig`] describes how to reach the backend; [`JobConfig`] holds
//! the poll interval and settle delay that shape the job lifecycle. Both use
//! `Default` plus chained `with_*` setters.

use std::time::Duration;

use crate::{BASE_URL_ENV, DEFAULT_BASE_URL};

/// Interval between status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Pause between observing completion and revealing results, so the
/// completion indicator can finish before content swaps.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Per-request timeout for the HTTP client.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How to reach the backend job service.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL the `api/...` paths are joined onto.
    /// Default: [`DEFAULT_BASE_URL`].
    pub base_url: String,
    /// Timeout applied to each request. Default: 30 s.
    pub request_timeout: Duration,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            user_agent: concat!("cardcast/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the `User-Agent` header.
    pub fn with_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Resolve the base URL: an explicit flag wins, then the
    /// `CARDCAST_URL` environment variable, then the default.
    pub fn resolve_base_url(flag: Option<String>) -> String {
        Self::pick_base_url(flag, std::env::var(BASE_URL_ENV).ok())
    }

    fn pick_base_url(flag: Option<String>, env: Option<String>) -> String {
        flag.or(env.filter(|v| !v.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }
}

/// Timing of the job lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobConfig {
    /// Delay between status polls. Default: 2000 ms.
    pub poll_interval: Duration,
    /// Delay between seeing `finished` and revealing results. Default: 500 ms.
    pub settle_delay: Duration,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

impl JobConfig {
    /// Set the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the settle delay.
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }
}
