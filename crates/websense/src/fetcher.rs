//! Async HTTP fetcher wrapping reqwest.
//!
//! One GET per attempt. Transport failures and non-2xx statuses are retried
//! up to `retries` additional times with exponential backoff.

use std::collections::HashMap;
use std::time::Duration;

use crate::types::{FetchResult, WebSenseError, WebSenseResult};

/// Default User-Agent header sent with every request.
pub const DEFAULT_USER_AGENT: &str = "WebSense/1.0";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default number of additional attempts after the first failure.
pub const DEFAULT_RETRIES: u32 = 3;

/// Default base delay before the first retry.
const DEFAULT_RETRY_BACKOFF_MS: u64 = 500;

/// Fetcher settings, fixed at construction.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub user_agent: String,
    pub timeout: Duration,
    pub retries: u32,
    /// Base delay; retry `n` waits `retry_backoff * 2^(n-1)`.
    pub retry_backoff: Duration,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retries: DEFAULT_RETRIES,
            retry_backoff: Duration::from_millis(DEFAULT_RETRY_BACKOFF_MS),
        }
    }
}

impl FetcherConfig {
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Delay before retry number `retry` (1-based).
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.retry_backoff.saturating_mul(factor)
    }
}

/// HTTP fetcher used as the first pipeline stage.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    config: FetcherConfig,
}

impl Fetcher {
    /// Create a fetcher with the given settings.
    pub fn new(config: FetcherConfig) -> WebSenseResult<Self> {
        if config.timeout.is_zero() {
            return Err(WebSenseError::Configuration(
                "fetch timeout must be positive".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| {
                WebSenseError::Configuration(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self { client, config })
    }

    /// The settings this fetcher was built with.
    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// GET `url`, retrying on transport errors and non-2xx statuses.
    pub async fn fetch(&self, url: &str) -> WebSenseResult<FetchResult> {
        let max_attempts = self.config.retries.saturating_add(1);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            tracing::debug!("GET {url} (attempt {attempt}/{max_attempts})");

            let cause = match self.attempt(url).await {
                Ok(result) => return Ok(result),
                Err(cause) => cause,
            };

            if attempt >= max_attempts {
                return Err(WebSenseError::Fetch {
                    url: url.to_string(),
                    attempts: attempt,
                    cause,
                });
            }

            let delay = self.config.backoff_for(attempt);
            tracing::warn!("Fetch of {url} failed ({cause}); retrying in {delay:?}");
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }

    async fn attempt(&self, url: &str) -> Result<FetchResult, String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP status {status}"));
        }

        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
            .collect();

        let body = response
            .text()
            .await
            .map_err(|e| format!("failed to read response body: {e}"))?;

        Ok(FetchResult {
            url: url.to_string(),
            status_code: status.as_u16(),
            body,
            headers,
        })
    }
}
