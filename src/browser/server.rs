//! The app server the browser navigates to
//!
//! The harness does not start the app; it only needs its base URL, and it
//! checks the server answers before paying for a browser launch.

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

use crate::common::{Error, Result};

/// Number of reachability attempts before giving up
const HEALTH_CHECK_ATTEMPTS: u32 = 3;

/// Represents a running server that pages are loaded from.
#[async_trait]
pub trait DevServer: Send + Sync {
    /// Base URL of the server, e.g. `http://localhost:9500`
    fn base_url(&self) -> &str;

    /// Check the server is responsive. Default assumes it is.
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }

    /// Join a path onto the base URL
    ///
    /// ```ignore
    /// server.url("/") // "http://localhost:9500/"
    /// ```
    fn url(&self, path: &str) -> String {
        let base = self.base_url().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }
}

impl fmt::Debug for dyn DevServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DevServer")
            .field("base_url", &self.base_url())
            .finish()
    }
}

/// An already-running app server, reached over HTTP
#[derive(Debug, Clone)]
pub struct AppServer {
    base_url: String,
    attempts: u32,
    request_timeout: Duration,
    retry_delay: Duration,
}

impl AppServer {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            attempts: HEALTH_CHECK_ATTEMPTS,
            request_timeout: Duration::from_secs(5),
            retry_delay: Duration::from_secs(1),
        }
    }

    /// Override the retry policy of the health check
    pub fn with_retries(mut self, attempts: u32, retry_delay: Duration) -> Self {
        self.attempts = attempts.max(1);
        self.retry_delay = retry_delay;
        self
    }
}

#[async_trait]
impl DevServer for AppServer {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Any HTTP response counts as reachable; only connection failures and
    /// timeouts are retried.
    async fn health_check(&self) -> Result<()> {
        let client = reqwest::Client::builder()
            .timeout(self.request_timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        for attempt in 1..=self.attempts {
            match client.get(&self.base_url).send().await {
                Ok(response) => {
                    tracing::debug!(
                        url = %self.base_url,
                        status = %response.status(),
                        "App server is reachable"
                    );
                    return Ok(());
                }
                Err(e) => {
                    tracing::debug!(
                        url = %self.base_url,
                        attempt,
                        "App server not reachable: {}",
                        e
                    );
                    if attempt < self.attempts {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }

        Err(Error::ServerNotRunning {
            url: self.base_url.clone(),
            attempts: self.attempts,
        })
    }
}
