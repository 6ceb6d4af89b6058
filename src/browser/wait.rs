//! Retry-until-timeout polling for DOM queries
//!
//! A check against a live page may run before the app has finished
//! rendering, so every query is retried at `poll_interval` until the
//! observed value is accepted or `timeout` elapses. Query errors are treated
//! as transient and retried as well.

use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::sleep;

use crate::common::{Error, Result};

/// Default timeout for wait operations (4 seconds).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(4);

/// Default poll interval for checking conditions (100ms).
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Configuration for wait operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    /// Maximum time to wait for the condition.
    pub timeout: Duration,

    /// How often to check if the condition is satisfied.
    pub poll_interval: Duration,
}

impl WaitConfig {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT, DEFAULT_POLL_INTERVAL)
    }
}

/// Result of polling a probe
#[derive(Debug)]
pub enum Outcome<T> {
    /// The probe produced an accepted value
    Satisfied(T),
    /// Time ran out; carries the last value seen and the last probe error
    TimedOut {
        last: Option<T>,
        last_error: Option<Error>,
    },
}

impl<T> Outcome<T> {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Outcome::Satisfied(_))
    }
}

/// Poll `probe` until `accept` returns true for its value or the timeout
/// expires.
///
/// The probe always runs at least once, even with a zero timeout.
pub async fn poll_until<T, F, Fut, P>(probe: F, accept: P, config: WaitConfig) -> Outcome<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
    P: Fn(&T) -> bool,
{
    let start = Instant::now();
    let mut last = None;
    let mut last_error = None;

    loop {
        match probe().await {
            Ok(value) if accept(&value) => return Outcome::Satisfied(value),
            Ok(value) => last = Some(value),
            Err(e) => {
                tracing::trace!("probe failed, retrying: {}", e);
                last_error = Some(e);
            }
        }

        if start.elapsed() >= config.timeout {
            return Outcome::TimedOut { last, last_error };
        }

        sleep(config.poll_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_succeeds_immediately() {
        let outcome = poll_until(
            || async { Ok(200usize) },
            |n| *n == 200,
            WaitConfig::default(),
        )
        .await;
        assert!(matches!(outcome, Outcome::Satisfied(200)));
    }

    #[tokio::test]
    async fn test_succeeds_eventually() {
        let counter = Arc::new(AtomicU32::new(0));
        let probe_counter = counter.clone();

        let outcome = poll_until(
            move || {
                let c = probe_counter.clone();
                async move { Ok(c.fetch_add(1, Ordering::SeqCst)) }
            },
            |count| *count >= 3,
            WaitConfig::new(Duration::from_secs(5), Duration::from_millis(5)),
        )
        .await;

        assert!(outcome.is_satisfied());
        assert!(counter.load(Ordering::SeqCst) >= 4);
    }

    #[tokio::test]
    async fn test_timeout_reports_last_value() {
        let outcome = poll_until(
            || async { Ok(199usize) },
            |n| *n == 200,
            WaitConfig::new(Duration::from_millis(50), Duration::from_millis(10)),
        )
        .await;

        match outcome {
            Outcome::TimedOut { last, last_error } => {
                assert_eq!(last, Some(199));
                assert!(last_error.is_none());
            }
            Outcome::Satisfied(_) => panic!("should have timed out"),
        }
    }

    #[tokio::test]
    async fn test_errors_are_retried() {
        let counter = Arc::new(AtomicU32::new(0));
        let probe_counter = counter.clone();

        let outcome = poll_until(
            move || {
                let c = probe_counter.clone();
                async move {
                    if c.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(Error::Script("document not ready".to_string()))
                    } else {
                        Ok("complete".to_string())
                    }
                }
            },
            |s| s == "complete",
            WaitConfig::new(Duration::from_secs(5), Duration::from_millis(5)),
        )
        .await;

        assert!(outcome.is_satisfied());
    }

    #[tokio::test]
    async fn test_zero_timeout_probes_once() {
        let counter = Arc::new(AtomicU32::new(0));
        let probe_counter = counter.clone();

        let outcome = poll_until(
            move || {
                let c = probe_counter.clone();
                async move { Ok(c.fetch_add(1, Ordering::SeqCst)) }
            },
            |_| false,
            WaitConfig::new(Duration::ZERO, Duration::from_millis(5)),
        )
        .await;

        assert!(!outcome.is_satisfied());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
