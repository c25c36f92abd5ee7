use std::future::Future;
use std::time::{Duration, Instant};

use dsm_types::RetrySettings;

use crate::error::{LinkError, LinkResult};

/// Exponential backoff with jitter: each delay doubles up to `max`, plus a
/// random extra of up to a quarter of the base delay.
#[derive(Clone, Debug)]
pub struct Backoff {
    current: Duration,
    max: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            current: initial,
            max: max.max(initial),
        }
    }

    /// The next delay to sleep for.
    pub fn next_delay(&mut self) -> Duration {
        let base = self.current;
        self.current = (self.current * 2).min(self.max);
        base + jitter(base)
    }
}

fn jitter(base: Duration) -> Duration {
    let span = (base.as_micros() / 4) as u64;
    if span == 0 {
        return Duration::ZERO;
    }
    Duration::from_micros(rand::random::<u64>() % (span + 1))
}

/// How long, and how patiently, to keep retrying a remote call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// `None` retries forever.
    pub timeout: Option<Duration>,
}

impl RetryPolicy {
    pub fn new(initial_backoff: Duration, max_backoff: Duration, timeout: Option<Duration>) -> Self {
        Self {
            initial_backoff,
            max_backoff,
            timeout,
        }
    }

    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self::new(
            settings.initial_backoff(),
            settings.max_backoff(),
            settings.timeout(),
        )
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn backoff(&self) -> Backoff {
        Backoff::new(self.initial_backoff, self.max_backoff)
    }

    /// Run `attempt` until it succeeds, fails with a non-retryable error, or
    /// the timeout elapses.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut attempt: F) -> LinkResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = LinkResult<T>>,
    {
        let start = Instant::now();
        let mut backoff = self.backoff();
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            let error = match attempt().await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => e,
            };

            let mut delay = backoff.next_delay();
            if let Some(timeout) = self.timeout {
                let elapsed = start.elapsed();
                if elapsed >= timeout {
                    tracing::warn!(operation, attempts, %error, "giving up");
                    return Err(LinkError::Timeout {
                        operation: operation.to_string(),
                        elapsed,
                    });
                }
                delay = delay.min(timeout - elapsed);
            }
            tracing::debug!(operation, attempts, %error, ?delay, "retrying");
            tokio::time::sleep(delay).await;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&RetrySettings::default())
    }
}
