//! Exponential backoff for transient failures.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// How a failed attempt should be handled.
#[derive(Debug)]
pub enum Attempt<E> {
    /// The failure is transient; try again if attempts remain.
    Retry(E),
    /// The failure is permanent (authentication, validation); give up now.
    Abort(E),
}

/// Retry limits: `max_retries` extra attempts after the first, waiting
/// `initial_delay` before the first retry and doubling each time.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    /// Attempts after the first one.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
}

impl Backoff {
    /// Creates a backoff policy.
    pub fn new(max_retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
        }
    }

    /// Runs `operation` until it succeeds, aborts, or retries are exhausted.
    ///
    /// The operation receives the zero-based attempt number. The error of
    /// the last attempt is returned on failure.
    pub async fn run<T, E, F, Fut>(&self, mut operation: F) -> Result<T, E>
    where
        E: std::fmt::Display,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, Attempt<E>>>,
    {
        let mut delay = self.initial_delay;
        let mut attempt = 0;

        loop {
            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(Attempt::Abort(err)) => return Err(err),
                Err(Attempt::Retry(err)) => {
                    if attempt >= self.max_retries {
                        return Err(err);
                    }
                    warn!(
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn quick(max_retries: u32) -> Backoff {
        Backoff::new(max_retries, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: Result<u32, String> = quick(3)
            .run(|_| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                }
            })
            .await;

        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried_until_success() {
        let result: Result<u32, String> = quick(3)
            .run(|attempt| async move {
                if attempt < 2 {
                    Err(Attempt::Retry(format!("busy {}", attempt)))
                } else {
                    Ok(attempt)
                }
            })
            .await;

        assert_eq!(result, Ok(2));
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: Result<(), String> = quick(2)
            .run(|attempt| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(Attempt::Retry(format!("busy {}", attempt)))
                }
            })
            .await;

        assert_eq!(result, Err("busy 2".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_abort_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: Result<(), String> = quick(5)
            .run(|_| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(Attempt::Abort("unauthorized".to_string()))
                }
            })
            .await;

        assert_eq!(result, Err("unauthorized".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
