use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::config::ScreeningSettings;

/// Bounded retry with exponential backoff and a per-attempt timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub attempt_timeout: Duration,
}

impl RetryPolicy {
    pub fn from_settings(settings: &ScreeningSettings) -> Self {
        Self {
            max_attempts: settings.job_max_attempts.max(1),
            base_delay: settings.job_backoff,
            attempt_timeout: settings.provider_timeout,
        }
    }

    /// Delay after the given failed attempt (1-based): base, 2×base, 4×base, ...
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1u32 << exponent)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RetryError {
    #[error("{operation} failed after {attempts} attempt(s): {last_error}")]
    Exhausted {
        operation: String,
        attempts: u32,
        last_error: String,
    },
}

/// Run `attempt` until it succeeds or the policy is exhausted. The closure receives the
/// 1-based attempt number.
pub async fn retry_with_backoff<T, E, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut attempt: F,
) -> Result<T, RetryError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut last_error = String::new();

    for number in 1..=max_attempts {
        match tokio::time::timeout(policy.attempt_timeout, attempt(number)).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(error)) => last_error = error.to_string(),
            Err(_) => {
                last_error = format!("timed out after {}ms", policy.attempt_timeout.as_millis())
            }
        }

        if number < max_attempts {
            let delay = policy.delay_after(number);
            warn!(
                operation,
                attempt = number,
                delay_ms = delay.as_millis() as u64,
                error = %last_error,
                "attempt failed; retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    Err(RetryError::Exhausted {
        operation: operation.to_string(),
        attempts: max_attempts,
        last_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            attempt_timeout: Duration::from_millis(200),
        }
    }

    #[test]
    fn backoff_doubles() {
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(250),
            ..policy(3)
        };
        assert_eq!(policy.delay_after(1), Duration::from_millis(250));
        assert_eq!(policy.delay_after(2), Duration::from_millis(500));
        assert_eq!(policy.delay_after(3), Duration::from_millis(1_000));
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = retry_with_backoff(&policy(3), "lookup", |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 3 {
                    Err("temporarily unavailable")
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result.expect("third attempt succeeds"), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let result: Result<(), RetryError> =
            retry_with_backoff(&policy(2), "lookup", |_| async { Err("down") }).await;

        let RetryError::Exhausted {
            attempts,
            last_error,
            ..
        } = result.expect_err("exhausted");
        assert_eq!(attempts, 2);
        assert_eq!(last_error, "down");
    }

    #[tokio::test]
    async fn slow_attempts_time_out() {
        let result: Result<(), RetryError> = retry_with_backoff(&policy(1), "lookup", |_| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<(), String>(())
        })
        .await;

        let error = result.expect_err("timed out").to_string();
        assert!(error.contains("timed out"));
    }
}
