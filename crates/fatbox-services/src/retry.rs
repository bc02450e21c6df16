//! Bounded retry for outbound uploads

use fatbox_core::{Destination, UpstreamConfig};
use rand::Rng;
use std::future::Future;
use std::time::Duration;

use crate::forwarder::ForwardError;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Delay before retry number `retry` (1-based): doubling from the base
    /// delay, plus up to 50% random jitter.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exp = retry.saturating_sub(1).min(8);
        let base = self.base_delay.saturating_mul(1u32 << exp);
        let max_jitter_ms = (base.as_millis() / 2) as u64;
        let jitter_ms = if max_jitter_ms == 0 {
            0
        } else {
            rand::rng().random_range(0..=max_jitter_ms)
        };
        base + Duration::from_millis(jitter_ms)
    }

    /// Run `op` until it succeeds, fails with a non-transient error, or the
    /// retries are used up. `op` receives the 1-based attempt number.
    pub async fn run<T, F, Fut>(&self, destination: Destination, mut op: F) -> Result<T, ForwardError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, ForwardError>>,
    {
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt <= self.max_retries => {
                    let delay = self.delay_for(attempt);
                    tracing::warn!(
                        destination = %destination,
                        attempt = attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Upstream attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl From<&UpstreamConfig> for RetryPolicy {
    fn from(config: &UpstreamConfig) -> Self {
        Self::new(config.max_retries, config.retry_base_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn server_error() -> ForwardError {
        ForwardError::Status {
            destination: Destination::Catbox,
            status: 503,
            body: "busy".into(),
        }
    }

    #[test]
    fn delay_stays_within_jitter_bounds() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100));
        for _ in 0..50 {
            let first = policy.delay_for(1);
            assert!(first >= Duration::from_millis(100) && first <= Duration::from_millis(150));
            let second = policy.delay_for(2);
            assert!(second >= Duration::from_millis(200) && second <= Duration::from_millis(300));
        }
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).delay_for(1), Duration::ZERO);
    }

    #[tokio::test]
    async fn transient_failure_is_retried_once() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(1, Duration::from_millis(1));

        let result = policy
            .run(Destination::Catbox, |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt == 1 {
                        Err(server_error())
                    } else {
                        Ok("https://files.catbox.moe/abc.bin")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "https://files.catbox.moe/abc.bin");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn retries_are_bounded() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(1, Duration::from_millis(1));

        let result: Result<(), _> = policy
            .run(Destination::Catbox, |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(server_error()) }
            })
            .await;

        assert!(matches!(result, Err(ForwardError::Status { status: 503, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn permanent_failure_is_not_retried() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(3, Duration::from_millis(1));

        let result: Result<(), _> = policy
            .run(Destination::Pomf, |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(ForwardError::Rejected {
                        destination: Destination::Pomf,
                        reason: "success flag was false".into(),
                        body: r#"{"success":false}"#.into(),
                    })
                }
            })
            .await;

        assert!(matches!(result, Err(ForwardError::Rejected { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
