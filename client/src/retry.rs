//! Retry policy applied at every remote call site.

use std::future::Future;
use std::num::NonZeroU32;
use std::time::Duration;

use retrovote_types::Address;

use crate::ApiError;

/// How often a transient failure is retried.
///
/// The default is unbounded with no delay: an account keeps trying until the
/// call succeeds or fails fatally. A cap turns the final transient failure
/// into [`ApiError::RetriesExhausted`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: Option<NonZeroU32>,
    delay: Duration,
}

impl RetryPolicy {
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// At most `max_attempts` attempts in total (`0` is treated as `1`).
    pub fn bounded(max_attempts: u32) -> Self {
        Self {
            max_attempts: Some(NonZeroU32::new(max_attempts).unwrap_or(NonZeroU32::MIN)),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts.map(NonZeroU32::get)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `op` until it succeeds, fails fatally, or the cap is reached.
    ///
    /// Every transient failure is logged as `"{account} | {operation} ..."`.
    pub async fn run<T, F, Fut>(
        &self,
        operation: &str,
        account: &Address,
        mut op: F,
    ) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt = attempt.saturating_add(1);
            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) => err,
            };

            if let Some(max) = self.max_attempts {
                if attempt >= max.get() {
                    tracing::error!(
                        "{account} | {operation} failed after {attempt} attempts: {err}"
                    );
                    return Err(ApiError::RetriesExhausted {
                        attempts: attempt,
                        last: Box::new(err),
                    });
                }
            }

            tracing::warn!("{account} | {operation} failed (attempt {attempt}), retrying: {err}");
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn account() -> Address {
        "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed".parse().unwrap()
    }

    fn transient() -> ApiError {
        ApiError::Transport("connection reset".into())
    }

    #[tokio::test]
    async fn unbounded_retries_until_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = RetryPolicy::unbounded()
            .run("get challenge", &account(), move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 9 {
                    Err(transient())
                } else {
                    Ok("nonce")
                }
            })
            .await;
        assert_eq!(result, Ok("nonce"));
        assert_eq!(calls.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn fatal_error_is_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = RetryPolicy::unbounded()
            .run("login", &account(), move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ApiError::Payload("bad".into()))
            })
            .await;
        assert_eq!(result, Err(ApiError::Payload("bad".into())));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn bounded_policy_gives_up() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = RetryPolicy::bounded(3)
            .run("cast vote", &account(), move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(transient())
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(ApiError::RetriesExhausted { attempts, last }) => {
                assert_eq!(attempts, 3);
                assert_eq!(*last, transient());
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn zero_cap_means_single_attempt() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::bounded(0);
        assert_eq!(policy.max_attempts(), Some(1));
        let _: Result<(), _> = policy
            .run("x", &account(), move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(transient())
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn delay_is_applied_between_attempts() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let started = std::time::Instant::now();
        let _: Result<(), _> = RetryPolicy::bounded(3)
            .with_delay(Duration::from_millis(20))
            .run("x", &account(), move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(transient())
            })
            .await;
        assert!(started.elapsed() >= Duration::from_millis(40));
    }
}
