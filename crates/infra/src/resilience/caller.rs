use std::future::Future;

use tracing::{debug, warn};

use super::error::{CallError, UpstreamError};
use super::policy::RetryPolicy;

/// Result of a single attempt, as classified by the caller.
#[derive(Debug)]
pub enum CallOutcome<T> {
    Success(T),
    RetryableFailure(UpstreamError),
    FatalFailure(UpstreamError),
}

/// Runs an outbound operation under a [`RetryPolicy`].
#[derive(Debug, Clone, Default)]
pub struct ResilientCaller {
    policy: RetryPolicy,
}

impl ResilientCaller {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run one attempt of `op` under the per-attempt timeout and classify it.
    pub async fn attempt<T, Fut>(&self, op: Fut) -> CallOutcome<T>
    where
        Fut: Future<Output = Result<T, UpstreamError>>,
    {
        match tokio::time::timeout(self.policy.attempt_timeout, op).await {
            Ok(Ok(value)) => CallOutcome::Success(value),
            Ok(Err(err)) if self.policy.is_retryable(&err) => CallOutcome::RetryableFailure(err),
            Ok(Err(err)) => CallOutcome::FatalFailure(err),
            Err(_) => CallOutcome::RetryableFailure(UpstreamError::Timeout(self.policy.attempt_timeout)),
        }
    }

    /// Call `op` until it succeeds, fails fatally, or the attempt budget is spent.
    ///
    /// `op` is invoked once per attempt, so it must build a fresh request each time.
    pub async fn call<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T, CallError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, UpstreamError>>,
    {
        let mut attempts = 0u32;

        loop {
            attempts += 1;

            match self.attempt(op()).await {
                CallOutcome::Success(value) => {
                    if attempts > 1 {
                        debug!(operation, attempts, "call succeeded after retry");
                    }
                    return Ok(value);
                }
                CallOutcome::FatalFailure(err) => {
                    return Err(CallError::Fatal {
                        operation: operation.to_string(),
                        source: err,
                    });
                }
                CallOutcome::RetryableFailure(err) => {
                    if !self.policy.should_retry(attempts) {
                        return Err(CallError::UpstreamUnavailable {
                            operation: operation.to_string(),
                            attempts,
                            last: err,
                        });
                    }

                    let delay = self.policy.delay_for_attempt(attempts - 1);
                    warn!(
                        operation,
                        attempt = attempts,
                        max_attempts = self.policy.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retrying outbound call"
                    );
                    tokio::time::sleep(delay).await;
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
    use std::time::Duration;

    use tokio::sync::Mutex;
    use tokio::time::Instant;

    fn caller() -> ResilientCaller {
        ResilientCaller::new(RetryPolicy::exponential(
            3,
            Duration::from_secs(1),
            Duration::from_secs(10),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_503_exhausts_budget_with_increasing_backoff() {
        let calls = Arc::new(Mutex::new(Vec::<Instant>::new()));

        let result: Result<(), CallError> = caller()
            .call("submit", || {
                let calls = calls.clone();
                async move {
                    calls.lock().await.push(Instant::now());
                    Err(UpstreamError::status(503, "busy"))
                }
            })
            .await;

        let calls = calls.lock().await;
        assert_eq!(calls.len(), 3, "one call plus budget - 1 retries");

        let gaps: Vec<Duration> = calls.windows(2).map(|w| w[1] - w[0]).collect();
        assert_eq!(gaps, vec![Duration::from_secs(1), Duration::from_secs(2)]);

        match result {
            Err(CallError::UpstreamUnavailable { attempts, last, .. }) => {
                assert_eq!(attempts, 3);
                assert_eq!(last.status_code(), Some(503));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn success_on_final_attempt_stops_retrying() {
        let counter = Arc::new(AtomicU32::new(0));

        let result = caller()
            .call("submit", || {
                let counter = counter.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                    if n < 3 {
                        Err(UpstreamError::Network("connection reset".into()))
                    } else {
                        Ok("accepted")
                    }
                }
            })
            .await;

        assert_eq!(result, Ok("accepted"));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_failure_propagates_immediately() {
        let counter = Arc::new(AtomicU32::new(0));
        let started = Instant::now();

        let result: Result<(), CallError> = caller()
            .call("submit", || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(UpstreamError::status(401, "bad token"))
                }
            })
            .await;

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert!(matches!(result, Err(CallError::Fatal { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_attempts_time_out_and_count_as_retryable() {
        let counter = Arc::new(AtomicU32::new(0));
        let caller = ResilientCaller::new(RetryPolicy::exponential(
            2,
            Duration::from_millis(100),
            Duration::from_secs(5),
        ));

        let result: Result<(), CallError> = caller
            .call("notify", || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(())
                }
            })
            .await;

        assert_eq!(counter.load(Ordering::SeqCst), 2);
        match result {
            Err(CallError::UpstreamUnavailable { last, .. }) => {
                assert_eq!(last, UpstreamError::Timeout(Duration::from_secs(5)));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
