//! Retry logic.
//!
//! # Responsibilities
//! - Re-invoke the same operation until it succeeds or the attempt budget is spent
//! - Wait a constant delay between attempts
//! - Hand the last failure back to the caller unchanged
//!
//! # Design Decisions
//! - `max_attempts` counts invocations, not retries; 0 and 1 both mean one attempt
//! - Constant delay: no jitter, no exponential growth
//! - The delay primitive is a `Sleeper` so tests run without wall-clock time
//! - Errors are never inspected here; status classification is the caller's hook

use std::convert::Infallible;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;

use crate::config::RetryConfig;
use crate::observability::metrics;
use crate::resilience::cancel::{CancelToken, Cancelled};

/// Attempts made by the service clients unless configured otherwise.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;

/// Pause between attempts unless configured otherwise.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(1000);

/// Attempt budget for one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total invocations allowed. Values below 1 are treated as 1.
    pub max_attempts: u32,
    /// Fixed pause between a failed attempt and the next one.
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// A policy that never retries.
    pub fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Number of invocations the dispatcher will actually make at most.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_DELAY)
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        if !config.enabled {
            return Self::once();
        }
        Self::new(config.max_attempts, Duration::from_millis(config.delay_ms))
    }
}

/// Non-blocking delay primitive used between attempts.
pub trait Sleeper: Send + Sync + std::fmt::Debug {
    fn sleep(&self, delay: Duration) -> BoxFuture<'static, ()>;
}

/// `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, delay: Duration) -> BoxFuture<'static, ()> {
        Box::pin(tokio::time::sleep(delay))
    }
}

/// Executes a request-issuing operation under a `RetryPolicy`.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    name: Arc<str>,
}

impl Dispatcher {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            sleeper: Arc::new(TokioSleeper),
            name: Arc::from("default"),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the delay primitive.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Label used in logs and metrics (usually the service prefix).
    pub fn named(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = name.into();
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Run `op` until it succeeds or the budget is spent.
    ///
    /// The same closure is invoked on every attempt, so it must be safe to
    /// call repeatedly.
    pub async fn run<T, E, F, Fut>(&self, op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        match self.drive(op, std::future::pending::<Infallible>).await {
            Ok(outcome) => outcome,
            Err(never) => match never {},
        }
    }

    /// Like [`Dispatcher::run`], but stops as soon as `cancel` fires, whether
    /// an attempt or a delay is in progress.
    pub async fn run_until_cancelled<T, E, F, Fut>(&self, cancel: &CancelToken, op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display + From<Cancelled>,
    {
        let fired = || async move {
            cancel.cancelled().await;
            Cancelled
        };
        match self.drive(op, fired).await {
            Ok(outcome) => outcome,
            Err(cancelled) => {
                tracing::debug!(dispatcher = %self.name, "Dispatch cancelled");
                Err(E::from(cancelled))
            }
        }
    }

    async fn drive<T, E, X, F, Fut, C, CFut>(&self, mut op: F, cancelled: C) -> Result<Result<T, E>, X>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        C: Fn() -> CFut,
        CFut: Future<Output = X>,
    {
        let attempts = self.policy.attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            metrics::record_dispatch_attempt(&self.name);

            let outcome = tokio::select! {
                biased;
                x = cancelled() => return Err(x),
                outcome = op() => outcome,
            };

            let error = match outcome {
                Ok(value) => return Ok(Ok(value)),
                Err(e) => e,
            };

            if attempt >= attempts {
                tracing::debug!(dispatcher = %self.name, attempts = attempt, error = %error, "Retry budget exhausted");
                return Ok(Err(error));
            }

            tracing::warn!(
                dispatcher = %self.name,
                attempt,
                delay = ?self.policy.delay,
                error = %error,
                "Request failed, retrying"
            );
            metrics::record_dispatch_retry(&self.name);

            tokio::select! {
                biased;
                x = cancelled() => return Err(x),
                _ = self.sleeper.sleep(self.policy.delay) => {}
            }
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Records requested delays and returns immediately.
    #[derive(Debug, Default)]
    struct RecordingSleeper {
        delays: Mutex<Vec<Duration>>,
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, delay: Duration) -> BoxFuture<'static, ()> {
            self.delays.lock().unwrap().push(delay);
            Box::pin(async {})
        }
    }

    fn dispatcher(max_attempts: u32, sleeper: Arc<RecordingSleeper>) -> Dispatcher {
        Dispatcher::new(RetryPolicy::new(max_attempts, Duration::from_millis(250))).with_sleeper(sleeper)
    }

    #[tokio::test]
    async fn always_failing_op_is_invoked_max_attempts_times() {
        for n in 1..=5 {
            let sleeper = Arc::new(RecordingSleeper::default());
            let calls = &AtomicU32::new(0);
            let result: Result<(), String> = dispatcher(n, sleeper.clone())
                .run(|| async move {
                    let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    Err(format!("failure {}", call))
                })
                .await;

            assert_eq!(calls.load(Ordering::SeqCst), n);
            assert_eq!(result, Err(format!("failure {}", n)));
            assert_eq!(sleeper.delays.lock().unwrap().len(), (n - 1) as usize);
        }
    }

    #[tokio::test]
    async fn success_on_attempt_k_stops_retrying() {
        let sleeper = Arc::new(RecordingSleeper::default());
        let calls = &AtomicU32::new(0);
        let result: Result<u32, String> = dispatcher(4, sleeper.clone())
            .run(|| async move {
                let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if call < 3 {
                    Err("not yet".to_string())
                } else {
                    Ok(call)
                }
            })
            .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(sleeper.delays.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn zero_attempts_still_invokes_once() {
        let sleeper = Arc::new(RecordingSleeper::default());
        let calls = &AtomicU32::new(0);
        let result: Result<(), &str> = dispatcher(0, sleeper.clone())
            .run(|| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("boom")
            })
            .await;

        assert_eq!(result, Err("boom"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(sleeper.delays.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn delay_is_constant_between_attempts() {
        let sleeper = Arc::new(RecordingSleeper::default());
        let _: Result<(), &str> = dispatcher(5, sleeper.clone()).run(|| async move { Err("down") }).await;

        let delays = sleeper.delays.lock().unwrap();
        assert_eq!(delays.len(), 4);
        assert!(delays.iter().all(|d| *d == Duration::from_millis(250)));
    }

    #[tokio::test(start_paused = true)]
    async fn two_failures_wait_one_full_delay() {
        let calls = &AtomicU32::new(0);
        let start = tokio::time::Instant::now();

        let result: Result<&str, String> = Dispatcher::default()
            .run(|| async move {
                let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if call <= 2 {
                    Err(format!("attempt {} failed", call))
                } else {
                    Ok("third call would succeed")
                }
            })
            .await;

        assert_eq!(result, Err("attempt 2 failed".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(start.elapsed() >= Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn pre_cancelled_token_issues_no_attempt() {
        let token = CancelToken::new();
        token.cancel();
        let calls = &AtomicU32::new(0);

        let result: Result<(), crate::error::DispatchError> = Dispatcher::default()
            .run_until_cancelled(&token, || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await;

        assert_eq!(result, Err(crate::error::DispatchError::Cancelled));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_delay_aborts_pending_retry() {
        let token = CancelToken::new();
        let calls = Arc::new(AtomicU32::new(0));
        let dispatcher = Dispatcher::new(RetryPolicy::new(3, Duration::from_secs(60)));

        let task = {
            let token = token.clone();
            let calls = calls.clone();
            tokio::spawn(async move {
                dispatcher
                    .run_until_cancelled(&token, || {
                        let calls = calls.clone();
                        async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            Err::<(), _>(crate::error::DispatchError::Transport("reset".into()))
                        }
                    })
                    .await
            })
        };

        tokio::time::sleep(Duration::from_secs(1)).await;
        token.cancel();

        let result = task.await.unwrap();
        assert_eq!(result, Err(crate::error::DispatchError::Cancelled));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn policy_from_disabled_config_is_single_attempt() {
        let config = RetryConfig {
            enabled: false,
            ..RetryConfig::default()
        };
        assert_eq!(RetryPolicy::from(&config).attempts(), 1);
        assert_eq!(RetryPolicy::from(&RetryConfig::default()), RetryPolicy::default());
    }
}
