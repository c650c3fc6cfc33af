//! Retry with exponential backoff and jitter.
//!
//! Every retrying call site names its own [`RetryPolicy`]: how many retries,
//! which errors qualify, and optionally an observer for each retry. After
//! exhaustion, or on the first error the predicate rejects, the last error
//! is returned unchanged.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

use crate::config::RetrySettings;
use crate::http::ApiError;

const JITTER_MS: u64 = 1000;

/// Details passed to a policy's `on_retry` observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryAttempt {
    /// 1-based retry number.
    pub attempt: u32,
    pub max_retries: u32,
    /// Sleep before this retry.
    pub delay: Duration,
}

type Predicate<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;
type Observer = Arc<dyn Fn(RetryAttempt) + Send + Sync>;

/// How a call is retried.
pub struct RetryPolicy<E> {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    should_retry: Predicate<E>,
    on_retry: Option<Observer>,
}

impl<E> RetryPolicy<E> {
    /// Policy retrying up to `max_retries` times on errors accepted by
    /// `should_retry`, with 1s initial and 10s maximum delay.
    pub fn new(max_retries: u32, should_retry: impl Fn(&E) -> bool + Send + Sync + 'static) -> Self {
        let defaults = RetrySettings::default();
        Self {
            max_retries,
            initial_delay: defaults.initial_delay,
            max_delay: defaults.max_delay,
            should_retry: Arc::new(should_retry),
            on_retry: None,
        }
    }

    /// Policy that never retries.
    #[must_use]
    pub fn none() -> Self {
        Self::new(0, |_| false)
    }

    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Use the delays from `settings`.
    #[must_use]
    pub const fn with_settings(mut self, settings: RetrySettings) -> Self {
        self.initial_delay = settings.initial_delay;
        self.max_delay = settings.max_delay;
        self
    }

    /// Replace the retry predicate.
    #[must_use]
    pub fn with_predicate(mut self, should_retry: impl Fn(&E) -> bool + Send + Sync + 'static) -> Self {
        self.should_retry = Arc::new(should_retry);
        self
    }

    /// Observe each retry before its sleep.
    #[must_use]
    pub fn on_retry(mut self, observer: impl Fn(RetryAttempt) + Send + Sync + 'static) -> Self {
        self.on_retry = Some(Arc::new(observer));
        self
    }

    /// Whether `error` qualifies for a retry.
    #[must_use]
    pub fn should_retry(&self, error: &E) -> bool {
        (self.should_retry)(error)
    }

    /// Delay following `delay`: doubled plus up to a second of jitter,
    /// capped at `max_delay`.
    #[must_use]
    pub fn next_delay(&self, delay: Duration) -> Duration {
        let jitter = Duration::from_millis(rand::rng().random_range(0..JITTER_MS));
        delay.saturating_mul(2).saturating_add(jitter).min(self.max_delay)
    }
}

impl Default for RetryPolicy<ApiError> {
    /// Three retries on network errors, timeouts and 5xx.
    fn default() -> Self {
        Self::new(3, ApiError::is_retryable)
    }
}

impl<E> Clone for RetryPolicy<E> {
    fn clone(&self) -> Self {
        Self {
            max_retries: self.max_retries,
            initial_delay: self.initial_delay,
            max_delay: self.max_delay,
            should_retry: Arc::clone(&self.should_retry),
            on_retry: self.on_retry.clone(),
        }
    }
}

impl<E> fmt::Debug for RetryPolicy<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_retries", &self.max_retries)
            .field("initial_delay", &self.initial_delay)
            .field("max_delay", &self.max_delay)
            .field("has_observer", &self.on_retry.is_some())
            .finish_non_exhaustive()
    }
}

/// Run `request_fn` until it succeeds, the policy rejects the error, or
/// retries run out.
///
/// `request_fn` is called at most `max_retries + 1` times.
///
/// # Errors
///
/// Returns the last error produced by `request_fn`.
pub async fn retry_request<T, E, F, Fut>(policy: &RetryPolicy<E>, mut request_fn: F) -> Result<T, E>
where
    E: fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut delay = policy.initial_delay;
    let mut attempt = 0;

    loop {
        let error = match request_fn().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if !policy.should_retry(&error) {
            debug!(error = %error, "Error is not retryable");
            return Err(error);
        }
        if attempt >= policy.max_retries {
            if policy.max_retries > 0 {
                warn!(error = %error, retries = policy.max_retries, "Retries exhausted");
            }
            return Err(error);
        }

        attempt += 1;
        debug!(
            attempt,
            max_retries = policy.max_retries,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %error,
            "Retrying request"
        );
        if let Some(observer) = &policy.on_retry {
            observer(RetryAttempt {
                attempt,
                max_retries: policy.max_retries,
                delay,
            });
        }
        tokio::time::sleep(delay).await;
        delay = policy.next_delay(delay);
    }
}

/// A function bound to a retry policy. See [`with_retry`].
pub struct WithRetry<F, E> {
    f: F,
    policy: RetryPolicy<E>,
}

/// Bind `f` to `policy`; each [`WithRetry::call`] runs under
/// [`retry_request`].
pub const fn with_retry<F, E>(f: F, policy: RetryPolicy<E>) -> WithRetry<F, E> {
    WithRetry { f, policy }
}

impl<F, E> WithRetry<F, E> {
    /// Call the wrapped function with `args`, cloned for every attempt.
    ///
    /// # Errors
    ///
    /// Returns the last error produced by the wrapped function.
    pub async fn call<A, T, Fut>(&self, args: A) -> Result<T, E>
    where
        A: Clone,
        E: fmt::Display,
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        retry_request(&self.policy, || (self.f)(args.clone())).await
    }

    #[must_use]
    pub const fn policy(&self) -> &RetryPolicy<E> {
        &self.policy
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn server_error() -> ApiError {
        ApiError::from_response(reqwest::StatusCode::INTERNAL_SERVER_ERROR, "")
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_calls_max_plus_one() {
        let calls = &AtomicU32::new(0);
        let policy = RetryPolicy::default().with_max_retries(2);

        let result: Result<(), ApiError> = retry_request(&policy, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(server_error())
        })
        .await;

        assert_eq!(result.unwrap_err().status, Some(500));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_short_circuits() {
        let calls = &AtomicU32::new(0);
        let policy = RetryPolicy::default();

        let result: Result<(), ApiError> = retry_request(&policy, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ApiError::from_response(reqwest::StatusCode::BAD_REQUEST, ""))
        })
        .await;

        assert_eq!(result.unwrap_err().status, Some(400));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failure() {
        let calls = &AtomicU32::new(0);
        let policy = RetryPolicy::default();

        let result = retry_request(&policy, move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(ApiError::network("offline"))
            } else {
                Ok("menu")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "menu");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_observer_sees_each_retry() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let policy = RetryPolicy::default()
            .with_max_retries(2)
            .on_retry(move |a| sink.lock().unwrap().push(a));

        let _: Result<(), ApiError> = retry_request(&policy, || async { Err(server_error()) }).await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].attempt, 1);
        assert_eq!(seen[0].delay, Duration::from_secs(1));
        assert_eq!(seen[1].attempt, 2);
        assert!(seen[1].delay >= Duration::from_secs(2));
        assert!(seen[1].delay < Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_retries() {
        let calls = &AtomicU32::new(0);
        let policy = RetryPolicy::<ApiError>::none();

        let _: Result<(), ApiError> = retry_request(&policy, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ApiError::network("offline"))
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_next_delay_is_capped() {
        let policy = RetryPolicy::default();
        for _ in 0..50 {
            let next = policy.next_delay(Duration::from_secs(3));
            assert!(next >= Duration::from_secs(6));
            assert!(next < Duration::from_secs(7));
            assert_eq!(policy.next_delay(Duration::from_secs(8)), Duration::from_secs(10));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_retry_clones_args() {
        let calls = AtomicU32::new(0);
        let lookup = with_retry(
            |id: String| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 1 {
                        Err(ApiError::network("offline"))
                    } else {
                        Ok(format!("order {id}"))
                    }
                }
            },
            RetryPolicy::default().with_max_retries(2),
        );

        assert_eq!(lookup.call("A-1".to_string()).await.unwrap(), "order A-1");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(lookup.policy().max_retries, 2);
    }
}
