//! Retry on rate limiting and connection failures.

use crate::error::ErrorDetail;
use crate::{Configuration, Error, Response, Result, MAX_RETRY_AFTER};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Fraction of the backoff delay added as random jitter, at most.
const JITTER_FRACTION: f64 = 0.1;

/// A completed attempt the rate limiter can inspect.
pub trait RetryableResponse {
    /// HTTP status code of the attempt.
    fn status_code(&self) -> u16;

    /// Server supplied retry delay, when present and positive.
    fn retry_after(&self) -> Option<Duration>;

    /// Error records carried by the attempt.
    fn error_details(&self) -> Vec<ErrorDetail> {
        Vec::new()
    }
}

impl RetryableResponse for Response {
    fn status_code(&self) -> u16 {
        self.status().as_u16()
    }

    fn retry_after(&self) -> Option<Duration> {
        Response::retry_after(self)
    }

    fn error_details(&self) -> Vec<ErrorDetail> {
        self.errors()
    }
}

/// Retries a single-attempt unit of work on HTTP 429 and connection failures.
///
/// Other statuses, including 4xx/5xx, are handed back untouched for the
/// caller to classify. A 429 is never returned: it is either retried or
/// turned into [`Error::RateLimit`].
#[derive(Debug, Clone)]
pub struct RateLimiter {
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each further retry.
    pub base_delay: Duration,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RateLimiter {
    /// Create a rate limiter.
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Create a rate limiter from the retry settings of a configuration.
    pub fn from_config(config: &Configuration) -> Self {
        Self::new(config.max_retries, config.retry_base_delay)
    }

    /// Exponential backoff for a 1-indexed retry, without jitter.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay.saturating_mul(1u32 << exponent)
    }

    /// Delay before a 1-indexed retry.
    ///
    /// A positive server supplied `Retry-After` wins, capped at
    /// [`MAX_RETRY_AFTER`]; otherwise exponential backoff with up to 10% jitter.
    pub fn delay_for_attempt(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        if let Some(delay) = retry_after.filter(|d| !d.is_zero()) {
            return delay.min(MAX_RETRY_AFTER);
        }
        let backoff = self.backoff(attempt);
        let jitter = backoff.mul_f64(rand::random::<f64>() * JITTER_FRACTION);
        backoff + jitter
    }

    /// Run `attempt` until it yields something other than a 429.
    pub async fn with_retry<F, Fut, R>(&self, mut attempt: F) -> Result<R>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<R>>,
        R: RetryableResponse,
    {
        let mut retries = 0u32;

        loop {
            match attempt().await {
                Ok(response) if response.status_code() == 429 => {
                    let retry_after = response.retry_after();
                    if retries >= self.max_retries {
                        return Err(Error::RateLimit {
                            message: "Too many requests".to_string(),
                            retries,
                            retry_after,
                            errors: response.error_details(),
                        });
                    }
                    retries += 1;
                    let delay = self.delay_for_attempt(retries, retry_after);
                    warn!(
                        retry = retries,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "Rate limited, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Ok(response) => {
                    if retries > 0 {
                        debug!(
                            retries,
                            status = response.status_code(),
                            "Request succeeded after retry"
                        );
                    }
                    return Ok(response);
                }
                Err(e) if e.is_retryable() => {
                    if retries >= self.max_retries {
                        return Err(Error::Network {
                            message: e.to_string(),
                            retries,
                        });
                    }
                    retries += 1;
                    let delay = self.delay_for_attempt(retries, None);
                    warn!(
                        retry = retries,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Connection failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct FakeResponse {
        status: u16,
        retry_after: Option<Duration>,
    }

    impl FakeResponse {
        fn status(status: u16) -> Self {
            Self {
                status,
                retry_after: None,
            }
        }
    }

    impl RetryableResponse for FakeResponse {
        fn status_code(&self) -> u16 {
            self.status
        }

        fn retry_after(&self) -> Option<Duration> {
            self.retry_after
        }
    }

    #[test]
    fn test_backoff_doubles() {
        let limiter = RateLimiter::new(3, Duration::from_millis(100));
        assert_eq!(limiter.backoff(1), Duration::from_millis(100));
        assert_eq!(limiter.backoff(2), Duration::from_millis(200));
        assert_eq!(limiter.backoff(3), Duration::from_millis(400));
    }

    #[test]
    fn test_jitter_is_bounded() {
        let limiter = RateLimiter::new(3, Duration::from_secs(1));
        for attempt in 1..=4 {
            let base = limiter.backoff(attempt);
            let delay = limiter.delay_for_attempt(attempt, None);
            assert!(delay >= base);
            assert!(delay <= base.mul_f64(1.1));
        }
    }

    #[test]
    fn test_retry_after_wins() {
        let limiter = RateLimiter::default();
        assert_eq!(
            limiter.delay_for_attempt(3, Some(Duration::from_secs(7))),
            Duration::from_secs(7)
        );
        assert!(limiter.delay_for_attempt(1, Some(Duration::ZERO)) >= Duration::from_secs(1));
        assert_eq!(
            limiter.delay_for_attempt(1, Some(Duration::from_secs(10_000))),
            MAX_RETRY_AFTER
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_retry_after_header_is_capped() {
        use bytes::Bytes;
        use http::{HeaderMap, HeaderValue, StatusCode};

        let limiter = RateLimiter::new(1, Duration::from_millis(10));
        let calls = Cell::new(0u32);
        let started = tokio::time::Instant::now();

        let response = limiter
            .with_retry(|| {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move {
                    if n == 1 {
                        let mut headers = HeaderMap::new();
                        headers.insert("retry-after", HeaderValue::from_static("1e20"));
                        Ok(Response::from_parts(
                            StatusCode::TOO_MANY_REQUESTS,
                            headers,
                            Bytes::new(),
                        ))
                    } else {
                        Ok(Response::from_parts(
                            StatusCode::OK,
                            HeaderMap::new(),
                            Bytes::from_static(b"{}"),
                        ))
                    }
                }
            })
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(calls.get(), 2);
        let waited = started.elapsed();
        assert!(waited >= MAX_RETRY_AFTER);
        assert!(waited < MAX_RETRY_AFTER + Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_first_non_429() {
        let limiter = RateLimiter::new(3, Duration::from_secs(1));
        let calls = Cell::new(0u32);

        let response = limiter
            .with_retry(|| {
                calls.set(calls.get() + 1);
                let status = if calls.get() <= 2 { 429 } else { 200 };
                async move { Ok(FakeResponse::status(status)) }
            })
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_429_raises_rate_limit() {
        let limiter = RateLimiter::new(3, Duration::from_secs(1));
        let calls = Cell::new(0u32);

        let result = limiter
            .with_retry(|| {
                calls.set(calls.get() + 1);
                async move {
                    Ok(FakeResponse {
                        status: 429,
                        retry_after: Some(Duration::from_secs(5)),
                    })
                }
            })
            .await;

        match result {
            Err(Error::RateLimit {
                retries,
                retry_after,
                ..
            }) => {
                assert_eq!(retries, 3);
                assert_eq!(retry_after, Some(Duration::from_secs(5)));
            }
            other => panic!("expected rate limit error, got {:?}", other.map(|r| r.status)),
        }
        assert_eq!(calls.get(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_statuses_pass_through() {
        let limiter = RateLimiter::default();
        let calls = Cell::new(0u32);

        let response = limiter
            .with_retry(|| {
                calls.set(calls.get() + 1);
                async move { Ok(FakeResponse::status(503)) }
            })
            .await
            .unwrap();

        assert_eq!(response.status, 503);
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connection_failures_retry_then_raise() {
        let limiter = RateLimiter::new(2, Duration::from_millis(10));
        let calls = Cell::new(0u32);

        let result: Result<FakeResponse> = limiter
            .with_retry(|| {
                calls.set(calls.get() + 1);
                async move { Err(Error::Connection("connection refused".to_string())) }
            })
            .await;

        assert!(matches!(result, Err(Error::Network { retries: 2, .. })));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connection_failure_recovers() {
        let limiter = RateLimiter::new(2, Duration::from_millis(10));
        let calls = Cell::new(0u32);

        let response = limiter
            .with_retry(|| {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move {
                    if n == 1 {
                        Err(Error::Connection("connection reset".to_string()))
                    } else {
                        Ok(FakeResponse::status(200))
                    }
                }
            })
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(calls.get(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_errors_are_not_retried() {
        let limiter = RateLimiter::default();
        let calls = Cell::new(0u32);

        let result: Result<FakeResponse> = limiter
            .with_retry(|| {
                calls.set(calls.get() + 1);
                async move { Err(Error::InvalidUrl("::".to_string())) }
            })
            .await;

        assert!(matches!(result, Err(Error::InvalidUrl(_))));
        assert_eq!(calls.get(), 1);
    }
}
