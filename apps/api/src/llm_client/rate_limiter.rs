//! Outbound call throttle.
//!
//! One `RateLimiter` is shared by every request in the process. It records the
//! instant the last call was *issued* (not completed), so it bounds sustained
//! throughput rather than per-call latency.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use super::{CompletionRequest, CompletionService, LlmError};

pub struct RateLimiter {
    min_interval: Duration,
    last_issued: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_issued: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Waits until a call may be issued, records the issue instant and returns it.
    ///
    /// The lock is held across the sleep: concurrent callers queue on the mutex
    /// and are released one interval apart.
    pub async fn acquire(&self) -> Instant {
        let mut last_issued = self.last_issued.lock().await;

        if let Some(previous) = *last_issued {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                debug!("Rate limiter holding call for {}ms", wait.as_millis());
                tokio::time::sleep(wait).await;
            }
        }

        let issued = Instant::now();
        *last_issued = Some(issued);
        issued
    }
}

/// Decorates a `CompletionService` so that every call passes through the limiter.
pub struct RateLimitedClient {
    inner: Arc<dyn CompletionService>,
    limiter: Arc<RateLimiter>,
}

impl RateLimitedClient {
    pub fn new(inner: Arc<dyn CompletionService>, limiter: Arc<RateLimiter>) -> Self {
        Self { inner, limiter }
    }
}

#[async_trait]
impl CompletionService for RateLimitedClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        self.limiter.acquire().await;
        self.inner.complete(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedCompletion;

    const INTERVAL: Duration = Duration::from_millis(300);

    fn assert_spaced(mut issued: Vec<Instant>) {
        issued.sort();
        for pair in issued.windows(2) {
            let gap = pair[1] - pair[0];
            assert!(
                gap >= INTERVAL,
                "calls issued {}ms apart, minimum is {}ms",
                gap.as_millis(),
                INTERVAL.as_millis()
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_call_is_not_delayed() {
        let limiter = RateLimiter::new(INTERVAL);
        let start = Instant::now();
        let issued = limiter.acquire().await;
        assert_eq!(issued, start);
    }

    #[tokio::test(start_paused = true)]
    async fn test_back_to_back_calls_are_spaced() {
        let limiter = RateLimiter::new(INTERVAL);
        let mut issued = Vec::new();
        for _ in 0..5 {
            issued.push(limiter.acquire().await);
        }
        assert_spaced(issued);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_gap_longer_than_interval_is_not_padded() {
        let limiter = RateLimiter::new(INTERVAL);
        limiter.acquire().await;
        tokio::time::sleep(INTERVAL * 2).await;

        let before = Instant::now();
        let issued = limiter.acquire().await;
        assert_eq!(issued, before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_gap_waits_only_the_remainder() {
        let limiter = RateLimiter::new(INTERVAL);
        let first = limiter.acquire().await;
        tokio::time::sleep(Duration::from_millis(100)).await;

        let second = limiter.acquire().await;
        let gap = second - first;
        assert!(gap >= INTERVAL);
        assert!(gap < INTERVAL + Duration::from_millis(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_never_overlap_interval() {
        let limiter = Arc::new(RateLimiter::new(INTERVAL));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move { limiter.acquire().await }));
        }

        let mut issued = Vec::new();
        for handle in handles {
            issued.push(handle.await.unwrap());
        }
        assert_eq!(issued.len(), 8);
        assert_spaced(issued);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_client_throttles_inner_service() {
        let inner = Arc::new(ScriptedCompletion::always("ok"));
        let limiter = Arc::new(RateLimiter::new(INTERVAL));
        let client = RateLimitedClient::new(inner.clone(), limiter);

        let start = Instant::now();
        for _ in 0..3 {
            let text = client
                .complete(CompletionRequest::text("sys", "prompt"))
                .await
                .unwrap();
            assert_eq!(text, "ok");
        }

        assert_eq!(inner.call_count(), 3);
        assert!(Instant::now() - start >= INTERVAL * 2);
    }
}
