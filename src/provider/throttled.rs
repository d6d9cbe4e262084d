// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 signer contributors

//! Rate-limited provider decorator
//!
//! Wraps any [`HashProvider`] with per-call latency and a ceiling on
//! concurrent strong-hash calls. A strong-hash call that would exceed the
//! ceiling fails as "overheated" instead of computing.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::HashProvider;
use crate::errors::{DigestError, DigestResult};

/// Call counters collected by a [`ThrottledProvider`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProviderStats {
    /// Strong-hash calls started
    pub strong_calls: usize,
    /// Fast-hash calls started
    pub fast_calls: usize,
    /// Highest number of strong-hash calls seen in flight at once
    pub peak_strong_in_flight: usize,
    /// Highest number of fast-hash calls seen in flight at once
    pub peak_fast_in_flight: usize,
}

/// Provider decorator adding latency and a strong-hash ceiling
pub struct ThrottledProvider {
    inner: Arc<dyn HashProvider>,
    strong_latency: Duration,
    fast_latency: Duration,
    strong_limit: usize,
    strong: CallCounter,
    fast: CallCounter,
}

/// Started, live and peak-live calls of one kind
#[derive(Default)]
struct CallCounter {
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl CallCounter {
    /// Record a call start; the guard marks it finished when dropped
    fn enter(&self) -> (usize, InFlight<'_>) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(current, Ordering::SeqCst);
        (current, InFlight(&self.in_flight))
    }
}

/// Decrements an in-flight counter when a call ends
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ThrottledProvider {
    /// Wrap `inner` with no latency and a strong-hash ceiling of one
    pub fn new(inner: Arc<dyn HashProvider>) -> Self {
        Self {
            inner,
            strong_latency: Duration::ZERO,
            fast_latency: Duration::ZERO,
            strong_limit: 1,
            strong: CallCounter::default(),
            fast: CallCounter::default(),
        }
    }

    /// Set the latency added to each strong-hash call
    pub fn with_strong_latency(mut self, latency: Duration) -> Self {
        self.strong_latency = latency;
        self
    }

    /// Set the latency added to each fast-hash call
    pub fn with_fast_latency(mut self, latency: Duration) -> Self {
        self.fast_latency = latency;
        self
    }

    /// Set how many strong-hash calls may be in flight at once
    pub fn with_strong_limit(mut self, limit: usize) -> Self {
        self.strong_limit = limit.max(1);
        self
    }

    /// Snapshot the call counters
    pub fn stats(&self) -> ProviderStats {
        ProviderStats {
            strong_calls: self.strong.calls.load(Ordering::SeqCst),
            fast_calls: self.fast.calls.load(Ordering::SeqCst),
            peak_strong_in_flight: self.strong.peak.load(Ordering::SeqCst),
            peak_fast_in_flight: self.fast.peak.load(Ordering::SeqCst),
        }
    }
}

#[async_trait]
impl HashProvider for ThrottledProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn strong_hash(&self, input: &str) -> DigestResult<String> {
        let (current, _guard) = self.strong.enter();

        if current > self.strong_limit {
            tracing::warn!(
                provider = self.inner.name(),
                in_flight = current,
                limit = self.strong_limit,
                "strong hash overheated"
            );
            return Err(DigestError::overheated(
                self.inner.name(),
                current,
                self.strong_limit,
            ));
        }

        if !self.strong_latency.is_zero() {
            tokio::time::sleep(self.strong_latency).await;
        }
        self.inner.strong_hash(input).await
    }

    async fn fast_hash(&self, input: &str) -> DigestResult<String> {
        let _guard = self.fast.enter();

        if !self.fast_latency.is_zero() {
            tokio::time::sleep(self.fast_latency).await;
        }
        self.inner.fast_hash(input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::StubProvider;

    fn throttled(latency_ms: u64) -> Arc<ThrottledProvider> {
        Arc::new(
            ThrottledProvider::new(Arc::new(StubProvider::new()))
                .with_strong_latency(Duration::from_millis(latency_ms)),
        )
    }

    #[tokio::test]
    async fn test_sequential_calls_pass() {
        let provider = throttled(1);

        assert_eq!(provider.strong_hash("a").await.unwrap(), "a_STRONG");
        assert_eq!(provider.strong_hash("b").await.unwrap(), "b_STRONG");
        assert_eq!(provider.fast_hash("a").await.unwrap(), "H(a)");

        let stats = provider.stats();
        assert_eq!(stats.strong_calls, 2);
        assert_eq!(stats.fast_calls, 1);
        assert_eq!(stats.peak_strong_in_flight, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_strong_calls_overheat() {
        let provider = throttled(50);

        let a = tokio::spawn({
            let provider = Arc::clone(&provider);
            async move { provider.strong_hash("a").await }
        });
        let b = tokio::spawn({
            let provider = Arc::clone(&provider);
            async move { provider.strong_hash("b").await }
        });

        let results = [a.await.unwrap(), b.await.unwrap()];
        let failures = results.iter().filter(|r| r.is_err()).count();

        assert_eq!(failures, 1);
        assert_eq!(provider.stats().peak_strong_in_flight, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_fast_calls_are_unthrottled() {
        let provider = Arc::new(
            ThrottledProvider::new(Arc::new(StubProvider::new()))
                .with_fast_latency(Duration::from_millis(30)),
        );

        let calls: Vec<_> = (0..3)
            .map(|i| {
                let provider = Arc::clone(&provider);
                tokio::spawn(async move { provider.fast_hash(&i.to_string()).await })
            })
            .collect();
        for call in calls {
            assert!(call.await.unwrap().is_ok());
        }

        let stats = provider.stats();
        assert_eq!(stats.fast_calls, 3);
        assert_eq!(stats.peak_fast_in_flight, 3);
        assert_eq!(stats.peak_strong_in_flight, 0);
    }

    #[tokio::test]
    async fn test_zero_limit_is_clamped() {
        let provider = Arc::new(
            ThrottledProvider::new(Arc::new(StubProvider::new())).with_strong_limit(0),
        );

        assert!(provider.strong_hash("a").await.is_ok());
        assert!(provider.strong_hash("b").await.is_ok());
    }
}
