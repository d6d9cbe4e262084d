// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 signer contributors

//! Deterministic stub provider
//!
//! `strong_hash(x) = x + "_STRONG"` and `fast_hash(x) = "H(" + x + ")"`, so
//! pipeline output can be written down by hand. Optional jitter delays each
//! call by a pseudo-random amount to shuffle task completion order.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::HashProvider;
use crate::errors::DigestResult;

/// Stub hash provider with readable output
#[derive(Default)]
pub struct StubProvider {
    jitter: Option<Jitter>,
    calls: AtomicU64,
}

struct Jitter {
    seed: u64,
    max_ms: u64,
}

impl StubProvider {
    /// Create a stub provider without latency
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call by up to `max_ms` milliseconds, varied by `seed`
    pub fn with_jitter(mut self, seed: u64, max_ms: u64) -> Self {
        self.jitter = Some(Jitter { seed, max_ms });
        self
    }

    async fn delay(&self, input: &str) {
        let Some(ref jitter) = self.jitter else {
            return;
        };
        if jitter.max_ms == 0 {
            return;
        }

        let call = self.calls.fetch_add(1, Ordering::Relaxed);
        let mut hasher = ::blake3::Hasher::new();
        hasher.update(&jitter.seed.to_le_bytes());
        hasher.update(&call.to_le_bytes());
        hasher.update(input.as_bytes());
        let digest = hasher.finalize();

        let mut word = [0u8; 8];
        word.copy_from_slice(&digest.as_bytes()[..8]);
        let ms = u64::from_le_bytes(word) % (jitter.max_ms + 1);

        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

#[async_trait]
impl HashProvider for StubProvider {
    fn name(&self) -> &str {
        "stub"
    }

    async fn strong_hash(&self, input: &str) -> DigestResult<String> {
        self.delay(input).await;
        Ok(format!("{}_STRONG", input))
    }

    async fn fast_hash(&self, input: &str) -> DigestResult<String> {
        self.delay(input).await;
        Ok(format!("H({})", input))
    }
}
