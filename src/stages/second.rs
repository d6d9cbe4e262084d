// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 signer contributors

//! Second digest stage
//!
//! For every item, hashes `"0" + data` through `"5" + data` concurrently and
//! concatenates the six results in index order.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::errors::DigestResult;
use crate::pipeline::{emit, fan_out_ordered, FanOut, Item, ItemReceiver, ItemSender, Stage};
use crate::provider::HashProvider;

const NAME: &str = "second_digest";

/// Number of indexed sub-hashes per item
pub const SUB_HASHES: usize = 6;

/// Second digest stage
pub struct SecondDigest {
    provider: Arc<dyn HashProvider>,
    max_in_flight: Option<usize>,
}

impl SecondDigest {
    pub fn new(provider: Arc<dyn HashProvider>) -> Self {
        Self {
            provider,
            max_in_flight: None,
        }
    }

    /// Bound the number of items processed at once
    pub fn with_max_in_flight(mut self, limit: Option<usize>) -> Self {
        self.max_in_flight = limit;
        self
    }
}

/// Digest one item's canonical string
pub async fn multi_hash(provider: &Arc<dyn HashProvider>, data: &str) -> DigestResult<String> {
    let inputs: [String; SUB_HASHES] = std::array::from_fn(|i| format!("{}{}", i, data));

    let parts = fan_out_ordered(NAME, inputs, |input| {
        let provider = Arc::clone(provider);
        async move { provider.fast_hash(&input).await }
    })
    .await?;

    Ok(parts.concat())
}

#[async_trait]
impl Stage for SecondDigest {
    fn name(&self) -> &str {
        NAME
    }

    async fn run(&self, mut input: ItemReceiver, output: ItemSender) -> DigestResult<()> {
        let mut tasks = FanOut::new(NAME, self.max_in_flight);

        while let Some(item) = input.recv().await {
            let provider = Arc::clone(&self.provider);
            let output = output.clone();

            tasks
                .spawn(async move {
                    let data = item.into_canonical()?;
                    let digest = multi_hash(&provider, &data).await?;
                    emit(NAME, &output, Item::Text(digest)).await
                })
                .await?;
        }

        let items = tasks.join().await?;
        debug!(stage = NAME, items, "stage drained");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{Blake3Provider, StubProvider, ThrottledProvider};
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_multi_hash_concatenates_by_index() {
        let provider: Arc<dyn HashProvider> = Arc::new(StubProvider::new());

        let digest = multi_hash(&provider, "x").await.unwrap();

        assert_eq!(digest, "H(0x)H(1x)H(2x)H(3x)H(4x)H(5x)");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_multi_hash_stable_under_shuffled_completion() {
        let baseline: Arc<dyn HashProvider> = Arc::new(StubProvider::new());
        let expected = multi_hash(&baseline, "H(3)~H(3_STRONG)").await.unwrap();

        for seed in 0..10 {
            let jittery: Arc<dyn HashProvider> = Arc::new(StubProvider::new().with_jitter(seed, 8));
            let digest = multi_hash(&jittery, "H(3)~H(3_STRONG)").await.unwrap();
            assert_eq!(digest, expected, "seed {seed}");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_multi_hash_runs_sub_hashes_together() {
        let throttled = Arc::new(
            ThrottledProvider::new(Arc::new(StubProvider::new()))
                .with_fast_latency(Duration::from_millis(40)),
        );
        let provider: Arc<dyn HashProvider> = throttled.clone();

        let digest = multi_hash(&provider, "x").await.unwrap();

        assert_eq!(digest, "H(0x)H(1x)H(2x)H(3x)H(4x)H(5x)");
        let stats = throttled.stats();
        assert_eq!(stats.fast_calls, SUB_HASHES);
        assert_eq!(stats.peak_fast_in_flight, SUB_HASHES);
    }

    #[tokio::test]
    async fn test_multi_hash_matches_sequential_blake3() {
        let provider: Arc<dyn HashProvider> = Arc::new(Blake3Provider::default());

        let mut expected = String::new();
        for i in 0..SUB_HASHES {
            expected.push_str(&provider.fast_hash(&format!("{}{}", i, "data")).await.unwrap());
        }

        assert_eq!(multi_hash(&provider, "data").await.unwrap(), expected);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_stage_with_bounded_fan_out() {
        let provider: Arc<dyn HashProvider> = Arc::new(StubProvider::new().with_jitter(3, 2));
        let stage = SecondDigest::new(provider).with_max_in_flight(Some(1));

        let (in_tx, in_rx) = mpsc::channel(4);
        let (out_tx, mut out_rx) = mpsc::channel(4);
        in_tx.send(Item::from("a")).await.unwrap();
        in_tx.send(Item::from("b")).await.unwrap();
        drop(in_tx);

        stage.run(in_rx, out_tx).await.unwrap();

        let mut out = Vec::new();
        while let Some(item) = out_rx.recv().await {
            out.push(item.into_canonical().unwrap());
        }
        out.sort();

        assert_eq!(
            out,
            [
                "H(0a)H(1a)H(2a)H(3a)H(4a)H(5a)",
                "H(0b)H(1b)H(2b)H(3b)H(4b)H(5b)"
            ]
        );
    }
}
