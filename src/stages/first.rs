// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 signer contributors

//! First digest stage
//!
//! Emits `fast(data) + "~" + fast(strong(data))` for every item. Strong-hash
//! calls from all items go through one [`StrongHashGate`].

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::errors::DigestResult;
use crate::pipeline::{emit, fan_out_ordered, FanOut, Item, ItemReceiver, ItemSender, Stage};
use crate::provider::HashProvider;

const NAME: &str = "first_digest";

/// Serializes strong-hash calls: at most one is in flight at a time
#[derive(Default)]
pub struct StrongHashGate {
    lock: Mutex<()>,
}

impl StrongHashGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `provider.strong_hash(data)` while holding the gate
    pub async fn strong_hash(&self, provider: &dyn HashProvider, data: &str) -> DigestResult<String> {
        let _held = self.lock.lock().await;
        provider.strong_hash(data).await
    }
}

/// First digest stage
pub struct FirstDigest {
    provider: Arc<dyn HashProvider>,
    gate: Arc<StrongHashGate>,
    max_in_flight: Option<usize>,
}

impl FirstDigest {
    /// Create the stage with its own gate
    pub fn new(provider: Arc<dyn HashProvider>) -> Self {
        Self {
            provider,
            gate: Arc::new(StrongHashGate::new()),
            max_in_flight: None,
        }
    }

    /// Share a gate with other users of the same provider
    pub fn with_gate(mut self, gate: Arc<StrongHashGate>) -> Self {
        self.gate = gate;
        self
    }

    /// Bound the number of items processed at once
    pub fn with_max_in_flight(mut self, limit: Option<usize>) -> Self {
        self.max_in_flight = limit;
        self
    }
}

/// Digest one item's canonical string
pub async fn single_hash(
    provider: &Arc<dyn HashProvider>,
    gate: &StrongHashGate,
    data: String,
) -> DigestResult<String> {
    let strong = gate.strong_hash(provider.as_ref(), &data).await?;

    let [crc0, crc1] = fan_out_ordered(NAME, [data, strong], |input| {
        let provider = Arc::clone(provider);
        async move { provider.fast_hash(&input).await }
    })
    .await?;

    Ok(format!("{}~{}", crc0, crc1))
}

#[async_trait]
impl Stage for FirstDigest {
    fn name(&self) -> &str {
        NAME
    }

    async fn run(&self, mut input: ItemReceiver, output: ItemSender) -> DigestResult<()> {
        let mut tasks = FanOut::new(NAME, self.max_in_flight);

        while let Some(item) = input.recv().await {
            let provider = Arc::clone(&self.provider);
            let gate = Arc::clone(&self.gate);
            let output = output.clone();

            tasks
                .spawn(async move {
                    let data = item.into_canonical()?;
                    let digest = single_hash(&provider, &gate, data).await?;
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
    use crate::provider::{StubProvider, ThrottledProvider};
    use std::time::Duration;
    use tokio::sync::mpsc;

    async fn run_stage(stage: FirstDigest, items: Vec<Item>) -> DigestResult<Vec<String>> {
        let (in_tx, in_rx) = mpsc::channel(items.len().max(1));
        let (out_tx, mut out_rx) = mpsc::channel(items.len().max(1));
        for item in items {
            in_tx.send(item).await.unwrap();
        }
        drop(in_tx);

        stage.run(in_rx, out_tx).await?;

        let mut out = Vec::new();
        while let Some(item) = out_rx.recv().await {
            out.push(item.into_canonical().unwrap());
        }
        Ok(out)
    }

    #[tokio::test]
    async fn test_single_hash_formula() {
        let provider: Arc<dyn HashProvider> = Arc::new(StubProvider::new());
        let gate = StrongHashGate::new();

        let digest = single_hash(&provider, &gate, "7".into()).await.unwrap();

        assert_eq!(digest, "H(7)~H(7_STRONG)");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_stage_emits_one_digest_per_item() {
        let provider: Arc<dyn HashProvider> = Arc::new(StubProvider::new().with_jitter(7, 5));
        let stage = FirstDigest::new(provider);

        let mut out = run_stage(stage, vec![Item::from(0), Item::from(1), Item::from(2)])
            .await
            .unwrap();
        out.sort();

        assert_eq!(
            out,
            ["H(0)~H(0_STRONG)", "H(1)~H(1_STRONG)", "H(2)~H(2_STRONG)"]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_gate_keeps_strong_hash_single_flight() {
        let throttled = Arc::new(
            ThrottledProvider::new(Arc::new(StubProvider::new()))
                .with_strong_latency(Duration::from_millis(3))
                .with_strong_limit(1),
        );
        let provider: Arc<dyn HashProvider> = throttled.clone();
        let stage = FirstDigest::new(provider);

        let items = (0..12).map(Item::from).collect();
        let out = run_stage(stage, items).await.unwrap();

        let stats = throttled.stats();
        assert_eq!(out.len(), 12);
        assert_eq!(stats.strong_calls, 12);
        assert_eq!(stats.fast_calls, 24);
        assert_eq!(stats.peak_strong_in_flight, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_gate_leaves_fast_hashes_concurrent() {
        let throttled = Arc::new(
            ThrottledProvider::new(Arc::new(StubProvider::new()))
                .with_fast_latency(Duration::from_millis(40)),
        );
        let provider: Arc<dyn HashProvider> = throttled.clone();
        let stage = FirstDigest::new(provider);

        let items = (0..6).map(Item::from).collect();
        let out = run_stage(stage, items).await.unwrap();

        let stats = throttled.stats();
        assert_eq!(out.len(), 6);
        assert_eq!(stats.peak_strong_in_flight, 1);
        // Two fast hashes per item; more than two at once means items overlapped
        assert!(
            stats.peak_fast_in_flight > 2,
            "peak fast in flight: {}",
            stats.peak_fast_in_flight
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_shared_gate_spans_stages() {
        let throttled = Arc::new(
            ThrottledProvider::new(Arc::new(StubProvider::new()))
                .with_strong_latency(Duration::from_millis(5))
                .with_strong_limit(1),
        );
        let provider: Arc<dyn HashProvider> = throttled.clone();
        let gate = Arc::new(StrongHashGate::new());

        let left = FirstDigest::new(Arc::clone(&provider)).with_gate(Arc::clone(&gate));
        let right = FirstDigest::new(provider).with_gate(gate);

        let (left, right) = tokio::join!(
            run_stage(left, (0..5).map(Item::from).collect()),
            run_stage(right, (5..10).map(Item::from).collect()),
        );

        assert_eq!(left.unwrap().len(), 5);
        assert_eq!(right.unwrap().len(), 5);
        let stats = throttled.stats();
        assert_eq!(stats.strong_calls, 10);
        assert_eq!(stats.peak_strong_in_flight, 1);
    }

    #[tokio::test]
    async fn test_invalid_item_aborts_stage() {
        let provider: Arc<dyn HashProvider> = Arc::new(StubProvider::new());
        let stage = FirstDigest::new(provider);

        let result = run_stage(stage, vec![Item::from(1), Item::Bytes(vec![0xc3])]).await;

        assert!(matches!(
            result,
            Err(crate::errors::DigestError::InvalidItemType { .. })
        ));
    }
}
