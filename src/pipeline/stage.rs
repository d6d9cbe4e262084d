// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 signer contributors

//! Stage primitive
//!
//! A stage drains its input channel, does its work, and returns. Dropping
//! the output sender on return is what tells the next stage the stream
//! has ended.

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

use super::Item;
use crate::errors::{DigestError, DigestResult};

/// Receiving end of a stage boundary
pub type ItemReceiver = mpsc::Receiver<Item>;

/// Sending end of a stage boundary
pub type ItemSender = mpsc::Sender<Item>;

/// Trait for pipeline stages
#[async_trait]
pub trait Stage: Send + Sync {
    /// Stage name, used in logs and faults
    fn name(&self) -> &str;

    /// Consume `input` until it closes, writing results to `output`
    async fn run(&self, input: ItemReceiver, output: ItemSender) -> DigestResult<()>;
}

/// A value tagged with its position among sibling sub-computations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult<T = String> {
    pub order: usize,
    pub value: T,
}

/// Send one item downstream on behalf of `stage`
pub async fn emit(stage: &str, output: &ItemSender, item: Item) -> DigestResult<()> {
    output
        .send(item)
        .await
        .map_err(|_| DigestError::ChannelClosed {
            stage: stage.to_string(),
        })
}

/// Run `N` computations concurrently and return their values by input index
///
/// Completion order never leaks into the result: every value lands in the
/// slot its input came from.
pub async fn fan_out_ordered<const N: usize, F, Fut>(
    stage: &str,
    inputs: [String; N],
    compute: F,
) -> DigestResult<[String; N]>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = DigestResult<String>> + Send + 'static,
{
    let mut tasks = JoinSet::new();
    for (order, input) in inputs.into_iter().enumerate() {
        let fut = compute(input);
        tasks.spawn(async move { fut.await.map(|value| ExecutionResult { order, value }) });
    }

    let mut slots: [Option<String>; N] = std::array::from_fn(|_| None);
    while let Some(joined) = tasks.join_next().await {
        let result = joined.map_err(|e| DigestError::from_join(stage, e))??;
        slots[result.order] = Some(result.value);
    }

    let mut values: [String; N] = std::array::from_fn(|_| String::new());
    for (order, (value, slot)) in values.iter_mut().zip(slots).enumerate() {
        *value = slot.ok_or_else(|| DigestError::TaskPanicked {
            stage: stage.to_string(),
            message: format!("sub-computation {} produced no value", order),
        })?;
    }

    Ok(values)
}

/// Per-item task set for a fanning stage
///
/// With a limit, at most that many item tasks are alive at once and
/// [`FanOut::spawn`] waits for a free slot before accepting more input.
pub struct FanOut {
    stage: String,
    tasks: JoinSet<DigestResult<()>>,
    limit: Option<Arc<Semaphore>>,
}

impl FanOut {
    /// Create a task set for `stage`, optionally bounded
    pub fn new(stage: &str, max_in_flight: Option<usize>) -> Self {
        Self {
            stage: stage.to_string(),
            tasks: JoinSet::new(),
            limit: max_in_flight.map(|n| Arc::new(Semaphore::new(n.max(1)))),
        }
    }

    /// Spawn one item task
    pub async fn spawn<F>(&mut self, task: F) -> DigestResult<()>
    where
        F: Future<Output = DigestResult<()>> + Send + 'static,
    {
        let permit = match self.limit {
            Some(ref limit) => Some(Arc::clone(limit).acquire_owned().await.map_err(|_| {
                DigestError::TaskPanicked {
                    stage: self.stage.clone(),
                    message: "fan-out limiter closed".to_string(),
                }
            })?),
            None => None,
        };

        self.tasks.spawn(async move {
            let _permit = permit;
            task.await
        });
        Ok(())
    }

    /// Wait for every task and report how many succeeded
    ///
    /// Returns the first failure, preferring a root cause over a
    /// closed-channel error.
    pub async fn join(mut self) -> DigestResult<usize> {
        let mut completed = 0;
        let mut failure: Option<DigestError> = None;

        while let Some(joined) = self.tasks.join_next().await {
            let outcome = joined
                .map_err(|e| DigestError::from_join(&self.stage, e))
                .and_then(|result| result);

            match outcome {
                Ok(()) => completed += 1,
                Err(e) => {
                    let replace = match failure {
                        None => true,
                        Some(ref current) => current.is_channel_closed() && !e.is_channel_closed(),
                    };
                    if replace {
                        failure = Some(e);
                    }
                }
            }
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(completed),
        }
    }
}
