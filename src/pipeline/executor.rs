// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 signer contributors

//! Pipeline executor
//!
//! Chains stages with bounded channels and runs each stage as its own task.
//! The run succeeds only if every stage does; there is no partial result.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{Item, ItemReceiver, ItemSender, Stage};
use crate::errors::{DigestError, DigestResult};

/// Default capacity of each boundary channel
pub const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// Name used for faults raised by the executor itself
const EXECUTOR: &str = "pipeline";

/// Lifecycle of a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Running,
    AllStagesDone,
    Faulted,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::AllStagesDone => "all stages done",
            Self::Faulted => "faulted",
        };
        f.write_str(name)
    }
}

/// Timing for one completed stage
#[derive(Debug, Clone)]
pub struct StageReport {
    pub name: String,
    pub duration: Duration,
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Per-stage timing, in pipeline order
    pub stages: Vec<StageReport>,
    /// Wall time of the whole run
    pub duration: Duration,
    /// Terminal state; always [`PipelineState::AllStagesDone`] for a returned result
    pub state: PipelineState,
}

/// Terminal digest together with its run report
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub digest: String,
    pub items: usize,
    pub result: PipelineResult,
}

/// Pipeline executor
pub struct PipelineExecutor {
    stages: Vec<Arc<dyn Stage>>,
    channel_capacity: usize,
}

impl PipelineExecutor {
    /// Create an executor over `stages`, in order
    pub fn new(stages: Vec<Arc<dyn Stage>>) -> Self {
        Self {
            stages,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Set the capacity of each boundary channel
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Stage names in pipeline order
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage, reading from `input` and writing to `output`
    ///
    /// The caller owns both ends: it seeds `input` and drains the receiver
    /// paired with `output`. Returns once every stage task has finished.
    pub async fn run(
        &self,
        mut input: ItemReceiver,
        output: ItemSender,
    ) -> DigestResult<PipelineResult> {
        let start = Instant::now();
        let mut state = PipelineState::Idle;
        debug!(%state, stages = self.stages.len(), "pipeline created");

        state = PipelineState::Running;
        info!(%state, stages = ?self.stage_names(), "pipeline started");

        if self.stages.is_empty() {
            while let Some(item) = input.recv().await {
                output
                    .send(item)
                    .await
                    .map_err(|_| DigestError::ChannelClosed {
                        stage: EXECUTOR.to_string(),
                    })?;
            }
            return Ok(PipelineResult {
                stages: vec![],
                duration: start.elapsed(),
                state: PipelineState::AllStagesDone,
            });
        }

        // One receiver and one sender per stage; the outermost two belong to the caller
        let mut receivers = Vec::with_capacity(self.stages.len());
        let mut senders = Vec::with_capacity(self.stages.len());
        receivers.push(input);
        for _ in 1..self.stages.len() {
            let (tx, rx) = mpsc::channel(self.channel_capacity);
            senders.push(tx);
            receivers.push(rx);
        }
        senders.push(output);

        let mut handles = Vec::with_capacity(self.stages.len());
        for ((stage, rx), tx) in self.stages.iter().zip(receivers).zip(senders) {
            let stage = Arc::clone(stage);
            let name = stage.name().to_string();

            let handle = tokio::spawn(async move {
                let started = Instant::now();
                debug!(stage = stage.name(), "stage started");
                // `tx` is dropped when `run` returns, closing the next boundary
                let result = stage.run(rx, tx).await;
                (result, started.elapsed())
            });
            handles.push((name, handle));
        }

        let mut reports = Vec::with_capacity(handles.len());
        let mut failures = Vec::new();
        for (name, handle) in handles {
            match handle.await {
                Ok((Ok(()), duration)) => {
                    debug!(stage = %name, elapsed_ms = duration.as_millis() as u64, "stage finished");
                    reports.push(StageReport { name, duration });
                }
                Ok((Err(e), _)) => failures.push((name, e)),
                Err(join_err) => {
                    let e = DigestError::from_join(&name, join_err);
                    failures.push((name, e));
                }
            }
        }

        if let Some((stage, error)) = Self::root_cause(failures) {
            state = PipelineState::Faulted;
            warn!(%state, %stage, error = %error, "pipeline faulted");
            return Err(error.into_fault(&stage));
        }

        state = PipelineState::AllStagesDone;
        let duration = start.elapsed();
        info!(%state, elapsed_ms = duration.as_millis() as u64, "pipeline finished");

        Ok(PipelineResult {
            stages: reports,
            duration,
            state,
        })
    }

    /// Seed the pipeline with `items`, run it, and return the single terminal item
    pub async fn digest(&self, items: Vec<Item>) -> DigestResult<PipelineOutput> {
        let count = items.len();
        let (seed_tx, seed_rx) = mpsc::channel(self.channel_capacity);
        let (out_tx, mut out_rx) = mpsc::channel(self.channel_capacity);

        let seeder = tokio::spawn(async move {
            for item in items {
                if seed_tx.send(item).await.is_err() {
                    // First stage gave up; the run reports why
                    break;
                }
            }
        });

        let drainer = tokio::spawn(async move {
            let mut terminal = Vec::new();
            while let Some(item) = out_rx.recv().await {
                terminal.push(item);
            }
            terminal
        });

        let result = self.run(seed_rx, out_tx).await;

        seeder
            .await
            .map_err(|e| DigestError::from_join(EXECUTOR, e).into_fault(EXECUTOR))?;
        let mut terminal = drainer
            .await
            .map_err(|e| DigestError::from_join(EXECUTOR, e).into_fault(EXECUTOR))?;
        let result = result?;

        if terminal.len() != 1 {
            return Err(DigestError::PipelineFault {
                stage: EXECUTOR.to_string(),
                message: format!("expected exactly one terminal item, got {}", terminal.len()),
            });
        }
        let digest = terminal.swap_remove(0).into_canonical()?;

        Ok(PipelineOutput {
            digest,
            items: count,
            result,
        })
    }

    /// Pick the failure to report: the first one, in stage order, that is
    /// not merely a downstream stage having gone away
    fn root_cause(failures: Vec<(String, DigestError)>) -> Option<(String, DigestError)> {
        let root = failures.iter().position(|(_, e)| !e.is_channel_closed());
        let mut failures = failures;
        match root {
            Some(idx) => Some(failures.swap_remove(idx)),
            None => failures.into_iter().next(),
        }
    }
}

/// Run `stages` between `input` and `output` with default settings
pub async fn run_pipeline(
    stages: Vec<Arc<dyn Stage>>,
    input: ItemReceiver,
    output: ItemSender,
) -> DigestResult<PipelineResult> {
    PipelineExecutor::new(stages).run(input, output).await
}
