// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 signer contributors

//! Pipeline core
//!
//! This module defines the items that flow through a pipeline, the stage
//! trait, and the executor that wires stages together.

mod executor;
mod item;
mod stage;

pub use executor::{
    run_pipeline, PipelineExecutor, PipelineOutput, PipelineResult, PipelineState, StageReport,
    DEFAULT_CHANNEL_CAPACITY,
};
pub use item::Item;
pub use stage::{
    emit, fan_out_ordered, ExecutionResult, FanOut, ItemReceiver, ItemSender, Stage,
};
