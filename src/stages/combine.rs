// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 signer contributors

//! Combine stage
//!
//! Collects every item, sorts, and joins with `_` into a single output.

use async_trait::async_trait;
use tracing::debug;

use crate::errors::DigestResult;
use crate::pipeline::{emit, Item, ItemReceiver, ItemSender, Stage};

const NAME: &str = "combine";

/// Separator between combined digests
pub const SEPARATOR: &str = "_";

/// Terminal stage producing the final digest
#[derive(Debug, Default)]
pub struct Combine;

impl Combine {
    pub fn new() -> Self {
        Self
    }
}

/// Sort `parts` byte-wise and join them
pub fn combine(mut parts: Vec<String>) -> String {
    parts.sort();
    parts.join(SEPARATOR)
}

#[async_trait]
impl Stage for Combine {
    fn name(&self) -> &str {
        NAME
    }

    async fn run(&self, mut input: ItemReceiver, output: ItemSender) -> DigestResult<()> {
        let mut parts = Vec::new();
        while let Some(item) = input.recv().await {
            parts.push(item.into_canonical()?);
        }

        debug!(stage = NAME, items = parts.len(), "combining");
        emit(NAME, &output, Item::Text(combine(parts))).await
    }
}
