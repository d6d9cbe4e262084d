// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 signer contributors

//! Digest stages
//!
//! The three stages of the signer pipeline, in order: [`FirstDigest`],
//! [`SecondDigest`], [`Combine`].

mod combine;
mod first;
mod second;

pub use combine::{combine, Combine, SEPARATOR};
pub use first::{single_hash, FirstDigest, StrongHashGate};
pub use second::{multi_hash, SecondDigest, SUB_HASHES};

use std::sync::Arc;

use crate::pipeline::Stage;
use crate::provider::HashProvider;

/// Build the standard three-stage chain over `provider`
///
/// `max_in_flight` bounds per-item tasks in each fanning stage; `None`
/// leaves fan-out unbounded.
pub fn create_default_stages(
    provider: Arc<dyn HashProvider>,
    max_in_flight: Option<usize>,
) -> Vec<Arc<dyn Stage>> {
    vec![
        Arc::new(FirstDigest::new(Arc::clone(&provider)).with_max_in_flight(max_in_flight)),
        Arc::new(SecondDigest::new(provider).with_max_in_flight(max_in_flight)),
        Arc::new(Combine::new()),
    ]
}
