// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 signer contributors

//! Hash providers
//!
//! The pipeline treats hashing as an external collaborator with two
//! primitives: a slow keyed "strong" hash and a cheap "fast" checksum. Both
//! are deterministic functions of their input. Only the strong hash has a
//! concurrency ceiling, which callers must respect.

mod blake3;
mod stub;
mod throttled;

pub use self::blake3::{Blake3Provider, DEFAULT_SALT};
pub use stub::StubProvider;
pub use throttled::{ProviderStats, ThrottledProvider};

use async_trait::async_trait;

use crate::errors::DigestResult;

/// Trait for hash providers
#[async_trait]
pub trait HashProvider: Send + Sync {
    /// Provider name, used in logs and errors
    fn name(&self) -> &str;

    /// Compute the strong (keyed, slow) digest of `input`
    ///
    /// Not safe for unbounded concurrent use; see [`crate::stages::StrongHashGate`].
    async fn strong_hash(&self, input: &str) -> DigestResult<String>;

    /// Compute the fast checksum of `input`
    async fn fast_hash(&self, input: &str) -> DigestResult<String>;
}
