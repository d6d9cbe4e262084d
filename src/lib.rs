// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 signer contributors

//! # signer - Concurrent Hash Pipeline
//!
//! `signer` computes a composite, order-stable digest for a set of items by
//! running them through a chain of concurrent stages.
//!
//! ## Pipeline
//!
//! - **FirstDigest** - `fast(data) + "~" + fast(strong(data))`, with every
//!   strong-hash call serialized through one gate
//! - **SecondDigest** - six indexed fast hashes per item, concatenated in
//!   index order
//! - **Combine** - sort everything and join with `_`
//!
//! Items inside a stage are processed concurrently; stages hand off through
//! bounded channels.
//!
//! ## Quick Start
//!
//! ```bash
//! # Digest the items 0..7
//! signer digest
//!
//! # Readable output with the stub hashes
//! signer digest --stub 0 1 2
//!
//! # Print a directory tree, including files
//! signer tree . -f
//! ```

pub mod cli;
pub mod config;
pub mod errors;
pub mod pipeline;
pub mod provider;
pub mod stages;
pub mod tree;
pub mod utils;

// Re-export commonly used types
pub use config::DigestConfig;
pub use errors::{DigestError, DigestResult};
pub use pipeline::{Item, PipelineExecutor, Stage};
pub use provider::HashProvider;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
