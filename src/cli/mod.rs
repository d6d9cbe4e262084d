// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 signer contributors

//! CLI command definitions and handlers
//!
//! Defines the command-line interface for signer.

pub mod digest;
pub mod tree;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Concurrent hash pipeline
///
/// Compute composite digests through a multi-stage concurrent pipeline.
#[derive(Parser, Debug)]
#[clap(
    name = "signer",
    version,
    about = "Concurrent multi-stage hash pipeline",
    long_about = None,
    after_help = "Examples:\n\
        signer digest                   Digest the items 0..7\n\
        signer digest 0 1 1 2 3 5       Digest the given items\n\
        signer digest --stub 0 1 2      Use the readable stub hashes\n\
        signer tree . -f                Print a directory tree with files\n\n\
        See 'signer <command> --help' for more information on a specific command."
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Config file (defaults to .signer.yaml, then the user config directory)
    #[clap(short, long, global = true, env = "SIGNER_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run items through the digest pipeline
    Digest {
        /// Items to digest; integers are read as numbers, anything else as text
        items: Vec<String>,

        /// Digest 0..COUNT when no items are given
        #[clap(short = 'n', long, default_value = "7")]
        count: u32,

        /// Use the stub provider (readable digests)
        #[clap(long)]
        stub: bool,

        /// Latency added to each strong-hash call, in milliseconds
        #[clap(long, value_name = "MS")]
        strong_latency_ms: Option<u64>,

        /// Latency added to each fast-hash call, in milliseconds
        #[clap(long, value_name = "MS")]
        fast_latency_ms: Option<u64>,

        /// Maximum items processed at once per stage
        #[clap(long, value_name = "N")]
        max_in_flight: Option<usize>,

        /// Output format
        #[clap(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Print a directory tree
    Tree {
        /// Root directory
        path: PathBuf,

        /// Include files, not just directories
        #[clap(short, long)]
        files: bool,
    },
}

/// Output format for the digest command
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
