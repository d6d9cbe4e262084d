// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 signer contributors

//! signer - concurrent hash pipeline
//!
//! Compute composite digests through a multi-stage concurrent pipeline.

use clap::Parser;
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use signer::cli::digest::DigestArgs;
use signer::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing; stdout is reserved for results
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "signer=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();

    // Dispatch to command handlers
    match cli.command {
        Commands::Digest {
            items,
            count,
            stub,
            strong_latency_ms,
            fast_latency_ms,
            max_in_flight,
            format,
        } => {
            let args = DigestArgs {
                items,
                count,
                stub,
                strong_latency_ms,
                fast_latency_ms,
                max_in_flight,
                format: Some(format),
            };
            signer::cli::digest::run(args, cli.config, cli.verbose).await
        }
        Commands::Tree { path, files } => signer::cli::tree::run(path, files, cli.verbose).await,
    }
}
