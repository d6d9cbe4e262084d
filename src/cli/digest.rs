// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 signer contributors

//! Digest command - run items through the pipeline

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use super::OutputFormat;
use crate::config::{DigestConfig, ProviderKind};
use crate::pipeline::{Item, PipelineExecutor, PipelineOutput};
use crate::provider::{HashProvider, ProviderStats};
use crate::stages::create_default_stages;
use crate::utils::{create_spinner, print_header, print_success};

/// Command-line overrides for the digest command
#[derive(Debug, Clone, Default)]
pub struct DigestArgs {
    pub items: Vec<String>,
    pub count: u32,
    pub stub: bool,
    pub strong_latency_ms: Option<u64>,
    pub fast_latency_ms: Option<u64>,
    pub max_in_flight: Option<usize>,
    pub format: Option<OutputFormat>,
}

impl DigestArgs {
    /// Items to seed: explicit tokens, or `0..count`
    pub fn seed_items(&self) -> Vec<Item> {
        if self.items.is_empty() {
            (0..i64::from(self.count)).map(Item::Int).collect()
        } else {
            self.items.iter().map(|token| Item::parse(token)).collect()
        }
    }

    /// Apply these overrides on top of a loaded config
    pub fn apply(&self, config: &mut DigestConfig) {
        if self.stub {
            config.provider.kind = ProviderKind::Stub;
        }
        if let Some(ms) = self.strong_latency_ms {
            config.provider.strong_latency_ms = ms;
        }
        if let Some(ms) = self.fast_latency_ms {
            config.provider.fast_latency_ms = ms;
        }
        if self.max_in_flight.is_some() {
            config.max_in_flight = self.max_in_flight;
        }
    }
}

/// Run the digest command
pub async fn run(args: DigestArgs, config_path: Option<PathBuf>, verbose: bool) -> Result<()> {
    let (mut config, used) = DigestConfig::discover(config_path.as_deref())?;
    args.apply(&mut config);
    config.validate()?;

    let format = args.format.unwrap_or(OutputFormat::Text);
    let items = args.seed_items();

    let provider = config.provider.build();
    let stages = create_default_stages(provider.clone(), config.max_in_flight);
    let executor = PipelineExecutor::new(stages).with_channel_capacity(config.channel_capacity);

    if verbose && format == OutputFormat::Text {
        print_header(&format!("Pipeline: {}", executor.stage_names().join(" → ")));
        if let Some(ref path) = used {
            println!("  Config: {}", path.display());
        }
        println!("  Provider: {}", provider.name());
        println!("  Items: {}", items.len());
        println!();
    }

    let output = match format {
        OutputFormat::Text => {
            let spinner = create_spinner(&format!("Digesting {} items...", items.len()));
            let result = executor.digest(items).await;
            spinner.finish_and_clear();
            result?
        }
        OutputFormat::Json => executor.digest(items).await?,
    };

    match format {
        OutputFormat::Text => print_text(&output, provider.stats(), verbose),
        OutputFormat::Json => print_json(&output, provider.name(), provider.stats())?,
    }

    Ok(())
}

fn print_text(output: &PipelineOutput, stats: ProviderStats, verbose: bool) {
    if verbose {
        for stage in &output.result.stages {
            print_success(&format!(
                "{} ({:.3}s)",
                stage.name.bold(),
                stage.duration.as_secs_f64()
            ));
        }
        println!(
            "  {} strong / {} fast hash calls, peak strong in flight: {}",
            stats.strong_calls, stats.fast_calls, stats.peak_strong_in_flight
        );
        println!();
    }

    println!(
        "{}",
        format!(
            "Digest of {} item{} in {:.3}s:",
            output.items,
            if output.items == 1 { "" } else { "s" },
            output.result.duration.as_secs_f64()
        )
        .green()
    );
    println!("{}", output.digest);
}

fn print_json(output: &PipelineOutput, provider: &str, stats: ProviderStats) -> Result<()> {
    let stages: Vec<_> = output
        .result
        .stages
        .iter()
        .map(|stage| {
            serde_json::json!({
                "name": stage.name,
                "duration_ms": stage.duration.as_millis() as u64,
            })
        })
        .collect();

    let json = serde_json::json!({
        "digest": output.digest,
        "items": output.items,
        "provider": provider,
        "provider_stats": stats,
        "stages": stages,
        "duration_ms": output.result.duration.as_millis() as u64,
    });

    println!(
        "{}",
        serde_json::to_string_pretty(&json)
            .map_err(|e| miette::miette!("Failed to serialize JSON: {}", e))?
    );

    Ok(())
}
