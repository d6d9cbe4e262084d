// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 signer contributors

//! Error types
//!
//! Every fault in signer ends up as a [`DigestError`]. Stage-local faults
//! abort the task that raised them; the pipeline executor folds whatever
//! reaches it into [`DigestError::PipelineFault`].

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for signer operations
pub type DigestResult<T> = Result<T, DigestError>;

/// Main error type for signer
#[derive(Error, Debug, Diagnostic)]
pub enum DigestError {
    // ─────────────────────────────────────────────────────────────────────────
    // Item Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Item cannot be converted to a string: {item}")]
    #[diagnostic(
        code(signer::invalid_item_type),
        help("Items must be integers, text, or UTF-8 bytes")
    )]
    InvalidItemType { item: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Provider Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Hash provider '{provider}' failed: {message}")]
    #[diagnostic(code(signer::hash_provider_failure))]
    HashProviderFailure {
        provider: String,
        message: String,
        #[help]
        help: Option<String>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Pipeline Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Pipeline faulted in stage '{stage}': {message}")]
    #[diagnostic(
        code(signer::pipeline_fault),
        help("A faulted run produces no digest; fix the cause and run again")
    )]
    PipelineFault { stage: String, message: String },

    #[error("Stage '{stage}' could not hand an item downstream: channel closed")]
    #[diagnostic(code(signer::channel_closed))]
    ChannelClosed { stage: String },

    #[error("A task in stage '{stage}' did not complete: {message}")]
    #[diagnostic(code(signer::task_panicked))]
    TaskPanicked { stage: String, message: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Config file not found: {path}")]
    #[diagnostic(
        code(signer::config_not_found),
        help("Pass an existing file to --config or unset SIGNER_CONFIG")
    )]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid configuration: {reason}")]
    #[diagnostic(code(signer::invalid_config))]
    InvalidConfig { reason: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Tree Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Cannot open '{path}': {error}")]
    #[diagnostic(code(signer::tree_root_unreadable))]
    TreeRootUnreadable { path: PathBuf, error: String },

    // ─────────────────────────────────────────────────────────────────────────
    // IO/System Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("IO error: {message}")]
    #[diagnostic(code(signer::io_error))]
    Io { message: String },

    #[error("YAML parsing error: {message}")]
    #[diagnostic(code(signer::yaml_error))]
    Yaml { message: String },

    #[error("JSON error: {message}")]
    #[diagnostic(code(signer::json_error))]
    Json { message: String },
}

impl From<std::io::Error> for DigestError {
    fn from(e: std::io::Error) -> Self {
        Self::Io { message: e.to_string() }
    }
}

impl From<serde_yaml::Error> for DigestError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml { message: e.to_string() }
    }
}

impl From<serde_json::Error> for DigestError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json { message: e.to_string() }
    }
}

impl DigestError {
    /// Create a provider failure without extra help text
    pub fn provider(provider: &str, message: impl Into<String>) -> Self {
        Self::HashProviderFailure {
            provider: provider.to_string(),
            message: message.into(),
            help: None,
        }
    }

    /// Create the error raised when the strong hash is entered too many times at once
    pub fn overheated(provider: &str, in_flight: usize, limit: usize) -> Self {
        Self::HashProviderFailure {
            provider: provider.to_string(),
            message: format!(
                "strong hash overheated: {} concurrent calls, limit is {}",
                in_flight, limit
            ),
            help: Some("Route strong-hash calls through a StrongHashGate".into()),
        }
    }

    /// Convert a joined task failure into an error for the owning stage
    pub fn from_join(stage: &str, err: tokio::task::JoinError) -> Self {
        let message = if err.is_cancelled() {
            "task was cancelled".to_string()
        } else {
            let panic = err.into_panic();
            if let Some(s) = panic.downcast_ref::<&str>() {
                (*s).to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "task panicked".to_string()
            }
        };

        Self::TaskPanicked {
            stage: stage.to_string(),
            message,
        }
    }

    /// Whether this error is only a consequence of a downstream stage going away
    pub fn is_channel_closed(&self) -> bool {
        matches!(self, Self::ChannelClosed { .. })
    }

    /// Wrap this error as a fault of the named stage
    pub fn into_fault(self, stage: &str) -> Self {
        match self {
            Self::PipelineFault { .. } => self,
            other => Self::PipelineFault {
                stage: stage.to_string(),
                message: other.to_string(),
            },
        }
    }
}
