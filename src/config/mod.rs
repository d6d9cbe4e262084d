// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 signer contributors

//! Configuration
//!
//! Settings come from a YAML file (`.signer.yaml` by default) and are then
//! overridden by command-line flags.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::{DigestError, DigestResult};
use crate::pipeline::DEFAULT_CHANNEL_CAPACITY;
use crate::provider::{Blake3Provider, HashProvider, StubProvider, ThrottledProvider};

/// Config file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = ".signer.yaml";

/// Config file looked up in the user config directory
pub const USER_CONFIG_FILE: &str = "config.yaml";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    /// Capacity of each channel between stages
    pub channel_capacity: usize,

    /// Upper bound on per-item tasks alive in one stage (unbounded if unset)
    pub max_in_flight: Option<usize>,

    /// Hash provider settings
    pub provider: ProviderConfig,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            max_in_flight: None,
            provider: ProviderConfig::default(),
        }
    }
}

/// Which hash primitives to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Blake3,
    Stub,
}

/// Hash provider configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub kind: ProviderKind,

    /// Salt keying the strong hash
    pub salt: String,

    /// Latency added to each strong-hash call
    pub strong_latency_ms: u64,

    /// Latency added to each fast-hash call
    pub fast_latency_ms: u64,

    /// Strong-hash calls allowed in flight at once
    pub strong_concurrency_limit: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Blake3,
            salt: crate::provider::DEFAULT_SALT.to_string(),
            strong_latency_ms: 10,
            fast_latency_ms: 0,
            strong_concurrency_limit: 1,
        }
    }
}

impl ProviderConfig {
    /// Build the configured provider behind a throttling layer
    pub fn build(&self) -> Arc<ThrottledProvider> {
        let inner: Arc<dyn HashProvider> = match self.kind {
            ProviderKind::Blake3 => Arc::new(Blake3Provider::new(&self.salt)),
            ProviderKind::Stub => Arc::new(StubProvider::new()),
        };

        Arc::new(
            ThrottledProvider::new(inner)
                .with_strong_latency(Duration::from_millis(self.strong_latency_ms))
                .with_fast_latency(Duration::from_millis(self.fast_latency_ms))
                .with_strong_limit(self.strong_concurrency_limit),
        )
    }
}

impl DigestConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: &Path) -> DigestResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DigestError::ConfigNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                DigestError::Io {
                    message: format!("{}: {}", path.display(), e),
                }
            }
        })?;

        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> DigestResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to YAML
    pub fn to_yaml(&self) -> DigestResult<String> {
        serde_yaml::to_string(self).map_err(Into::into)
    }

    /// Find and load the configuration
    ///
    /// Lookup order: `explicit`, `./.signer.yaml`, the user config
    /// directory, built-in defaults. Returns the file that was used, if any.
    pub fn discover(explicit: Option<&Path>) -> DigestResult<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            return Ok((Self::from_file(path)?, Some(path.to_path_buf())));
        }

        let mut candidates = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(dir) = user_config_dir() {
            candidates.push(dir.join(USER_CONFIG_FILE));
        }

        for candidate in candidates {
            if candidate.is_file() {
                tracing::debug!(path = %candidate.display(), "loading config");
                return Ok((Self::from_file(&candidate)?, Some(candidate)));
            }
        }

        Ok((Self::default(), None))
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> DigestResult<()> {
        if self.channel_capacity == 0 {
            return Err(DigestError::InvalidConfig {
                reason: "channel_capacity must be at least 1".into(),
            });
        }

        if self.max_in_flight == Some(0) {
            return Err(DigestError::InvalidConfig {
                reason: "max_in_flight must be at least 1 when set".into(),
            });
        }

        if self.provider.strong_concurrency_limit == 0 {
            return Err(DigestError::InvalidConfig {
                reason: "provider.strong_concurrency_limit must be at least 1".into(),
            });
        }

        Ok(())
    }
}

/// Per-user config directory for signer
pub fn user_config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "signer").map(|dirs| dirs.config_dir().to_path_buf())
}
