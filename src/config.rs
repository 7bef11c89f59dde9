//! Client configuration.
//!
//! Settings come from three layers, highest priority first:
//! 1. Command-line flags (and their environment variables, see [`crate::cli`])
//! 2. An optional YAML file passed with `--config`
//! 3. Defaults

use crate::cli::Cli;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Number of items requested per listing page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Resolved client configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL the `/news`, `/pre-signed-url` and `/newsitem` paths hang off.
    pub api_base_url: String,
    /// Items requested per `/news` call.
    pub page_size: u32,
    /// Prefix used to display thumbnails by storage key.
    pub thumbnail_base_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3000/api".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            thumbnail_base_url: "/thumbnails".to_string(),
        }
    }
}

impl ClientConfig {
    /// Resolve the configuration for a CLI invocation.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_cli_overrides(cli);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file. Missing keys keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.display().to_string(), e.to_string()))?;

        serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn apply_cli_overrides(&mut self, cli: &Cli) {
        if let Some(url) = &cli.api_url {
            self.api_base_url = url.clone();
        }
        if let Some(base) = &cli.thumbnail_base_url {
            self.thumbnail_base_url = base.clone();
        }
        if let Some(limit) = cli.command.page_size() {
            self.page_size = limit;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::Invalid("page_size must be at least 1".to_string()));
        }
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api_base_url must not be empty".to_string()));
        }
        Ok(())
    }
}
