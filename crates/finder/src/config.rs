//! Configuration management for Finder.
//!
//! ```toml
//! [finder]
//! hosts = ["node01.example.org", "node02.example.org"]
//!
//! [discovery]
//! settle_window_ms = 1000
//! ```

use finder_common::constants::DEFAULT_SETTLE_WINDOW_MS;
use finder_common::{FinderError, Node, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::discovery::DiscoveryConfig;

/// Top-level configuration file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Static node list
    #[serde(default)]
    pub finder: FinderConfig,

    /// Live discovery settings
    #[serde(default)]
    pub discovery: DiscoverySettings,
}

/// Static finder configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FinderConfig {
    /// Host names, one node each
    #[serde(default)]
    pub hosts: Vec<String>,
}

impl FinderConfig {
    /// Nodes with only their host populated
    pub fn nodes(&self) -> Vec<Node> {
        self.hosts.iter().map(Node::with_host_name).collect()
    }
}

/// Live discovery configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoverySettings {
    /// Wait after a search broadcast in milliseconds
    #[serde(default = "default_settle_window_ms")]
    pub settle_window_ms: u64,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            settle_window_ms: default_settle_window_ms(),
        }
    }
}

impl From<&DiscoverySettings> for DiscoveryConfig {
    fn from(settings: &DiscoverySettings) -> Self {
        Self {
            settle_window: Duration::from_millis(settings.settle_window_ms),
        }
    }
}

fn default_settle_window_ms() -> u64 { DEFAULT_SETTLE_WINDOW_MS }

impl Config {
    /// Load configuration from file, falling back to defaults when absent
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self> {
        let path = config_path.as_ref();

        if path.as_os_str().is_empty() || !path.exists() {
            tracing::warn!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        tracing::trace!(path = %path.display(), "Loading config file");

        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .build()
            .map_err(|e| FinderError::Config(format!("Failed to load config file: {}", e)))?;

        settings
            .try_deserialize()
            .map_err(|e| FinderError::Config(format!("Failed to parse config: {}", e)))
    }
}
