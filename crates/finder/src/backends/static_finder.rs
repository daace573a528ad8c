//! Finder over a fixed node list.

use async_trait::async_trait;
use finder_common::constants::backends;
use finder_common::{Node, Result};
use std::path::Path;

use crate::config::{Config, FinderConfig};
use crate::finder::Finder;
use crate::registry::Registry;

/// A finder whose nodes are known up front
pub struct StaticFinder {
    registry: Registry,
}

impl StaticFinder {
    /// Create a finder with the specified nodes, dropping duplicates
    pub fn new(nodes: impl IntoIterator<Item = Node>) -> Self {
        Self {
            registry: Registry::from_nodes(nodes),
        }
    }

    /// Create a finder with one host-only node per configured host
    pub fn from_config(config: &FinderConfig) -> Self {
        Self::new(config.nodes())
    }

    /// Create a finder from a configuration file
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self> {
        let config = Config::load(path)?;
        Ok(Self::from_config(&config.finder))
    }
}

#[async_trait]
impl Finder for StaticFinder {
    async fn search(&self) -> Result<()> {
        Ok(())
    }

    async fn start(&self) -> Result<()> {
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        Ok(())
    }

    fn is_running(&self) -> bool {
        true
    }

    fn describe(&self) -> String {
        backends::STATIC.to_string()
    }

    fn registry(&self) -> &Registry {
        &self.registry
    }
}
