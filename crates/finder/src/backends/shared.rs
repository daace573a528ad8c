//! Finder over a registry shared between independently built components.
//!
//! Every `SharedFinder` created from clones of the same [`Registry`] sees the
//! same nodes. Holders must not assume exclusive ownership.

use async_trait::async_trait;
use finder_common::constants::backends;
use finder_common::{Node, Result};

use crate::finder::Finder;
use crate::registry::Registry;

/// A finder over a caller-owned registry handle
#[derive(Clone)]
pub struct SharedFinder {
    registry: Registry,
}

impl SharedFinder {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    /// Add a node visible to every finder sharing the registry
    pub async fn add_node(&self, node: Node) -> Result<()> {
        self.registry.add_node(node).await
    }
}

#[async_trait]
impl Finder for SharedFinder {
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
        backends::SHARED.to_string()
    }

    fn registry(&self) -> &Registry {
        &self.registry
    }
}
