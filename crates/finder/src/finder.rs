//! The `Finder` contract shared by every discovery backend.

use async_trait::async_trait;
use finder_common::{Node, Result};
use std::sync::Arc;

use crate::regexp::Pattern;
use crate::registry::Registry;

/// Receives nodes found in response to a search
pub trait SearchListener: Send + Sync {
    fn search_response_received(&self, node: &Node);
}

/// Receives nodes announced by peers without a search
pub trait NotifyListener: Send + Sync {
    fn notify_received(&self, node: &Node);
}

impl<F> SearchListener for F
where
    F: Fn(&Node) + Send + Sync,
{
    fn search_response_received(&self, node: &Node) {
        self(node)
    }
}

impl<F> NotifyListener for F
where
    F: Fn(&Node) + Send + Sync,
{
    fn notify_received(&self, node: &Node) {
        self(node)
    }
}

/// Node discovery abstraction.
///
/// Backends supply the lifecycle and their [`Registry`]; the query surface
/// is served from that registry.
#[async_trait]
pub trait Finder: Send + Sync {
    /// Search for nodes
    async fn search(&self) -> Result<()>;

    async fn start(&self) -> Result<()>;

    async fn stop(&self) -> Result<()>;

    fn is_running(&self) -> bool;

    /// Human-readable backend identity
    fn describe(&self) -> String;

    /// Registry holding the nodes found so far
    fn registry(&self) -> &Registry;

    /// All found nodes, in discovery order
    async fn all_nodes(&self) -> Result<Vec<Node>> {
        Ok(self.registry().all_nodes().await)
    }

    /// Nodes whose name or address (optionally with port) prefixes `query`
    async fn prefix_nodes(&self, query: &str) -> Result<Vec<Node>> {
        Ok(self.registry().prefix_nodes(query).await)
    }

    /// Nodes whose name or address (optionally with port) matches `pattern`
    async fn regexp_nodes(&self, pattern: &Pattern) -> Result<Vec<Node>> {
        Ok(self.registry().regexp_nodes(pattern).await)
    }

    /// A neighborhood node of `node`
    async fn neighborhood_node(&self, node: &Node) -> Result<Node> {
        self.registry().neighborhood_node(node).await
    }

    async fn set_search_listener(&self, listener: Arc<dyn SearchListener>) {
        self.registry().set_search_listener(listener).await
    }

    async fn set_notify_listener(&self, listener: Arc<dyn NotifyListener>) {
        self.registry().set_notify_listener(listener).await
    }
}
