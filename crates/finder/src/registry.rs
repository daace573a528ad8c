//! Deduplicated, ordered node registry.
//!
//! Shared by every backend. A `Registry` is a handle: clones see and mutate
//! the same set of nodes.

use finder_common::{FinderError, Node, Result, equal};
use rand::Rng;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::finder::{NotifyListener, SearchListener};
use crate::regexp::Pattern;

#[derive(Default)]
struct Listeners {
    search: Option<Arc<dyn SearchListener>>,
    notify: Option<Arc<dyn NotifyListener>>,
}

/// Registry of known nodes
#[derive(Clone, Default)]
pub struct Registry {
    /// Nodes in insertion order, never two equal ones
    nodes: Arc<RwLock<Vec<Node>>>,
    /// Single-slot listeners (last set wins)
    listeners: Arc<RwLock<Listeners>>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a fixed list.
    ///
    /// Duplicates are logged and dropped; construction never fails.
    pub fn from_nodes(nodes: impl IntoIterator<Item = Node>) -> Self {
        let mut added: Vec<Node> = Vec::new();

        for node in nodes {
            if added.iter().any(|existing| equal(existing, &node)) {
                tracing::error!(node = %node, "{}", FinderError::DuplicateNode(node.to_string()));
                continue;
            }
            added.push(node);
        }

        Self {
            nodes: Arc::new(RwLock::new(added)),
            listeners: Arc::default(),
        }
    }

    /// Add a node unless an equal one is already registered
    pub async fn add_node(&self, node: Node) -> Result<()> {
        let mut nodes = self.nodes.write().await;
        if nodes.iter().any(|existing| equal(existing, &node)) {
            return Err(FinderError::DuplicateNode(node.to_string()));
        }
        nodes.push(node);
        Ok(())
    }

    /// Returns true if an equal node is registered
    pub async fn has_node(&self, node: &Node) -> bool {
        self.nodes
            .read()
            .await
            .iter()
            .any(|existing| equal(existing, node))
    }

    /// Snapshot of all nodes in insertion order
    pub async fn all_nodes(&self) -> Vec<Node> {
        self.nodes.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.nodes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.nodes.read().await.is_empty()
    }

    /// Nodes with a host candidate that `query` starts with.
    ///
    /// A metrics path such as `host.system.cpu` selects the node `host`.
    pub async fn prefix_nodes(&self, query: &str) -> Vec<Node> {
        self.nodes
            .read()
            .await
            .iter()
            .filter(|node| {
                host_candidates(node)
                    .iter()
                    .any(|candidate| query.starts_with(candidate.as_str()))
            })
            .cloned()
            .collect()
    }

    /// Nodes with a host candidate matched by the pattern's regex
    pub async fn regexp_nodes(&self, pattern: &Pattern) -> Vec<Node> {
        self.nodes
            .read()
            .await
            .iter()
            .filter(|node| {
                host_candidates(node)
                    .iter()
                    .any(|candidate| pattern.regex().is_match(candidate))
            })
            .cloned()
            .collect()
    }

    /// Pick a neighborhood node for `node`.
    ///
    /// Currently a uniformly random member; no locality is implied.
    pub async fn neighborhood_node(&self, _node: &Node) -> Result<Node> {
        let nodes = self.nodes.read().await;
        if nodes.is_empty() {
            return Err(FinderError::EmptyRegistry);
        }
        // TODO: pick by topology once nodes carry locality information
        let idx = rand::rng().random_range(0..nodes.len());
        Ok(nodes[idx].clone())
    }

    pub async fn set_search_listener(&self, listener: Arc<dyn SearchListener>) {
        self.listeners.write().await.search = Some(listener);
    }

    pub async fn set_notify_listener(&self, listener: Arc<dyn NotifyListener>) {
        self.listeners.write().await.notify = Some(listener);
    }

    /// Forward a newly found node to the search listener, if any
    pub async fn notify_search_listener(&self, node: &Node) {
        let listener = self.listeners.read().await.search.clone();
        if let Some(listener) = listener {
            listener.search_response_received(node);
        }
    }

    /// Forward an announced node to the notify listener, if any
    pub async fn notify_notify_listener(&self, node: &Node) {
        let listener = self.listeners.read().await.notify.clone();
        if let Some(listener) = listener {
            listener.notify_received(node);
        }
    }
}

/// Address, `address:port`, host, and `host:port`, skipping blanks
fn host_candidates(node: &Node) -> Vec<String> {
    let port = node.rpc_port();
    let mut candidates = Vec::with_capacity(4);

    if let Some(addr) = node.address() {
        candidates.push(addr.to_string());
        candidates.push(format!("{}:{}", addr, port));
    }

    let host = node.host();
    if !host.is_empty() {
        candidates.push(host.to_string());
        candidates.push(format!("{}:{}", host, port));
    }

    candidates
}
