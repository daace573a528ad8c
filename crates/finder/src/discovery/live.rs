//! Finder driven by a discovery transport.
//!
//! `search()` broadcasts and then waits a fixed settle window while the
//! transport reports peers through [`TransportListener`]. Each reported peer
//! is queried for its properties, decoded into a candidate node, and added
//! to the registry unless it is the local node or already known.
//!
//! The settle window is a heuristic. Peers answering after it elapses are
//! still added, just not before `search()` returns.

use async_trait::async_trait;
use finder_common::constants::{DEFAULT_SETTLE_WINDOW_MS, backends};
use finder_common::{FinderError, Node, Result, equal};
use parking_lot::RwLock;
use std::sync::{Arc, Weak};
use std::time::Duration;

use super::properties;
use super::{DiscoveryTransport, Message, MessageKind, PropertyStore, RemotePeer, TransportListener};
use crate::finder::Finder;
use crate::registry::Registry;

/// Live discovery configuration
#[derive(Clone, Debug)]
pub struct DiscoveryConfig {
    /// Wait after a search broadcast before `search()` returns
    pub settle_window: Duration,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            settle_window: Duration::from_millis(DEFAULT_SETTLE_WINDOW_MS),
        }
    }
}

/// Finder that discovers peers over a [`DiscoveryTransport`]
pub struct LiveDiscoveryFinder {
    inner: Arc<LiveInner>,
}

struct LiveInner {
    registry: Registry,
    /// Node this process announces, never added to the registry
    local_node: RwLock<Option<Node>>,
    /// Broadcast and request/response side of the transport
    controller: Arc<dyn DiscoveryTransport>,
    /// Property values served to peers
    device: Arc<dyn PropertyStore>,
    config: DiscoveryConfig,
}

impl LiveDiscoveryFinder {
    /// Create a finder over separate controller and device handles
    pub fn new(
        controller: Arc<dyn DiscoveryTransport>,
        device: Arc<dyn PropertyStore>,
        local_node: Option<Node>,
        config: DiscoveryConfig,
    ) -> Self {
        let inner = Arc::new(LiveInner {
            registry: Registry::new(),
            local_node: RwLock::new(local_node),
            controller,
            device,
            config,
        });

        let listener: Weak<LiveInner> = Arc::downgrade(&inner);
        inner.controller.set_listener(listener);

        Self { inner }
    }

    /// Create a finder over a transport that also hosts the local device
    pub fn from_transport<T>(
        transport: Arc<T>,
        local_node: Option<Node>,
        config: DiscoveryConfig,
    ) -> Self
    where
        T: DiscoveryTransport + PropertyStore + 'static,
    {
        Self::new(transport.clone(), transport, local_node, config)
    }

    pub fn local_node(&self) -> Option<Node> {
        self.inner.local_node.read().clone()
    }

    /// Replace the announced node and republish its properties
    pub fn set_local_node(&self, node: Option<Node>) {
        *self.inner.local_node.write() = node;
        self.inner.sync_local_properties();
    }

    /// Returns true if the candidate describes this process
    pub fn is_local_node(&self, candidate: &Node) -> bool {
        self.inner.is_local_node(candidate)
    }

    /// Broadcast the local node to all peers without waiting for a search
    pub async fn announce(&self) -> Result<()> {
        let Some(node) = self.local_node() else {
            return Ok(());
        };

        self.inner.sync_local_properties();
        self.inner
            .controller
            .notify_all(properties::notification(self.inner.device.object_code(), &node))
            .await
    }
}

impl LiveInner {
    fn is_local_node(&self, candidate: &Node) -> bool {
        match self.local_node.read().as_ref() {
            Some(local) => equal(local, candidate),
            None => false,
        }
    }

    fn sync_local_properties(&self) {
        if let Some(node) = self.local_node.read().as_ref() {
            properties::update_properties(self.device.as_ref(), node);
        }
    }

    /// Ask a peer for its properties and decode them into a node
    async fn query_candidate(&self, peer: &RemotePeer) -> Result<Node> {
        let request = properties::read_request(self.device.object_code());
        let response = self.controller.post_message(peer, request).await?;
        properties::parse_response(&response)
    }

    /// Decode an announcement and pass it to the notify listener
    async fn handle_notification(&self, message: &Message) {
        let candidate = match properties::parse_response(message) {
            Ok(node) => node,
            Err(e) if e.is_candidate_error() => {
                tracing::warn!(error = %e, "Rejected node announcement");
                return;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to decode node announcement");
                return;
            }
        };

        if self.is_local_node(&candidate) {
            return;
        }

        match self.registry.add_node(candidate.clone()).await {
            Ok(()) => tracing::info!(node = %candidate, "New finder node announced"),
            Err(FinderError::DuplicateNode(_)) => {}
            Err(e) => tracing::error!(error = %e, "Failed to add announced node"),
        }

        self.registry.notify_notify_listener(&candidate).await;
    }
}

#[async_trait]
impl TransportListener for LiveInner {
    async fn peer_found(&self, peer: RemotePeer) {
        if !self.controller.is_running() {
            return;
        }

        tracing::trace!(peer = %peer, "Discovery node found");

        let candidate = match self.query_candidate(&peer).await {
            Ok(node) => node,
            Err(e) if e.is_candidate_error() => {
                tracing::warn!(peer = %peer, error = %e, "Rejected candidate node");
                return;
            }
            Err(e) => {
                tracing::error!(peer = %peer, error = %e, "Discovery query failed");
                return;
            }
        };

        tracing::trace!(
            peer = %peer,
            address = %candidate.address_string(),
            port = candidate.rpc_port(),
            "Candidate finder node found"
        );

        if self.is_local_node(&candidate) {
            return;
        }

        match self.registry.add_node(candidate.clone()).await {
            Ok(()) => {
                tracing::info!(
                    address = %candidate.address_string(),
                    port = candidate.rpc_port(),
                    "New finder node found"
                );
                self.registry.notify_search_listener(&candidate).await;
            }
            Err(FinderError::DuplicateNode(_)) => {}
            Err(e) => tracing::error!(error = %e, "Failed to add candidate node"),
        }
    }

    async fn message_received(&self, message: &Message) {
        match message.kind {
            MessageKind::ReadRequest => self.sync_local_properties(),
            MessageKind::Notification => self.handle_notification(message).await,
            MessageKind::ReadResponse | MessageKind::ReadNotPossible => {}
        }
    }
}

#[async_trait]
impl Finder for LiveDiscoveryFinder {
    async fn search(&self) -> Result<()> {
        self.inner.controller.search_all().await?;
        tokio::time::sleep(self.inner.config.settle_window).await;
        Ok(())
    }

    async fn start(&self) -> Result<()> {
        self.inner.controller.start().await?;
        self.inner.sync_local_properties();
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.inner.controller.stop().await
    }

    fn is_running(&self) -> bool {
        self.inner.controller.is_running()
    }

    fn describe(&self) -> String {
        format!("{}:{}", backends::DISCOVERY, self.inner.controller.describe())
    }

    fn registry(&self) -> &Registry {
        &self.inner.registry
    }
}
