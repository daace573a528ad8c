//! Node identity model.
//!
//! A [`Node`] is the configuration of a discoverable peer (cluster, host,
//! address, RPC port, Graphite ports) plus its [`NodeStatus`]. Identity is field-wise and
//! tolerant of blanks: see [`equal`].

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::net::{IpAddr, ToSocketAddrs};

use crate::types::{Clock, Condition, NodeStatus};

/// Attributes of a discoverable peer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Logical group, must match exactly
    #[serde(default)]
    pub cluster: String,

    /// Symbolic name (may be empty)
    #[serde(default)]
    pub host: String,

    /// Network address (may be absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<IpAddr>,

    /// Service port
    #[serde(default)]
    pub rpc_port: u32,

    /// Graphite render API port, not part of identity
    #[serde(default)]
    pub render_port: u32,

    /// Graphite carbon (plaintext ingest) port, not part of identity
    #[serde(default)]
    pub carbon_port: u32,
}

/// A discovered or configured peer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Node {
    #[serde(flatten)]
    config: NodeConfig,
    #[serde(flatten)]
    status: NodeStatus,
}

/// Returns true if both nodes describe the same peer.
///
/// Cluster and RPC port must be identical. Host and address are compared
/// only when present on both sides. Graphite ports are ignored.
pub fn equal(this: &Node, other: &Node) -> bool {
    if this.config.cluster != other.config.cluster {
        return false;
    }

    if !this.config.host.is_empty()
        && !other.config.host.is_empty()
        && this.config.host != other.config.host
    {
        return false;
    }

    if let (Some(a), Some(b)) = (this.config.address, other.config.address) {
        if a != b {
            return false;
        }
    }

    this.config.rpc_port == other.config.rpc_port
}

/// SHA-256 hex digest over cluster, host, address and port
pub fn unique_id(node: &Node) -> String {
    let seed = format!(
        "{}{}{}{}",
        node.config.cluster,
        node.config.host,
        node.address_string(),
        node.config.rpc_port
    );
    hex::encode(Sha256::digest(seed.as_bytes()))
}

impl Node {
    /// Create a node with empty configuration and an initial status
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: NodeConfig) -> Self {
        Self {
            config,
            status: NodeStatus::default(),
        }
    }

    /// Create a node with only its host set
    pub fn with_host_name(host: impl Into<String>) -> Self {
        Self::new().with_host(host)
    }

    pub fn with_cluster(mut self, cluster: impl Into<String>) -> Self {
        self.config.cluster = cluster.into();
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn with_address(mut self, address: Option<IpAddr>) -> Self {
        self.config.address = address;
        self
    }

    pub fn with_rpc_port(mut self, port: u32) -> Self {
        self.config.rpc_port = port;
        self
    }

    pub fn with_render_port(mut self, port: u32) -> Self {
        self.config.render_port = port;
        self
    }

    pub fn with_carbon_port(mut self, port: u32) -> Self {
        self.config.carbon_port = port;
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.status.condition = condition;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.status.clock = clock;
        self
    }

    pub fn with_version(mut self, version: u64) -> Self {
        self.status.version = version;
        self
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn status(&self) -> &NodeStatus {
        &self.status
    }

    pub fn cluster(&self) -> &str {
        &self.config.cluster
    }

    /// Host as stored, without resolution
    pub fn host(&self) -> &str {
        &self.config.host
    }

    /// Address as stored, without resolution
    pub fn address(&self) -> Option<IpAddr> {
        self.config.address
    }

    /// Textual address, empty when absent
    pub fn address_string(&self) -> String {
        self.config
            .address
            .map(|addr| addr.to_string())
            .unwrap_or_default()
    }

    pub fn rpc_port(&self) -> u32 {
        self.config.rpc_port
    }

    pub fn render_port(&self) -> u32 {
        self.config.render_port
    }

    pub fn carbon_port(&self) -> u32 {
        self.config.carbon_port
    }

    pub fn condition(&self) -> Condition {
        self.status.condition
    }

    pub fn clock(&self) -> Clock {
        self.status.clock
    }

    pub fn version(&self) -> u64 {
        self.status.version
    }

    pub fn set_condition(&mut self, condition: Condition) {
        self.status.condition = condition;
    }

    /// Merge a status snapshot from the peer.
    ///
    /// The condition is replaced; clock and version never move backwards.
    pub fn set_status(&mut self, status: NodeStatus) {
        self.status.condition = status.condition;
        self.status.clock = self.status.clock.max(status.clock);
        self.status.version = self.status.version.max(status.version);
    }

    /// Advance the logical clock
    pub fn update_clock(&mut self) {
        self.status.clock.increment();
    }

    /// Advance the repository version
    pub fn update_version(&mut self) {
        self.status.version = self.status.version.saturating_add(1);
    }

    /// See [`equal`]
    pub fn is_same_node(&self, other: &Node) -> bool {
        equal(self, other)
    }

    /// See [`unique_id`]
    pub fn unique_id(&self) -> String {
        unique_id(self)
    }

    /// Host, reverse-resolved from the address and cached when unset.
    ///
    /// Returns an empty string when neither is available.
    pub fn resolve_host(&mut self) -> &str {
        if self.config.host.is_empty() {
            if let Some(addr) = self.config.address {
                match dns_lookup::lookup_addr(&addr) {
                    Ok(name) => self.config.host = name,
                    Err(_) => return "",
                }
            }
        }
        &self.config.host
    }

    /// Address, forward-resolved from the host and cached when unset
    pub fn resolve_address(&mut self) -> Option<IpAddr> {
        if self.config.address.is_none() && !self.config.host.is_empty() {
            self.config.address = (self.config.host.as_str(), 0)
                .to_socket_addrs()
                .ok()
                .and_then(|mut addrs| addrs.next())
                .map(|sock| sock.ip());
        }
        self.config.address
    }
}

impl From<NodeConfig> for Node {
    fn from(config: NodeConfig) -> Self {
        Self::from_config(config)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.config.host.is_empty() {
            write!(f, "{}:{}", self.address_string(), self.config.rpc_port)
        } else {
            write!(f, "{}:{}", self.config.host, self.config.rpc_port)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn ip(a: u8, b: u8, c: u8, d: u8) -> Option<IpAddr> {
        Some(IpAddr::V4(Ipv4Addr::new(a, b, c, d)))
    }

    #[test]
    fn test_equal_by_host() {
        let node01 = Node::with_host_name("node01");
        let node02 = Node::with_host_name("node02");

        assert!(equal(&node01, &node01));
        assert!(!equal(&node01, &node02));
    }

    #[test]
    fn test_equal_by_address() {
        let node01 = Node::new().with_address(ip(192, 168, 100, 1));
        let node02 = Node::new().with_address(ip(192, 168, 100, 2));

        assert!(equal(&node01, &node01));
        assert!(!equal(&node01, &node02));
    }

    #[test]
    fn test_equal_by_port() {
        let node01 = Node::with_host_name("node01")
            .with_address(ip(192, 168, 100, 1))
            .with_rpc_port(1);
        let node02 = node01.clone().with_rpc_port(2);

        assert!(equal(&node01, &node01));
        assert!(!equal(&node01, &node02));
    }

    #[test]
    fn test_equal_blank_fields_are_dont_care() {
        let named = Node::with_host_name("node01").with_address(ip(10, 0, 0, 1));
        let host_only = Node::with_host_name("node01");
        let addr_only = Node::new().with_address(ip(10, 0, 0, 1));

        assert!(equal(&named, &host_only));
        assert!(equal(&named, &addr_only));
        assert!(equal(&host_only, &addr_only));
    }

    #[test]
    fn test_equal_requires_cluster() {
        let a = Node::with_host_name("node01").with_cluster("alpha");
        let b = Node::with_host_name("node01").with_cluster("beta");
        assert!(!equal(&a, &b));
        assert!(!a.is_same_node(&Node::with_host_name("node01")));
    }

    #[test]
    fn test_equal_ignores_status() {
        let a = Node::with_host_name("node01").with_clock(Clock::new(3));
        let b = Node::with_host_name("node01").with_condition(Condition::Ready);
        assert!(equal(&a, &b));
    }

    #[test]
    fn test_unique_id() {
        let a = Node::with_host_name("node01")
            .with_cluster("alpha")
            .with_address(ip(10, 0, 0, 1))
            .with_rpc_port(38400);
        let b = a.clone().with_clock(Clock::new(42));
        let c = a.clone().with_rpc_port(38401);

        assert_eq!(a.unique_id().len(), 64);
        assert_eq!(a.unique_id(), b.unique_id());
        assert_ne!(a.unique_id(), c.unique_id());
    }

    #[test]
    fn test_clock_and_version_only_move_forward() {
        let mut node = Node::new();
        node.update_clock();
        node.update_clock();
        node.update_version();
        assert_eq!(node.clock().value(), 2);
        assert_eq!(node.version(), 1);
    }

    #[test]
    fn test_set_status_keeps_counters() {
        let mut node = Node::new();
        node.update_clock();
        node.update_clock();
        node.update_version();

        node.set_status(NodeStatus::default());
        assert_eq!(node.clock().value(), 2);
        assert_eq!(node.version(), 1);
        assert_eq!(node.condition(), Condition::Initial);

        node.set_status(NodeStatus {
            condition: Condition::Ready,
            clock: Clock::new(10),
            version: 4,
        });
        assert_eq!(node.clock().value(), 10);
        assert_eq!(node.version(), 4);
        assert_eq!(node.condition(), Condition::Ready);
    }

    #[test]
    fn test_graphite_ports() {
        let node = Node::with_host_name("node01")
            .with_rpc_port(38400)
            .with_render_port(8080)
            .with_carbon_port(2003);
        assert_eq!(node.render_port(), 8080);
        assert_eq!(node.carbon_port(), 2003);

        let other = Node::with_host_name("node01")
            .with_rpc_port(38400)
            .with_render_port(8081)
            .with_carbon_port(2004);
        assert!(equal(&node, &other));

        assert_eq!(Node::new().render_port(), 0);
        assert_eq!(Node::new().carbon_port(), 0);
    }

    #[test]
    fn test_resolve_address_from_host() {
        let mut node = Node::with_host_name("localhost");
        assert!(node.resolve_address().is_some());
        assert!(node.address().is_some());
    }

    #[test]
    fn test_resolve_without_fields() {
        let mut node = Node::new();
        assert_eq!(node.resolve_host(), "");
        assert!(node.resolve_address().is_none());
    }

    #[test]
    fn test_display() {
        let node = Node::with_host_name("node01").with_rpc_port(8080);
        assert_eq!(node.to_string(), "node01:8080");

        let node = Node::new().with_address(ip(10, 0, 0, 1)).with_rpc_port(8080);
        assert_eq!(node.to_string(), "10.0.0.1:8080");
    }

    #[test]
    fn test_node_serialization() {
        let node = Node::with_host_name("node01")
            .with_cluster("alpha")
            .with_address(ip(10, 0, 0, 1))
            .with_rpc_port(38400)
            .with_carbon_port(2003);

        let json = serde_json::to_string(&node).unwrap();
        let parsed: Node = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.config(), node.config());
        assert_eq!(parsed.status(), node.status());
    }
}
