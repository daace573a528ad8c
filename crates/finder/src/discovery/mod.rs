//! Live node discovery.
//!
//! The wire protocol lives behind [`DiscoveryTransport`] (broadcast, direct
//! request/response, peer callbacks) and [`PropertyStore`] (the local
//! device's property values). [`LiveDiscoveryFinder`] drives both, and the
//! [`properties`] bridge maps nodes to and from property sets.
//!
//! [`MemoryNetwork`] provides an in-process transport so several finders in
//! one process can discover each other.

mod live;
mod memory;
pub mod properties;

pub use live::{DiscoveryConfig, LiveDiscoveryFinder};
pub use memory::{MemoryNetwork, MemoryTransport};

use async_trait::async_trait;
use finder_common::Result;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Weak;

/// Property code within a device object
pub type PropertyCode = u8;

/// Kind of a discovery message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Asks the destination object for the listed properties
    ReadRequest,
    /// Answers a read request with property data
    ReadResponse,
    /// The destination could not serve a read request
    ReadNotPossible,
    /// Unsolicited announcement of property data
    Notification,
}

/// A single property value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub code: PropertyCode,
    pub data: Vec<u8>,
}

impl Property {
    pub fn new(code: PropertyCode, data: Vec<u8>) -> Self {
        Self { code, data }
    }

    /// Property without data, as listed in read requests
    pub fn request(code: PropertyCode) -> Self {
        Self { code, data: Vec::new() }
    }
}

/// A discovery message exchanged between peers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub kind: MessageKind,
    /// Object that sent the message
    pub source_object: u32,
    /// Object the message is addressed to
    pub destination_object: u32,
    pub properties: Vec<Property>,
}

impl Message {
    pub fn is_read_request(&self) -> bool {
        self.kind == MessageKind::ReadRequest
    }

    pub fn has_property(&self, code: PropertyCode) -> bool {
        self.properties.iter().any(|prop| prop.code == code)
    }

    pub fn property(&self, code: PropertyCode) -> Option<&Property> {
        self.properties.iter().find(|prop| prop.code == code)
    }
}

/// A peer observed by the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RemotePeer {
    pub address: SocketAddr,
}

impl fmt::Display for RemotePeer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.address.fmt(f)
    }
}

/// Callbacks from the transport, invoked on transport-owned tasks
#[async_trait]
pub trait TransportListener: Send + Sync {
    /// A peer answered a search broadcast
    async fn peer_found(&self, peer: RemotePeer);

    /// A message addressed to the local device arrived.
    ///
    /// For read requests this runs before the transport replies.
    async fn message_received(&self, message: &Message);
}

/// Network side of a discovery protocol
#[async_trait]
pub trait DiscoveryTransport: Send + Sync {
    async fn start(&self) -> Result<()>;

    async fn stop(&self) -> Result<()>;

    fn is_running(&self) -> bool;

    /// Broadcast a search for all finder devices
    async fn search_all(&self) -> Result<()>;

    /// Send a request to a peer and wait for its answer.
    ///
    /// Fails with `NoResponse` when the peer does not answer.
    async fn post_message(&self, peer: &RemotePeer, message: Message) -> Result<Message>;

    /// Broadcast an unsolicited message to all peers
    async fn notify_all(&self, message: Message) -> Result<()>;

    /// Register the callback target; the transport must not keep it alive
    fn set_listener(&self, listener: Weak<dyn TransportListener>);

    /// Transport name and version
    fn describe(&self) -> String;
}

/// Local device property values served to peers
pub trait PropertyStore: Send + Sync {
    /// Object code of the local device
    fn object_code(&self) -> u32;

    /// Codes the device declares
    fn property_codes(&self) -> Vec<PropertyCode>;

    fn set_property_data(&self, code: PropertyCode, data: Vec<u8>) -> Result<()>;

    fn property_data(&self, code: PropertyCode) -> Option<Vec<u8>>;
}
