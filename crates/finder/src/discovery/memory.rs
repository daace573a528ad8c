//! In-process discovery transport.
//!
//! Endpoints joined to one [`MemoryNetwork`] see each other the way hosts on
//! one multicast segment would: a search reaches every other running
//! endpoint, and read requests are answered from the target's device
//! properties.

use async_trait::async_trait;
use finder_common::constants::device::{FINDER_DEVICE_CODE, MANUFACTURER_CODE};
use finder_common::{FinderError, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use super::properties::PROPERTY_TABLE;
use super::{
    DiscoveryTransport, Message, MessageKind, Property, PropertyCode, PropertyStore, RemotePeer,
    TransportListener,
};

/// Experimental manufacturer code
const MANUFACTURER_DATA: [u8; 3] = [0xFF, 0xFF, 0xFF];

/// Shared segment joined by [`MemoryTransport`] endpoints
#[derive(Clone, Default)]
pub struct MemoryNetwork {
    /// Running endpoints by address; the network never keeps one alive
    endpoints: Arc<RwLock<HashMap<SocketAddr, Weak<MemoryTransport>>>>,
}

impl MemoryNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a stopped endpoint at `address`
    pub fn endpoint(&self, address: SocketAddr) -> Arc<MemoryTransport> {
        let mut properties = HashMap::new();
        properties.insert(MANUFACTURER_CODE, MANUFACTURER_DATA.to_vec());

        Arc::new_cyclic(|this| MemoryTransport {
            network: self.clone(),
            address,
            this: this.clone(),
            running: AtomicBool::new(false),
            listener: RwLock::new(None),
            properties: RwLock::new(properties),
        })
    }

    fn join(&self, address: SocketAddr, endpoint: Weak<MemoryTransport>) {
        self.endpoints.write().insert(address, endpoint);
    }

    fn leave(&self, address: &SocketAddr) {
        self.endpoints.write().remove(address);
    }

    fn lookup(&self, address: &SocketAddr) -> Option<Arc<MemoryTransport>> {
        self.endpoints
            .read()
            .get(address)
            .and_then(Weak::upgrade)
            .filter(|endpoint| endpoint.is_running())
    }

    /// Running endpoints other than `address`
    fn peers_of(&self, address: &SocketAddr) -> Vec<Arc<MemoryTransport>> {
        self.endpoints
            .read()
            .iter()
            .filter(|(addr, _)| *addr != address)
            .filter_map(|(_, endpoint)| endpoint.upgrade())
            .filter(|endpoint| endpoint.is_running())
            .collect()
    }
}

/// One endpoint of a [`MemoryNetwork`], hosting a finder device
pub struct MemoryTransport {
    network: MemoryNetwork,
    address: SocketAddr,
    this: Weak<MemoryTransport>,
    running: AtomicBool,
    listener: RwLock<Option<Weak<dyn TransportListener>>>,
    properties: RwLock<HashMap<PropertyCode, Vec<u8>>>,
}

impl MemoryTransport {
    pub fn address(&self) -> SocketAddr {
        self.address
    }

    fn listener(&self) -> Option<Arc<dyn TransportListener>> {
        self.listener.read().as_ref().and_then(Weak::upgrade)
    }

    fn ensure_running(&self) -> Result<()> {
        if self.is_running() {
            Ok(())
        } else {
            Err(FinderError::Transport(format!("endpoint {} is stopped", self.address)))
        }
    }

    fn is_declared(&self, code: PropertyCode) -> bool {
        code == MANUFACTURER_CODE || PROPERTY_TABLE.iter().any(|spec| spec.code == code)
    }

    /// Serve a request addressed to this endpoint's device
    async fn answer(&self, request: Message) -> Message {
        if let Some(listener) = self.listener() {
            listener.message_received(&request).await;
        }

        let readable = request.is_read_request()
            && request.destination_object == self.object_code()
            && request.properties.iter().all(|prop| self.is_declared(prop.code));

        if !readable {
            return Message {
                kind: MessageKind::ReadNotPossible,
                source_object: self.object_code(),
                destination_object: request.source_object,
                properties: request.properties,
            };
        }

        let properties = request
            .properties
            .iter()
            .map(|prop| Property::new(prop.code, self.property_data(prop.code).unwrap_or_default()))
            .collect();

        Message {
            kind: MessageKind::ReadResponse,
            source_object: self.object_code(),
            destination_object: request.source_object,
            properties,
        }
    }
}

#[async_trait]
impl DiscoveryTransport for MemoryTransport {
    async fn start(&self) -> Result<()> {
        self.running.store(true, Ordering::SeqCst);
        self.network.join(self.address, self.this.clone());
        tracing::debug!(address = %self.address, "Memory endpoint joined");
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.running.store(false, Ordering::SeqCst);
        self.network.leave(&self.address);
        tracing::debug!(address = %self.address, "Memory endpoint left");
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    async fn search_all(&self) -> Result<()> {
        self.ensure_running()?;

        let Some(listener) = self.listener() else {
            return Ok(());
        };

        for peer in self.network.peers_of(&self.address) {
            let listener = listener.clone();
            let remote = RemotePeer { address: peer.address };
            tokio::spawn(async move {
                listener.peer_found(remote).await;
            });
        }

        Ok(())
    }

    async fn post_message(&self, peer: &RemotePeer, message: Message) -> Result<Message> {
        self.ensure_running()?;

        match self.network.lookup(&peer.address) {
            Some(endpoint) => Ok(endpoint.answer(message).await),
            None => Err(FinderError::NoResponse(peer.to_string())),
        }
    }

    async fn notify_all(&self, message: Message) -> Result<()> {
        self.ensure_running()?;

        for peer in self.network.peers_of(&self.address) {
            if let Some(listener) = peer.listener() {
                listener.message_received(&message).await;
            }
        }

        Ok(())
    }

    fn set_listener(&self, listener: Weak<dyn TransportListener>) {
        *self.listener.write() = Some(listener);
    }

    fn describe(&self) -> String {
        format!("memory/{}", env!("CARGO_PKG_VERSION"))
    }
}

impl PropertyStore for MemoryTransport {
    fn object_code(&self) -> u32 {
        FINDER_DEVICE_CODE
    }

    fn property_codes(&self) -> Vec<PropertyCode> {
        let mut codes = vec![MANUFACTURER_CODE];
        codes.extend(PROPERTY_TABLE.iter().map(|spec| spec.code));
        codes
    }

    fn set_property_data(&self, code: PropertyCode, data: Vec<u8>) -> Result<()> {
        if !self.is_declared(code) {
            return Err(FinderError::Transport(format!("property {:02X} is not declared", code)));
        }
        self.properties.write().insert(code, data);
        Ok(())
    }

    fn property_data(&self, code: PropertyCode) -> Option<Vec<u8>> {
        self.properties.read().get(&code).cloned()
    }
}
