//! Property sync bridge.
//!
//! Each node field occupies one property code of the finder device. Strings
//! travel as raw bytes, integers as fixed-width big-endian values.

use finder_common::constants::device::*;
use finder_common::{Clock, Condition, FinderError, Node, Result};
use std::net::IpAddr;

use super::{Message, MessageKind, Property, PropertyCode, PropertyStore};

/// Node field carried by a property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeField {
    Condition,
    Cluster,
    Host,
    Address,
    RpcPort,
    Clock,
    Version,
}

/// Entry of the property table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertySpec {
    pub code: PropertyCode,
    pub field: NodeField,
    /// Byte width of integer fields, `None` for strings
    pub width: Option<usize>,
    /// Responses lacking this property are rejected
    pub required: bool,
}

impl PropertySpec {
    /// Required variable-length string property
    const fn string(code: PropertyCode, field: NodeField) -> Self {
        Self {
            code,
            field,
            width: None,
            required: true,
        }
    }

    /// Fixed-width big-endian integer property
    const fn integer(code: PropertyCode, field: NodeField, width: usize, required: bool) -> Self {
        Self {
            code,
            field,
            width: Some(width),
            required,
        }
    }
}

/// Every property mapped to a node field
pub const PROPERTY_TABLE: [PropertySpec; 7] = [
    PropertySpec::integer(CONDITION_CODE, NodeField::Condition, CONDITION_SIZE, false),
    PropertySpec::string(CLUSTER_CODE, NodeField::Cluster),
    PropertySpec::string(HOST_CODE, NodeField::Host),
    PropertySpec::string(ADDRESS_CODE, NodeField::Address),
    PropertySpec::integer(RPC_PORT_CODE, NodeField::RpcPort, RPC_PORT_SIZE, true),
    PropertySpec::integer(CLOCK_CODE, NodeField::Clock, CLOCK_SIZE, true),
    PropertySpec::integer(VERSION_CODE, NodeField::Version, VERSION_SIZE, false),
];

/// Look up the table entry for a code
pub fn property_spec(code: PropertyCode) -> Option<&'static PropertySpec> {
    PROPERTY_TABLE.iter().find(|spec| spec.code == code)
}

/// Read request from `source_object` for every mapped property of the
/// finder device
pub fn read_request(source_object: u32) -> Message {
    Message {
        kind: MessageKind::ReadRequest,
        source_object,
        destination_object: FINDER_DEVICE_CODE,
        properties: PROPERTY_TABLE
            .iter()
            .map(|spec| Property::request(spec.code))
            .collect(),
    }
}

/// Notification from `source_object` carrying every mapped property of `node`
pub fn notification(source_object: u32, node: &Node) -> Message {
    Message {
        kind: MessageKind::Notification,
        source_object,
        destination_object: FINDER_DEVICE_CODE,
        properties: PROPERTY_TABLE
            .iter()
            .map(|spec| Property::new(spec.code, encode_field(spec, node)))
            .collect(),
    }
}

/// Serialize the field a property carries
pub fn encode_field(spec: &PropertySpec, node: &Node) -> Vec<u8> {
    let width = spec.width.unwrap_or(8);
    match spec.field {
        NodeField::Condition => encode_uint(u64::from(node.condition().value()), width),
        NodeField::Cluster => node.cluster().as_bytes().to_vec(),
        NodeField::Host => node.host().as_bytes().to_vec(),
        NodeField::Address => node.address_string().into_bytes(),
        NodeField::RpcPort => encode_uint(u64::from(node.rpc_port()), width),
        NodeField::Clock => encode_uint(node.clock().value(), width),
        NodeField::Version => encode_uint(node.version(), width),
    }
}

/// Push the node's fields into the local device.
///
/// Codes the bridge does not map are skipped. A failed push is logged and
/// the remaining properties still sync.
pub fn update_properties(store: &dyn PropertyStore, node: &Node) {
    for code in store.property_codes() {
        let Some(spec) = property_spec(code) else {
            continue;
        };

        if let Err(e) = store.set_property_data(code, encode_field(spec, node)) {
            tracing::error!(code, error = %e, "Failed to update property");
        }
    }
}

/// Build a candidate node from a peer's response.
///
/// The whole candidate is rejected on any malformed or unknown property,
/// and when its address is not reachable from other hosts.
pub fn parse_response(message: &Message) -> Result<Node> {
    if !matches!(message.kind, MessageKind::ReadResponse | MessageKind::Notification) {
        return Err(FinderError::InvalidMessage(format!(
            "unexpected {:?} message",
            message.kind
        )));
    }

    if message.source_object != FINDER_DEVICE_CODE {
        return Err(FinderError::ObjectCodeMismatch {
            found: message.source_object,
            expected: FINDER_DEVICE_CODE,
        });
    }

    for spec in PROPERTY_TABLE.iter().filter(|spec| spec.required) {
        if !message.has_property(spec.code) {
            return Err(FinderError::InvalidMessage(format!(
                "missing property {:02X}",
                spec.code
            )));
        }
    }

    let mut node = Node::new();
    let mut address_text = String::new();

    for prop in &message.properties {
        let spec = property_spec(prop.code).ok_or(FinderError::UnrecognizedProperty(prop.code))?;

        node = match spec.field {
            NodeField::Condition => {
                let value = u8::try_from(decode_uint(&prop.data)?)
                    .map_err(|_| invalid_integer(prop))?;
                node.with_condition(Condition::from(value))
            }
            NodeField::Cluster => node.with_cluster(decode_string(prop)?),
            NodeField::Host => node.with_host(decode_string(prop)?),
            NodeField::Address => {
                address_text = decode_string(prop)?;
                node.with_address(address_text.parse::<IpAddr>().ok())
            }
            NodeField::RpcPort => {
                let port = u32::try_from(decode_uint(&prop.data)?)
                    .map_err(|_| invalid_integer(prop))?;
                node.with_rpc_port(port)
            }
            NodeField::Clock => node.with_clock(Clock::new(decode_uint(&prop.data)?)),
            NodeField::Version => node.with_version(decode_uint(&prop.data)?),
        };
    }

    match node.address() {
        Some(addr) if !addr.is_loopback() && !addr.is_unspecified() => Ok(node),
        _ => Err(FinderError::UnreachableAddress(if address_text.is_empty() {
            "<empty>".to_string()
        } else {
            address_text
        })),
    }
}

/// Big-endian encoding in exactly `width` bytes (at most 8)
fn encode_uint(value: u64, width: usize) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    bytes[bytes.len() - width.min(bytes.len())..].to_vec()
}

fn decode_uint(data: &[u8]) -> Result<u64> {
    if data.len() > 8 {
        return Err(FinderError::InvalidMessage(format!(
            "integer property of {} bytes",
            data.len()
        )));
    }
    Ok(data.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
}

fn decode_string(prop: &Property) -> Result<String> {
    String::from_utf8(prop.data.clone()).map_err(|_| {
        FinderError::InvalidMessage(format!("property {:02X} is not UTF-8", prop.code))
    })
}

fn invalid_integer(prop: &Property) -> FinderError {
    FinderError::InvalidMessage(format!("property {:02X} out of range", prop.code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::BTreeMap;
    use std::net::Ipv4Addr;

    fn test_node() -> Node {
        Node::with_host_name("org.cybergarage.finder001")
            .with_cluster("alpha")
            .with_address(Some(IpAddr::V4(Ipv4Addr::new(192, 168, 100, 1))))
            .with_rpc_port(38400)
            .with_condition(Condition::Ready)
            .with_clock(Clock::new(0x0102_0304_0506))
            .with_version(7)
    }

    fn response(properties: Vec<Property>) -> Message {
        Message {
            kind: MessageKind::ReadResponse,
            source_object: FINDER_DEVICE_CODE,
            destination_object: FINDER_DEVICE_CODE,
            properties,
        }
    }

    fn response_for(node: &Node) -> Message {
        response(
            PROPERTY_TABLE
                .iter()
                .map(|spec| Property::new(spec.code, encode_field(spec, node)))
                .collect(),
        )
    }

    #[derive(Default)]
    struct TestStore {
        codes: Vec<PropertyCode>,
        failing: Option<PropertyCode>,
        data: Mutex<BTreeMap<PropertyCode, Vec<u8>>>,
    }

    impl PropertyStore for TestStore {
        fn object_code(&self) -> u32 {
            FINDER_DEVICE_CODE
        }

        fn property_codes(&self) -> Vec<PropertyCode> {
            self.codes.clone()
        }

        fn set_property_data(&self, code: PropertyCode, data: Vec<u8>) -> Result<()> {
            if self.failing == Some(code) {
                return Err(FinderError::Transport("read-only property".to_string()));
            }
            self.data.lock().insert(code, data);
            Ok(())
        }

        fn property_data(&self, code: PropertyCode) -> Option<Vec<u8>> {
            self.data.lock().get(&code).cloned()
        }
    }

    #[test]
    fn test_round_trip() {
        let node = test_node();
        let parsed = parse_response(&response_for(&node)).unwrap();

        assert_eq!(parsed.config(), node.config());
        assert_eq!(parsed.status(), node.status());
    }

    #[test]
    fn test_integer_widths() {
        let node = test_node();
        let port = property_spec(RPC_PORT_CODE).unwrap();
        assert_eq!(encode_field(port, &node), vec![0x00, 0x00, 0x96, 0x00]);

        let clock = property_spec(CLOCK_CODE).unwrap();
        assert_eq!(
            encode_field(clock, &node),
            vec![0x00, 0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06]
        );

        let condition = property_spec(CONDITION_CODE).unwrap();
        assert_eq!(encode_field(condition, &node), vec![0x30]);
    }

    #[test]
    fn test_read_request_lists_all_codes() {
        let request = read_request(FINDER_DEVICE_CODE);
        assert!(request.is_read_request());
        assert_eq!(request.destination_object, FINDER_DEVICE_CODE);
        for spec in &PROPERTY_TABLE {
            assert!(request.has_property(spec.code));
        }
    }

    #[test]
    fn test_messages_carry_source_object() {
        let request = read_request(0x05FF01);
        assert_eq!(request.source_object, 0x05FF01);
        assert_eq!(request.destination_object, FINDER_DEVICE_CODE);

        let message = notification(0x05FF01, &test_node());
        assert_eq!(message.source_object, 0x05FF01);
        assert_eq!(message.destination_object, FINDER_DEVICE_CODE);
    }

    #[test]
    fn test_rejects_request_messages() {
        let result = parse_response(&read_request(FINDER_DEVICE_CODE));
        assert!(matches!(result, Err(FinderError::InvalidMessage(_))));
    }

    #[test]
    fn test_rejects_other_objects() {
        let mut message = response_for(&test_node());
        message.source_object = 0x029001;

        let result = parse_response(&message);
        assert!(matches!(
            result,
            Err(FinderError::ObjectCodeMismatch { found: 0x029001, .. })
        ));
    }

    #[test]
    fn test_rejects_missing_required_property() {
        let mut message = response_for(&test_node());
        message.properties.retain(|prop| prop.code != HOST_CODE);

        let result = parse_response(&message);
        assert!(matches!(result, Err(FinderError::InvalidMessage(_))));
    }

    #[test]
    fn test_optional_properties_may_be_missing() {
        let mut message = response_for(&test_node());
        message
            .properties
            .retain(|prop| prop.code != CONDITION_CODE && prop.code != VERSION_CODE);

        let node = parse_response(&message).unwrap();
        assert_eq!(node.condition(), Condition::Initial);
        assert_eq!(node.version(), 0);
    }

    #[test]
    fn test_rejects_unrecognized_property() {
        let mut message = response_for(&test_node());
        message.properties.push(Property::new(MANUFACTURER_CODE, vec![0x00, 0x00, 0x00]));

        let result = parse_response(&message);
        assert!(matches!(
            result,
            Err(FinderError::UnrecognizedProperty(MANUFACTURER_CODE))
        ));
    }

    #[test]
    fn test_rejects_unreachable_addresses() {
        for address in [
            None,
            Some(IpAddr::V4(Ipv4Addr::LOCALHOST)),
            Some(IpAddr::V4(Ipv4Addr::UNSPECIFIED)),
        ] {
            let node = test_node().with_address(address);
            let result = parse_response(&response_for(&node));
            assert!(
                matches!(result, Err(FinderError::UnreachableAddress(_))),
                "{:?}",
                address
            );
        }

        let mut message = response_for(&test_node());
        for prop in &mut message.properties {
            if prop.code == ADDRESS_CODE {
                prop.data = b"not-an-address".to_vec();
            }
        }
        assert!(matches!(
            parse_response(&message),
            Err(FinderError::UnreachableAddress(_))
        ));
    }

    #[test]
    fn test_rejects_oversized_integers() {
        let mut message = response_for(&test_node());
        for prop in &mut message.properties {
            if prop.code == CLOCK_CODE {
                prop.data = vec![0x01; 9];
            }
        }
        assert!(matches!(
            parse_response(&message),
            Err(FinderError::InvalidMessage(_))
        ));
    }

    #[test]
    fn test_update_properties() {
        let store = TestStore {
            codes: vec![MANUFACTURER_CODE, CLUSTER_CODE, HOST_CODE, ADDRESS_CODE, RPC_PORT_CODE],
            ..Default::default()
        };
        let node = test_node();

        update_properties(&store, &node);

        assert!(store.property_data(MANUFACTURER_CODE).is_none());
        assert_eq!(store.property_data(CLUSTER_CODE).unwrap(), b"alpha");
        assert_eq!(store.property_data(HOST_CODE).unwrap(), b"org.cybergarage.finder001");
        assert_eq!(store.property_data(ADDRESS_CODE).unwrap(), b"192.168.100.1");
        assert_eq!(store.property_data(RPC_PORT_CODE).unwrap(), vec![0x00, 0x00, 0x96, 0x00]);
    }

    #[test]
    fn test_update_properties_continues_after_failure() {
        let store = TestStore {
            codes: PROPERTY_TABLE.iter().map(|spec| spec.code).collect(),
            failing: Some(CLUSTER_CODE),
            ..Default::default()
        };

        update_properties(&store, &test_node());

        assert!(store.property_data(CLUSTER_CODE).is_none());
        assert!(store.property_data(HOST_CODE).is_some());
        assert!(store.property_data(CLOCK_CODE).is_some());
    }

    #[test]
    fn test_notification_round_trip() {
        let node = test_node();
        let parsed = parse_response(&notification(FINDER_DEVICE_CODE, &node)).unwrap();
        assert_eq!(parsed.config(), node.config());
    }
}
