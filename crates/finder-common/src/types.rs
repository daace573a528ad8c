//! Node status types shared across Finder components.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Liveness condition of a node.
///
/// The discriminants are the values carried in the condition property.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Condition {
    Unknown = 0x00,
    /// Freshly constructed, not yet bootstrapped
    #[default]
    Initial = 0x10,
    Bootstrap = 0x20,
    /// Serving requests
    Ready = 0x30,
    Stop = 0x31,
    OutOfDate = 0x32,
}

impl Condition {
    pub fn value(&self) -> u8 {
        *self as u8
    }
}

impl From<u8> for Condition {
    fn from(value: u8) -> Self {
        match value {
            0x10 => Self::Initial,
            0x20 => Self::Bootstrap,
            0x30 => Self::Ready,
            0x31 => Self::Stop,
            0x32 => Self::OutOfDate,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "unknown",
            Self::Initial => "initial",
            Self::Bootstrap => "bootstrap",
            Self::Ready => "ready",
            Self::Stop => "stop",
            Self::OutOfDate => "outofdate",
        };
        f.write_str(name)
    }
}

/// Logical clock of a node. Only ever moves forward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Clock(u64);

impl Clock {
    pub const ZERO: Clock = Clock(0);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// Advance the clock by one tick
    pub fn increment(&mut self) {
        self.0 = self.0.saturating_add(1);
    }
}

impl From<u64> for Clock {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Local liveness and versioning metadata of a node.
///
/// Not part of node identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStatus {
    pub condition: Condition,
    pub clock: Clock,
    /// Repository version counter
    pub version: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_wire_values() {
        for condition in [
            Condition::Unknown,
            Condition::Initial,
            Condition::Bootstrap,
            Condition::Ready,
            Condition::Stop,
            Condition::OutOfDate,
        ] {
            assert_eq!(Condition::from(condition.value()), condition);
        }
        assert_eq!(Condition::from(0xFF), Condition::Unknown);
    }

    #[test]
    fn test_clock_saturates() {
        let mut clock = Clock::new(u64::MAX - 1);
        clock.increment();
        clock.increment();
        assert_eq!(clock.value(), u64::MAX);
    }

    #[test]
    fn test_default_status() {
        let status = NodeStatus::default();
        assert_eq!(status.condition, Condition::Initial);
        assert_eq!(status.clock, Clock::ZERO);
        assert_eq!(status.version, 0);
    }
}
