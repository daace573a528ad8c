//! Common error types for Finder components.

use thiserror::Error;

/// Result alias used across Finder crates
pub type Result<T> = std::result::Result<T, FinderError>;

/// Common errors across Finder components
#[derive(Debug, Error)]
pub enum FinderError {
    /// An equal node is already registered
    #[error("Node ({0}) is already added")]
    DuplicateNode(String),

    /// The registry has no nodes to pick from
    #[error("Finder hasn't found any nodes")]
    EmptyRegistry,

    /// Missing, malformed, or incomplete discovery message
    #[error("Invalid discovery message: {0}")]
    InvalidMessage(String),

    /// Message was sent by an object other than the finder device
    #[error("Invalid object code: {found:06X} != {expected:06X}")]
    ObjectCodeMismatch { found: u32, expected: u32 },

    /// Message carries a property code with no node field
    #[error("Invalid property code: {0:02X}")]
    UnrecognizedProperty(u8),

    /// Decoded node has no usable address
    #[error("Unreachable node address: {0}")]
    UnreachableAddress(String),

    /// Peer did not answer a request
    #[error("Node ({0}) is not responding")]
    NoResponse(String),

    /// Pattern failed to compile
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// Transport-level failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl FinderError {
    /// Returns true if this error rejects a single discovery candidate
    pub fn is_candidate_error(&self) -> bool {
        matches!(
            self,
            Self::NoResponse(_)
                | Self::InvalidMessage(_)
                | Self::ObjectCodeMismatch { .. }
                | Self::UnrecognizedProperty(_)
                | Self::UnreachableAddress(_)
        )
    }
}
