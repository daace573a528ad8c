//! # Finder Common
//!
//! Shared types and utilities used across Finder components.
//!
//! ## Modules
//! - `node` - Node identity model (equality, unique IDs, lazy resolution)
//! - `types` - Node status data (Condition, Clock, NodeStatus)
//! - `error` - Common error types
//! - `constants` - Device/property codes and default settings

pub mod constants;
pub mod error;
pub mod node;
pub mod types;

pub use error::{FinderError, Result};
pub use node::{Node, NodeConfig, equal};
pub use types::*;
