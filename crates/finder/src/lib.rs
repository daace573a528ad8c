//! # Finder
//!
//! Discovers peer service instances, keeps a deduplicated registry of them,
//! and selects nodes for routing metrics/RPC traffic.
//!
//! ## Architecture
//! ```text
//! Finder (trait) ──► Registry ◄── Pattern (Graphite wildcards / regex)
//!    │
//!    ├── StaticFinder         fixed node list / config file
//!    ├── SharedFinder         registry handle shared between components
//!    └── LiveDiscoveryFinder  DiscoveryTransport ⇄ property bridge
//! ```

pub mod backends;
pub mod config;
pub mod discovery;
pub mod finder;
pub mod regexp;
pub mod registry;

#[cfg(test)]
pub(crate) mod testing;

pub use backends::{SharedFinder, StaticFinder};
pub use crate::config::{Config, FinderConfig};
pub use discovery::{DiscoveryConfig, LiveDiscoveryFinder};
pub use finder::{Finder, NotifyListener, SearchListener};
pub use finder_common::{FinderError, Node, NodeConfig, Result};
pub use regexp::Pattern;
pub use registry::Registry;
