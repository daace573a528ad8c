//! Finder backends with a fixed lifecycle.
//!
//! Implements:
//! - Static finder (fixed node list or configuration file)
//! - Shared finder (registry handle shared between components)

mod shared;
mod static_finder;

pub use shared::SharedFinder;
pub use static_finder::StaticFinder;
