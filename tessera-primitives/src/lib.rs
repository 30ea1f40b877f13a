//! Core shared types for the tessera configuration registry.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod name;
mod node;

/// Error type and result alias shared across the workspace.
pub use error::{Error, Result};
/// Validated dotted configuration path.
pub use name::ConfigName;
/// Structured scalar/sequence/mapping value.
pub use node::Node;
