//! Shared error definitions for tessera primitives.

use thiserror::Error;

/// Result alias used throughout the primitives crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while manipulating primitive types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Configuration name failed identifier validation.
    #[error("invalid configuration name `{name}`: {reason}")]
    InvalidName {
        /// The offending name.
        name: String,
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// Structured text could not be parsed into a node tree.
    #[error("invalid structured document: {reason}")]
    InvalidDocument {
        /// Reason reported by the underlying parser.
        reason: String,
    },
}
