//! Typed configuration registry with hot-reloadable, pattern-formatted logging.
//!
//! This crate bundles the workspace crates behind feature flags so downstream
//! users can enable only the parts they need.

#![warn(missing_docs, clippy::pedantic)]

/// Shared primitives: configuration names and document nodes.
pub use tessera_primitives as primitives;

/// Configuration variables, codecs, and the registry (enabled by `config` feature).
#[cfg(feature = "config")]
pub use tessera_config as config;

/// Log levels, events, and pattern formatting (enabled by `format` feature).
#[cfg(feature = "format")]
pub use tessera_format as format;

/// Loggers, appenders, and reconciliation (enabled by `log` feature).
#[cfg(feature = "log")]
pub use tessera_log as log;
