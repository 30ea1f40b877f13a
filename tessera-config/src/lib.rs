//! Typed configuration variables and the registry that owns them.
//!
//! Values convert to and from text through [`Codec`]; the [`ConfigRegistry`]
//! stores them type-erased under dotted names, applies documents to them, and
//! hands out typed [`ConfigVar`] handles whose listeners fire on every change.
//!
//! ```
//! use tessera_config::ConfigRegistry;
//!
//! let registry = ConfigRegistry::new();
//! let port = registry.lookup("system.port", 8080_u16, "listen port").unwrap();
//! port.add_listener(|old, new| println!("port {old} -> {new}"));
//!
//! registry.load_from_text(r#"{"system": {"port": 9000}}"#).unwrap();
//! assert_eq!(port.get_value(), 9000);
//! ```

#![warn(missing_docs, clippy::pedantic)]

pub mod codec;
mod error;
mod loader;
mod registry;
mod var;

pub use codec::{Codec, CodecError, CodecResult};
pub use error::{ConfigError, ConfigResult};
pub use loader::flatten;
pub use registry::ConfigRegistry;
pub use var::{ConfigValue, ConfigVar, ConfigVarBase, Listener, ListenerId};
