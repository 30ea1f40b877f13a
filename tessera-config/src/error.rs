//! Error types for the configuration registry.

use thiserror::Error;

use crate::codec::CodecError;

/// Result alias for registry and variable operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors emitted by configuration variables and the registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable was created with a malformed name.
    ///
    /// This is a programming error in the caller, not a data error.
    #[error("invalid configuration name `{name}`: {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// An existing variable was looked up with a different value type.
    #[error("configuration `{name}` holds `{actual}`, requested `{expected}`")]
    TypeMismatch {
        /// Name of the variable.
        name: String,
        /// Type requested by the caller.
        expected: &'static str,
        /// Type the variable was registered with.
        actual: &'static str,
    },

    /// Text could not be decoded into the variable's type.
    #[error("cannot update configuration `{name}`: {source}")]
    Decode {
        /// Name of the variable.
        name: String,
        /// Underlying codec failure.
        #[source]
        source: CodecError,
    },

    /// The current value could not be encoded as text.
    #[error("cannot render configuration `{name}`: {source}")]
    Encode {
        /// Name of the variable.
        name: String,
        /// Underlying codec failure.
        #[source]
        source: CodecError,
    },

    /// A document could not be parsed before loading.
    #[error("invalid configuration document: {reason}")]
    Document {
        /// Reason reported by the parser.
        reason: String,
    },
}

impl From<tessera_primitives::Error> for ConfigError {
    fn from(err: tessera_primitives::Error) -> Self {
        match err {
            tessera_primitives::Error::InvalidName { name, reason } => {
                Self::InvalidName { name, reason }
            }
            tessera_primitives::Error::InvalidDocument { reason } => Self::Document { reason },
        }
    }
}
