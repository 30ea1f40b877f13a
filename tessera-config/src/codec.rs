//! Bidirectional conversion between typed values and [`Node`] trees.

use std::any::type_name;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, LinkedList, VecDeque};
use std::hash::{BuildHasher, Hash};
use std::path::PathBuf;

use tessera_primitives::Node;
use thiserror::Error;

/// Result alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors produced while encoding or decoding a value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Input could not be turned into the target type.
    #[error("cannot decode `{target}`: {reason}")]
    Decode {
        /// Rust type name of the decode target.
        target: &'static str,
        /// Human-readable reason for the failure.
        reason: String,
    },

    /// Value could not be represented as a node.
    #[error("cannot encode `{source_type}`: {reason}")]
    Encode {
        /// Rust type name of the encoded value.
        source_type: &'static str,
        /// Human-readable reason for the failure.
        reason: String,
    },
}

impl CodecError {
    /// Creates a decode error targeting `T`.
    #[must_use]
    pub fn decode<T: ?Sized>(reason: impl Into<String>) -> Self {
        Self::Decode {
            target: type_name::<T>(),
            reason: reason.into(),
        }
    }

    /// Creates an encode error for a value of type `T`.
    #[must_use]
    pub fn encode<T: ?Sized>(reason: impl Into<String>) -> Self {
        Self::Encode {
            source_type: type_name::<T>(),
            reason: reason.into(),
        }
    }

    /// Decode error for a node of the wrong shape.
    #[must_use]
    pub fn unexpected<T: ?Sized>(expected: &str, found: &Node) -> Self {
        Self::decode::<T>(format!("expected a {expected}, found a {}", found.kind()))
    }

    /// Decode error for a mapping without a required key.
    #[must_use]
    pub fn missing_field<T: ?Sized>(field: &str) -> Self {
        Self::decode::<T>(format!("missing field `{field}`"))
    }
}

/// Converts a value to and from its structured form.
///
/// `T::from_text(&value.to_text()?)` must reproduce `value`. Containers
/// delegate element conversion to their element codecs, so any composite
/// type that implements `Codec` can be nested inside them.
///
/// # Examples
///
/// ```
/// use tessera_config::{Codec, CodecResult};
/// use tessera_primitives::Node;
///
/// #[derive(Debug, PartialEq)]
/// struct Endpoint {
///     host: String,
///     port: u16,
/// }
///
/// impl Codec for Endpoint {
///     fn encode(&self) -> CodecResult<Node> {
///         Ok(Node::mapping()
///             .with_entry("host", self.host.encode()?)
///             .with_entry("port", self.port.encode()?))
///     }
///
///     fn decode(node: &Node) -> CodecResult<Self> {
///         Ok(Self {
///             host: tessera_config::codec::field(node, "host")?,
///             port: tessera_config::codec::field(node, "port")?,
///         })
///     }
/// }
///
/// let text = Endpoint { host: "localhost".into(), port: 80 }.to_text().unwrap();
/// assert_eq!(text, r#"{"host":"localhost","port":80}"#);
/// assert_eq!(Endpoint::from_text(&text).unwrap().port, 80);
/// ```
pub trait Codec: Sized {
    /// Encodes the value as a node tree.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Encode`] when the value has no structured form.
    fn encode(&self) -> CodecResult<Node>;

    /// Decodes a value from a node tree.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Decode`] when the node has the wrong shape or a
    /// scalar fails to parse.
    fn decode(node: &Node) -> CodecResult<Self>;

    /// Encodes the value as text.
    ///
    /// # Errors
    ///
    /// Propagates [`CodecError::Encode`] from [`Codec::encode`].
    fn to_text(&self) -> CodecResult<String> {
        self.encode().map(|node| node.to_text())
    }

    /// Decodes a value from text.
    ///
    /// # Errors
    ///
    /// Propagates [`CodecError::Decode`] from [`Codec::decode`].
    fn from_text(text: &str) -> CodecResult<Self> {
        Self::decode(&Node::parse(text))
    }
}

/// Decodes the required mapping entry `key` of `node`.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] when `node` is not a mapping, lacks the key,
/// or the entry fails to decode.
pub fn field<T: Codec>(node: &Node, key: &str) -> CodecResult<T> {
    optional_field(node, key)?.ok_or_else(|| CodecError::missing_field::<T>(key))
}

/// Decodes the mapping entry `key` of `node` when present.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] when `node` is not a mapping or a present
/// entry fails to decode.
pub fn optional_field<T: Codec>(node: &Node, key: &str) -> CodecResult<Option<T>> {
    if node.as_mapping().is_none() {
        return Err(CodecError::unexpected::<T>("mapping", node));
    }
    node.get(key).map(T::decode).transpose()
}

fn scalar_text<'a, T>(node: &'a Node) -> CodecResult<&'a str> {
    node.as_scalar()
        .ok_or_else(|| CodecError::unexpected::<T>("scalar", node))
}

macro_rules! lexical_codec {
    ($($ty:ty),* $(,)?) => {$(
        impl Codec for $ty {
            fn encode(&self) -> CodecResult<Node> {
                Ok(Node::Scalar(self.to_string()))
            }

            fn decode(node: &Node) -> CodecResult<Self> {
                Self::from_text(scalar_text::<Self>(node)?)
            }

            fn to_text(&self) -> CodecResult<String> {
                Ok(self.to_string())
            }

            fn from_text(text: &str) -> CodecResult<Self> {
                text.trim()
                    .parse::<$ty>()
                    .map_err(|err| CodecError::decode::<Self>(format!("`{text}`: {err}")))
            }
        }
    )*};
}

lexical_codec!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool,
);

/// Whitespace is a valid `char`, so its text is parsed untrimmed.
impl Codec for char {
    fn encode(&self) -> CodecResult<Node> {
        Ok(Node::Scalar(self.to_string()))
    }

    fn decode(node: &Node) -> CodecResult<Self> {
        Self::from_text(scalar_text::<Self>(node)?)
    }

    fn to_text(&self) -> CodecResult<String> {
        Ok(self.to_string())
    }

    fn from_text(text: &str) -> CodecResult<Self> {
        text.parse::<char>()
            .map_err(|err| CodecError::decode::<Self>(format!("`{text}`: {err}")))
    }
}

impl Codec for String {
    fn encode(&self) -> CodecResult<Node> {
        Ok(Node::Scalar(self.clone()))
    }

    fn decode(node: &Node) -> CodecResult<Self> {
        scalar_text::<Self>(node).map(str::to_owned)
    }

    fn to_text(&self) -> CodecResult<String> {
        Ok(self.clone())
    }

    fn from_text(text: &str) -> CodecResult<Self> {
        Ok(text.to_owned())
    }
}

impl Codec for PathBuf {
    fn encode(&self) -> CodecResult<Node> {
        self.to_str()
            .map(Node::scalar)
            .ok_or_else(|| CodecError::encode::<Self>("path is not valid UTF-8"))
    }

    fn decode(node: &Node) -> CodecResult<Self> {
        scalar_text::<Self>(node).map(PathBuf::from)
    }

    fn from_text(text: &str) -> CodecResult<Self> {
        Ok(PathBuf::from(text))
    }
}

fn encode_items<'a, T>(items: impl IntoIterator<Item = &'a T>) -> CodecResult<Node>
where
    T: Codec + 'a,
{
    items
        .into_iter()
        .map(Codec::encode)
        .collect::<CodecResult<Vec<_>>>()
        .map(Node::Sequence)
}

fn decode_items<T, C>(node: &Node) -> CodecResult<C>
where
    T: Codec,
    C: FromIterator<T>,
{
    node.as_sequence()
        .ok_or_else(|| CodecError::unexpected::<C>("sequence", node))?
        .iter()
        .map(T::decode)
        .collect()
}

fn encode_entries<'a, T>(entries: impl IntoIterator<Item = (&'a String, &'a T)>) -> CodecResult<Node>
where
    T: Codec + 'a,
{
    entries
        .into_iter()
        .map(|(key, value)| -> CodecResult<(String, Node)> { Ok((key.clone(), value.encode()?)) })
        .collect::<CodecResult<Vec<_>>>()
        .map(Node::Mapping)
}

fn decode_entries<T, C>(node: &Node) -> CodecResult<C>
where
    T: Codec,
    C: FromIterator<(String, T)>,
{
    node.as_mapping()
        .ok_or_else(|| CodecError::unexpected::<C>("mapping", node))?
        .iter()
        .map(|(key, value)| -> CodecResult<(String, T)> { Ok((key.clone(), T::decode(value)?)) })
        .collect()
}

impl<T: Codec> Codec for Vec<T> {
    fn encode(&self) -> CodecResult<Node> {
        encode_items(self)
    }

    fn decode(node: &Node) -> CodecResult<Self> {
        decode_items(node)
    }
}

impl<T: Codec> Codec for VecDeque<T> {
    fn encode(&self) -> CodecResult<Node> {
        encode_items(self)
    }

    fn decode(node: &Node) -> CodecResult<Self> {
        decode_items(node)
    }
}

impl<T: Codec> Codec for LinkedList<T> {
    fn encode(&self) -> CodecResult<Node> {
        encode_items(self)
    }

    fn decode(node: &Node) -> CodecResult<Self> {
        decode_items(node)
    }
}

impl<T: Codec + Ord> Codec for BTreeSet<T> {
    fn encode(&self) -> CodecResult<Node> {
        encode_items(self)
    }

    fn decode(node: &Node) -> CodecResult<Self> {
        decode_items(node)
    }
}

impl<T, S> Codec for HashSet<T, S>
where
    T: Codec + Eq + Hash,
    S: BuildHasher + Default,
{
    fn encode(&self) -> CodecResult<Node> {
        encode_items(self)
    }

    fn decode(node: &Node) -> CodecResult<Self> {
        decode_items(node)
    }
}

impl<T: Codec> Codec for BTreeMap<String, T> {
    fn encode(&self) -> CodecResult<Node> {
        encode_entries(self)
    }

    fn decode(node: &Node) -> CodecResult<Self> {
        decode_entries(node)
    }
}

impl<T, S> Codec for HashMap<String, T, S>
where
    T: Codec,
    S: BuildHasher + Default,
{
    fn encode(&self) -> CodecResult<Node> {
        // Sorted so the text form is stable across runs.
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        encode_entries(entries)
    }

    fn decode(node: &Node) -> CodecResult<Self> {
        decode_entries(node)
    }
}
