//! Tree-shaped intermediate form shared by codecs and document loaders.

use std::fmt;

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::{Error, Result};

/// Structured configuration value: a scalar, an ordered sequence, or an
/// ordered mapping with unique string keys.
///
/// Scalars are untyped text. Numbers and booleans read from a document keep
/// their textual spelling, so `8080` and `"8080"` both become
/// `Node::Scalar("8080")`.
///
/// # Examples
///
/// ```
/// use tessera_primitives::Node;
///
/// let node = Node::parse(r#"{"port": 8080, "hosts": ["a", "b"]}"#);
/// assert_eq!(node.get("port").and_then(Node::as_scalar), Some("8080"));
/// assert_eq!(node.to_text(), r#"{"port":8080,"hosts":["a","b"]}"#);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    /// Leaf text value.
    Scalar(String),
    /// Ordered list of child nodes.
    Sequence(Vec<Node>),
    /// Ordered key/value pairs; keys are unique.
    Mapping(Vec<(String, Node)>),
}

impl Default for Node {
    fn default() -> Self {
        Self::Scalar(String::new())
    }
}

impl Node {
    /// Creates a scalar node.
    #[must_use]
    pub fn scalar(text: impl Into<String>) -> Self {
        Self::Scalar(text.into())
    }

    /// Creates a sequence node from the supplied children.
    #[must_use]
    pub fn sequence(items: impl IntoIterator<Item = Node>) -> Self {
        Self::Sequence(items.into_iter().collect())
    }

    /// Creates an empty mapping node.
    #[must_use]
    pub const fn mapping() -> Self {
        Self::Mapping(Vec::new())
    }

    /// Parses structured text into a node tree.
    ///
    /// Text whose first non-blank character opens a sequence (`[`) or a mapping
    /// (`{`) is read as JSON. Anything else, including structured text that
    /// fails to parse, is returned verbatim as a single scalar.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim_start();
        if trimmed.starts_with('[') || trimmed.starts_with('{') {
            if let Ok(node) = Self::parse_document(text) {
                return node;
            }
        }
        Self::Scalar(text.to_owned())
    }

    /// Parses a complete JSON document into a node tree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDocument`] when the text is not valid JSON or a
    /// mapping repeats a key.
    pub fn parse_document(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|err| Error::InvalidDocument {
            reason: err.to_string(),
        })
    }

    /// Renders the node as text.
    ///
    /// Scalars render as their raw text; sequences and mappings render as
    /// compact JSON that [`Node::parse`] reads back into an equal tree.
    #[must_use]
    pub fn to_text(&self) -> String {
        self.to_string()
    }

    /// Returns the scalar text, if this is a scalar.
    #[must_use]
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Self::Scalar(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the children, if this is a sequence.
    #[must_use]
    pub fn as_sequence(&self) -> Option<&[Node]> {
        match self {
            Self::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the entries, if this is a mapping.
    #[must_use]
    pub fn as_mapping(&self) -> Option<&[(String, Node)]> {
        match self {
            Self::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    /// Returns `true` for scalar nodes.
    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        matches!(self, Self::Scalar(_))
    }

    /// Short description of the node shape, used in diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::Sequence(_) => "sequence",
            Self::Mapping(_) => "mapping",
        }
    }

    /// Looks up a mapping entry by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_mapping()?
            .iter()
            .find_map(|(k, v)| (k == key).then_some(v))
    }

    /// Inserts a mapping entry, replacing the value of an existing key.
    ///
    /// A node that is not a mapping is turned into an empty mapping first.
    pub fn insert(&mut self, key: impl Into<String>, value: Node) {
        if !matches!(self, Self::Mapping(_)) {
            *self = Self::mapping();
        }
        if let Self::Mapping(entries) = self {
            let key = key.into();
            match entries.iter_mut().find(|(k, _)| *k == key) {
                Some((_, slot)) => *slot = value,
                None => entries.push((key, value)),
            }
        }
    }

    /// Builder-style variant of [`Node::insert`].
    #[must_use]
    pub fn with_entry(mut self, key: impl Into<String>, value: Node) -> Self {
        self.insert(key, value);
        self
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(text) => f.write_str(text),
            _ => {
                let text = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                f.write_str(&text)
            }
        }
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Self::Scalar(value.to_owned())
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Self::Scalar(value)
    }
}

/// Returns the JSON number spelled exactly like `text`, if there is one.
fn exact_number(text: &str) -> Option<serde_json::Number> {
    let number: serde_json::Number = text.parse().ok()?;
    (number.to_string() == text).then_some(number)
}

impl Serialize for Node {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Scalar(text) => match text.as_str() {
                "true" => serializer.serialize_bool(true),
                "false" => serializer.serialize_bool(false),
                _ => match exact_number(text) {
                    Some(number) => number.serialize(serializer),
                    None => serializer.serialize_str(text),
                },
            },
            Self::Sequence(items) => serializer.collect_seq(items),
            Self::Mapping(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

struct NodeVisitor;

impl<'de> Visitor<'de> for NodeVisitor {
    type Value = Node;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a scalar, sequence, or string-keyed mapping")
    }

    fn visit_bool<E>(self, v: bool) -> std::result::Result<Node, E>
    where
        E: de::Error,
    {
        Ok(Node::Scalar(v.to_string()))
    }

    fn visit_i64<E>(self, v: i64) -> std::result::Result<Node, E>
    where
        E: de::Error,
    {
        Ok(Node::Scalar(v.to_string()))
    }

    fn visit_u64<E>(self, v: u64) -> std::result::Result<Node, E>
    where
        E: de::Error,
    {
        Ok(Node::Scalar(v.to_string()))
    }

    fn visit_f64<E>(self, v: f64) -> std::result::Result<Node, E>
    where
        E: de::Error,
    {
        // Same spelling the serializer checks against in `exact_number`.
        let text = serde_json::Number::from_f64(v).map_or_else(|| v.to_string(), |n| n.to_string());
        Ok(Node::Scalar(text))
    }

    fn visit_str<E>(self, v: &str) -> std::result::Result<Node, E>
    where
        E: de::Error,
    {
        Ok(Node::Scalar(v.to_owned()))
    }

    fn visit_string<E>(self, v: String) -> std::result::Result<Node, E>
    where
        E: de::Error,
    {
        Ok(Node::Scalar(v))
    }

    fn visit_unit<E>(self) -> std::result::Result<Node, E>
    where
        E: de::Error,
    {
        Ok(Node::default())
    }

    fn visit_none<E>(self) -> std::result::Result<Node, E>
    where
        E: de::Error,
    {
        Ok(Node::default())
    }

    fn visit_some<D>(self, deserializer: D) -> std::result::Result<Node, D::Error>
    where
        D: Deserializer<'de>,
    {
        Node::deserialize(deserializer)
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Node, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Node::Sequence(items))
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<Node, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries: Vec<(String, Node)> = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, value)) = map.next_entry::<String, Node>()? {
            if entries.iter().any(|(k, _)| *k == key) {
                return Err(de::Error::custom(format!("duplicate key `{key}`")));
            }
            entries.push((key, value));
        }
        Ok(Node::Mapping(entries))
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(NodeVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_document_preserving_order() {
        let node = Node::parse(r#"{"b": 1, "a": {"c": [1, 2]}, "flag": true}"#);
        let entries = node.as_mapping().unwrap();
        let keys: Vec<_> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["b", "a", "flag"]);
        assert_eq!(node.get("b"), Some(&Node::scalar("1")));
        assert_eq!(node.get("flag"), Some(&Node::scalar("true")));
        assert_eq!(
            node.get("a").and_then(|a| a.get("c")),
            Some(&Node::sequence([Node::scalar("1"), Node::scalar("2")]))
        );
    }

    #[test]
    fn plain_text_is_a_scalar() {
        assert_eq!(Node::parse("8080"), Node::scalar("8080"));
        assert_eq!(Node::parse("hello world"), Node::scalar("hello world"));
        assert_eq!(Node::parse("[not json"), Node::scalar("[not json"));
        assert_eq!(Node::parse(""), Node::scalar(""));
    }

    #[test]
    fn scalars_render_as_numbers_only_when_exact() {
        let node = Node::sequence([
            Node::scalar("1"),
            Node::scalar("1.5"),
            Node::scalar("01"),
            Node::scalar("1.50"),
            Node::scalar("true"),
            Node::scalar("x"),
        ]);
        assert_eq!(node.to_text(), r#"[1,1.5,"01","1.50",true,"x"]"#);
        assert_eq!(Node::parse(&node.to_text()), node);
    }

    #[test]
    fn null_becomes_empty_scalar() {
        let node = Node::parse(r#"{"a": null}"#);
        assert_eq!(node.get("a"), Some(&Node::scalar("")));
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let err = Node::parse_document(r#"{"a": 1, "a": 2}"#).expect_err("duplicate key");
        assert!(matches!(err, Error::InvalidDocument { .. }));
    }

    #[test]
    fn insert_replaces_existing_keys() {
        let mut node = Node::mapping()
            .with_entry("name", Node::scalar("a"))
            .with_entry("age", Node::scalar("3"));
        node.insert("name", Node::scalar("b"));
        assert_eq!(node.as_mapping().unwrap().len(), 2);
        assert_eq!(node.get("name"), Some(&Node::scalar("b")));
    }
}
