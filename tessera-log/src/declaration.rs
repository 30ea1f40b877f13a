//! Declarative logger configuration, diffed on every reload.
//!
//! These are plain values. Live loggers and appenders are built from them by
//! the reconciler and can describe themselves back through
//! `declaration()`.

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::path::PathBuf;

use tessera_config::codec::{field, optional_field};
use tessera_config::{Codec, CodecError, CodecResult};
use tessera_format::Level;
use tessera_primitives::Node;
use tracing::warn;

/// Where an appender writes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AppenderTarget {
    /// Standard output.
    Stdout,
    /// A file opened in append mode.
    File {
        /// Path of the file.
        path: PathBuf,
    },
}

/// Desired configuration of one appender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppenderDeclaration {
    /// Destination of rendered events.
    pub target: AppenderTarget,
    /// Minimum level, `None` to accept everything the logger passes on.
    pub level: Option<Level>,
    /// Pattern overriding the logger's formatter.
    pub formatter: Option<String>,
}

impl AppenderDeclaration {
    /// Declares a stdout appender.
    #[must_use]
    pub const fn stdout() -> Self {
        Self {
            target: AppenderTarget::Stdout,
            level: None,
            formatter: None,
        }
    }

    /// Declares a file appender writing to `path`.
    #[must_use]
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            target: AppenderTarget::File { path: path.into() },
            level: None,
            formatter: None,
        }
    }

    /// Sets the minimum level.
    #[must_use]
    pub const fn with_level(mut self, level: Level) -> Self {
        self.level = declared_level(level);
        self
    }

    /// Sets the formatter pattern.
    #[must_use]
    pub fn with_formatter(mut self, pattern: impl Into<String>) -> Self {
        self.formatter = Some(pattern.into());
        self
    }
}

/// Desired configuration of one named logger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerDeclaration {
    /// Logger name.
    pub name: String,
    /// Threshold, `None` to keep the logger's current one.
    pub level: Option<Level>,
    /// Formatter pattern, `None` to keep the logger's current one.
    pub formatter: Option<String>,
    /// Appenders in attachment order.
    pub appenders: Vec<AppenderDeclaration>,
}

impl LoggerDeclaration {
    /// Declares a logger with no level, formatter, or appenders.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: None,
            formatter: None,
            appenders: Vec::new(),
        }
    }

    /// Sets the threshold.
    #[must_use]
    pub const fn with_level(mut self, level: Level) -> Self {
        self.level = declared_level(level);
        self
    }

    /// Sets the formatter pattern.
    #[must_use]
    pub fn with_formatter(mut self, pattern: impl Into<String>) -> Self {
        self.formatter = Some(pattern.into());
        self
    }

    /// Appends an appender declaration.
    #[must_use]
    pub fn with_appender(mut self, appender: AppenderDeclaration) -> Self {
        self.appenders.push(appender);
        self
    }
}

/// A set of logger declarations keyed and ordered by name.
///
/// This is the value type of the `logs` configuration variable.
///
/// # Examples
///
/// ```
/// use tessera_config::Codec;
/// use tessera_log::{Level, LogDeclarations};
///
/// let text = r#"[{"name": "system", "level": "info",
///                 "appenders": [{"type": "FileAppender", "file": "system.log"}]}]"#;
/// let decls = LogDeclarations::from_text(text).unwrap();
/// let system = decls.get("system").unwrap();
/// assert_eq!(system.level, Some(Level::Info));
/// assert_eq!(system.appenders.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LogDeclarations(BTreeMap<String, LoggerDeclaration>);

impl LogDeclarations {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `declaration`, replacing and returning any previous one with the
    /// same name.
    pub fn insert(&mut self, declaration: LoggerDeclaration) -> Option<LoggerDeclaration> {
        self.0.insert(declaration.name.clone(), declaration)
    }

    /// Builder form of [`LogDeclarations::insert`].
    #[must_use]
    pub fn with(mut self, declaration: LoggerDeclaration) -> Self {
        self.insert(declaration);
        self
    }

    /// Removes the declaration for `name`.
    pub fn remove(&mut self, name: &str) -> Option<LoggerDeclaration> {
        self.0.remove(name)
    }

    /// Returns the declaration for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&LoggerDeclaration> {
        self.0.get(name)
    }

    /// Returns `true` when `name` is declared.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Iterates declarations in name order.
    pub fn iter(&self) -> btree_map::Values<'_, String, LoggerDeclaration> {
        self.0.values()
    }

    /// Number of declared loggers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when nothing is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<LoggerDeclaration> for LogDeclarations {
    fn from_iter<I: IntoIterator<Item = LoggerDeclaration>>(iter: I) -> Self {
        let mut decls = Self::new();
        for declaration in iter {
            decls.insert(declaration);
        }
        decls
    }
}

impl<'a> IntoIterator for &'a LogDeclarations {
    type Item = &'a LoggerDeclaration;
    type IntoIter = btree_map::Values<'a, String, LoggerDeclaration>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// `Unknown` means "not declared".
const fn declared_level(level: Level) -> Option<Level> {
    match level {
        Level::Unknown => None,
        level => Some(level),
    }
}

fn decode_level<T>(node: &Node) -> CodecResult<Option<Level>> {
    let text: Option<String> = optional_field(node, "level")
        .map_err(|err| CodecError::decode::<T>(format!("level: {err}")))?;
    Ok(text.and_then(|text| declared_level(Level::parse(text.trim()))))
}

fn decode_pattern(node: &Node) -> CodecResult<Option<String>> {
    let pattern: Option<String> = optional_field(node, "formatter")?;
    Ok(pattern.filter(|pattern| !pattern.is_empty()))
}

fn encode_common(mut node: Node, level: Option<Level>, formatter: Option<&String>) -> Node {
    if let Some(level) = level {
        node.insert("level", Node::scalar(level.as_str()));
    }
    if let Some(formatter) = formatter {
        node.insert("formatter", Node::scalar(formatter.clone()));
    }
    node
}

impl Codec for AppenderDeclaration {
    fn encode(&self) -> CodecResult<Node> {
        let node = match &self.target {
            AppenderTarget::Stdout => Node::mapping().with_entry("type", Node::scalar("StdoutAppender")),
            AppenderTarget::File { path } => {
                let file = path
                    .to_str()
                    .ok_or_else(|| CodecError::encode::<Self>("file path is not valid UTF-8"))?;
                Node::mapping()
                    .with_entry("type", Node::scalar("FileAppender"))
                    .with_entry("file", Node::scalar(file))
            }
        };
        Ok(encode_common(node, self.level, self.formatter.as_ref()))
    }

    fn decode(node: &Node) -> CodecResult<Self> {
        let kind: String = field(node, "type")?;
        let target = match kind.to_ascii_lowercase().as_str() {
            "fileappender" | "file" => {
                let path: PathBuf = optional_field(node, "file")?
                    .filter(|path: &PathBuf| !path.as_os_str().is_empty())
                    .ok_or_else(|| CodecError::decode::<Self>("file appender without `file`"))?;
                AppenderTarget::File { path }
            }
            "stdoutappender" | "stdout" => AppenderTarget::Stdout,
            _ => {
                return Err(CodecError::decode::<Self>(format!(
                    "unknown appender type `{kind}`"
                )));
            }
        };
        Ok(Self {
            target,
            level: decode_level::<Self>(node)?,
            formatter: decode_pattern(node)?,
        })
    }
}

impl Codec for LoggerDeclaration {
    fn encode(&self) -> CodecResult<Node> {
        let node = encode_common(
            Node::mapping().with_entry("name", Node::scalar(self.name.clone())),
            self.level,
            self.formatter.as_ref(),
        );
        if self.appenders.is_empty() {
            return Ok(node);
        }
        Ok(node.with_entry("appenders", self.appenders.encode()?))
    }

    fn decode(node: &Node) -> CodecResult<Self> {
        let name: String = field(node, "name")?;
        if name.trim().is_empty() {
            return Err(CodecError::decode::<Self>("logger with an empty `name`"));
        }
        Ok(Self {
            name,
            level: decode_level::<Self>(node)?,
            formatter: decode_pattern(node)?,
            appenders: optional_field(node, "appenders")?.unwrap_or_default(),
        })
    }
}

impl Codec for LogDeclarations {
    fn encode(&self) -> CodecResult<Node> {
        let items = self.iter().map(Codec::encode).collect::<CodecResult<Vec<_>>>()?;
        Ok(Node::sequence(items))
    }

    fn decode(node: &Node) -> CodecResult<Self> {
        if node.as_scalar().is_some_and(|text| text.trim().is_empty()) {
            return Ok(Self::new());
        }
        let items = node
            .as_sequence()
            .ok_or_else(|| CodecError::unexpected::<Self>("sequence", node))?;

        let mut decls = Self::new();
        for item in items {
            let declaration = LoggerDeclaration::decode(item)?;
            if decls.contains(&declaration.name) {
                warn!(logger = %declaration.name, "duplicate logger declaration ignored");
                continue;
            }
            decls.insert(declaration);
        }
        Ok(decls)
    }
}
