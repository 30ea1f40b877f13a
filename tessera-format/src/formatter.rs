//! Rendering of log events through compiled patterns.

use std::fmt::Write as _;

use chrono::format::{Item, StrftimeItems};
use tracing::debug;

use crate::event::LogEvent;
use crate::pattern::{FormatItem, PatternCompiler};

/// An immutable, compiled log pattern.
///
/// Formatters built from malformed patterns still render; their output carries
/// the error markers and [`LogFormatter::is_error`] reports `true`.
///
/// # Examples
///
/// ```
/// use tessera_format::{Level, LogEvent, LogFormatter};
///
/// let formatter = LogFormatter::new("[%p] %c: %m");
/// let event = LogEvent::new("system", Level::Warn, "disk almost full");
/// assert_eq!(formatter.format(&event), "[WARN] system: disk almost full");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFormatter {
    pattern: String,
    items: Vec<FormatItem>,
    has_error: bool,
}

impl LogFormatter {
    /// Compiles `pattern` into a formatter.
    #[must_use]
    pub fn new(pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let compiled = PatternCompiler::compile(&pattern);
        if compiled.has_error {
            debug!(pattern = %pattern, "log pattern compiled with errors");
        }
        Self {
            pattern,
            items: compiled.items,
            has_error: compiled.has_error,
        }
    }

    /// Source pattern text.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Compiled items in pattern order.
    #[must_use]
    pub fn items(&self) -> &[FormatItem] {
        &self.items
    }

    /// Returns `true` when the pattern contained malformed directives.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.has_error
    }

    /// Renders `event`.
    #[must_use]
    pub fn format(&self, event: &LogEvent) -> String {
        let mut out = String::with_capacity(self.pattern.len() + event.message().len());
        for item in &self.items {
            render_item(item, event, &mut out);
        }
        out
    }
}

fn render_item(item: &FormatItem, event: &LogEvent, out: &mut String) {
    // Writing into a String cannot fail.
    let _ = match item {
        FormatItem::Literal(text) => {
            out.push_str(text);
            Ok(())
        }
        FormatItem::Message => {
            out.push_str(event.message());
            Ok(())
        }
        FormatItem::Level => write!(out, "{}", event.level()),
        FormatItem::LoggerName => {
            out.push_str(event.logger());
            Ok(())
        }
        FormatItem::ThreadId => write!(out, "{}", event.thread_id()),
        FormatItem::TaskId => write!(out, "{}", event.task_id()),
        FormatItem::Elapsed => write!(out, "{}", event.elapsed()),
        FormatItem::Timestamp(format) => {
            render_time(format, event, out);
            Ok(())
        }
        FormatItem::SourceFile => {
            out.push_str(event.file());
            Ok(())
        }
        FormatItem::SourceLine => write!(out, "{}", event.line()),
        FormatItem::Tab => {
            out.push('\t');
            Ok(())
        }
        FormatItem::Newline => {
            out.push('\n');
            Ok(())
        }
    };
}

/// Formats the event time, falling back to the raw format text when it holds
/// specifiers chrono does not understand.
fn render_time(format: &str, event: &LogEvent, out: &mut String) {
    let items: Vec<Item<'_>> = StrftimeItems::new(format).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        out.push_str(format);
        return;
    }
    let _ = write!(out, "{}", event.time().format_with_items(items.iter()));
}
