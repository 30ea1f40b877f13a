//! Compilation of log patterns into format items.
//!
//! A pattern is literal text interleaved with directives: `%` followed by a
//! single letter and an optional `{argument}`. `%%` is a literal percent sign.
//! Compilation never fails outright; malformed directives become visible
//! marker literals and set the error flag on the result.

use std::fmt;

/// Marker emitted for an unterminated `{argument}`.
pub const PATTERN_ERROR_MARKER: &str = "<<pattern_error>>";

/// Timestamp format used by `%d` without an argument.
pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One compiled unit of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatItem {
    /// Text copied verbatim.
    Literal(String),
    /// `%m`: the event message.
    Message,
    /// `%p`: the event level.
    Level,
    /// `%c`: the name of the emitting logger.
    LoggerName,
    /// `%t`: the emitting thread id.
    ThreadId,
    /// `%F`: the emitting task id.
    TaskId,
    /// `%e` or `%r`: milliseconds since logging started.
    Elapsed,
    /// `%d{fmt}`: wall-clock time in strftime notation.
    Timestamp(String),
    /// `%f`: source file.
    SourceFile,
    /// `%l`: source line.
    SourceLine,
    /// `%T`: a tab.
    Tab,
    /// `%n`: a newline.
    Newline,
}

impl FormatItem {
    /// Builds the item for a directive letter, or `None` for unknown letters.
    ///
    /// The argument is only meaningful for `d`, where an empty one means
    /// [`DEFAULT_TIME_FORMAT`]; other directives ignore it.
    #[must_use]
    pub fn from_directive(letter: char, argument: &str) -> Option<Self> {
        let item = match letter {
            'm' => Self::Message,
            'p' => Self::Level,
            'c' => Self::LoggerName,
            't' => Self::ThreadId,
            'F' => Self::TaskId,
            'e' | 'r' => Self::Elapsed,
            'd' if argument.is_empty() => Self::Timestamp(DEFAULT_TIME_FORMAT.to_owned()),
            'd' => Self::Timestamp(argument.to_owned()),
            'f' => Self::SourceFile,
            'l' => Self::SourceLine,
            'T' => Self::Tab,
            'n' => Self::Newline,
            _ => return None,
        };
        Some(item)
    }

    /// Returns the error marker for a bad directive letter.
    #[must_use]
    pub fn error_marker(letter: Option<char>) -> Self {
        match letter {
            Some(letter) => Self::Literal(format!("<<error_format %{letter}>>")),
            None => Self::Literal(String::from("<<error_format %>>")),
        }
    }

    /// Returns `true` for [`FormatItem::Literal`].
    #[must_use]
    pub const fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }
}

impl fmt::Display for FormatItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(text) => f.write_str(text),
            Self::Message => f.write_str("%m"),
            Self::Level => f.write_str("%p"),
            Self::LoggerName => f.write_str("%c"),
            Self::ThreadId => f.write_str("%t"),
            Self::TaskId => f.write_str("%F"),
            Self::Elapsed => f.write_str("%e"),
            Self::Timestamp(format) => write!(f, "%d{{{format}}}"),
            Self::SourceFile => f.write_str("%f"),
            Self::SourceLine => f.write_str("%l"),
            Self::Tab => f.write_str("%T"),
            Self::Newline => f.write_str("%n"),
        }
    }
}

/// Result of compiling a pattern.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompiledPattern {
    /// Items in pattern order, adjacent literals merged.
    pub items: Vec<FormatItem>,
    /// Set when any directive was malformed.
    pub has_error: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Literal,
    DirectiveLetter,
    /// `resume` is the byte offset of the directive letter.
    InBraceArgument { letter: char, resume: usize },
}

/// Explicit state machine turning pattern text into [`FormatItem`]s.
#[derive(Debug, Default)]
pub struct PatternCompiler {
    items: Vec<FormatItem>,
    literal: String,
    argument: String,
    has_error: bool,
}

impl PatternCompiler {
    /// Compiles `pattern`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tessera_format::{FormatItem, PatternCompiler};
    ///
    /// let compiled = PatternCompiler::compile("[%p] %m%n");
    /// assert!(!compiled.has_error);
    /// assert_eq!(compiled.items[1], FormatItem::Level);
    /// ```
    #[must_use]
    pub fn compile(pattern: &str) -> CompiledPattern {
        let mut compiler = Self::default();
        compiler.scan(pattern);
        compiler.finish()
    }

    /// An unterminated `{argument}` leaves a marker and the text from its
    /// directive letter onward is scanned again as literal text.
    fn scan(&mut self, pattern: &str) {
        let mut state = State::Literal;
        let mut chars = pattern.char_indices().peekable();

        while let Some((at, ch)) = chars.next() {
            state = match state {
                State::Literal if ch == '%' => State::DirectiveLetter,
                State::Literal => {
                    self.literal.push(ch);
                    State::Literal
                }
                State::DirectiveLetter if ch == '%' => {
                    self.literal.push('%');
                    State::Literal
                }
                State::DirectiveLetter if ch.is_ascii_alphabetic() => {
                    if chars.next_if(|&(_, next)| next == '{').is_some() {
                        self.argument.clear();
                        State::InBraceArgument {
                            letter: ch,
                            resume: at,
                        }
                    } else {
                        self.directive(ch, "");
                        State::Literal
                    }
                }
                State::DirectiveLetter => {
                    self.fail(FormatItem::error_marker(None));
                    self.literal.push(ch);
                    State::Literal
                }
                State::InBraceArgument { letter, .. } if ch == '}' => {
                    let argument = std::mem::take(&mut self.argument);
                    self.directive(letter, &argument);
                    State::Literal
                }
                State::InBraceArgument { letter, resume } => {
                    self.argument.push(ch);
                    State::InBraceArgument { letter, resume }
                }
            };
        }

        match state {
            State::Literal => {}
            State::DirectiveLetter => self.fail(FormatItem::error_marker(None)),
            State::InBraceArgument { resume, .. } => {
                self.argument.clear();
                self.fail(FormatItem::Literal(PATTERN_ERROR_MARKER.to_owned()));
                self.scan(&pattern[resume..]);
            }
        }
    }

    fn directive(&mut self, letter: char, argument: &str) {
        match FormatItem::from_directive(letter, argument) {
            Some(item) => {
                self.flush_literal();
                self.items.push(item);
            }
            None => self.fail(FormatItem::error_marker(Some(letter))),
        }
    }

    /// Markers stay separate items so they remain visible in `items`.
    fn fail(&mut self, marker: FormatItem) {
        self.flush_literal();
        self.items.push(marker);
        self.has_error = true;
    }

    fn flush_literal(&mut self) {
        if !self.literal.is_empty() {
            self.items
                .push(FormatItem::Literal(std::mem::take(&mut self.literal)));
        }
    }

    fn finish(mut self) -> CompiledPattern {
        self.flush_literal();
        CompiledPattern {
            items: self.items,
            has_error: self.has_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal(text: &str) -> FormatItem {
        FormatItem::Literal(text.to_owned())
    }

    #[test]
    fn compiles_directives_and_literals_in_order() {
        let compiled = PatternCompiler::compile("%d{%Y-%m-%d} [%p] %m%n");
        assert!(!compiled.has_error);
        assert_eq!(
            compiled.items,
            vec![
                FormatItem::Timestamp("%Y-%m-%d".into()),
                literal(" ["),
                FormatItem::Level,
                literal("] "),
                FormatItem::Message,
                FormatItem::Newline,
            ]
        );
    }

    #[test]
    fn double_percent_is_one_literal() {
        let compiled = PatternCompiler::compile("%%");
        assert_eq!(compiled.items, vec![literal("%")]);
        assert!(!compiled.has_error);

        let merged = PatternCompiler::compile("100%% done");
        assert_eq!(merged.items, vec![literal("100% done")]);
    }

    #[test]
    fn unknown_letter_leaves_a_marker_and_continues() {
        let compiled = PatternCompiler::compile("a%qb%m");
        assert!(compiled.has_error);
        assert_eq!(
            compiled.items,
            vec![
                literal("a"),
                literal("<<error_format %q>>"),
                literal("b"),
                FormatItem::Message,
            ]
        );
    }

    #[test]
    fn unterminated_argument_sets_error_flag() {
        let compiled = PatternCompiler::compile("%m %d{unterminated");
        assert!(compiled.has_error);
        assert_eq!(
            compiled.items,
            vec![
                FormatItem::Message,
                literal(" "),
                literal(PATTERN_ERROR_MARKER),
                literal("d{unterminated"),
            ]
        );
    }

    #[test]
    fn directives_after_unterminated_argument_still_compile() {
        let compiled = PatternCompiler::compile("%d{%Y [%p] %m%n");
        assert!(compiled.has_error);
        assert_eq!(
            compiled.items,
            vec![
                literal(PATTERN_ERROR_MARKER),
                literal("d{"),
                literal("<<error_format %Y>>"),
                literal(" ["),
                FormatItem::Level,
                literal("] "),
                FormatItem::Message,
                FormatItem::Newline,
            ]
        );

        let nested = PatternCompiler::compile("%d{a%c{b");
        assert_eq!(
            nested.items,
            vec![
                literal(PATTERN_ERROR_MARKER),
                literal("d{a"),
                literal(PATTERN_ERROR_MARKER),
                literal("c{b"),
            ]
        );
    }

    #[test]
    fn lone_percent_and_non_letters_are_marked() {
        let trailing = PatternCompiler::compile("x%");
        assert!(trailing.has_error);
        assert_eq!(trailing.items, vec![literal("x"), literal("<<error_format %>>")]);

        let symbol = PatternCompiler::compile("%-m");
        assert!(symbol.has_error);
        assert_eq!(
            symbol.items,
            vec![literal("<<error_format %>>"), literal("-m")]
        );
    }

    #[test]
    fn arguments_on_plain_directives_are_ignored() {
        let compiled = PatternCompiler::compile("%m{ignored}%T%t%F%e%r%f:%l%c");
        assert!(!compiled.has_error);
        assert_eq!(
            compiled.items,
            vec![
                FormatItem::Message,
                FormatItem::Tab,
                FormatItem::ThreadId,
                FormatItem::TaskId,
                FormatItem::Elapsed,
                FormatItem::Elapsed,
                FormatItem::SourceFile,
                literal(":"),
                FormatItem::SourceLine,
                FormatItem::LoggerName,
            ]
        );
    }

    #[test]
    fn bare_timestamp_uses_default_format() {
        let expected = vec![FormatItem::Timestamp(DEFAULT_TIME_FORMAT.into())];
        assert_eq!(PatternCompiler::compile("%d").items, expected);
        assert_eq!(PatternCompiler::compile("%d{}").items, expected);
    }

    #[test]
    fn empty_pattern_has_no_items() {
        assert_eq!(PatternCompiler::compile(""), CompiledPattern::default());
    }

    #[test]
    fn display_reproduces_directives() {
        let rendered: String = PatternCompiler::compile("%d{%H} %p%%")
            .items
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(rendered, "%d{%H} %p%");
    }
}
