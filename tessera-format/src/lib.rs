//! Log levels, events, and the pattern-driven log formatter.
//!
//! Patterns are compiled once into a [`LogFormatter`], which then renders any
//! number of [`LogEvent`]s without shared mutable state.
//!
//! | Directive | Renders |
//! |-----------|---------|
//! | `%m` | message |
//! | `%p` | level |
//! | `%c` | logger name |
//! | `%t` | thread id |
//! | `%F` | task id |
//! | `%e`, `%r` | elapsed milliseconds |
//! | `%d{fmt}` | time, strftime `fmt` (default `%Y-%m-%d %H:%M:%S`) |
//! | `%f` | source file |
//! | `%l` | source line |
//! | `%T` | tab |
//! | `%n` | newline |
//! | `%%` | a literal `%` |

#![warn(missing_docs, clippy::pedantic)]

mod event;
mod formatter;
mod level;
mod pattern;

pub use event::{LogEvent, current_thread_id, elapsed_ms};
pub use formatter::LogFormatter;
pub use level::Level;
pub use pattern::{
    CompiledPattern, DEFAULT_TIME_FORMAT, FormatItem, PATTERN_ERROR_MARKER, PatternCompiler,
};
