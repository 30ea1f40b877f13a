//! Output sinks for rendered log events.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tessera_format::{Level, LogFormatter};
use tracing::{debug, warn};

use crate::declaration::{AppenderDeclaration, AppenderTarget};
use crate::error::{LogError, LogResult};

/// Minimum interval between reopening a log file.
pub const REOPEN_INTERVAL: Duration = Duration::from_secs(1);

/// Kind of a built-in appender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppenderKind {
    /// Writes to standard output.
    Stdout,
    /// Writes to a file.
    File,
}

/// A destination for rendered events.
///
/// Loggers check [`Appender::accepts`] and pick the formatter before calling
/// [`Appender::append`], so implementations only move text.
pub trait Appender: Send + Sync + fmt::Debug {
    /// Kind of the appender.
    fn kind(&self) -> AppenderKind;

    /// Minimum level this appender writes, `None` for no filter.
    fn level(&self) -> Option<Level>;

    /// Formatter overriding the logger's, if any.
    fn formatter(&self) -> Option<Arc<LogFormatter>>;

    /// Writes already rendered text.
    fn append(&self, rendered: &str);

    /// Describes the appender as a declaration.
    fn declaration(&self) -> AppenderDeclaration;

    /// Returns `true` when an event at `level` should be written.
    fn accepts(&self, level: Level) -> bool {
        self.level().is_none_or(|min| level >= min)
    }
}

/// Builds an appender from its declaration.
///
/// A malformed formatter pattern is dropped with a warning and the appender
/// falls back to the logger's formatter.
///
/// # Errors
///
/// Returns [`LogError::Io`] when a file appender cannot open its file.
pub fn from_declaration(declaration: &AppenderDeclaration) -> LogResult<Arc<dyn Appender>> {
    let settings = Settings::from_declaration(declaration);
    let appender: Arc<dyn Appender> = match &declaration.target {
        AppenderTarget::Stdout => Arc::new(StdoutAppender { settings }),
        AppenderTarget::File { path } => Arc::new(FileAppender::open(path, settings)?),
    };
    Ok(appender)
}

#[derive(Debug, Clone, Default)]
struct Settings {
    level: Option<Level>,
    formatter: Option<Arc<LogFormatter>>,
}

impl Settings {
    fn from_declaration(declaration: &AppenderDeclaration) -> Self {
        let formatter = declaration.formatter.as_deref().and_then(|pattern| {
            let formatter = LogFormatter::new(pattern);
            if formatter.is_error() {
                warn!(pattern, "ignoring malformed appender pattern");
                return None;
            }
            Some(Arc::new(formatter))
        });
        Self {
            level: declaration.level,
            formatter,
        }
    }

    fn describe(&self, target: AppenderTarget) -> AppenderDeclaration {
        AppenderDeclaration {
            target,
            level: self.level,
            formatter: self
                .formatter
                .as_ref()
                .map(|formatter| formatter.pattern().to_owned()),
        }
    }
}

/// Writes events to standard output.
#[derive(Debug, Clone, Default)]
pub struct StdoutAppender {
    settings: Settings,
}

impl StdoutAppender {
    /// Creates an unfiltered stdout appender.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Only write events at `level` or above.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.settings.level = Some(level);
        self
    }

    /// Render with `formatter` instead of the logger's.
    #[must_use]
    pub fn with_formatter(mut self, formatter: LogFormatter) -> Self {
        self.settings.formatter = Some(Arc::new(formatter));
        self
    }
}

impl Appender for StdoutAppender {
    fn kind(&self) -> AppenderKind {
        AppenderKind::Stdout
    }

    fn level(&self) -> Option<Level> {
        self.settings.level
    }

    fn formatter(&self) -> Option<Arc<LogFormatter>> {
        self.settings.formatter.clone()
    }

    fn append(&self, rendered: &str) {
        let mut out = io::stdout().lock();
        if let Err(err) = out.write_all(rendered.as_bytes()) {
            debug!(error = %err, "stdout appender write failed");
        }
    }

    fn declaration(&self) -> AppenderDeclaration {
        self.settings.describe(AppenderTarget::Stdout)
    }
}

#[derive(Debug)]
struct OpenFile {
    file: File,
    opened_at: Instant,
}

/// Appends events to a file, reopening it periodically so a file removed or
/// rotated away is recreated.
#[derive(Debug)]
pub struct FileAppender {
    path: PathBuf,
    settings: Settings,
    state: Mutex<OpenFile>,
}

impl FileAppender {
    /// Opens `path` for appending, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Io`] when the file cannot be opened.
    pub fn new(path: impl Into<PathBuf>) -> LogResult<Self> {
        Self::open(&path.into(), Settings::default())
    }

    fn open(path: &Path, settings: Settings) -> LogResult<Self> {
        let file = open_append(path)?;
        debug!(path = %path.display(), "opened log file");
        Ok(Self {
            path: path.to_path_buf(),
            settings,
            state: Mutex::new(OpenFile {
                file,
                opened_at: Instant::now(),
            }),
        })
    }

    /// Only write events at `level` or above.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.settings.level = Some(level);
        self
    }

    /// Render with `formatter` instead of the logger's.
    #[must_use]
    pub fn with_formatter(mut self, formatter: LogFormatter) -> Self {
        self.settings.formatter = Some(Arc::new(formatter));
        self
    }

    /// Path written to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reopens the file now.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Io`] when the file cannot be opened; the previous
    /// handle is kept.
    ///
    /// # Panics
    ///
    /// Panics if the appender lock is poisoned.
    pub fn reopen(&self) -> LogResult<()> {
        let mut state = self.state.lock().expect("file appender poisoned");
        self.reopen_locked(&mut state)
    }

    fn reopen_locked(&self, state: &mut OpenFile) -> LogResult<()> {
        state.file = open_append(&self.path)?;
        state.opened_at = Instant::now();
        Ok(())
    }
}

impl Appender for FileAppender {
    fn kind(&self) -> AppenderKind {
        AppenderKind::File
    }

    fn level(&self) -> Option<Level> {
        self.settings.level
    }

    fn formatter(&self) -> Option<Arc<LogFormatter>> {
        self.settings.formatter.clone()
    }

    fn append(&self, rendered: &str) {
        let mut state = self.state.lock().expect("file appender poisoned");
        if state.opened_at.elapsed() >= REOPEN_INTERVAL {
            if let Err(err) = self.reopen_locked(&mut state) {
                warn!(error = %err, "keeping previous log file handle");
            }
        }
        if let Err(err) = state.file.write_all(rendered.as_bytes()) {
            warn!(path = %self.path.display(), error = %err, "file appender write failed");
        }
    }

    fn declaration(&self) -> AppenderDeclaration {
        self.settings.describe(AppenderTarget::File {
            path: self.path.clone(),
        })
    }
}

fn open_append(path: &Path) -> LogResult<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LogError::Io {
            path: path.to_path_buf(),
            source,
        })
}
