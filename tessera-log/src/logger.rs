//! Named loggers.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, RwLock};

use tessera_format::{Level, LogEvent, LogFormatter};
use tracing::warn;

use crate::appender::Appender;
use crate::declaration::LoggerDeclaration;
use crate::error::{LogError, LogResult};

/// Pattern given to every new logger.
pub const DEFAULT_PATTERN: &str = "%d{%Y-%m-%d %H:%M:%S}%T%t%T%F%T[%p]%T[%c]%T%f:%l%T%T%m%n";

/// Threshold no event level reaches.
const DISABLED: u8 = u8::MAX;

/// A named logger with a level threshold, a formatter, and appenders.
///
/// A logger without appenders forwards accepted events to its root logger,
/// when it has one.
///
/// # Examples
///
/// ```
/// use tessera_log::{Level, Logger};
///
/// let logger = Logger::new("system");
/// logger.set_level(Level::Warn);
/// assert!(logger.is_enabled(Level::Error));
/// assert!(!logger.is_enabled(Level::Info));
///
/// logger.disable();
/// assert!(logger.is_disabled());
/// assert_eq!(logger.level(), None);
/// ```
pub struct Logger {
    name: String,
    threshold: AtomicU8,
    formatter: RwLock<Arc<LogFormatter>>,
    appenders: RwLock<Vec<Arc<dyn Appender>>>,
    root: Option<Arc<Logger>>,
}

impl Logger {
    /// Creates a logger at [`Level::Debug`] with the default pattern and no
    /// appenders.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            threshold: AtomicU8::new(Level::Debug.rank()),
            formatter: RwLock::new(Arc::new(LogFormatter::new(DEFAULT_PATTERN))),
            appenders: RwLock::new(Vec::new()),
            root: None,
        }
    }

    /// Sets the logger that receives events while this one has no appenders.
    #[must_use]
    pub fn with_root(mut self, root: Arc<Logger>) -> Self {
        self.root = Some(root);
        self
    }

    /// Logger name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current threshold, `None` while disabled.
    #[must_use]
    pub fn level(&self) -> Option<Level> {
        let rank = self.threshold.load(Ordering::Acquire);
        Level::ALL
            .into_iter()
            .chain([Level::Unknown])
            .find(|level| level.rank() == rank)
    }

    /// Sets the threshold, re-enabling a disabled logger.
    pub fn set_level(&self, level: Level) {
        self.threshold.store(level.rank(), Ordering::Release);
    }

    /// Silences the logger without detaching it from anyone holding it.
    pub fn disable(&self) {
        self.threshold.store(DISABLED, Ordering::Release);
    }

    /// Returns `true` after [`Logger::disable`] until the next
    /// [`Logger::set_level`].
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.threshold.load(Ordering::Acquire) == DISABLED
    }

    /// Returns `true` when an event at `level` passes the threshold.
    #[must_use]
    pub fn is_enabled(&self, level: Level) -> bool {
        level.rank() >= self.threshold.load(Ordering::Acquire)
    }

    /// Current formatter.
    ///
    /// # Panics
    ///
    /// Panics if the formatter lock is poisoned.
    #[must_use]
    pub fn formatter(&self) -> Arc<LogFormatter> {
        Arc::clone(&self.formatter.read().expect("logger formatter poisoned"))
    }

    /// Replaces the formatter.
    ///
    /// # Panics
    ///
    /// Panics if the formatter lock is poisoned.
    pub fn set_formatter(&self, formatter: LogFormatter) {
        *self.formatter.write().expect("logger formatter poisoned") = Arc::new(formatter);
    }

    /// Compiles `pattern` and installs it as the formatter.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::InvalidPattern`] when the pattern has malformed
    /// directives; the current formatter stays in place.
    pub fn set_formatter_pattern(&self, pattern: &str) -> LogResult<()> {
        let formatter = LogFormatter::new(pattern);
        if formatter.is_error() {
            warn!(logger = %self.name, pattern, "rejecting malformed log pattern");
            return Err(LogError::InvalidPattern {
                pattern: pattern.to_owned(),
            });
        }
        self.set_formatter(formatter);
        Ok(())
    }

    /// Attaches an appender after the existing ones.
    ///
    /// # Panics
    ///
    /// Panics if the appender lock is poisoned.
    pub fn add_appender(&self, appender: Arc<dyn Appender>) {
        self.appenders
            .write()
            .expect("logger appenders poisoned")
            .push(appender);
    }

    /// Detaches every appender.
    ///
    /// # Panics
    ///
    /// Panics if the appender lock is poisoned.
    pub fn clear_appenders(&self) {
        self.appenders
            .write()
            .expect("logger appenders poisoned")
            .clear();
    }

    /// Snapshot of the attached appenders.
    ///
    /// # Panics
    ///
    /// Panics if the appender lock is poisoned.
    #[must_use]
    pub fn appenders(&self) -> Vec<Arc<dyn Appender>> {
        self.appenders
            .read()
            .expect("logger appenders poisoned")
            .clone()
    }

    /// Routes `event` to the appenders, or to the root logger when there are
    /// none. Events below the threshold are dropped.
    pub fn log(&self, event: &LogEvent) {
        let level = event.level();
        if !self.is_enabled(level) {
            return;
        }

        let appenders = self.appenders();
        if appenders.is_empty() {
            if let Some(root) = &self.root {
                root.log(event);
            }
            return;
        }

        let formatter = self.formatter();
        for appender in appenders.iter().filter(|appender| appender.accepts(level)) {
            let rendered = match appender.formatter() {
                Some(own) => own.format(event),
                None => formatter.format(event),
            };
            appender.append(&rendered);
        }
    }

    /// Logs `message` at `level` without a source location.
    pub fn log_message(&self, level: Level, message: impl Into<String>) {
        if self.is_enabled(level) {
            self.log(&LogEvent::new(self.name.clone(), level, message));
        }
    }

    /// Describes the live state as a declaration.
    ///
    /// The formatter is only reported when it differs from
    /// [`DEFAULT_PATTERN`].
    #[must_use]
    pub fn declaration(&self) -> LoggerDeclaration {
        let formatter = self.formatter();
        LoggerDeclaration {
            name: self.name.clone(),
            level: self.level().filter(|level| *level != Level::Unknown),
            formatter: (formatter.pattern() != DEFAULT_PATTERN)
                .then(|| formatter.pattern().to_owned()),
            appenders: self
                .appenders()
                .iter()
                .map(|appender| appender.declaration())
                .collect(),
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("level", &self.level())
            .field("appenders", &self.appenders().len())
            .field("root", &self.root.as_ref().map(|root| root.name()))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::appender::AppenderKind;
    use crate::declaration::AppenderDeclaration;

    /// Collects rendered text in memory.
    #[derive(Debug, Default)]
    pub(crate) struct MemoryAppender {
        pub(crate) level: Option<Level>,
        pub(crate) formatter: Option<Arc<LogFormatter>>,
        pub(crate) lines: Mutex<Vec<String>>,
    }

    impl MemoryAppender {
        pub(crate) fn lines(&self) -> Vec<String> {
            self.lines.lock().unwrap().clone()
        }
    }

    impl Appender for MemoryAppender {
        fn kind(&self) -> AppenderKind {
            AppenderKind::Stdout
        }

        fn level(&self) -> Option<Level> {
            self.level
        }

        fn formatter(&self) -> Option<Arc<LogFormatter>> {
            self.formatter.clone()
        }

        fn append(&self, rendered: &str) {
            self.lines.lock().unwrap().push(rendered.to_owned());
        }

        fn declaration(&self) -> AppenderDeclaration {
            AppenderDeclaration::stdout()
        }
    }

    #[test]
    fn threshold_filters_events() {
        let logger = Logger::new("system");
        logger.set_formatter(LogFormatter::new("%p %m"));
        let sink = Arc::new(MemoryAppender::default());
        logger.add_appender(sink.clone());

        logger.log_message(Level::Debug, "a");
        logger.set_level(Level::Error);
        logger.log_message(Level::Warn, "b");
        logger.log_message(Level::Fatal, "c");

        assert_eq!(sink.lines(), ["DEBUG a", "FATAL c"]);
    }

    #[test]
    fn appender_formatter_and_level_take_precedence() {
        let logger = Logger::new("system");
        logger.set_formatter(LogFormatter::new("logger:%m"));
        let plain = Arc::new(MemoryAppender::default());
        let custom = Arc::new(MemoryAppender {
            level: Some(Level::Error),
            formatter: Some(Arc::new(LogFormatter::new("own:%m"))),
            ..MemoryAppender::default()
        });
        logger.add_appender(plain.clone());
        logger.add_appender(custom.clone());

        logger.log_message(Level::Info, "x");
        logger.log_message(Level::Error, "y");

        assert_eq!(plain.lines(), ["logger:x", "logger:y"]);
        assert_eq!(custom.lines(), ["own:y"]);
    }

    #[test]
    fn loggers_without_appenders_forward_to_root() {
        let root = Arc::new(Logger::new("root"));
        root.set_formatter(LogFormatter::new("[%c] %m"));
        let sink = Arc::new(MemoryAppender::default());
        root.add_appender(sink.clone());

        let child = Logger::new("child").with_root(Arc::clone(&root));
        child.log_message(Level::Info, "hello");

        child.add_appender(Arc::new(MemoryAppender::default()));
        child.log_message(Level::Info, "kept local");

        assert_eq!(sink.lines(), ["[child] hello"]);
    }

    #[test]
    fn disabled_loggers_drop_everything() {
        let logger = Logger::new("quiet");
        let sink = Arc::new(MemoryAppender::default());
        logger.add_appender(sink.clone());

        logger.disable();
        for level in Level::ALL {
            assert!(!logger.is_enabled(level));
            logger.log_message(level, "nope");
        }
        assert!(sink.lines().is_empty());

        logger.set_level(Level::Info);
        assert!(!logger.is_disabled());
        assert_eq!(logger.level(), Some(Level::Info));
    }

    #[test]
    fn malformed_patterns_keep_the_current_formatter() {
        let logger = Logger::new("system");
        logger.set_formatter_pattern("%m%n").unwrap();

        let err = logger.set_formatter_pattern("%m %d{broken").unwrap_err();
        assert!(matches!(err, LogError::InvalidPattern { .. }));
        assert_eq!(logger.formatter().pattern(), "%m%n");
    }

    #[test]
    fn declaration_reflects_live_state() {
        let logger = Logger::new("system");
        assert_eq!(
            logger.declaration(),
            LoggerDeclaration::new("system").with_level(Level::Debug)
        );

        logger.set_level(Level::Warn);
        logger.set_formatter_pattern("%m").unwrap();
        logger.add_appender(Arc::new(MemoryAppender::default()));
        assert_eq!(
            logger.declaration(),
            LoggerDeclaration::new("system")
                .with_level(Level::Warn)
                .with_formatter("%m")
                .with_appender(AppenderDeclaration::stdout())
        );
    }
}
