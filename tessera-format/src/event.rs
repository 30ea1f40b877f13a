//! Log events handed to formatters.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use chrono::{DateTime, Local};

use crate::level::Level;

static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_ID: u64 = NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed);
}

/// Small sequential identifier of the calling thread, assigned on first use.
#[must_use]
pub fn current_thread_id() -> u64 {
    THREAD_ID.with(|id| *id)
}

/// Milliseconds since the first event of the process was created.
#[must_use]
pub fn elapsed_ms() -> u64 {
    static START: OnceLock<Instant> = OnceLock::new();
    let start = START.get_or_init(Instant::now);
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// A single log record.
///
/// # Examples
///
/// ```
/// use tessera_format::{Level, LogEvent};
///
/// let event = LogEvent::new("system", Level::Info, "hello")
///     .with_location("main.rs", 12)
///     .with_task_id(7);
/// assert_eq!(event.logger(), "system");
/// assert_eq!(event.line(), 12);
/// ```
#[derive(Clone, Debug)]
pub struct LogEvent {
    logger: String,
    level: Level,
    message: String,
    file: String,
    line: u32,
    elapsed_ms: u64,
    thread_id: u64,
    task_id: u64,
    time: DateTime<Local>,
}

impl LogEvent {
    /// Creates an event stamped with the current time, thread, and elapsed time.
    #[must_use]
    pub fn new(logger: impl Into<String>, level: Level, message: impl Into<String>) -> Self {
        Self {
            logger: logger.into(),
            level,
            message: message.into(),
            file: String::new(),
            line: 0,
            elapsed_ms: elapsed_ms(),
            thread_id: current_thread_id(),
            task_id: 0,
            time: Local::now(),
        }
    }

    /// Sets the source location.
    #[must_use]
    pub fn with_location(mut self, file: impl Into<String>, line: u32) -> Self {
        self.file = file.into();
        self.line = line;
        self
    }

    /// Sets the task identifier.
    #[must_use]
    pub fn with_task_id(mut self, task_id: u64) -> Self {
        self.task_id = task_id;
        self
    }

    /// Overrides the thread identifier.
    #[must_use]
    pub fn with_thread_id(mut self, thread_id: u64) -> Self {
        self.thread_id = thread_id;
        self
    }

    /// Overrides the elapsed milliseconds.
    #[must_use]
    pub fn with_elapsed_ms(mut self, elapsed_ms: u64) -> Self {
        self.elapsed_ms = elapsed_ms;
        self
    }

    /// Overrides the wall-clock time.
    #[must_use]
    pub fn with_time(mut self, time: DateTime<Local>) -> Self {
        self.time = time;
        self
    }

    /// Name of the logger the event was emitted through.
    #[must_use]
    pub fn logger(&self) -> &str {
        &self.logger
    }

    /// Event severity.
    #[must_use]
    pub const fn level(&self) -> Level {
        self.level
    }

    /// Message body.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Source file, empty when unknown.
    #[must_use]
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Source line, zero when unknown.
    #[must_use]
    pub const fn line(&self) -> u32 {
        self.line
    }

    /// Milliseconds since the process started logging.
    #[must_use]
    pub const fn elapsed(&self) -> u64 {
        self.elapsed_ms
    }

    /// Identifier of the emitting thread.
    #[must_use]
    pub const fn thread_id(&self) -> u64 {
        self.thread_id
    }

    /// Identifier of the emitting task, zero outside tasks.
    #[must_use]
    pub const fn task_id(&self) -> u64 {
        self.task_id
    }

    /// Wall-clock time of the event.
    #[must_use]
    pub const fn time(&self) -> &DateTime<Local> {
        &self.time
    }
}
