//! Logging macros capturing the call site.

/// Logs a formatted message at an explicit level through a [`crate::Logger`].
///
/// The message is only formatted when the logger accepts the level.
#[macro_export]
macro_rules! log_at {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let logger: &$crate::Logger = &$logger;
        let level: $crate::Level = $level;
        if logger.is_enabled(level) {
            logger.log(
                &$crate::LogEvent::new(logger.name(), level, ::std::format!($($arg)+))
                    .with_location(::std::file!(), ::std::line!()),
            );
        }
    }};
}

/// Logs at [`crate::Level::Debug`].
#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)+) => { $crate::log_at!($logger, $crate::Level::Debug, $($arg)+) };
}

/// Logs at [`crate::Level::Info`].
#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)+) => { $crate::log_at!($logger, $crate::Level::Info, $($arg)+) };
}

/// Logs at [`crate::Level::Warn`].
#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)+) => { $crate::log_at!($logger, $crate::Level::Warn, $($arg)+) };
}

/// Logs at [`crate::Level::Error`].
#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)+) => { $crate::log_at!($logger, $crate::Level::Error, $($arg)+) };
}

/// Logs at [`crate::Level::Fatal`].
#[macro_export]
macro_rules! log_fatal {
    ($logger:expr, $($arg:tt)+) => { $crate::log_at!($logger, $crate::Level::Fatal, $($arg)+) };
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tessera_format::LogFormatter;

    use crate::Logger;
    use crate::logger::tests::MemoryAppender;

    #[test]
    fn macros_capture_location_and_respect_threshold() {
        let logger = Arc::new(Logger::new("macros"));
        logger.set_formatter(LogFormatter::new("%p %f %m"));
        let sink = Arc::new(MemoryAppender::default());
        logger.add_appender(sink.clone());
        logger.set_level(crate::Level::Info);

        crate::log_debug!(logger, "hidden {}", 1);
        crate::log_info!(logger, "shown {}", 2);
        crate::log_fatal!(*logger, "also {}", 3);

        let file = file!();
        assert_eq!(
            sink.lines(),
            [format!("INFO {file} shown 2"), format!("FATAL {file} also 3")]
        );
    }
}
