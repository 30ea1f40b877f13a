//! The registry of live loggers.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock, RwLock};

use tessera_config::Codec;
use tracing::{debug, error};

use crate::appender::StdoutAppender;
use crate::declaration::LogDeclarations;
use crate::logger::Logger;

/// Name of the root logger.
pub const ROOT_LOGGER: &str = "root";

/// Owns the root logger and every named logger created through it.
///
/// Loggers are never removed; reconfiguration disables them instead so
/// handles held elsewhere stay valid.
#[derive(Debug)]
pub struct LoggerManager {
    root: Arc<Logger>,
    loggers: RwLock<BTreeMap<String, Arc<Logger>>>,
}

impl Default for LoggerManager {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggerManager {
    /// Creates a manager whose root logger writes to standard output.
    #[must_use]
    pub fn new() -> Self {
        let root = Arc::new(Logger::new(ROOT_LOGGER));
        root.add_appender(Arc::new(StdoutAppender::new()));
        let loggers = BTreeMap::from([(ROOT_LOGGER.to_owned(), Arc::clone(&root))]);
        Self {
            root,
            loggers: RwLock::new(loggers),
        }
    }

    /// Returns the process-wide manager, creating it on first use.
    #[must_use]
    pub fn global() -> Arc<LoggerManager> {
        static GLOBAL: OnceLock<Arc<LoggerManager>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(LoggerManager::new())))
    }

    /// The root logger.
    #[must_use]
    pub fn root(&self) -> Arc<Logger> {
        Arc::clone(&self.root)
    }

    /// Returns the logger `name`, creating it with the root as fallback.
    ///
    /// # Panics
    ///
    /// Panics if the logger map lock is poisoned.
    pub fn logger(&self, name: &str) -> Arc<Logger> {
        if let Some(logger) = self.get(name) {
            return logger;
        }
        let mut loggers = self.loggers.write().expect("logger map poisoned");
        let logger = loggers.entry(name.to_owned()).or_insert_with(|| {
            debug!(logger = name, "created logger");
            Arc::new(Logger::new(name).with_root(Arc::clone(&self.root)))
        });
        Arc::clone(logger)
    }

    /// Returns the logger `name` if it exists. Never creates one.
    ///
    /// # Panics
    ///
    /// Panics if the logger map lock is poisoned.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<Logger>> {
        let loggers = self.loggers.read().expect("logger map poisoned");
        loggers.get(name).cloned()
    }

    /// Names of every known logger, in order.
    ///
    /// # Panics
    ///
    /// Panics if the logger map lock is poisoned.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let loggers = self.loggers.read().expect("logger map poisoned");
        loggers.keys().cloned().collect()
    }

    /// Describes every live logger.
    ///
    /// # Panics
    ///
    /// Panics if the logger map lock is poisoned.
    #[must_use]
    pub fn declarations(&self) -> LogDeclarations {
        let loggers: Vec<_> = self
            .loggers
            .read()
            .expect("logger map poisoned")
            .values()
            .cloned()
            .collect();
        loggers.iter().map(|logger| logger.declaration()).collect()
    }

    /// Renders [`LoggerManager::declarations`] in the text form accepted by
    /// the `logs` configuration variable.
    #[must_use]
    pub fn to_text(&self) -> String {
        self.declarations().to_text().unwrap_or_else(|err| {
            error!(error = %err, "failed to render logger declarations");
            String::new()
        })
    }
}

#[cfg(test)]
mod tests {
    use tessera_format::Level;

    use super::*;
    use crate::appender::AppenderKind;
    use crate::declaration::{AppenderDeclaration, LoggerDeclaration};

    #[test]
    fn root_writes_to_stdout() {
        let manager = LoggerManager::new();
        let root = manager.root();
        assert_eq!(root.name(), ROOT_LOGGER);
        let kinds: Vec<_> = root.appenders().iter().map(|a| a.kind()).collect();
        assert_eq!(kinds, [AppenderKind::Stdout]);
        assert!(Arc::ptr_eq(&manager.logger(ROOT_LOGGER), &root));
    }

    #[test]
    fn logger_resolves_or_creates_once() {
        let manager = LoggerManager::new();
        assert!(manager.get("system").is_none());

        let first = manager.logger("system");
        let second = manager.logger("system");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(manager.names(), ["root", "system"]);
    }

    #[test]
    fn concurrent_creation_yields_one_logger() {
        let manager = Arc::new(LoggerManager::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let manager = Arc::clone(&manager);
                std::thread::spawn(move || manager.logger("shared"))
            })
            .collect();
        let loggers: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(loggers.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
    }

    #[test]
    fn declarations_snapshot_every_logger() {
        let manager = LoggerManager::new();
        manager.logger("system").set_level(Level::Error);

        let decls = manager.declarations();
        assert_eq!(
            decls.get("root"),
            Some(
                &LoggerDeclaration::new("root")
                    .with_level(Level::Debug)
                    .with_appender(AppenderDeclaration::stdout())
            )
        );
        assert_eq!(decls.get("system").and_then(|d| d.level), Some(Level::Error));

        let text = manager.to_text();
        assert_eq!(LogDeclarations::from_text(&text).unwrap(), decls);
    }
}
