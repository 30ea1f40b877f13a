//! Loggers, appenders, and hot reload of logging declarations.
//!
//! [`LoggerManager`] owns named [`Logger`]s. Their desired shape lives in the
//! `logs` configuration variable as [`LogDeclarations`]; a [`LogReconciler`]
//! subscribed to that variable rebuilds the affected loggers whenever it
//! changes.
//!
//! ```no_run
//! use tessera_config::ConfigRegistry;
//! use tessera_log::log_info;
//!
//! let manager = tessera_log::init().unwrap();
//! ConfigRegistry::global()
//!     .load_from_text(r#"{"logs": [{"name": "system", "level": "info",
//!                                   "appenders": [{"type": "StdoutAppender"}]}]}"#)
//!     .unwrap();
//! log_info!(manager.logger("system"), "listening on {}", 8080);
//! ```

#![warn(missing_docs, clippy::pedantic)]

pub mod appender;
mod declaration;
mod error;
mod logger;
mod macros;
mod manager;
mod reconcile;

use std::sync::{Arc, Mutex};

use tessera_config::ConfigRegistry;

pub use appender::{Appender, AppenderKind, FileAppender, StdoutAppender};
pub use declaration::{AppenderDeclaration, AppenderTarget, LogDeclarations, LoggerDeclaration};
pub use error::{LogError, LogResult};
pub use logger::{DEFAULT_PATTERN, Logger};
pub use manager::{LoggerManager, ROOT_LOGGER};
pub use reconcile::{LOGS_CONFIG_NAME, LogReconciler, LogSubscription, ReconcileOutcome};
pub use tessera_format::{Level, LogEvent, LogFormatter};

/// Subscribes the global manager to the `logs` variable of the global
/// registry, once per process, and returns the manager.
///
/// # Errors
///
/// Returns [`LogError::Config`] when `logs` is registered with another type.
/// A later call retries.
///
/// # Panics
///
/// Panics if the initialization lock is poisoned.
pub fn init() -> LogResult<Arc<LoggerManager>> {
    static SUBSCRIPTION: Mutex<Option<LogSubscription>> = Mutex::new(None);

    let mut subscription = SUBSCRIPTION.lock().expect("log init poisoned");
    if subscription.is_none() {
        *subscription = Some(LogReconciler::install(
            ConfigRegistry::global(),
            LoggerManager::global(),
        )?);
    }
    Ok(LoggerManager::global())
}
