//! Applying logger declarations to live loggers on every reload.

use std::fmt;
use std::sync::{Arc, Mutex};

use tessera_config::{ConfigRegistry, ConfigVar, ListenerId};
use tessera_format::Level;
use tracing::{debug, info, warn};

use crate::appender;
use crate::declaration::{LogDeclarations, LoggerDeclaration};
use crate::error::LogResult;
use crate::manager::LoggerManager;

/// Name of the configuration variable holding the logger declarations.
pub const LOGS_CONFIG_NAME: &str = "logs";

/// What a single reconciliation changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Loggers created or rebuilt, in name order.
    pub updated: Vec<String>,
    /// Loggers disabled because their declaration disappeared.
    pub removed: Vec<String>,
    /// `false` when some appender could not be built; the applied snapshot
    /// was then left as it was.
    pub complete: bool,
}

/// Diffs declaration snapshots against the last applied one and rebuilds the
/// affected loggers.
///
/// New or changed declarations get their logger resolved or created, their
/// level and pattern applied, and their appenders rebuilt from scratch.
/// Declarations that disappear leave their logger disabled with no
/// appenders.
pub struct LogReconciler {
    manager: Arc<LoggerManager>,
    applied: Mutex<LogDeclarations>,
}

impl LogReconciler {
    /// Creates a reconciler with an empty applied snapshot.
    #[must_use]
    pub fn new(manager: Arc<LoggerManager>) -> Self {
        Self {
            manager,
            applied: Mutex::new(LogDeclarations::new()),
        }
    }

    /// The managed loggers.
    #[must_use]
    pub fn manager(&self) -> &Arc<LoggerManager> {
        &self.manager
    }

    /// The last fully applied snapshot.
    ///
    /// # Panics
    ///
    /// Panics if the snapshot lock is poisoned.
    #[must_use]
    pub fn applied(&self) -> LogDeclarations {
        self.applied.lock().expect("log reconciler poisoned").clone()
    }

    /// Brings the live loggers in line with `declarations`.
    ///
    /// Concurrent calls are serialized.
    ///
    /// # Panics
    ///
    /// Panics if the snapshot lock is poisoned.
    pub fn reconcile(&self, declarations: &LogDeclarations) -> ReconcileOutcome {
        let mut applied = self.applied.lock().expect("log reconciler poisoned");
        let mut outcome = ReconcileOutcome {
            complete: true,
            ..ReconcileOutcome::default()
        };

        for declaration in declarations {
            if applied.get(&declaration.name) == Some(declaration) {
                continue;
            }
            outcome.complete &= self.apply(declaration);
            outcome.updated.push(declaration.name.clone());
        }

        for previous in applied.iter() {
            if declarations.contains(&previous.name) {
                continue;
            }
            let logger = self.manager.logger(&previous.name);
            logger.disable();
            logger.clear_appenders();
            info!(logger = %previous.name, "disabled logger with no declaration");
            outcome.removed.push(previous.name.clone());
        }

        if outcome.complete {
            *applied = declarations.clone();
        } else {
            warn!("logger declarations applied partially, keeping previous snapshot");
        }
        debug!(
            updated = outcome.updated.len(),
            removed = outcome.removed.len(),
            "reconciled logger declarations"
        );
        outcome
    }

    /// Returns `false` when an appender could not be built.
    fn apply(&self, declaration: &LoggerDeclaration) -> bool {
        let logger = self.manager.logger(&declaration.name);
        match declaration.level {
            Some(level) => logger.set_level(level),
            None if logger.is_disabled() => logger.set_level(Level::Debug),
            None => {}
        }
        if let Some(pattern) = &declaration.formatter {
            // Rejection is logged by the logger; the old formatter stays.
            let _ = logger.set_formatter_pattern(pattern);
        }

        logger.clear_appenders();
        let mut complete = true;
        for appender_declaration in &declaration.appenders {
            match appender::from_declaration(appender_declaration) {
                Ok(built) => logger.add_appender(built),
                Err(err) => {
                    warn!(logger = %declaration.name, error = %err, "skipping appender");
                    complete = false;
                }
            }
        }
        info!(
            logger = %declaration.name,
            appenders = declaration.appenders.len(),
            "applied logger declaration"
        );
        complete
    }

    /// Subscribes a new reconciler to the `logs` variable of `registry` and
    /// applies its current value.
    ///
    /// # Errors
    ///
    /// Returns [`crate::LogError::Config`] when `logs` is already registered
    /// with a different type.
    pub fn install(
        registry: &ConfigRegistry,
        manager: Arc<LoggerManager>,
    ) -> LogResult<LogSubscription> {
        let variable = registry.lookup(LOGS_CONFIG_NAME, LogDeclarations::new(), "logs config")?;
        let reconciler = Arc::new(Self::new(manager));

        let listening = Arc::clone(&reconciler);
        let listener = variable.add_listener(move |_, declarations| {
            listening.reconcile(declarations);
        });
        reconciler.reconcile(&variable.get_value());

        Ok(LogSubscription {
            reconciler,
            variable,
            listener,
        })
    }
}

impl fmt::Debug for LogReconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogReconciler")
            .field("manager", &self.manager)
            .field(
                "applied",
                &self.applied.lock().expect("log reconciler poisoned").len(),
            )
            .finish()
    }
}

/// A reconciler attached to a configuration variable.
#[derive(Debug)]
pub struct LogSubscription {
    reconciler: Arc<LogReconciler>,
    variable: Arc<ConfigVar<LogDeclarations>>,
    listener: ListenerId,
}

impl LogSubscription {
    /// The subscribed reconciler.
    #[must_use]
    pub fn reconciler(&self) -> &Arc<LogReconciler> {
        &self.reconciler
    }

    /// The variable being watched.
    #[must_use]
    pub fn variable(&self) -> &Arc<ConfigVar<LogDeclarations>> {
        &self.variable
    }

    /// Identifier of the change listener.
    #[must_use]
    pub const fn listener(&self) -> ListenerId {
        self.listener
    }

    /// Stops reacting to changes. Loggers keep their current state.
    pub fn cancel(self) {
        self.variable.remove_listener(self.listener);
    }
}
