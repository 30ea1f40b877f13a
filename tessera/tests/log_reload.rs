use std::fs;
use std::sync::Arc;

use anyhow::Result;
use serde_json::json;
use tessera::config::{Codec, ConfigRegistry};
use tessera::log::{
    AppenderKind, Level, LogDeclarations, LogReconciler, LoggerManager, log_error, log_info,
    log_warn,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn load(registry: &ConfigRegistry, logs: &serde_json::Value) -> Result<()> {
    registry.load_from_text(&json!({ "logs": logs }).to_string())?;
    Ok(())
}

#[test]
fn reload_rebuilds_changed_loggers_and_disables_removed_ones() -> Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let log_path = dir.path().join("x.log");
    let registry = ConfigRegistry::new();
    let manager = Arc::new(LoggerManager::new());
    let subscription = LogReconciler::install(&registry, Arc::clone(&manager))?;

    load(
        &registry,
        &json!([{"name": "a", "level": "info", "appenders": [{"type": "StdoutAppender"}]}]),
    )?;
    let a = manager.logger("a");
    assert_eq!(a.level(), Some(Level::Info));

    load(
        &registry,
        &json!([
            {"name": "a", "level": "error", "appenders": [{"type": "StdoutAppender"}]},
            {"name": "b", "level": "info", "formatter": "%p|%c|%m%n",
             "appenders": [{"type": "FileAppender", "file": log_path.to_str().unwrap()}]}
        ]),
    )?;
    assert_eq!(a.level(), Some(Level::Error));
    let kinds: Vec<_> = a.appenders().iter().map(|ap| ap.kind()).collect();
    assert_eq!(kinds, [AppenderKind::Stdout]);

    let b = manager.logger("b");
    log_info!(b, "first {}", 1);
    log_warn!(b, "second");
    assert_eq!(fs::read_to_string(&log_path)?, "INFO|b|first 1\nWARN|b|second\n");

    load(
        &registry,
        &json!([{"name": "a", "level": "error", "appenders": [{"type": "StdoutAppender"}]}]),
    )?;
    assert!(b.is_disabled());
    assert!(b.appenders().is_empty());
    log_error!(b, "dropped");
    assert_eq!(fs::read_to_string(&log_path)?.lines().count(), 2);

    assert_eq!(subscription.reconciler().applied().len(), 1);
    Ok(())
}

#[test]
fn malformed_declarations_leave_loggers_untouched() -> Result<()> {
    init_tracing();
    let registry = ConfigRegistry::new();
    let manager = Arc::new(LoggerManager::new());
    let subscription = LogReconciler::install(&registry, Arc::clone(&manager))?;

    load(&registry, &json!([{"name": "keep", "level": "warn"}]))?;
    load(
        &registry,
        &json!([{"name": "keep", "level": "debug", "appenders": [{"type": "FileAppender"}]}]),
    )?;

    assert_eq!(manager.logger("keep").level(), Some(Level::Warn));
    assert_eq!(
        subscription.variable().get_value(),
        LogDeclarations::from_text(r#"[{"name": "keep", "level": "WARN"}]"#)?
    );
    Ok(())
}

#[test]
fn manager_text_reloads_into_the_same_shape() -> Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let source = Arc::new(LoggerManager::new());
    let first = ConfigRegistry::new();
    LogReconciler::install(&first, Arc::clone(&source))?;
    load(
        &first,
        &json!([{"name": "system", "level": "error", "formatter": "%m%n",
                 "appenders": [{"type": "file", "file": dir.path().join("s.log").to_str().unwrap(),
                                "level": "fatal"}]}]),
    )?;

    let replica = Arc::new(LoggerManager::new());
    let second = ConfigRegistry::new();
    LogReconciler::install(&second, Arc::clone(&replica))?;
    second.load_from_text(&format!(r#"{{"logs": {}}}"#, source.to_text()))?;

    assert_eq!(replica.declarations(), source.declarations());
    Ok(())
}
