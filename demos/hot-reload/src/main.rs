//! Registers a few variables, loads a document, and reloads the logging
//! declarations while logging through them.
//!
//! Pass a JSON document path to load it instead of the built-in one. Set
//! `RUST_LOG=debug` to see the registry's own diagnostics.

use std::env;
use std::fs;

use anyhow::{Context, Result};
use serde_json::json;
use tessera::config::ConfigRegistry;
use tessera::log::{log_debug, log_error, log_info};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .init();

    let registry = ConfigRegistry::global();
    let manager = tessera::log::init()?;

    let port = registry.lookup("system.port", 8080_u16, "system port")?;
    port.add_listener(|old, new| info!(old, new, "port changed"));
    let hosts = registry.lookup("system.hosts", vec![String::from("localhost")], "hosts")?;

    let document = match env::args().nth(1) {
        Some(path) => fs::read_to_string(&path).with_context(|| format!("reading {path}"))?,
        None => json!({
            "system": {"port": 9000, "hosts": ["a.example", "b.example"]},
            "logs": [
                {"name": "root", "level": "info",
                 "appenders": [{"type": "StdoutAppender"}]},
                {"name": "system", "level": "debug", "formatter": "%d{%H:%M:%S} [%p] %c %m%n",
                 "appenders": [{"type": "StdoutAppender"}]}
            ]
        })
        .to_string(),
    };
    let applied = registry.load_from_text(&document)?;
    println!("applied {applied} configuration values");

    let system = manager.logger("system");
    log_info!(system, "listening on port {}", port.get_value());
    log_debug!(system, "hosts: {:?}", hosts.get_value());

    registry.load_from_text(
        &json!({"logs": [{"name": "root", "level": "info",
                          "appenders": [{"type": "StdoutAppender"}]}]})
        .to_string(),
    )?;
    log_error!(system, "not shown: the system logger is now disabled");
    log_info!(manager.root(), "system logger disabled: {}", system.is_disabled());

    println!("current logging declarations:\n{}", manager.to_text());
    registry.visit(|var| println!("{} = {} ({})", var.name(), var.to_text(), var.description()));
    Ok(())
}
