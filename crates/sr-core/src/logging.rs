use tracing_subscriber::{fmt, EnvFilter};

use crate::{errors::Error, Result};

/// Initialize logging/tracing for the bot.
///
/// Filter precedence: `RUST_LOG`, then `LOG_LEVEL` (e.g. `INFO`, `debug`), then `info`.
pub fn init(service_name: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = level_from(std::env::var("LOG_LEVEL").ok());
        EnvFilter::try_new(default_directives(&level, service_name))
            .unwrap_or_else(|_| EnvFilter::new(default_directives("info", service_name)))
    });

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| Error::External(format!("logging init failed: {e}")))
}

fn level_from(raw: Option<String>) -> String {
    raw.map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "info".to_string())
}

fn default_directives(level: &str, service_name: &str) -> String {
    format!("{level},sr_core={level},{service_name}={level}")
}
