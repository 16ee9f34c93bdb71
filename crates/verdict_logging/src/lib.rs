//! Shared logging setup for verdict binaries.
//!
//! Hop start/end records are the only observability signal that crosses
//! the asynchronous boundary, so every binary installs the same
//! subscriber: an `EnvFilter`-governed stderr layer plus, when requested,
//! an append-only file under the verdict home directory.

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "verdict=info,verdict_intake=info,verdict_scorer=info,verdict_aggregator=info,verdict_protocol=info";

/// Logging configuration shared by verdict binaries.
pub struct LogConfig<'a> {
    pub app_name: &'a str,
    pub verbose: bool,
    /// Also append events to `<verdict home>/logs/<app_name>.log`.
    pub log_to_file: bool,
}

/// Initialize tracing for one binary. Call once at startup.
pub fn init_logging(config: LogConfig<'_>) -> Result<()> {
    let stderr_filter = if config.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(stderr_filter);

    if config.log_to_file {
        let path = ensure_logs_dir()?.join(format!("{}.log", sanitize_name(config.app_name)));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file: {}", path.display()))?;
        let file_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(Arc::new(file))
            .with_ansi(false)
            .with_filter(file_filter);

        tracing_subscriber::registry()
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry().with(stderr_layer).init();
    }

    Ok(())
}

/// The verdict home directory: `~/.verdict`, overridable via `VERDICT_HOME`.
pub fn verdict_home() -> PathBuf {
    if let Ok(override_path) = std::env::var("VERDICT_HOME") {
        return PathBuf::from(override_path);
    }
    if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
        return PathBuf::from(home).join(".verdict");
    }
    PathBuf::from(".").join(".verdict")
}

/// The logs directory: `<verdict home>/logs`.
pub fn logs_dir() -> PathBuf {
    verdict_home().join("logs")
}

/// Ensure the logs directory exists.
pub fn ensure_logs_dir() -> Result<PathBuf> {
    let logs = logs_dir();
    fs::create_dir_all(&logs)
        .with_context(|| format!("Failed to create logs directory: {}", logs.display()))?;
    Ok(logs)
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn home_honors_override() {
        let prev = std::env::var("VERDICT_HOME").ok();
        std::env::set_var("VERDICT_HOME", "/tmp/verdict-test-home");
        assert_eq!(verdict_home(), PathBuf::from("/tmp/verdict-test-home"));
        assert_eq!(
            logs_dir(),
            PathBuf::from("/tmp/verdict-test-home").join("logs")
        );
        match prev {
            Some(value) => std::env::set_var("VERDICT_HOME", value),
            None => std::env::remove_var("VERDICT_HOME"),
        }
    }

    #[test]
    fn sanitize_keeps_safe_characters() {
        assert_eq!(sanitize_name("verdict-worker_1"), "verdict-worker_1");
        assert_eq!(sanitize_name("a b/c"), "a_b_c");
    }
}
