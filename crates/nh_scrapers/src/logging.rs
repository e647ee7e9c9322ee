use nh_core::Result;
use std::fs;
use std::path::Path;
use std::sync::Once;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Logging context handed to each component at construction.
///
/// Prefixes stack, so the manager can log as `[nh]` while the RIA scraper
/// logs as `[nh] [ria]`.
#[derive(Debug, Clone, Default)]
pub struct Logger {
    prefixes: Vec<String>,
}

impl Logger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_new_prefixes(mut self, prefix: impl Into<String>) -> Self {
        self.prefixes.clear();
        self.prefixes.push(prefix.into());
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefixes.push(prefix.into());
        self
    }

    pub fn prefix(&self) -> String {
        self.prefixes.join(" ")
    }

    fn render(&self, message: &str) -> String {
        if self.prefixes.is_empty() {
            message.to_string()
        } else {
            format!("{} {}", self.prefix(), message)
        }
    }

    pub fn info(&self, message: &str) {
        tracing::info!("{}", self.render(message));
    }

    pub fn error(&self, message: &str) {
        tracing::error!("{}", self.render(message));
    }

    pub fn warn(&self, message: &str) {
        tracing::warn!("{}", self.render(message));
    }

    pub fn debug(&self, message: &str) {
        tracing::debug!("{}", self.render(message));
    }
}

/// Daily `nh.YYYY-MM-DD.log` files under `dir`.
pub fn file_appender(dir: &Path) -> Result<RollingFileAppender> {
    fs::create_dir_all(dir)?;
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("nh")
        .filename_suffix("log")
        .build(dir)
        .map_err(|e| std::io::Error::other(e.to_string()).into())
}

/// Installs the global subscriber once. `RUST_LOG` wins over `default_filter`.
/// With `log_dir` set, every line is also written to a rolling file there.
pub fn init_logging(default_filter: &str, log_dir: Option<&Path>) -> Result<Logger> {
    if tracing::dispatcher::has_been_set() {
        return Ok(Logger::new());
    }

    let file_layer = match log_dir {
        Some(dir) => Some(
            fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(file_appender(dir)?),
        ),
        None => None,
    };

    let default_filter = default_filter.to_string();
    INIT.call_once(move || {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_filter));
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false))
            .with(file_layer)
            .init();
    });
    Ok(Logger::new())
}
