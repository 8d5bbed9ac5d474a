//! Logging setup.
//!
//! The `[logging].level` setting picks the default level. Directives in the
//! `FILENEST_LOG` environment variable (same syntax as `RUST_LOG`) replace it,
//! e.g. `FILENEST_LOG=filenest=debug,sqlx=warn`.

use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::Result;

/// Environment variable holding filter directives.
pub const LOG_ENV_VAR: &str = "FILENEST_LOG";

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Filter from the configured level and optional override directives.
/// Invalid directives are skipped.
fn build_filter(level: &str, directives: Option<&str>) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(parse_level(level).into())
        .parse_lossy(directives.map(str::trim).unwrap_or_default())
}

fn env_filter(level: &str) -> EnvFilter {
    let directives = std::env::var(LOG_ENV_VAR).ok();
    build_filter(level, directives.as_deref())
}

/// Install the global subscriber.
///
/// Logs go to stdout and, when `config.file` is non-empty, to that file too.
pub fn init(config: &LoggingConfig) -> Result<()> {
    if config.file.is_empty() {
        init_console_only(&config.level);
        return Ok(());
    }

    if let Some(parent) = Path::new(&config.file).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let log_file = Arc::new(File::create(&config.file)?);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout.and(log_file))
                .with_ansi(false),
        )
        .with(env_filter(&config.level))
        .init();

    Ok(())
}

/// Install a stdout-only subscriber.
pub fn init_console_only(level: &str) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .with(env_filter(level))
        .init();
}
