//! Logging initialization for studyhall.
//!
//! Passwords, salts, hashes, and raw tokens must never appear in log
//! output; callers log usernames and user ids only.

use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::Result;

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Initialize logging to the console and the configured log file.
///
/// The console layer keeps ANSI colors; the file layer writes plain
/// text. `RUST_LOG` directives are honored on top of the configured
/// level.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter =
        EnvFilter::from_default_env().add_directive(parse_level(&config.level).into());

    let path = Path::new(&config.file);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let log_file = Arc::new(File::create(path)?);

    let console_layer = tracing_subscriber::fmt::layer().with_target(true);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}
