//! Tracing setup: console output plus an appended plain-text log file

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing::{error, warn, Level as TraceLevel};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Map a level name to a tracing level; unknown names mean INFO
pub fn parse_level(value: &str) -> TraceLevel {
    match value.trim().to_lowercase().as_str() {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    }
}

/// Level from the command line option, else `LOG_LEVEL`, else INFO
pub fn resolve_level(option: Option<&str>) -> TraceLevel {
    let value = option
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| std::env::var("LOG_LEVEL").ok())
        .unwrap_or_else(|| "info".to_string());
    parse_level(&value)
}

pub fn init(level: TraceLevel, log_file: &Path) -> Result<()> {
    let (file_layer, file_error) = match OpenOptions::new().create(true).append(true).open(log_file) {
        Ok(file) => (
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file))),
            None,
        ),
        Err(e) => (None, Some(e)),
    };

    let subscriber = tracing_subscriber::registry()
        .with(LevelFilter::from_level(level))
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer);

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install tracing subscriber")?;

    if let Some(e) = file_error {
        warn!(path = %log_file.display(), error = %e, "Log file unavailable, logging to console only");
    }
    Ok(())
}

/// Route panics through the log so a crash leaves one diagnostic behind
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        error!(panic = %info, "Fatal error in main process");
        eprintln!("error: {info}");
    }));
}
