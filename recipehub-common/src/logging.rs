//! Tracing subscriber setup shared by RecipeHub binaries

use crate::config::LoggingConfig;
use crate::{Error, Result};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins when set. Otherwise the configured level is used as the
/// base directive, followed by any `extra_directives` (for example
/// `"tower_http=debug"`). When `config.file` is set, events are also appended
/// to that file without ANSI colouring.
pub fn init_tracing(config: &LoggingConfig, extra_directives: &[&str]) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(build_directives(&config.level, extra_directives)));

    let file_layer = match &config.file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to install tracing subscriber: {}", e)))
}

fn build_directives(level: &str, extra: &[&str]) -> String {
    let level = if level.trim().is_empty() { "info" } else { level.trim() };
    std::iter::once(level)
        .chain(extra.iter().copied())
        .collect::<Vec<_>>()
        .join(",")
}
