//! Tracing bootstrap plus structured scene events.

pub mod events;

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

const LOG_FILE_PREFIX: &str = "avatar-sprite.log";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs a stdout subscriber filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() -> Result<()> {
    let fmt_layer = fmt::layer().with_target(true);
    let subscriber = Registry::default().with(env_filter()).with(fmt_layer);

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|err| anyhow!("failed to set global subscriber: {err}"))
}

/// Like [`init_tracing`], but also writes daily-rolled logs under `dir`.
/// Keep the guard alive for as long as logs should be flushed.
pub fn init_tracing_with_file(dir: impl AsRef<Path>) -> Result<WorkerGuard> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create log directory {}", dir.display()))?;

    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let subscriber = Registry::default()
        .with(env_filter())
        .with(fmt::layer().with_target(true))
        .with(fmt::layer().with_ansi(false).with_writer(writer));

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|err| anyhow!("failed to set global subscriber: {err}"))?;
    Ok(guard)
}
