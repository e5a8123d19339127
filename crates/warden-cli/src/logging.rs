//! Tracing setup.
//!
//! Level is controlled by `WARDEN_LOG` (default `info`), e.g.
//! `WARDEN_LOG=warden_core=debug`.

use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "warden.log";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env("WARDEN_LOG").unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Log to stderr, for commands that print results to stdout.
pub fn init_stderr() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Log to a daily rolling file under `log_dir`, for commands that own the
/// terminal. Buffered lines are flushed when the returned guard drops, so
/// hold it until exit.
pub fn init_file(log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    tracing::info!(dir = %log_dir.display(), "logging to file");
    Ok(guard)
}
