//! Logging
//!
//! The screen belongs to the UI, so everything goes to a rotating file.
//! `RUST_LOG` overrides the configured level.

use std::path::Path;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{Builder, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use neurallink_conductor::config::LogSettings;

/// Start file logging. Keep the returned guard alive until exit so buffered
/// lines are flushed.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created or a global
/// subscriber is already installed.
pub fn init_logging(settings: &LogSettings) -> anyhow::Result<WorkerGuard> {
    let (dir, prefix) = split_log_path(&settings.file);
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create log directory {}", dir.display()))?;

    let appender = Builder::new()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix)
        .max_log_files(settings.backup_count.max(1))
        .build(dir)
        .context("failed to open log file")?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        )
        .with(filter)
        .try_init()
        .context("failed to install log subscriber")?;

    Ok(guard)
}

/// Directory and file name of a log path; bare names land in the working
/// directory
fn split_log_path(path: &Path) -> (&Path, String) {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let prefix = path
        .file_name()
        .map_or_else(|| "core.log".to_string(), |name| name.to_string_lossy().into_owned());
    (dir, prefix)
}
