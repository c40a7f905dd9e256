//! Tracing setup for the session core.

use std::path::PathBuf;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::Result;

/// Install the global tracing subscriber.
///
/// Output goes to a daily-rolled file under `<data_local_dir>/okul/logs`.
/// Filtering is controlled by the `OKUL_LOG` environment variable,
/// defaulting to `okul=info,warn`.
pub fn init() -> Result<()> {
    let log_dir = log_directory();
    std::fs::create_dir_all(&log_dir)?;

    let filter =
        EnvFilter::try_from_env("OKUL_LOG").unwrap_or_else(|_| EnvFilter::new("okul=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(RollingFileAppender::new(Rotation::DAILY, &log_dir, "okul.log"))
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .init();

    tracing::info!(dir = %log_dir.display(), "logging initialized");
    Ok(())
}

fn log_directory() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("okul")
        .join("logs")
}
