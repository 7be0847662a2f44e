//! Tracing setup.
//!
//! Filter precedence: `RUST_LOG`, then `[log].level`, then `warn`. Output goes to
//! stderr unless `[log].file` is set, in which case a daily-rolling file under
//! `$CIRCLE_HOME/logs` is used.

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{LogConfig, paths};

const DEFAULT_FILTER: &str = "warn";
const LOG_FILE_PREFIX: &str = "circle.log";

/// Installs the global subscriber.
///
/// Returns the file writer guard when logging to a file; keep it alive for the
/// life of the process so buffered lines are flushed. Calling this twice is
/// harmless: the second install is skipped.
pub fn init(config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let filter = build_filter(config);

    if config.file {
        let dir = paths::logs_dir();
        let appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(LOG_FILE_PREFIX)
            .build(&dir)
            .with_context(|| format!("Failed to open log directory {}", dir.display()))?;
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let installed = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_ansi(false).with_writer(writer))
            .try_init()
            .is_ok();
        return Ok(installed.then_some(guard));
    }

    install_stderr(filter);
    Ok(None)
}

/// Installs a stderr subscriber. Returns false, leaving the existing one in
/// place, when a subscriber is already installed (tests, embedding apps).
fn install_stderr(filter: EnvFilter) -> bool {
    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .is_ok();
    if !installed {
        tracing::debug!("global subscriber already set, keeping it");
    }
    installed
}

fn build_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directive = config
            .level
            .as_deref()
            .map(str::trim)
            .filter(|level| !level.is_empty())
            .unwrap_or(DEFAULT_FILTER);
        EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    })
}
