use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Route `tracing` output to `<dir>/popcorn.log.<date>`.
///
/// The terminal belongs to the TUI, so nothing is written to stdout or
/// stderr. `RUST_LOG` overrides the default `info` filter. Keep the returned
/// guard alive for the life of the process or buffered lines are lost.
pub fn init_logging(dir: &Path) -> Result<WorkerGuard> {
  std::fs::create_dir_all(dir).with_context(|| format!("Failed to create log dir {}", dir.display()))?;
  let appender = RollingFileAppender::new(Rotation::DAILY, dir, "popcorn.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  tracing_subscriber::registry()
    .with(filter)
    .with(fmt::layer().with_writer(writer).with_ansi(false).with_target(false))
    .try_init()
    .context("Failed to install tracing subscriber")?;
  Ok(guard)
}
