use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LogConfig;

/// Initialize the tracing subscriber.
///
/// Logs go to a daily-rolling file so stdout stays reserved for command output.
/// RUST_LOG takes precedence over the configured level. When no log directory
/// can be determined, logs go to stderr instead.
///
/// The returned guard must be held until exit to flush buffered lines.
pub fn init(config: &LogConfig) -> Option<WorkerGuard> {
  let default_level = config.level.as_deref().unwrap_or("warn");
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

  match log_dir(config) {
    Some(dir) => {
      let appender = tracing_appender::rolling::daily(dir, "policyvault.log");
      let (writer, guard) = tracing_appender::non_blocking(appender);
      tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();
      Some(guard)
    }
    None => {
      tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
      None
    }
  }
}

fn log_dir(config: &LogConfig) -> Option<PathBuf> {
  let dir = config
    .dir
    .clone()
    .or_else(|| dirs::data_dir().map(|d| d.join("policyvault").join("logs")))?;
  std::fs::create_dir_all(&dir).ok()?;
  Some(dir)
}
