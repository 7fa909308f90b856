//! Logging setup shared by both binaries.
//!
//! Logs always go to stderr, tagged with the worker thread that produced
//! them. With a log directory configured, a daily rolling file receives a
//! copy without ANSI colors.
//!
//! The level can be overridden with the `MEDIASHELF_LOG` environment
//! variable, which takes any `EnvFilter` directive:
//! - `MEDIASHELF_LOG=debug` logs every file as it is handled
//! - `MEDIASHELF_LOG=warn` for warnings and errors only
//! - `MEDIASHELF_LOG=mediashelf::tags=trace` for one module

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::OnceLock;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const LOG_ENV: &str = "MEDIASHELF_LOG";

static GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Default filter directive for a `-v` count.
pub fn default_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Initialize the logging system. Call once, before any work starts.
pub fn init(verbosity: u8, log_dir: Option<&Path>) -> Result<()> {
    let env_filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_level(verbosity)));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_thread_names(true)
        .with_target(false);

    let file_layer = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating log directory {}", dir.display()))?;
            let file_appender = tracing_appender::rolling::daily(dir, "mediashelf.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            // The guard flushes on drop, so it has to outlive every log call.
            let _ = GUARD.set(guard);
            Some(
                fmt::layer()
                    .with_writer(non_blocking)
                    .with_ansi(false)
                    .with_thread_names(true)
                    .boxed(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("installing the log subscriber")?;

    if let Some(dir) = log_dir {
        tracing::debug!("Logging to {:?}", dir);
    }
    Ok(())
}
