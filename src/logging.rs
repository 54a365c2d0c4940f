// src/logging.rs
// The terminal belongs to the UI, so events go to a daily rolling file.
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE: &str = "rime.log";

/// Keeps the background writer alive; drop it last.
pub struct LoggingGuard {
    _guard: WorkerGuard,
    log_dir: PathBuf,
}

impl LoggingGuard {
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }
}

/// `dir`, created if needed, falling back to `<tmp>/rime/logs`.
pub fn resolve_log_dir(dir: &Path) -> Option<PathBuf> {
    std::fs::create_dir_all(dir)
        .map(|_| dir.to_path_buf())
        .or_else(|_| -> std::io::Result<PathBuf> {
            let fallback = std::env::temp_dir().join("rime").join("logs");
            std::fs::create_dir_all(&fallback)?;
            Ok(fallback)
        })
        .ok()
}

/// Install the global subscriber. `RUST_LOG` wins over `default_filter`.
/// Returns `None` when no directory is writable or a subscriber is already set.
pub fn init(dir: &Path, default_filter: &str) -> Option<LoggingGuard> {
    let log_dir = resolve_log_dir(dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("rime=info"));

    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .with_thread_names(true)
            .with_line_number(true),
    );

    if subscriber.try_init().is_err() {
        return None;
    }

    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        tracing::error!(panic = %panic_info, "panic");
        previous(panic_info);
    }));

    tracing::info!(log_dir = %log_dir.display(), "tracing initialized");

    Some(LoggingGuard {
        _guard: guard,
        log_dir,
    })
}
