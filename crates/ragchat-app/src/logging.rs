//! Tracing setup: stdout plus a non-blocking log file.

use std::path::Path;
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Pick the filter directive.
///
/// Priority: --log-level > RUST_LOG > configured level (which already
/// carries any LOG_LEVEL override) > "info".
pub fn filter_directive(cli: Option<&str>, rust_log: Option<String>, configured: &str) -> String {
    [cli.map(str::to_string), rust_log, Some(configured.to_string())]
        .into_iter()
        .flatten()
        .find(|d| !d.trim().is_empty())
        .unwrap_or_else(|| "info".to_string())
}

/// Install the global subscriber.
///
/// If the log file's directory cannot be created, logging continues on
/// stdout only.
pub fn init(directive: &str, log_file: &Path) {
    let env_filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = file_writer(log_file).map(|writer| {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_ansi(false)
            .with_writer(writer)
    });
    let has_file = file_layer.is_some();
    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    if !has_file {
        tracing::warn!(path = %log_file.display(), "Log file unavailable, logging to stdout only");
    }
}

fn file_writer(log_file: &Path) -> Option<tracing_appender::non_blocking::NonBlocking> {
    let dir = match log_file.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let file_name = log_file.file_name()?;
    std::fs::create_dir_all(dir).ok()?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
    let _ = LOG_GUARD.set(guard);
    Some(non_blocking)
}
