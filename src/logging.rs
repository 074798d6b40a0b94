use anyhow::Result;
use std::path::Path;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Initialize structured logging system.
///
/// Console output goes to stderr, as JSON when `json_console` is set; with
/// `log_file` set, a daily-rolled JSON log is written next to it. Keep the
/// returned guard alive for as long as file logging should flush.
pub fn init_logging(
    log_level: Option<&str>,
    log_file: Option<&Path>,
    json_console: bool,
) -> Result<Option<WorkerGuard>> {
    // Set up environment filter
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            let level = log_level.unwrap_or("info");
            EnvFilter::try_new(level)
        })
        .map_err(|e| anyhow::anyhow!("Failed to create log filter: {}", e))?;

    let text_layer = (!json_console).then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(true)
    });
    let json_layer = json_console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .json()
    });

    let (file_layer, guard) = match log_file {
        Some(log_path) => {
            let directory = log_path.parent().unwrap_or_else(|| Path::new("."));
            let file_name = log_path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("expense-tracker.log");
            let file_appender = rolling::daily(directory, file_name);
            let (non_blocking_appender, guard) = non_blocking(file_appender);

            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .json();
            (Some(layer), Some(guard))
        },
        None => (None, None),
    };

    Registry::default()
        .with(env_filter)
        .with(text_layer)
        .with(json_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install subscriber: {}", e))?;

    info!("Logging system initialized");
    Ok(guard)
}

/// Performance timing utilities
pub struct OperationTimer {
    operation: String,
    start: std::time::Instant,
    finished: bool,
}

impl OperationTimer {
    /// Start timing `operation`
    #[must_use]
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            start: std::time::Instant::now(),
            finished: false,
        }
    }

    /// Log the elapsed time and return it in milliseconds
    pub fn finish(mut self) -> u128 {
        self.finished = true;
        let duration = self.start.elapsed().as_millis();
        tracing::info!(
            operation = %self.operation,
            duration_ms = duration,
            "Operation completed"
        );
        duration
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        if !self.finished && !std::thread::panicking() {
            let duration = self.start.elapsed().as_millis();
            tracing::debug!(
                operation = %self.operation,
                duration_ms = duration,
                "Operation finished"
            );
        }
    }
}
