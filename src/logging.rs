use std::path::PathBuf;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::error::{NotifierError, Result};

const DEFAULT_MAX_LOG_FILES: usize = 5;
const LOG_FILE_PREFIX: &str = "push_notifier";

pub struct FileLogger {
    log_directory: PathBuf,
    max_files: usize,
    rotation: Rotation,
}

impl FileLogger {
    pub fn new(log_directory: PathBuf) -> Self {
        Self {
            log_directory,
            max_files: DEFAULT_MAX_LOG_FILES,
            rotation: Rotation::DAILY,
        }
    }

    pub fn with_max_files(mut self, max_files: usize) -> Self {
        self.max_files = max_files;
        self
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// Creates the log directory and a non-blocking rolling file writer.
    /// The returned guard must be kept alive or buffered lines are lost.
    pub fn setup_file_logging(&self) -> Result<(NonBlocking, WorkerGuard)> {
        std::fs::create_dir_all(&self.log_directory)?;

        let file_appender = RollingFileAppender::builder()
            .rotation(self.rotation.clone())
            .filename_prefix(LOG_FILE_PREFIX)
            .max_log_files(self.max_files)
            .build(&self.log_directory)
            .map_err(|e| {
                NotifierError::ConfigError(format!(
                    "Failed to create log file in {:?}: {}",
                    self.log_directory, e
                ))
            })?;

        Ok(tracing_appender::non_blocking(file_appender))
    }
}

/// Console logging filtered by `RUST_LOG` (default `info`), plus an optional
/// plain-text file layer.
pub fn setup_logging(file_logger: Option<&FileLogger>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match file_logger {
        Some(file_logger) => {
            let (writer, guard) = file_logger.setup_file_logging()?;
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer()) // Console output
        .with(file_layer)
        .init();

    Ok(guard)
}
