//! Logging initialization for the jxref binary.
//!
//! Two modes are supported:
//! - CLI mode: logs to STDOUT.
//! - File mode: logs to STDOUT and to a rolling file in the given directory.
//!
//! The log file is rolled over when it reaches 5 MB. Rotated logs are
//! compressed and at most 20 of them are kept.

use anyhow::{Context, Result};
use file_rotate::{ContentLimit, FileRotate, compression::Compression, suffix::AppendCount};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt::writer::MakeWriterExt};

pub const LOG_FILE_NAME: &str = "jxref.log";

pub enum LogMode {
    Cli,
    File { directory: PathBuf },
}

/// Guard that keeps the background file writer alive. Dropping it flushes
/// buffered lines.
pub struct LoggingGuards {
    _guards: Vec<WorkerGuard>,
}

fn filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

fn rotating_writer(directory: &Path) -> Result<FileRotate<AppendCount>> {
    std::fs::create_dir_all(directory)
        .with_context(|| format!("Failed to create log directory {}", directory.display()))?;
    Ok(FileRotate::new(
        directory.join(LOG_FILE_NAME),
        AppendCount::new(20),
        ContentLimit::Bytes(5 * 1024 * 1024),
        Compression::OnRotate(1),
        None,
    ))
}

pub fn init(mode: LogMode, verbose: bool) -> Result<Option<LoggingGuards>> {
    let filter = filter(verbose);

    match mode {
        LogMode::Cli => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to install subscriber: {e}"))?;
            Ok(None)
        }
        LogMode::File { directory } => {
            let (file_non_blocking, file_guard) =
                tracing_appender::non_blocking(rotating_writer(&directory)?);

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(
                    file_non_blocking
                        .with_max_level(tracing::Level::DEBUG)
                        .and(std::io::stdout),
                )
                .with_ansi(false)
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to install subscriber: {e}"))?;

            Ok(Some(LoggingGuards {
                _guards: vec![file_guard],
            }))
        }
    }
}
