use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_NAME: &str = "neuro-backend.log";

/// Keeps the non-blocking file writer flushing until dropped
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLogSettings {
    pub dir: PathBuf,
    pub rotation: FileRotation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRotation {
    Hourly,
    Daily,
    Never,
}

impl FileRotation {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "hourly" => Some(Self::Hourly),
            "daily" => Some(Self::Daily),
            "never" => Some(Self::Never),
            _ => None,
        }
    }

    fn rotation(self) -> Rotation {
        match self {
            Self::Hourly => Rotation::HOURLY,
            Self::Daily => Rotation::DAILY,
            Self::Never => Rotation::NEVER,
        }
    }
}

pub fn file_logging_enabled() -> bool {
    std::env::var("ENABLE_FILE_LOGS")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false)
}

/// `ENABLE_FILE_LOGS`, `LOG_DIR` (default `./logs`) and `LOG_ROTATION`
/// (`hourly` | `daily` | `never`, default `daily`)
pub fn file_log_settings() -> Option<FileLogSettings> {
    if !file_logging_enabled() {
        return None;
    }
    let dir = std::env::var("LOG_DIR").unwrap_or_else(|_| "./logs".to_string());
    let rotation = std::env::var("LOG_ROTATION")
        .ok()
        .and_then(|v| FileRotation::parse(&v))
        .unwrap_or(FileRotation::Daily);
    Some(FileLogSettings {
        dir: PathBuf::from(dir),
        rotation,
    })
}

pub fn init_tracing(log_level: &str) -> Option<FileLogGuard> {
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_target(true);

    if let Some(settings) = file_log_settings() {
        if let Err(err) = std::fs::create_dir_all(&settings.dir) {
            eprintln!("failed to create log directory {}: {err}", settings.dir.display());
        } else {
            let file_appender =
                RollingFileAppender::new(settings.rotation.rotation(), &settings.dir, LOG_FILE_NAME);
            let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
            let file_layer = fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_target(true);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(stdout_layer)
                .with(file_layer)
                .init();

            return Some(FileLogGuard { _guard: guard });
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .init();

    None
}
