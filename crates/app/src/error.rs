//! Startup and runtime errors of the service binary.

use application::ApplicationError;
use common::ErrorKind;
use storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// The log subscriber could not be installed.
    #[error("Failed to initialize tracing: {0}")]
    Tracing(String),

    /// The Prometheus recorder could not be installed.
    #[error("Failed to install metrics recorder: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    /// Metrics were requested but no recorder is installed.
    #[error("Metrics are not being recorded")]
    MetricsUnavailable,

    /// The storage backend could not be prepared.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A command failed.
    #[error("Application error: {0}")]
    Application(#[from] ApplicationError),

    /// A command result could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    /// Classification of command failures; `None` for startup and encoding errors.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            AppError::Application(e) => Some(e.kind()),
            AppError::Storage(e) => Some(e.kind()),
            AppError::Tracing(_)
            | AppError::Metrics(_)
            | AppError::MetricsUnavailable
            | AppError::Serialization(_) => None,
        }
    }
}
