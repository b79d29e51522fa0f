//! Error types for ticket triage.
//!
//! The classifier itself has no error paths. Everything here belongs to the
//! edges: reading the export, writing the report, reading configuration.

use std::path::PathBuf;

/// Error from a full analysis run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors raised while loading a message export.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode export {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unexpected export shape in {path}: {reason}")]
    UnexpectedShape { path: PathBuf, reason: String },
}

/// Errors raised while writing analysis results.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for an analysis run.
pub type Result<T> = std::result::Result<T, Error>;
