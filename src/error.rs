//! Error types for dlp-audit.

use std::path::PathBuf;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("Mail log error: {0}")]
    Log(#[from] LogError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Failures reading a single policy export. These abandon one file only.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not valid UTF-8: {source}")]
    Encoding {
        path: PathBuf,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

/// Mail log loading errors.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("Mail log is missing a {column} column")]
    MissingColumn { column: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Report writing errors.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Workbook error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Vulnerability-scan API errors.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Request to {url} failed: {reason}")]
    RequestFailed { url: String, reason: String },

    #[error("Scan API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response from scan API: {0}")]
    InvalidResponse(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

/// Result type alias for dlp-audit.
pub type Result<T> = std::result::Result<T, Error>;
