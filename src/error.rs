//! Error types for biotrend

use thiserror::Error;

/// Errors that can occur while loading exports, assembling or rendering figures
#[derive(Debug, Error)]
pub enum TrendError {
    #[error("Failed to parse export: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid CSV: {0}")]
    CsvError(#[from] csv::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Date parse error: {0}")]
    DateParseError(String),

    #[error("Timestamp out of range: {0}")]
    TimestampOutOfRange(f64),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Render error: {0}")]
    RenderError(String),

    #[error("Music API error: {0}")]
    MusicApiError(String),
}
