//! Error types for SQLite Insight

use thiserror::Error;

/// Core error type for SQLite Insight operations
#[derive(Error, Debug)]
pub enum InsightError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Not a valid SQLite database: {0}")]
    InvalidDatabase(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl InsightError {
    /// Whether the error came back from the engine while running a statement
    pub fn is_query(&self) -> bool {
        matches!(self, InsightError::Query(_))
    }
}

/// Result type alias for SQLite Insight operations
pub type Result<T> = std::result::Result<T, InsightError>;
