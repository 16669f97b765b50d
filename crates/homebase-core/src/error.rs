//! Error types for homebase-core

use thiserror::Error;

use crate::gateway::GatewayError;

/// Result type alias using homebase-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in homebase-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// `SQLite` error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Record not found
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Remote store error
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
