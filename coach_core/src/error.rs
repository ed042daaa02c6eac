//! Error types for the coach_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for coach_core operations
///
/// Only [`Error::InvalidRequest`] is raised by the generation pipeline itself.
/// Shortfalls such as an empty eligible pool or an over-committed time budget
/// are reported as advisory warnings on the generated session instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Exercise or template catalog validation error
    #[error("Catalog validation error: {0}")]
    CatalogValidation(String),

    /// Session request rejected before planning
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A stored session could not be found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
