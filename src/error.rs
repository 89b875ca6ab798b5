//! Application error types shared by the graph and document drivers.

use std::time::Duration;

use thiserror::Error;

/// Application-level errors for graphgate.
///
/// Both driver boundaries return this type, so the gateway and the
/// bootstrapper can hand a driver failure back to their caller as-is.
#[derive(Error, Debug)]
pub enum AppError {
    // Driver errors
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Malformed query: {message}")]
    MalformedQuery { code: u16, message: String },

    #[error("Graph server error ({code}): {message}")]
    GraphServer { code: u16, message: String },

    #[error("Document store error ({status}): {message}")]
    DocumentStore { status: u16, message: String },

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Domain errors
    #[error("Validation error: {0}")]
    Validation(String),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Missing configuration section: [{0}]")]
    MissingConfig(&'static str),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns true for failures raised by a graph or document driver.
    pub fn is_driver_error(&self) -> bool {
        matches!(
            self,
            AppError::Connection(_)
                | AppError::Authentication(_)
                | AppError::MalformedQuery { .. }
                | AppError::GraphServer { .. }
                | AppError::DocumentStore { .. }
                | AppError::Timeout(_)
                | AppError::WebSocket(_)
                | AppError::Http(_)
        )
    }
}
