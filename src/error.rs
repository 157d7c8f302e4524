//! termbridge error types

use thiserror::Error;

/// termbridge error type
#[derive(Error, Debug)]
pub enum Error {
    /// Authentication failure (bad or missing credentials)
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Unreachable host or backend
    #[error("Network error: {0}")]
    Network(String),

    /// No response within the configured bound
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Remote command ran but failed
    #[error("Execution error: {0}")]
    Execution(String),

    /// Assistant backend reachable but returned an unusable result
    #[error("Model error: {0}")]
    Model(String),

    /// Session error
    #[error("Session error: {0}")]
    Session(String),

    /// Gateway error
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for termbridge operations
pub type Result<T> = std::result::Result<T, Error>;

impl From<russh::Error> for Error {
    fn from(err: russh::Error) -> Self {
        match &err {
            russh::Error::NotAuthenticated => Error::Auth(err.to_string()),
            _ => Error::Network(err.to_string()),
        }
    }
}
