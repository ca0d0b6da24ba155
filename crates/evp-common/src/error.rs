//! Error types for EVP

use thiserror::Error;

/// Result type alias for EVP operations
pub type Result<T> = std::result::Result<T, EvpError>;

/// Main error type for EVP
#[derive(Error, Debug)]
pub enum EvpError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Document parse error: {0}")]
    Parse(String),

    #[error("No valid ages in {0}, cannot compute an average")]
    NoValidAges(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
