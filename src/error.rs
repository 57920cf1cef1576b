//! # Centralized Error Handling
//!
//! Unified error types for the entire crate using `thiserror`.

use thiserror::Error;

/// Main error type for mosaix operations
#[derive(Error, Debug)]
pub enum MosaixError {
    /// I/O errors surfaced by provider or sink implementations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid data errors (marker count mismatch, empty reference panel)
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// Algorithm errors (empty candidate list where one is required)
    #[error("Algorithm error: {message}")]
    Algorithm { message: String },

    /// Configuration errors (zero-sized window, bad parameter combinations)
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Type alias for Results using MosaixError
pub type Result<T> = std::result::Result<T, MosaixError>;

impl MosaixError {
    /// Create an invalid data error
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Create an algorithm error
    pub fn algorithm(message: impl Into<String>) -> Self {
        Self::Algorithm {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
