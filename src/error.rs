//! Global error handling for chronicle
//!
//! This module provides a centralized error type that can represent errors
//! from all modules in the project.

use std::io;
use thiserror::Error;

/// Global error type for chronicle operations
#[derive(Error, Debug)]
pub enum ChronicleError {
    /// File system errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Directory listing errors raised while walking
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// JSON processing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Path not found
    #[error("Path not found: {0}")]
    PathNotFound(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Unexpected error
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Specialized Result type for chronicle operations
pub type Result<T> = std::result::Result<T, ChronicleError>;

/// Creates a ChronicleError with a formatted message
#[macro_export]
macro_rules! error {
    ($error_type:ident, $($arg:tt)*) => {
        $crate::error::ChronicleError::$error_type(format!($($arg)*))
    };
}

/// Returns an error result with a formatted message
#[macro_export]
macro_rules! bail {
    ($error_type:ident, $($arg:tt)*) => {
        return Err($crate::error!($error_type, $($arg)*))
    };
}

/// Ensures a condition is true, otherwise returns an error
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $error_type:ident, $($arg:tt)*) => {
        if !($cond) {
            $crate::bail!($error_type, $($arg)*)
        }
    };
}

/// Extension trait for adding context to errors
pub trait ResultExt<T, E> {
    /// Add additional context to an error
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display;
}

impl<T, E: std::error::Error + 'static> ResultExt<T, E> for std::result::Result<T, E> {
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display,
    {
        self.map_err(|e| {
            let context = f();
            ChronicleError::Unexpected(format!("{}: {}", context, e))
        })
    }
}

// main() reports through io::Result
impl From<ChronicleError> for io::Error {
    fn from(err: ChronicleError) -> Self {
        match err {
            ChronicleError::Io(e) => e,
            ChronicleError::PathNotFound(msg) => io::Error::new(io::ErrorKind::NotFound, msg),
            ChronicleError::InvalidArgument(msg) | ChronicleError::Config(msg) => {
                io::Error::new(io::ErrorKind::InvalidInput, msg)
            }
            other => io::Error::new(io::ErrorKind::Other, other.to_string()),
        }
    }
}
