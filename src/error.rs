//! Error types for the adapter.
//!
//! Every driver-level failure is translated into [`AdapterError`] at the
//! statement executor boundary.

use thiserror::Error;

/// Main error type for adapter operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdapterError {
    /// Library load/initialization and connect failures.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Execution failure reported by the native driver.
    ///
    /// `message`, `errno` and `sql` are kept verbatim for caller diagnostics.
    #[error("Database error {errno}: {message}")]
    Database {
        message: String,
        errno: i32,
        sql: String,
    },

    /// A raw column value could not be converted to its typed form.
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// Configuration errors (invalid config file, conflicting fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal errors (poisoned locks, unexpected states).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AdapterError {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a database error from the driver's error accessor output.
    pub fn database(message: impl Into<String>, errno: i32, sql: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            errno,
            sql: sql.into(),
        }
    }

    /// Creates a conversion error with the given message.
    pub fn conversion(msg: impl Into<String>) -> Self {
        Self::Conversion(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Native error code, for driver-level failures.
    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::Database { errno, .. } => Some(*errno),
            _ => None,
        }
    }

    /// Statement text that failed, for driver-level failures.
    pub fn sql(&self) -> Option<&str> {
        match self {
            Self::Database { sql, .. } => Some(sql),
            _ => None,
        }
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "Connection Error",
            Self::Database { .. } => "Database Error",
            Self::Conversion(_) => "Conversion Error",
            Self::Config(_) => "Configuration Error",
            Self::Internal(_) => "Internal Error",
        }
    }
}

/// Result type alias using AdapterError.
pub type Result<T> = std::result::Result<T, AdapterError>;
