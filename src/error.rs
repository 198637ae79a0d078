//! Error types for pg-notebook.
//!
//! Every failure the interpreter can hit collapses into one of these kinds.
//! The host only ever sees an ERROR status plus the underlying message; the
//! kind travels alongside for callers that want to tell them apart.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for pg-notebook operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotebookError {
    /// Connection options could not be built (bad URI, unsupported option).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database connection errors (host unreachable, auth failed, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution errors (syntax errors, constraint violations, etc.)
    #[error("Query error: {0}")]
    Query(String),

    /// A cell could not be read as text.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The command timeout elapsed before the query finished.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Host-side errors (unknown interpreter, scheduler gone, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error kind reported out-of-band next to an ERROR status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Config,
    Connection,
    Query,
    Decode,
    Timeout,
    Internal,
}

impl NotebookError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a decode error with the given message.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Creates a timeout error with the given message.
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "Configuration Error",
            Self::Connection(_) => "Connection Error",
            Self::Query(_) => "Query Error",
            Self::Decode(_) => "Decode Error",
            Self::Timeout(_) => "Timeout",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Config,
            Self::Connection(_) => ErrorKind::Connection,
            Self::Query(_) => ErrorKind::Query,
            Self::Decode(_) => ErrorKind::Decode,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Returns the underlying message without the category prefix.
    ///
    /// This is the text handed back to the host on failure.
    pub fn message(&self) -> &str {
        match self {
            Self::Config(msg)
            | Self::Connection(msg)
            | Self::Query(msg)
            | Self::Decode(msg)
            | Self::Timeout(msg)
            | Self::Internal(msg) => msg,
        }
    }
}

/// Result type alias using NotebookError.
pub type Result<T> = std::result::Result<T, NotebookError>;
