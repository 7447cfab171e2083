//! Unified error type for the kandan application.
//!
//! All crates funnel their failures into [`Error`], which carries enough
//! context for API handlers to derive an HTTP status code via
//! [`Error::http_status`].

use std::fmt;

/// Unified error type covering all failure modes in kandan.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "video", "binding").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// Request data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A conflicting resource already exists.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A database operation failed.
    #[error("Database error: {source}")]
    Database {
        /// The underlying database error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The metadata service answered with a well-formed payload whose
    /// success flag was false. Never retried.
    #[error("Service rejected request: {message}")]
    ServiceRejected {
        /// The error message reported by the service.
        message: String,
    },

    /// The metadata service could not be reached after exhausting the
    /// retry budget.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// No cached danmu payload exists for the requested episode.
    #[error("No cached danmu for episode {episode_id}")]
    NotCached {
        /// The episode whose cache entry was missing or unreadable.
        episode_id: i64,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::NotFound { .. } => 404,
            Error::Validation(_) => 400,
            Error::Conflict(_) => 409,
            Error::Database { .. } => 500,
            Error::Io { .. } => 500,
            Error::ServiceRejected { .. } => 502,
            Error::Unavailable(_) => 503,
            Error::NotCached { .. } => 404,
            Error::Internal(_) => 500,
        }
    }

    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Database`].
    pub fn database(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Database {
            source: source.into(),
        }
    }

    /// Convenience constructor for [`Error::ServiceRejected`].
    pub fn service_rejected(message: impl Into<String>) -> Self {
        Error::ServiceRejected {
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::NotCached`].
    pub fn not_cached(episode_id: i64) -> Self {
        Error::NotCached { episode_id }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
