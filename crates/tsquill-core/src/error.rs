//! Error types for tsquill operations.
//!
//! This module provides a common `Error` type and `Result<T>` alias used across
//! all tsquill crates. Uses `thiserror` for derive macros.
//!
//! Variants fall into four families, reported by [`Error::kind`]:
//!
//! - **Configuration**: a vector definition references something that does
//!   not exist, or the config surface is malformed. Raised at `configure`.
//! - **Lookup**: an entity or vector name cannot be resolved for a call.
//! - **Input**: a search was attempted with a nil or blank query.
//! - **Store**: the persistence collaborator failed (including timeouts).

use thiserror::Error;

/// Errors that can occur in tsquill operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A vector definition references a column that is missing or malformed.
    #[error("Invalid field {table}.{column}: {reason}")]
    InvalidField {
        /// Owning table of the offending column.
        table: String,
        /// The column as written in the configuration.
        column: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The entity type has no search configuration.
    #[error("Entity '{0}' is not configured for search")]
    EntityNotConfigured(String),

    /// The requested vector is not defined for the entity.
    #[error("Vector '{vector}' is not defined for entity '{entity}'")]
    VectorNotFound {
        /// Entity type that was searched.
        entity: String,
        /// Vector name that was requested.
        vector: String,
    },

    /// No vector was named and the entity has more than one.
    #[error("Entity '{entity}' has several vectors ({}); name one explicitly", candidates.join(", "))]
    AmbiguousVector {
        /// Entity type that was searched.
        entity: String,
        /// The vectors the caller must choose from.
        candidates: Vec<String>,
    },

    /// The search query is nil, blank, or has no searchable terms.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// The persistence collaborator failed.
    #[error("Store error: {0}")]
    Store(String),

    /// The persistence collaborator gave up waiting on the database.
    #[error("Store timeout: {0}")]
    Timeout(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected at configuration time.
    Configuration,
    /// Entity or vector name resolution failed.
    Lookup,
    /// The caller supplied an unusable query.
    Input,
    /// The underlying store failed.
    Store,
    /// Local I/O or (de)serialization.
    Other,
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid field error.
    pub fn invalid_field(
        table: impl Into<String>,
        column: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidField {
            table: table.into(),
            column: column.into(),
            reason: reason.into(),
        }
    }

    /// Create a vector lookup error.
    pub fn vector_not_found(entity: impl Into<String>, vector: impl Into<String>) -> Self {
        Self::VectorNotFound {
            entity: entity.into(),
            vector: vector.into(),
        }
    }

    /// Create an invalid query error.
    pub fn invalid_query(msg: impl Into<String>) -> Self {
        Self::InvalidQuery(msg.into())
    }

    /// Create a store error.
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a store timeout error.
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) | Self::InvalidField { .. } => ErrorKind::Configuration,
            Self::EntityNotConfigured(_)
            | Self::VectorNotFound { .. }
            | Self::AmbiguousVector { .. } => ErrorKind::Lookup,
            Self::InvalidQuery(_) => ErrorKind::Input,
            Self::Store(_) | Self::Timeout(_) => ErrorKind::Store,
            Self::Io(_) | Self::Serialization(_) => ErrorKind::Other,
        }
    }

    /// Whether this error came from the store.
    pub fn is_store(&self) -> bool {
        self.kind() == ErrorKind::Store
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias using tsquill's Error type.
pub type Result<T> = std::result::Result<T, Error>;
