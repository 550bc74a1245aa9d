//! Error types for carpool.
//!
//! Domain failures (`NotFound` through `InvalidState`) are reported straight
//! back to the caller and are never retried. The remaining variants are
//! system faults raised by storage, configuration or I/O.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The main error type for carpool operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Domain Errors ===
    /// A referenced user, ride or participation does not exist.
    #[error("{entity} '{key}' not found")]
    NotFound {
        /// Kind of entity that was looked up.
        entity: &'static str,
        /// The alias or identifier used for the lookup.
        key: String,
    },

    /// The acting user lacks the capability for this operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The request is malformed or has missing fields.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The request duplicates something that already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Not enough free seats on the ride.
    #[error("not enough available spaces: requested {requested}, available {available}")]
    CapacityExceeded {
        /// Seats asked for.
        requested: u32,
        /// Seats still free on the ride.
        available: u32,
    },

    /// The ride or participation is in the wrong lifecycle state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for carpool operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`], stable enough to hand to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Referenced entity absent.
    NotFound,
    /// Actor lacks the required capability.
    Forbidden,
    /// Malformed or missing request fields.
    InvalidInput,
    /// Duplicate request.
    Conflict,
    /// Seat math violated.
    CapacityExceeded,
    /// Wrong lifecycle state.
    InvalidState,
    /// Database or file system fault.
    Storage,
    /// Configuration could not be loaded or validated.
    Config,
    /// Anything else.
    Internal,
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a not-found error for the given entity.
    #[must_use]
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Create a forbidden error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    /// Create an invalid input error.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Create an invalid state error.
    #[must_use]
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::CapacityExceeded { .. } => ErrorKind::CapacityExceeded,
            Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::DatabaseOpen { .. }
            | Self::DatabaseQuery(_)
            | Self::DatabaseMigration { .. }
            | Self::Io(_)
            | Self::DirectoryCreate { .. } => ErrorKind::Storage,
            Self::ConfigLoad(_) | Self::ConfigValidation { .. } => ErrorKind::Config,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Check if this error was caused by the request rather than the system.
    #[must_use]
    pub fn is_domain(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::NotFound
                | ErrorKind::Forbidden
                | ErrorKind::InvalidInput
                | ErrorKind::Conflict
                | ErrorKind::CapacityExceeded
                | ErrorKind::InvalidState
        )
    }
}
