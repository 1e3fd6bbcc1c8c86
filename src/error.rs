//! Error types for the SQLite tour
//!
//! Every failure the store or the binding layer can produce is one variant of
//! [`Error`]. Driver errors are classified on conversion so callers can match
//! on "no rows" and constraint violations without digging into rusqlite.

use thiserror::Error;

/// The main error type for store and binding operations
#[derive(Debug, Error)]
pub enum Error {
    // ==========================================================================
    // Lifecycle Errors
    // ==========================================================================
    #[error("Failed to open database at '{path}': {source}")]
    Connection {
        path: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Failed to create table '{table}': {source}")]
    Schema {
        table: String,
        #[source]
        source: rusqlite::Error,
    },

    // ==========================================================================
    // Binding Errors
    // ==========================================================================
    #[error("Statement expects {expected} parameter(s) but {actual} were supplied")]
    Arity { expected: usize, actual: usize },

    #[error("IN clause argument {position} is an empty list")]
    EmptyList { position: usize },

    #[error("Could not find name '{name}' in the argument source")]
    UnboundName { name: String },

    // ==========================================================================
    // Result Errors
    // ==========================================================================
    #[error("Query returned no rows")]
    NotFound,

    #[error("Failed to decode row into {record}: {source}")]
    Decode {
        record: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    // ==========================================================================
    // Store Errors
    // ==========================================================================
    #[error("Constraint violation: {message}")]
    Constraint {
        message: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("SQLite error: {0}")]
    Sqlite(#[source] rusqlite::Error),
}

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, Error>;

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(code, message) = &err {
            if code.code == rusqlite::ErrorCode::ConstraintViolation {
                let message = message.clone().unwrap_or_else(|| code.to_string());
                return Error::Constraint {
                    message,
                    source: err,
                };
            }
        }
        match err {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            other => Error::Sqlite(other),
        }
    }
}

impl Error {
    /// Returns true if the error came from matching arguments to placeholders
    pub fn is_binding_error(&self) -> bool {
        matches!(
            self,
            Error::Arity { .. } | Error::EmptyList { .. } | Error::UnboundName { .. }
        )
    }

    /// Wraps a row conversion failure with the name of the target type
    pub(crate) fn decode<T>(source: rusqlite::Error) -> Self {
        Error::Decode {
            record: std::any::type_name::<T>(),
            source,
        }
    }
}
